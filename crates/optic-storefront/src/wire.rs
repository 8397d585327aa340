//! Storefront JSON shapes and their mapping onto cart snapshots.

use serde::{Deserialize, Serialize};

use optic_commerce::attributes::{Attribute, AttributeList};
use optic_commerce::cart::{
    BuyerIdentity, BuyerIdentityInput, Cart, CartCost, CartLine, LineItemRequest, LineUpdate,
    MutationOutcome, UserError,
};
use optic_commerce::{CartId, Currency, CustomerId, LineId, MerchandiseId, Money};

use crate::FetchError;

/// `{ data, errors }` envelope.
#[derive(Debug, Deserialize)]
pub struct GraphQlResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
pub struct GraphQlError {
    pub message: String,
}

impl<T> GraphQlResponse<T> {
    /// `data`, or the top-level errors when there is none.
    pub fn into_data(self) -> Result<T, FetchError> {
        match self.data {
            Some(data) if self.errors.is_empty() => Ok(data),
            _ if !self.errors.is_empty() => Err(FetchError::GraphQl(
                self.errors.into_iter().map(|e| e.message).collect(),
            )),
            _ => Err(FetchError::ParseError("response has no data".to_string())),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoneyV2 {
    pub amount: String,
    pub currency_code: String,
}

impl MoneyV2 {
    fn to_money(&self) -> Result<Money, FetchError> {
        let currency = Currency::from_code(&self.currency_code).ok_or_else(|| {
            FetchError::ParseError(format!("unsupported currency {}", self.currency_code))
        })?;
        Money::parse_decimal(&self.amount, currency)
            .ok_or_else(|| FetchError::ParseError(format!("invalid amount {}", self.amount)))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartCostDto {
    pub subtotal_amount: MoneyV2,
    pub total_amount: MoneyV2,
    #[serde(default)]
    pub total_tax_amount: Option<MoneyV2>,
}

#[derive(Debug, Deserialize)]
pub struct ProductRef {
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct MerchandiseDto {
    pub id: String,
    pub product: Option<ProductRef>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineCostDto {
    pub amount_per_quantity: MoneyV2,
}

#[derive(Debug, Deserialize)]
pub struct CartLineDto {
    pub id: String,
    pub quantity: i64,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
    pub cost: LineCostDto,
    pub merchandise: MerchandiseDto,
}

#[derive(Debug, Deserialize)]
pub struct Edge<T> {
    pub node: T,
}

#[derive(Debug, Deserialize)]
pub struct Connection<T> {
    pub edges: Vec<Edge<T>>,
}

#[derive(Debug, Deserialize)]
pub struct CustomerRef {
    pub id: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct BuyerIdentityDto {
    pub email: Option<String>,
    pub customer: Option<CustomerRef>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartDto {
    pub id: String,
    pub checkout_url: String,
    #[serde(default)]
    pub buyer_identity: Option<BuyerIdentityDto>,
    pub cost: CartCostDto,
    pub lines: Connection<CartLineDto>,
}

impl CartDto {
    pub fn into_cart(self) -> Result<Cart, FetchError> {
        let lines = self
            .lines
            .edges
            .into_iter()
            .map(|edge| {
                let node = edge.node;
                Ok(CartLine {
                    id: LineId::new(node.id),
                    merchandise_id: MerchandiseId::new(node.merchandise.id),
                    title: node.merchandise.product.map(|p| p.title).unwrap_or_default(),
                    quantity: node.quantity,
                    attributes: AttributeList::from(node.attributes),
                    unit_price: node.cost.amount_per_quantity.to_money()?,
                })
            })
            .collect::<Result<Vec<_>, FetchError>>()?;

        let buyer = self.buyer_identity.unwrap_or_default();
        Ok(Cart {
            id: CartId::new(self.id),
            checkout_url: self.checkout_url,
            lines,
            cost: CartCost {
                subtotal: self.cost.subtotal_amount.to_money()?,
                total: self.cost.total_amount.to_money()?,
                total_tax: self
                    .cost
                    .total_tax_amount
                    .as_ref()
                    .map(MoneyV2::to_money)
                    .transpose()?,
            },
            buyer_identity: BuyerIdentity {
                email: buyer.email,
                customer_id: buyer.customer.map(|c| CustomerId::new(c.id)),
            },
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserErrorDto {
    #[serde(default)]
    pub field: Option<Vec<String>>,
    pub message: String,
}

/// Payload shared by every cart mutation.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartPayload {
    pub cart: Option<CartDto>,
    #[serde(default)]
    pub user_errors: Vec<UserErrorDto>,
}

impl CartPayload {
    pub fn into_outcome(self) -> Result<MutationOutcome, FetchError> {
        Ok(MutationOutcome {
            cart: self.cart.map(CartDto::into_cart).transpose()?,
            user_errors: self
                .user_errors
                .into_iter()
                .map(|e| UserError {
                    field: e.field,
                    message: e.message,
                })
                .collect(),
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineInput<'a> {
    pub merchandise_id: &'a str,
    pub quantity: i64,
    pub attributes: &'a [Attribute],
}

impl<'a> From<&'a LineItemRequest> for CartLineInput<'a> {
    fn from(request: &'a LineItemRequest) -> Self {
        Self {
            merchandise_id: request.merchandise_id.as_str(),
            quantity: request.quantity,
            attributes: request.attributes.as_slice(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CartLineUpdateInput<'a> {
    pub id: &'a str,
    pub quantity: i64,
}

impl<'a> From<&'a LineUpdate> for CartLineUpdateInput<'a> {
    fn from(update: &'a LineUpdate) -> Self {
        Self {
            id: update.id.as_str(),
            quantity: update.quantity,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuyerIdentityWire<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_access_token: Option<&'a str>,
}

impl<'a> From<&'a BuyerIdentityInput> for BuyerIdentityWire<'a> {
    fn from(input: &'a BuyerIdentityInput) -> Self {
        Self {
            email: input.email.as_deref(),
            customer_access_token: input.customer_access_token.as_deref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn cart_json() -> serde_json::Value {
        json!({
            "id": "gid://shopify/Cart/c1",
            "checkoutUrl": "https://optic.example.com/cart/c/c1",
            "buyerIdentity": { "email": "ada@example.com", "customer": null },
            "cost": {
                "subtotalAmount": { "amount": "135.0", "currencyCode": "USD" },
                "totalAmount": { "amount": "135.0", "currencyCode": "USD" },
                "totalTaxAmount": null
            },
            "lines": { "edges": [{ "node": {
                "id": "gid://shopify/CartLine/l1",
                "quantity": 3,
                "attributes": [{ "key": "FocalProductType", "value": "ContactLenses" }],
                "cost": { "amountPerQuantity": { "amount": "45.0", "currencyCode": "USD" } },
                "merchandise": { "id": "gid://shopify/ProductVariant/v1", "product": { "title": "Daily" } }
            }}]}
        })
    }

    #[test]
    fn test_cart_dto_maps_to_snapshot() {
        let dto: CartDto = serde_json::from_value(cart_json()).unwrap();
        let cart = dto.into_cart().unwrap();
        assert_eq!(cart.cost.subtotal.amount_cents, 13500);
        assert_eq!(cart.cost.total_tax, None);
        assert_eq!(cart.lines[0].quantity, 3);
        assert_eq!(cart.lines[0].unit_price.amount_cents, 4500);
        assert_eq!(cart.lines[0].title, "Daily");
        assert_eq!(cart.lines[0].attributes.get("FocalProductType"), Some("ContactLenses"));
        assert_eq!(cart.buyer_identity.email.as_deref(), Some("ada@example.com"));
    }

    #[test]
    fn test_unknown_currency_is_parse_error() {
        let mut value = cart_json();
        value["cost"]["subtotalAmount"]["currencyCode"] = json!("XTS");
        let dto: CartDto = serde_json::from_value(value).unwrap();
        assert!(matches!(dto.into_cart(), Err(FetchError::ParseError(_))));
    }

    #[test]
    fn test_graphql_errors_win_over_data() {
        let resp: GraphQlResponse<serde_json::Value> = serde_json::from_value(json!({
            "data": null,
            "errors": [{ "message": "Throttled" }]
        }))
        .unwrap();
        let err = resp.into_data().unwrap_err();
        assert_eq!(err.to_string(), "GraphQL error: Throttled");
    }

    #[test]
    fn test_line_input_serializes_camel_case() {
        let request = LineItemRequest::new(
            MerchandiseId::new("v1"),
            2,
            vec![Attribute::new("Eye", "Left (OS)")].into(),
        );
        let value = serde_json::to_value(CartLineInput::from(&request)).unwrap();
        assert_eq!(
            value,
            json!({ "merchandiseId": "v1", "quantity": 2, "attributes": [{ "key": "Eye", "value": "Left (OS)" }] })
        );
    }
}
