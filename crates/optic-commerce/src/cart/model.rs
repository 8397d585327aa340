//! Cart snapshot types.
//!
//! A [`Cart`] is always a copy of what the commerce backend last returned.
//! Nothing here mutates lines locally.

use serde::{Deserialize, Serialize};

use crate::attributes::{AttributeList, FocalProductType};
use crate::ids::{CartId, CustomerId, LineId, MerchandiseId};
use crate::money::Money;

/// Maximum quantity accepted on a single line.
pub const MAX_LINE_QUANTITY: i64 = 99;

/// Backend-computed cart totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartCost {
    pub subtotal: Money,
    pub total: Money,
    /// Absent until the backend has an address to tax against.
    pub total_tax: Option<Money>,
}

impl CartCost {
    pub fn zero(currency: crate::money::Currency) -> Self {
        Self {
            subtotal: Money::zero(currency),
            total: Money::zero(currency),
            total_tax: None,
        }
    }
}

/// Who the cart belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuyerIdentity {
    pub email: Option<String>,
    pub customer_id: Option<CustomerId>,
}

/// A line in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub id: LineId,
    pub merchandise_id: MerchandiseId,
    /// Product title as shown by the backend.
    #[serde(default)]
    pub title: String,
    pub quantity: i64,
    pub attributes: AttributeList,
    pub unit_price: Money,
}

impl CartLine {
    pub fn focal_product_type(&self) -> Option<FocalProductType> {
        self.attributes.focal_product_type()
    }

    pub fn line_total(&self) -> Option<Money> {
        self.unit_price.try_multiply(self.quantity)
    }
}

/// Snapshot of the remote cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    pub id: CartId,
    pub checkout_url: String,
    pub lines: Vec<CartLine>,
    pub cost: CartCost,
    #[serde(default)]
    pub buyer_identity: BuyerIdentity,
}

impl Cart {
    pub fn line(&self, id: &LineId) -> Option<&CartLine> {
        self.lines.iter().find(|l| &l.id == id)
    }

    /// First line for `merchandise_id`.
    pub fn line_for(&self, merchandise_id: &MerchandiseId) -> Option<&CartLine> {
        self.lines.iter().find(|l| &l.merchandise_id == merchandise_id)
    }

    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// A line to add: merchandise, quantity and its attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItemRequest {
    pub merchandise_id: MerchandiseId,
    pub quantity: i64,
    pub attributes: AttributeList,
}

impl LineItemRequest {
    pub fn new(merchandise_id: MerchandiseId, quantity: i64, attributes: AttributeList) -> Self {
        Self {
            merchandise_id,
            quantity,
            attributes,
        }
    }
}

/// Quantity change for an existing line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineUpdate {
    pub id: LineId,
    pub quantity: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::Attribute;
    use crate::money::Currency;

    #[test]
    fn test_line_classification_reads_attributes() {
        let line = CartLine {
            id: LineId::new("line-1"),
            merchandise_id: MerchandiseId::new("variant-1"),
            title: "Acuvue Oasys".into(),
            quantity: 2,
            attributes: vec![Attribute::new("FocalProductType", "ContactLenses")].into(),
            unit_price: Money::new(4500, Currency::USD),
        };
        assert_eq!(line.focal_product_type(), Some(FocalProductType::ContactLenses));
        assert_eq!(line.line_total().unwrap().amount_cents, 9000);
    }
}
