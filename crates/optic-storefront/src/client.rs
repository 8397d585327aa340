//! Storefront GraphQL client.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use optic_commerce::cart::{
    BuyerIdentityInput, Cart, CommerceBackend, LineItemRequest, LineUpdate, MutationOutcome,
};
use optic_commerce::{CartId, CommerceError, LineId};

use crate::queries;
use crate::wire::{
    BuyerIdentityWire, CartDto, CartLineInput, CartLineUpdateInput, CartPayload, GraphQlResponse,
};
use crate::{FetchError, HttpTransport, RequestBuilder, StorefrontConfig};

/// Header carrying the public storefront token.
pub const ACCESS_TOKEN_HEADER: &str = "X-Shopify-Storefront-Access-Token";

/// Talks to the storefront cart API over an [`HttpTransport`].
#[derive(Clone)]
pub struct StorefrontClient {
    config: StorefrontConfig,
    transport: Arc<dyn HttpTransport>,
}

#[derive(Deserialize)]
struct CartQueryData {
    cart: Option<CartDto>,
}

impl StorefrontClient {
    pub fn new(config: StorefrontConfig, transport: Arc<dyn HttpTransport>) -> Self {
        Self { config, transport }
    }

    /// Client over the platform's default transport.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn connect(config: StorefrontConfig) -> Self {
        Self::new(config, Arc::new(crate::UreqTransport::new()))
    }

    #[cfg(target_arch = "wasm32")]
    pub fn connect(config: StorefrontConfig) -> Self {
        Self::new(config, Arc::new(crate::SpinTransport))
    }

    pub fn config(&self) -> &StorefrontConfig {
        &self.config
    }

    /// Run one GraphQL document and return its `data`.
    pub async fn execute<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: Value,
    ) -> Result<T, FetchError> {
        let request = RequestBuilder::post(self.config.graphql_url())
            .header(ACCESS_TOKEN_HEADER, self.config.access_token.as_str())
            .accept("application/json")
            .json(&json!({ "query": query, "variables": variables }))?;

        let response = self.transport.send(request).await?.error_for_status()?;
        response.json::<GraphQlResponse<T>>()?.into_data()
    }

    async fn mutate(
        &self,
        root: &'static str,
        query: String,
        variables: Value,
    ) -> Result<MutationOutcome, CommerceError> {
        debug!(mutation = root, "storefront mutation");
        let mut data: HashMap<String, Option<CartPayload>> =
            self.execute(&query, variables).await.map_err(|e| {
                warn!(mutation = root, error = %e, "storefront request failed");
                CommerceError::from(e)
            })?;

        match data.remove(root).flatten() {
            Some(payload) => Ok(payload.into_outcome()?),
            None => Err(FetchError::ParseError(format!("missing {} payload", root)).into()),
        }
    }
}

#[async_trait]
impl CommerceBackend for StorefrontClient {
    async fn cart_create(&self, buyer: BuyerIdentityInput) -> Result<MutationOutcome, CommerceError> {
        let variables = json!({ "input": { "buyerIdentity": BuyerIdentityWire::from(&buyer) } });
        self.mutate("cartCreate", queries::cart_create(), variables).await
    }

    async fn cart(&self, id: &CartId) -> Result<Option<Cart>, CommerceError> {
        debug!(cart = %id, "storefront cart query");
        let data: CartQueryData = self
            .execute(&queries::cart_query(), json!({ "id": id.as_str() }))
            .await?;
        Ok(data.cart.map(CartDto::into_cart).transpose()?)
    }

    async fn lines_add(
        &self,
        cart_id: &CartId,
        lines: Vec<LineItemRequest>,
    ) -> Result<MutationOutcome, CommerceError> {
        let lines: Vec<CartLineInput<'_>> = lines.iter().map(CartLineInput::from).collect();
        let variables = json!({ "cartId": cart_id.as_str(), "lines": lines });
        self.mutate("cartLinesAdd", queries::lines_add(), variables).await
    }

    async fn lines_update(
        &self,
        cart_id: &CartId,
        lines: Vec<LineUpdate>,
    ) -> Result<MutationOutcome, CommerceError> {
        let lines: Vec<CartLineUpdateInput<'_>> =
            lines.iter().map(CartLineUpdateInput::from).collect();
        let variables = json!({ "cartId": cart_id.as_str(), "lines": lines });
        self.mutate("cartLinesUpdate", queries::lines_update(), variables).await
    }

    async fn lines_remove(
        &self,
        cart_id: &CartId,
        line_ids: Vec<LineId>,
    ) -> Result<MutationOutcome, CommerceError> {
        let ids: Vec<&str> = line_ids.iter().map(LineId::as_str).collect();
        let variables = json!({ "cartId": cart_id.as_str(), "lineIds": ids });
        self.mutate("cartLinesRemove", queries::lines_remove(), variables).await
    }

    async fn buyer_identity_update(
        &self,
        cart_id: &CartId,
        buyer: BuyerIdentityInput,
    ) -> Result<MutationOutcome, CommerceError> {
        let variables = json!({
            "cartId": cart_id.as_str(),
            "buyerIdentity": BuyerIdentityWire::from(&buyer),
        });
        self.mutate("cartBuyerIdentityUpdate", queries::buyer_identity_update(), variables)
            .await
    }
}
