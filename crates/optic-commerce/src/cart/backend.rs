//! Port to the remote commerce backend.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::cart::{Cart, LineItemRequest, LineUpdate};
use crate::error::CommerceError;
use crate::ids::{CartId, LineId};

/// Shown when the backend gives no field-level reason.
pub const GENERIC_CART_ERROR: &str = "Something went wrong updating your cart. Please try again.";

/// A field-level error returned alongside a mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserError {
    /// Path to the offending input field, when the backend names one.
    #[serde(default)]
    pub field: Option<Vec<String>>,
    pub message: String,
}

impl UserError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            field: None,
            message: message.into(),
        }
    }
}

/// `{ cart, userErrors }` as returned by every cart mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationOutcome {
    pub cart: Option<Cart>,
    #[serde(default)]
    pub user_errors: Vec<UserError>,
}

impl MutationOutcome {
    pub fn ok(cart: Cart) -> Self {
        Self {
            cart: Some(cart),
            user_errors: Vec::new(),
        }
    }

    pub fn rejected(errors: Vec<UserError>) -> Self {
        Self {
            cart: None,
            user_errors: errors,
        }
    }
}

/// Buyer details attached to a cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuyerIdentityInput {
    pub email: Option<String>,
    pub customer_access_token: Option<String>,
}

/// Remote cart operations. Attributes are the only customization channel.
#[async_trait]
pub trait CommerceBackend: Send + Sync {
    async fn cart_create(&self, buyer: BuyerIdentityInput) -> Result<MutationOutcome, CommerceError>;

    /// `Ok(None)` when no cart exists for `id`.
    async fn cart(&self, id: &CartId) -> Result<Option<Cart>, CommerceError>;

    async fn lines_add(
        &self,
        cart_id: &CartId,
        lines: Vec<LineItemRequest>,
    ) -> Result<MutationOutcome, CommerceError>;

    async fn lines_update(
        &self,
        cart_id: &CartId,
        lines: Vec<LineUpdate>,
    ) -> Result<MutationOutcome, CommerceError>;

    async fn lines_remove(
        &self,
        cart_id: &CartId,
        line_ids: Vec<LineId>,
    ) -> Result<MutationOutcome, CommerceError>;

    async fn buyer_identity_update(
        &self,
        cart_id: &CartId,
        buyer: BuyerIdentityInput,
    ) -> Result<MutationOutcome, CommerceError>;
}

/// Collapse a mutation result into a cart or a [`CommerceError::RemoteOperation`].
///
/// Field-level user errors win; anything else becomes [`GENERIC_CART_ERROR`].
pub fn normalize(
    operation: &'static str,
    result: Result<MutationOutcome, CommerceError>,
) -> Result<Cart, CommerceError> {
    let outcome = match result {
        Ok(outcome) => outcome,
        Err(e) => {
            warn!(operation, error = %e, "cart operation failed");
            return Err(CommerceError::remote(GENERIC_CART_ERROR));
        }
    };

    if !outcome.user_errors.is_empty() {
        let message = outcome
            .user_errors
            .iter()
            .map(|e| e.message.as_str())
            .collect::<Vec<_>>()
            .join("; ");
        warn!(operation, %message, "cart operation rejected");
        return Err(CommerceError::remote(message));
    }

    outcome.cart.ok_or_else(|| {
        warn!(operation, "cart operation returned no cart");
        CommerceError::remote(GENERIC_CART_ERROR)
    })
}
