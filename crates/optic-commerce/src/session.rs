//! Signed-in buyer identity supplied by the session collaborator.

use serde::{Deserialize, Serialize};

use crate::ids::CustomerId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuyerSession {
    pub customer_id: CustomerId,
    pub email: String,
    /// Storefront customer access token.
    pub access_token: String,
}

impl BuyerSession {
    pub fn new(
        customer_id: CustomerId,
        email: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Self {
        Self {
            customer_id,
            email: email.into(),
            access_token: access_token.into(),
        }
    }
}
