//! Storefront connection settings.

use serde::{Deserialize, Serialize};

/// API version used when none is configured.
pub const DEFAULT_API_VERSION: &str = "2024-10";

/// Where the storefront lives and how to authenticate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorefrontConfig {
    /// Shop origin, e.g. `https://optic.myshopify.com`.
    pub endpoint: String,
    /// Public storefront access token.
    pub access_token: String,
    #[serde(default = "default_api_version")]
    pub api_version: String,
}

fn default_api_version() -> String {
    DEFAULT_API_VERSION.to_string()
}

impl StorefrontConfig {
    pub fn new(endpoint: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            access_token: access_token.into(),
            api_version: default_api_version(),
        }
    }

    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    /// Full GraphQL URL.
    pub fn graphql_url(&self) -> String {
        format!(
            "{}/api/{}/graphql.json",
            self.endpoint.trim_end_matches('/'),
            self.api_version
        )
    }
}
