//! CLI configuration (`optic.toml` or `optic.json`).

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use optic_commerce::cart::CartRules;
use optic_commerce::{Currency, Money};
use optic_storefront::{StorefrontConfig, DEFAULT_API_VERSION};

/// Environment variable that overrides `storefront.access_token`.
pub const TOKEN_ENV: &str = "OPTIC_STOREFRONT_TOKEN";

/// CLI configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    #[serde(default)]
    pub storefront: StorefrontSection,

    #[serde(default)]
    pub cart: CartSection,

    #[serde(default)]
    pub catalog: CatalogSection,
}

impl CliConfig {
    /// Load config from a file.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;
        Self::parse(path, &content)
    }

    fn parse(path: &str, content: &str) -> Result<Self> {
        if path.ends_with(".json") {
            serde_json::from_str(content)
                .with_context(|| format!("Failed to parse JSON config: {}", path))
        } else {
            toml::from_str(content).with_context(|| format!("Failed to parse TOML config: {}", path))
        }
    }

    /// Catalog price of the frame the configurator starts from.
    pub fn base_price(&self) -> Result<Money> {
        let raw = &self.catalog.eyeglasses_base_price;
        Money::parse_decimal(raw, self.cart.currency)
            .with_context(|| format!("Invalid catalog.eyeglasses_base_price: {}", raw))
    }
}

/// `[storefront]` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorefrontSection {
    pub endpoint: Option<String>,
    pub access_token: Option<String>,
    pub api_version: String,
}

impl Default for StorefrontSection {
    fn default() -> Self {
        Self {
            endpoint: None,
            access_token: None,
            api_version: DEFAULT_API_VERSION.to_string(),
        }
    }
}

impl StorefrontSection {
    /// Client settings, with the token taken from the environment when set.
    pub fn client_config(&self, env_token: Option<String>) -> Result<StorefrontConfig> {
        let Some(endpoint) = &self.endpoint else {
            bail!("storefront.endpoint is not configured");
        };
        let Some(token) = env_token.or_else(|| self.access_token.clone()) else {
            bail!("storefront.access_token is not configured (or set {})", TOKEN_ENV);
        };
        Ok(StorefrontConfig::new(endpoint.clone(), token).with_api_version(self.api_version.clone()))
    }
}

/// `[cart]` table: the cart rules plus the shop currency.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CartSection {
    #[serde(flatten)]
    pub rules: CartRules,
    pub currency: Currency,
}

/// `[catalog]` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogSection {
    /// Decimal string, e.g. `"95.00"`.
    pub eyeglasses_base_price: String,
}

impl Default for CatalogSection {
    fn default() -> Self {
        Self {
            eyeglasses_base_price: "95.00".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = CliConfig::parse("optic.toml", "").unwrap();
        assert_eq!(config.cart.rules, CartRules::default());
        assert_eq!(config.cart.currency, Currency::USD);
        assert_eq!(config.base_price().unwrap().amount_cents, 9500);
        assert_eq!(config.storefront.api_version, DEFAULT_API_VERSION);
    }

    #[test]
    fn test_toml_sections() {
        let config = CliConfig::parse(
            "optic.toml",
            r#"
[storefront]
endpoint = "https://optic.example.com"
access_token = "from-file"

[cart]
donation_merchandise_id = "gid://shopify/ProductVariant/donate"
contact_lens_threshold = 6
currency = "CAD"

[catalog]
eyeglasses_base_price = "120"
"#,
        )
        .unwrap();
        assert_eq!(config.cart.rules.contact_lens_threshold, 6);
        assert!(config.cart.rules.donation_rule().is_some());
        assert_eq!(config.base_price().unwrap(), Money::from_major(120, Currency::CAD));

        let client = config.storefront.client_config(None).unwrap();
        assert_eq!(client.access_token, "from-file");
        let client = config.storefront.client_config(Some("from-env".into())).unwrap();
        assert_eq!(client.access_token, "from-env");
    }

    #[test]
    fn test_missing_endpoint_is_reported() {
        let err = CliConfig::default().storefront.client_config(None).unwrap_err();
        assert!(err.to_string().contains("storefront.endpoint"));
    }

    #[test]
    fn test_json_config() {
        let config = CliConfig::parse(
            "optic.json",
            r#"{ "cart": { "first_time_discount_percent": 15 } }"#,
        )
        .unwrap();
        assert_eq!(config.cart.rules.first_time_discount_percent, 15);
    }
}
