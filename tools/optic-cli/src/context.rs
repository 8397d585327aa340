//! CLI execution context.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context as _, Result};

use optic_commerce::cart::CartService;
use optic_commerce::options::{ConfiguratorEngine, OptionTree};
use optic_storefront::StorefrontClient;

use crate::config::{CliConfig, TOKEN_ENV};
use crate::output::Output;
use crate::store::FileCartIdStore;

/// Execution context for CLI commands.
pub struct Context {
    pub config: CliConfig,
    pub output: Output,
    pub cwd: PathBuf,
}

impl Context {
    /// Load context from config file.
    pub fn load(config_path: Option<&str>, output: Output) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current directory")?;

        let config = match config_path {
            Some(path) => CliConfig::load(path)?,
            None => Self::find_config(&cwd).unwrap_or_default(),
        };

        Ok(Self { config, output, cwd })
    }

    /// Find config file in directory tree.
    fn find_config(start: &Path) -> Option<CliConfig> {
        let config_names = ["optic.toml", ".optic.toml", "optic.json"];

        let mut current = start.to_path_buf();
        loop {
            for name in &config_names {
                let config_path = current.join(name);
                if config_path.exists() {
                    if let Ok(config) = CliConfig::load(config_path.to_str()?) {
                        return Some(config);
                    }
                }
            }

            if !current.pop() {
                break;
            }
        }

        None
    }

    /// Configurator over the embedded eyeglasses option tree.
    pub fn engine(&self) -> Result<ConfiguratorEngine> {
        let tree = OptionTree::eyeglasses().context("Failed to load option catalog")?;
        Ok(ConfiguratorEngine::new(Arc::new(tree), self.config.base_price()?))
    }

    /// Cart service talking to the configured storefront.
    pub fn cart_service(&self) -> Result<CartService> {
        let client_config = self
            .config
            .storefront
            .client_config(std::env::var(TOKEN_ENV).ok())?;
        self.output.debug(&format!("storefront: {}", client_config.graphql_url()));

        let client = StorefrontClient::connect(client_config);
        let ids = FileCartIdStore::new(self.cart_id_path());
        Ok(CartService::new(
            Arc::new(client),
            Arc::new(ids),
            self.config.cart.rules.clone(),
        ))
    }

    /// Where the current cart id is kept.
    pub fn cart_id_path(&self) -> PathBuf {
        self.cwd.join(".optic").join("cart-id")
    }
}
