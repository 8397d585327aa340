//! CLI command implementations.

pub mod cart;
pub mod options;
pub mod quote;

use clap::{Args, Subcommand};

use optic_commerce::options::{ConfigurationPath, ConfiguratorEngine};
use optic_commerce::CommerceError;

/// Arguments for the options command.
#[derive(Args)]
pub struct OptionsArgs {
    /// Option keys selected so far, root first.
    pub keys: Vec<String>,
}

/// Arguments for the quote command.
#[derive(Args)]
pub struct QuoteArgs {
    /// Option keys for a complete configuration, root first.
    #[arg(required = true)]
    pub keys: Vec<String>,
}

/// Arguments for the cart command.
#[derive(Args)]
pub struct CartArgs {
    #[command(subcommand)]
    pub command: CartCommand,
}

#[derive(Subcommand)]
pub enum CartCommand {
    /// Show the current cart, creating one if needed.
    Show {
        /// Apply the first-time customer discount to the displayed totals.
        #[arg(long)]
        first_time: bool,
    },
    /// Add a configured eyeglasses lens with the prescription to follow.
    AddLens {
        /// Frame variant id.
        #[arg(long)]
        variant: String,
        /// Option keys for a complete configuration, root first.
        #[arg(required = true)]
        keys: Vec<String>,
    },
    /// Set a line's quantity (0 removes it).
    Update {
        /// Line id.
        line: String,
        quantity: i64,
    },
    /// Remove a line.
    Remove {
        /// Line id.
        line: String,
    },
    /// Print the checkout URL and forget the cart locally.
    Checkout,
}

/// Select `keys` one step at a time from the root.
pub fn walk(engine: &ConfiguratorEngine, keys: &[String]) -> Result<ConfigurationPath, CommerceError> {
    keys.iter()
        .enumerate()
        .try_fold(ConfigurationPath::new(), |path, (index, key)| {
            engine.select(&path, index, key).map(|s| s.path)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use optic_commerce::options::OptionTree;
    use optic_commerce::{Currency, Money};
    use std::sync::Arc;

    fn engine() -> ConfiguratorEngine {
        ConfiguratorEngine::new(
            Arc::new(OptionTree::eyeglasses().unwrap()),
            Money::from_major(95, Currency::USD),
        )
    }

    #[test]
    fn test_walk_follows_keys() {
        let keys: Vec<String> = ["reading", "thin"].iter().map(|s| s.to_string()).collect();
        let path = walk(&engine(), &keys).unwrap();
        assert_eq!(path.keys(), keys.as_slice());
    }

    #[test]
    fn test_walk_reports_unknown_key() {
        let keys = vec!["reading".to_string(), "glass".to_string()];
        let err = walk(&engine(), &keys).unwrap_err();
        assert!(matches!(err, CommerceError::UnknownOption { step: 1, .. }));
    }
}
