//! Optic CLI - inspect lens options, quote configurations and drive a cart.
//!
//! Commands:
//! - `optic options` - Show the choices after a partial path
//! - `optic quote` - Price a complete lens configuration
//! - `optic cart` - Show, modify and check out the storefront cart

mod commands;
mod config;
mod context;
mod logging;
mod output;
mod store;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{CartArgs, OptionsArgs, QuoteArgs};

/// Optic CLI - lens configurator and cart tooling
#[derive(Parser)]
#[command(name = "optic")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Flags shared by every command.
#[derive(clap::Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Use JSON output format
    #[arg(long, global = true)]
    pub json: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the choices offered after a partial configuration
    Options(OptionsArgs),

    /// Price a complete lens configuration
    Quote(QuoteArgs),

    /// Work with the storefront cart
    Cart(CartArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(&cli.global)?;

    let output = output::Output::new(cli.global.verbose > 0, cli.global.json);
    let ctx = context::Context::load(cli.global.config.as_deref(), output)?;

    let result = match cli.command {
        Commands::Options(args) => commands::options::run(args, &ctx),
        Commands::Quote(args) => commands::quote::run(args, &ctx),
        Commands::Cart(args) => commands::cart::run(args, &ctx).await,
    };

    if let Err(e) = result {
        ctx.output.error(&format!("{:#}", e));
        std::process::exit(1);
    }

    Ok(())
}
