//! Pharma CLI - Command line client for the pharmacy storefront.
//!
//! Commands:
//! - `pharma cart` - Show and edit the cart
//! - `pharma checkout` - Place an order from the cart
//! - `pharma orders` - Order history, detail and cancel requests
//! - `pharma admin` - Back-office dashboard
//! - `pharma config` - Manage configuration

mod commands;
mod config;
mod context;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::error;
use tracing_subscriber::EnvFilter;

use commands::{AdminArgs, CartArgs, CheckoutArgs, ConfigArgs, OrdersArgs};

/// Pharma CLI - Shop and run the back office of the pharmacy storefront
#[derive(Parser)]
#[command(name = "pharma")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use JSON output format
    #[arg(long, global = true)]
    json: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show and edit the cart
    Cart(CartArgs),

    /// Place an order for everything in the cart
    Checkout(CheckoutArgs),

    /// Your orders
    Orders(OrdersArgs),

    /// Back-office dashboard (admin only)
    Admin(AdminArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

/// `RUST_LOG` wins; otherwise `warn`, or `debug` with `-v`.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // Setup output formatting
    let output = output::Output::new(cli.verbose, cli.json);

    // Load config
    let config_path = cli.config.as_deref();
    let ctx = context::Context::load(config_path, output)?;

    // Execute command
    let result = match cli.command {
        Commands::Cart(args) => commands::cart::run(args, &ctx).await,
        Commands::Checkout(args) => commands::checkout::run(args, &ctx).await,
        Commands::Orders(args) => commands::orders::run(args, &ctx).await,
        Commands::Admin(args) => commands::admin::run(args, &ctx).await,
        Commands::Config(args) => commands::config::run(args, &ctx).await,
    };

    if let Err(e) = result {
        let message = if ctx.output.is_verbose() {
            format!("{:?}", e)
        } else {
            format!("{:#}", e)
        };
        error!(error = %format!("{:#}", e), "command failed");
        ctx.output.error(&message);
        std::process::exit(1);
    }

    Ok(())
}
