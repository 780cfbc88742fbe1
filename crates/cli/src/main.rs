//! Boutique CLI - Database migrations, receipts and exports.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! boutique migrate
//!
//! # Render the PDF receipt of an order
//! boutique receipt 42 --output receipt.pdf
//!
//! # Export all orders as CSV
//! boutique export --output orders.csv
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `receipt` - Write an order's PDF receipt to a file
//! - `export` - Export orders as CSV

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use boutique_server::config::BoutiqueConfig;
use boutique_server::db;
use boutique_server::services::receipt::ReceiptFormatter;

mod commands;

use commands::CommandError;

#[derive(Parser)]
#[command(name = "boutique")]
#[command(author, version, about = "Boutique CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Write the PDF receipt of an order
    Receipt {
        /// Order id
        id: i64,

        /// Output file (default: `receipt_<id>.pdf`)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Export every order as CSV
    Export {
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CommandError> {
    let config = BoutiqueConfig::from_env()?;
    let pool = db::create_pool(&config.database_url).await?;

    match cli.command {
        Commands::Migrate => commands::migrate::run(&pool).await?,
        Commands::Receipt { id, output } => {
            let formatter = ReceiptFormatter::from_config(&config.shop);
            commands::receipt::run(&pool, &formatter, id, output.as_deref()).await?;
        }
        Commands::Export { output } => {
            let mut stdout = std::io::stdout().lock();
            commands::export::run(&pool, output.as_deref(), &mut stdout).await?;
        }
    }
    Ok(())
}
