//! # checkout-cli
//!
//! Command-line front end for the checkout engine.
//!
//! ## Usage
//! ```bash
//! # Stage a sheet for member 1: two of option 3 (product 1), one of option 8 (product 2)
//! checkout stage --member 1 --line 1:3:2 --line 2:8:1
//!
//! # Check the sheet out
//! checkout checkout 17
//!
//! # Most-ordered options
//! checkout top --limit 10
//! ```
//!
//! Results go to stdout as JSON. Logs go to stderr and follow `RUST_LOG`.

mod config;
mod output;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use commerce_core::{CheckoutError, CheckoutResult, OptionSelection, ProductOptionStock, Resource};
use commerce_db::Database;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;
use crate::output::{ErrorEnvelope, Output};

#[derive(Debug, Parser)]
#[command(name = "checkout", version, about = "Order sheet checkout against stock and member balance")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Stage an order sheet at current catalog prices
    Stage {
        #[arg(long)]
        member: i64,

        /// PRODUCT_ID:OPTION_ID:QUANTITY, repeatable
        #[arg(long = "line", required = true, value_parser = parse_selection)]
        lines: Vec<OptionSelection>,
    },

    /// Check out a staged order sheet
    Checkout { order_sheet_id: i64 },

    /// Most-ordered product options
    Top {
        #[arg(long)]
        limit: Option<u32>,
    },

    /// A product with its options and stock
    Show { product_id: i64 },

    /// Credit a member's balance
    Charge {
        #[arg(long)]
        member: i64,

        #[arg(long)]
        amount: i64,
    },

    /// Add stock to a product option
    Restock {
        #[arg(long)]
        option: i64,

        #[arg(long)]
        quantity: i64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing();

    let config = AppConfig::load()?;
    debug!(db = %config.database_path.display(), "Configuration loaded");

    let db = Database::new(config.db_config()).await?;

    let result = run(&db, &config, cli.command).await;
    db.close().await;

    match result {
        Ok(output) => {
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            println!("{}", serde_json::to_string_pretty(&ErrorEnvelope::from(&err))?);
            Ok(ExitCode::FAILURE)
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,commerce=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(db: &Database, config: &AppConfig, command: Command) -> CheckoutResult<Output> {
    match command {
        Command::Stage { member, lines } => {
            let sheet = db.order_sheets().stage_from_catalog(member, &lines).await?;
            info!(order_sheet_id = sheet.id, member_id = member, lines = sheet.lines.len(), "Sheet staged");
            Ok(Output::Sheet(sheet))
        }

        Command::Checkout { order_sheet_id } => {
            let order = db
                .checkout_engine(config.checkout_config())
                .checkout(order_sheet_id)
                .await?;
            Ok(Output::Order(order))
        }

        Command::Top { limit } => {
            let limit = limit.unwrap_or(config.top_limit);
            let top = db.orders().find_top_ordered_options(limit).await?;
            Ok(Output::Top(top))
        }

        Command::Show { product_id } => {
            let product = db
                .products()
                .find_product_with_options(product_id)
                .await?
                .ok_or_else(|| CheckoutError::not_found(Resource::Product, product_id))?;
            Ok(Output::Product(product))
        }

        Command::Charge { member, amount } => {
            let amount = db.balances().charge(member, amount).await?;
            Ok(Output::Balance {
                member_id: member,
                amount,
            })
        }

        Command::Restock { option, quantity } => {
            let available_quantity = db.stock().restock(option, quantity).await?;
            Ok(Output::Stock(ProductOptionStock {
                product_option_id: option,
                available_quantity,
            }))
        }
    }
}

/// Parses `PRODUCT_ID:OPTION_ID:QUANTITY`.
fn parse_selection(raw: &str) -> Result<OptionSelection, String> {
    let parts: Vec<&str> = raw.split(':').collect();
    let &[product_id, product_option_id, quantity] = parts.as_slice() else {
        return Err(format!("expected PRODUCT_ID:OPTION_ID:QUANTITY, got `{raw}`"));
    };

    let number = |field: &str, value: &str| {
        value
            .trim()
            .parse::<i64>()
            .map_err(|_| format!("{field} must be an integer, got `{value}`"))
    };

    Ok(OptionSelection {
        product_id: number("product id", product_id)?,
        product_option_id: number("option id", product_option_id)?,
        quantity: number("quantity", quantity)?,
    })
}
