//! # Seed Data Generator
//!
//! Populates the database with a demo catalog and funded members.
//!
//! ## Usage
//! ```bash
//! # 40 products, 10 members (defaults)
//! cargo run -p commerce-db --bin seed
//!
//! # Custom amounts
//! cargo run -p commerce-db --bin seed -- --products 200 --members 50
//!
//! # Specify database path
//! cargo run -p commerce-db --bin seed -- --db ./data/commerce.db
//! ```
//!
//! ## Generated Data
//! - Products from a few apparel and homeware lines, one option per size
//! - Option price: base price + size surcharge
//! - Opening stock: 0 - 50 (some options start sold out)
//! - Members `1..=N`, each charged 10,000 - 100,000

use std::env;

use commerce_core::{Money, NewProductOption};
use commerce_db::{Database, DbConfig};

/// Product lines for realistic demo data: (line, base price, names)
const LINES: &[(&str, i64, &[&str])] = &[
    (
        "Tee",
        1900,
        &["Basic", "Pocket", "Striped", "Heavyweight", "Raglan", "V-Neck"],
    ),
    (
        "Hoodie",
        4900,
        &["Zip", "Pullover", "Fleece", "Oversized", "Cropped"],
    ),
    (
        "Cap",
        1500,
        &["Dad", "Trucker", "Snapback", "Beanie", "Bucket"],
    ),
    (
        "Mug",
        1200,
        &["Enamel", "Ceramic", "Travel", "Espresso"],
    ),
];

/// Size variants with their surcharge
const SIZES: &[(&str, i64)] = &[("S", 0), ("M", 0), ("L", 200), ("XL", 400)];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut product_count: usize = 40;
    let mut member_count: i64 = 10;
    let mut db_path = String::from("./commerce_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--products" | "-p" => {
                if i + 1 < args.len() {
                    product_count = args[i + 1].parse().unwrap_or(product_count);
                    i += 1;
                }
            }
            "--members" | "-m" => {
                if i + 1 < args.len() {
                    member_count = args[i + 1].parse().unwrap_or(member_count);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Commerce Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -p, --products <N>  Number of products to generate (default: 40)");
                println!("  -m, --members <N>   Number of funded members (default: 10)");
                println!("  -d, --db <PATH>     Database file path (default: ./commerce_dev.db)");
                println!("  -h, --help          Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Commerce Seed Data Generator");
    println!("===============================");
    println!("Database: {}", db_path);
    println!("Products: {}", product_count);
    println!("Members:  {}", member_count);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    println!();
    println!("Generating catalog...");

    let start = std::time::Instant::now();
    let mut generated = 0;
    let mut options = 0;

    'outer: for (line_idx, (line, base_price, names)) in LINES.iter().enumerate() {
        for (name_idx, name) in names.iter().enumerate() {
            if generated >= product_count {
                break 'outer;
            }

            let seed = line_idx * 100 + name_idx;
            let product_name = format!("{} {}", name, line);
            let product = match db
                .products()
                .create(&product_name, &generate_options(*base_price, seed))
                .await
            {
                Ok(product) => product,
                Err(e) => {
                    eprintln!("Failed to insert {}: {}", product_name, e);
                    continue;
                }
            };

            generated += 1;
            options += product.options.len();
        }
    }

    println!("✓ Generated {} products ({} options)", generated, options);

    println!();
    println!("Funding members...");

    let mut funded = Money::zero();
    for member_id in 1..=member_count {
        let amount = 10_000 + (member_id * 7_919) % 90_001;
        db.balances().charge(member_id, amount).await?;
        funded += Money::new(amount);
    }

    println!("✓ Funded {} members with {} total", member_count, funded);

    println!();
    println!("✓ Seed complete in {:?}", start.elapsed());

    db.close().await;
    Ok(())
}

/// One option per size, with deterministic stock.
fn generate_options(base_price: i64, seed: usize) -> Vec<NewProductOption> {
    SIZES
        .iter()
        .enumerate()
        .map(|(size_idx, (size, surcharge))| NewProductOption {
            name: size.to_string(),
            price: base_price + surcharge,
            quantity: ((seed * 13 + size_idx * 17) % 51) as i64,
        })
        .collect()
}
