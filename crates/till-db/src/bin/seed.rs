//! # Seed Data Generator
//!
//! Fills a database with a sample bar/bottle-store catalogue.
//!
//! ## Usage
//! ```bash
//! cargo run -p till-db --bin seed
//! cargo run -p till-db --bin seed -- --db ./data/till.db
//! ```

use std::env;
use till_core::{CurrencyFormat, Money, NewProduct};
use till_db::{Database, DbConfig};

/// (code, name, ml, cost, selling, stock)
const CATALOGUE: &[(&str, &str, i64, i64, i64, i64)] = &[
    ("6001234567890", "Nile Special", 500, 2500, 3500, 200),
    ("6001234567891", "Club Pilsener", 500, 2500, 3500, 200),
    ("6001234567892", "Bell Lager", 500, 2300, 3000, 150),
    ("6001234567893", "Guinness Foreign Extra", 500, 3200, 4500, 120),
    ("6001234567894", "Tusker Lager", 500, 2600, 3500, 150),
    ("6001234567895", "Uganda Waragi", 750, 18000, 25000, 40),
    ("6001234567896", "Uganda Waragi", 200, 5000, 7000, 100),
    ("6001234567897", "Smirnoff Vodka", 750, 32000, 45000, 24),
    ("6001234567898", "Johnnie Walker Red Label", 750, 55000, 75000, 12),
    ("6001234567899", "Four Cousins Sweet Red", 750, 22000, 30000, 36),
    ("6001234567900", "Castle Lite", 330, 2800, 4000, 96),
    ("6001234567901", "Coca-Cola", 300, 1000, 1500, 240),
    ("6001234567902", "Rwenzori Water", 500, 600, 1000, 240),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();
    let mut db_path = String::from("./till_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Till POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./till_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Till POS Seed Data Generator");
    println!("============================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected, migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products, skipping seed.", existing);
        return Ok(());
    }

    let ugx = CurrencyFormat::default();
    let mut inserted = 0;
    for (code, name, ml, cost, selling, stock) in CATALOGUE {
        let product = NewProduct {
            id: code.to_string(),
            name: name.to_string(),
            description: None,
            milliliters: *ml,
            cost_price_cents: *cost,
            selling_price_cents: *selling,
            quantity_stocked: *stock,
        };

        match db.products().insert(&product).await {
            Ok(p) => {
                inserted += 1;
                println!(
                    "  + {:<15} {:<26} {:>5}ml {:>12} x{}",
                    p.id,
                    p.name,
                    p.milliliters,
                    ugx.format(Money::from_minor(p.selling_price_cents)),
                    p.quantity_stocked
                );
            }
            Err(e) => eprintln!("Failed to insert {}: {}", code, e),
        }
    }

    println!();
    println!("✓ Inserted {} products", inserted);

    db.close().await;
    Ok(())
}
