//! # Seed Data Generator
//!
//! Populates the database with the demo pharmacy catalog for development.
//!
//! ## Usage
//! ```bash
//! # Seed the default database file
//! cargo run -p farma-db --bin seed
//!
//! # Specify database path
//! cargo run -p farma-db --bin seed -- --db ./data/farmapos.db
//! ```
//!
//! ## Generated Data
//! - One manager operator (`admin`)
//! - Six products across all four categories
//! - Seven stock lots, one of them expiring inside the 30-day alert
//!   window so the expiry alert and the automatic discount have something
//!   to show
//!
//! Idempotent: when the catalog already has products the seed is skipped.

use chrono::{Duration, Utc};
use std::env;
use tracing_subscriber::EnvFilter;

use farma_core::{Category, Role};
use farma_db::{Database, DbConfig};

/// Demo catalog: (name, manufacturer, category, price_cents, description).
const PRODUCTS: &[(&str, &str, Category, i64, &str)] = &[
    (
        "Dipirona 500mg",
        "EMS",
        Category::Common,
        850,
        "Analgesic and antipyretic",
    ),
    (
        "Paracetamol 750mg",
        "Medley",
        Category::Common,
        690,
        "Analgesic",
    ),
    (
        "Amoxicilina 500mg",
        "Eurofarma",
        Category::Antibiotic,
        2500,
        "Antibiotic, sold under prescription",
    ),
    (
        "Rivotril 2mg",
        "Roche",
        Category::Controlled,
        4590,
        "Controlled medication, black stripe",
    ),
    (
        "Shampoo Anticaspa",
        "Head & Shoulders",
        Category::Hygiene,
        2250,
        "Hair care",
    ),
    (
        "Ibuprofeno 400mg",
        "Neo Quimica",
        Category::Common,
        1200,
        "Anti-inflammatory",
    ),
];

/// Demo lots: (product index into PRODUCTS, lot number, days until expiry,
/// quantity). The 25-day lot lands inside the alert/discount window.
const LOTS: &[(usize, &str, i64, i64)] = &[
    (0, "LOT2026001", 180, 100),
    (0, "LOT2026002", 25, 50),
    (1, "LOT2026003", 365, 200),
    (2, "LOT2026004", 90, 30),
    (3, "LOT2026005", 120, 15),
    (4, "LOT2026006", 400, 80),
    (5, "LOT2026007", 60, 150),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./farmapos_dev.db");

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
                println!("FarmaPOS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./farmapos_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("FarmaPOS Seed Data Generator");
    println!("============================");
    println!("Database: {}", db_path);
    println!();

    let config = DbConfig::new(&db_path);
    let db = Database::new(config).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    // Idempotence check
    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    println!();
    println!("Seeding demo data...");

    let admin_id = db
        .operators()
        .insert("System Administrator", "admin", Role::Manager)
        .await?;
    println!("✓ Operator 'admin' created (id {})", admin_id);

    let mut product_ids = Vec::with_capacity(PRODUCTS.len());
    for (name, manufacturer, category, price_cents, description) in PRODUCTS {
        let id = db
            .products()
            .create(name, manufacturer, *category, *price_cents, Some(*description))
            .await?;
        product_ids.push(id);
    }
    println!("✓ {} products inserted", product_ids.len());

    let today = Utc::now().date_naive();
    for (product_idx, lot_number, days_out, quantity) in LOTS {
        let expiry = today + Duration::days(*days_out);
        db.lots()
            .insert(product_ids[*product_idx], lot_number, expiry, *quantity)
            .await?;
    }
    println!("✓ {} lots inserted (one expiring in 25 days)", LOTS.len());

    // Show what the catalog looks like right away
    println!();
    println!("Catalog preview:");
    for summary in db.list_products(today).await {
        let discount_note = if summary.quote.discounted {
            " (20% expiry discount)"
        } else {
            ""
        };
        println!(
            "  {:<22} stock {:>4}  {}{}",
            summary.name, summary.stock_total, summary.quote.sale_price, discount_note
        );
    }

    println!();
    println!("Seed complete.");

    Ok(())
}
