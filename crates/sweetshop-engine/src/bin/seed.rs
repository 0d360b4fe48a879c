//! # Seed Data Generator
//!
//! Populates the inventory with sweets for development.
//!
//! ## Usage
//! ```bash
//! # Generate 100 sweets (default)
//! cargo run -p sweetshop-engine --bin seed
//!
//! # Generate custom amount
//! cargo run -p sweetshop-engine --bin seed -- --count 500
//!
//! # Specify database path (overrides SWEETSHOP_DB_PATH)
//! cargo run -p sweetshop-engine --bin seed -- --db ./data/sweetshop.db
//! ```
//!
//! Every item is created empty and then stocked through one bulk restock,
//! so the audit trail starts populated as well.

use std::env;

use sweetshop_core::{Actor, BulkRestockRequest, ItemSpec, Money};
use sweetshop_engine::{EngineConfig, InventoryEngine};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Categories with their base sweets
const CATEGORIES: &[(&str, &[&str])] = &[
    (
        "Traditional",
        &[
            "Ladoo",
            "Barfi",
            "Kaju Katli",
            "Peda",
            "Soan Papdi",
            "Mysore Pak",
            "Halwa",
            "Balushahi",
        ],
    ),
    (
        "Bengali",
        &["Rasgulla", "Sandesh", "Cham Cham", "Mishti Doi", "Rasmalai"],
    ),
    ("Fried", &["Jalebi", "Gulab Jamun", "Imarti", "Malpua"]),
    (
        "Baked",
        &["Brownie", "Nankhatai", "Fruit Cake", "Almond Biscotti"],
    ),
    ("Fusion", &["Chocolate Ladoo", "Rose Cheesecake", "Mango Barfi"]),
];

/// Pack variants appended to the base name
const VARIANTS: &[(&str, i64)] = &[
    ("", 0),
    ("Box of 6", 400),
    ("Box of 12", 900),
    ("Gift Pack", 1500),
    ("Sugar Free", 250),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let args: Vec<String> = env::args().collect();

    let mut config = EngineConfig::from_env()?;
    let mut count: usize = 100;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(100);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    config = config.database_path(args[i + 1].clone());
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Sweet Shop Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of sweets to generate (default: 100)");
                println!("  -d, --db <PATH>    Database file path (default: $SWEETSHOP_DB_PATH)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    info!(path = %config.database_path.display(), count, "Seeding inventory");

    let engine = InventoryEngine::connect(config).await?;
    let admin = Actor::privileged("seed");

    let existing = engine.catalog().list().await?.len();
    if existing > 0 {
        warn!(existing, "Inventory already has items, skipping seed");
        engine.close().await;
        return Ok(());
    }

    let start = std::time::Instant::now();
    let mut restock = BulkRestockRequest::new();

    'outer: for (category, sweets) in CATEGORIES {
        for (variant, price_addon) in VARIANTS {
            for sweet in sweets.iter() {
                if restock.len() >= count {
                    break 'outer;
                }

                let seed = restock.len();
                let spec = generate_spec(category, sweet, variant, *price_addon, seed);
                let name = spec.name.clone();

                match engine.catalog().create(spec, &admin).await {
                    Ok(item) => restock.insert(item.id, initial_stock(seed)),
                    Err(e) => warn!(name = %name, error = %e, "Failed to create item"),
                }
            }
        }
    }

    let outcome = engine.ledger().bulk_restock(&restock, &admin).await;
    for (item_id, error) in outcome.failed() {
        warn!(item_id, error = %error, "Initial restock failed");
    }

    let stats = engine.query().stats().await?;
    info!(
        items = stats.total_items,
        units = stats.total_units,
        value = %stats.total_value,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Seed complete"
    );

    let low = engine.query().low_stock_default().await?;
    info!(low_stock = low.len(), "Low stock items after seeding");

    engine.close().await;
    Ok(())
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=sweetshop=trace` - Show trace for sweetshop crates only
/// - Default: `info,sweetshop=debug,sqlx=warn`
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sweetshop=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .init();
}

/// Builds one deterministic item from its position in the catalog.
fn generate_spec(category: &str, sweet: &str, variant: &str, price_addon: i64, seed: usize) -> ItemSpec {
    let name = if variant.is_empty() {
        sweet.to_string()
    } else {
        format!("{} ({})", sweet, variant)
    };

    // Base $2.49 - $14.48 plus the pack addon
    let price = Money::from_cents(249 + ((seed * 37) % 1200) as i64 + price_addon);

    ItemSpec::new(name, category, price, 0)
        .with_description(format!("{} from the {} counter", sweet, category.to_lowercase()))
        .with_tags(seed_tags(category, variant))
}

fn seed_tags(category: &str, variant: &str) -> Vec<String> {
    let mut tags = vec![category.to_lowercase()];
    if variant.contains("Gift") {
        tags.push("festive".to_string());
    }
    if variant.contains("Sugar Free") {
        tags.push("sugar-free".to_string());
    }
    tags
}

/// 1 - 120 units, with every seventh item left low.
fn initial_stock(seed: usize) -> i64 {
    if seed % 7 == 0 {
        (seed % 5 + 1) as i64
    } else {
        (seed * 13 % 120 + 1) as i64
    }
}
