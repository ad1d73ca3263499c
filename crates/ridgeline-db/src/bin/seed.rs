//! Seed binary: populates a database with demo rental data.
//!
//! ## Usage
//! ```text
//! cargo run --bin seed -- --db /path/to/ridgeline.db
//! ```
//!
//! Idempotent: refuses to seed a database that already has categories.

use chrono::NaiveDate;
use ridgeline_core::{ArticleDraft, Registration};
use ridgeline_db::{Database, DbConfig, DbResult};

const DEFAULT_DB_PATH: &str = "ridgeline.db";

/// Demo catalog: (category, [(name, description, rate_cents, stock, image)]).
const CATALOG: &[(&str, &[(&str, &str, i64, i64, &str)])] = &[
    (
        "Camping",
        &[
            ("Tent 2P", "Two-person dome tent, 3-season", 5000, 3, "tent_2p.png"),
            ("Tent 4P", "Four-person tunnel tent", 8500, 2, "tent_4p.png"),
            ("Sleeping bag -5°C", "Mummy bag, comfort -5°C", 2500, 8, "sleeping_bag.png"),
            ("Camping stove", "Single-burner gas stove", 1500, 6, "stove.png"),
        ],
    ),
    (
        "Skiing",
        &[
            ("Alpine skis", "All-mountain skis with bindings", 9000, 10, "skis_alpine.png"),
            ("Ski boots", "Flex 90 alpine boots", 4000, 12, "ski_boots.png"),
            ("Ski helmet", "Adjustable helmet, EN 1077", 1200, 15, "helmet.png"),
        ],
    ),
    (
        "Climbing",
        &[
            ("Climbing harness", "Adjustable sport harness", 2000, 10, "harness.png"),
            ("Rope 60m", "9.8mm dynamic single rope", 3500, 5, "rope_60m.png"),
            ("Quickdraw set", "Set of 6 quickdraws", 1800, 7, "quickdraws.png"),
        ],
    ),
    (
        "Hiking",
        &[
            ("Backpack 50L", "Trekking pack with rain cover", 3000, 9, "backpack_50l.png"),
            ("Trekking poles", "Pair of telescopic poles", 1000, 14, "poles.png"),
        ],
    ),
];

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let db_path = parse_args();

    println!("Seeding database: {db_path}");

    match seed(&db_path).await {
        Ok(true) => println!("Done."),
        Ok(false) => println!("Database already seeded, nothing to do."),
        Err(e) => {
            eprintln!("Seeding failed: {e}");
            std::process::exit(1);
        }
    }
}

fn parse_args() -> String {
    let args: Vec<String> = std::env::args().collect();
    let mut db_path = DEFAULT_DB_PATH.to_string();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" => {
                if i + 1 >= args.len() {
                    eprintln!("--db requires a path");
                    std::process::exit(2);
                }
                db_path = args[i + 1].clone();
                i += 2;
            }
            "--help" | "-h" => {
                println!("Usage: seed [--db PATH]");
                println!();
                println!("Populates PATH (default: {DEFAULT_DB_PATH}) with demo data.");
                std::process::exit(0);
            }
            other => {
                eprintln!("Unknown argument: {other}");
                std::process::exit(2);
            }
        }
    }

    db_path
}

/// Returns Ok(false) if the database already holds categories.
async fn seed(db_path: &str) -> DbResult<bool> {
    let db = Database::new(DbConfig::new(db_path)).await?;
    let catalog = db.catalog();
    let directory = db.directory();

    if !catalog.list_categories().await?.is_empty() {
        return Ok(false);
    }

    for (category_name, articles) in CATALOG {
        let category = catalog.create_category(category_name).await?;
        println!("  + category {}", category.name);

        for (name, description, rate_cents, stock, image) in *articles {
            catalog
                .create_article(&ArticleDraft {
                    name: (*name).to_string(),
                    description: (*description).to_string(),
                    price_cents: *rate_cents,
                    stock_quantity: *stock,
                    image: Some((*image).to_string()),
                    category_id: category.id,
                })
                .await?;
            println!("      - {name} ({stock} in stock)");
        }
    }

    let massy = directory.add_city("Massy", "91300").await?;
    println!("  + city {} {}", massy.name, massy.postal_code);

    let demo = directory
        .register(
            &Registration {
                last_name: "Martin".to_string(),
                first_name: "Camille".to_string(),
                email: "camille.martin@example.org".to_string(),
                login: "demo".to_string(),
                password: "demo".to_string(),
                birth_date: NaiveDate::from_ymd_opt(1992, 6, 15).expect("valid date"),
                address: "8 avenue du Granite".to_string(),
            },
            massy.id,
        )
        .await?;
    println!("  + customer account '{}' (password 'demo')", demo.login);

    db.close().await;
    Ok(true)
}
