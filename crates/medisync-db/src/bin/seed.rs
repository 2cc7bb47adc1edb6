//! # Seed Data Generator
//!
//! Populates the database with sample medicines for development.
//!
//! ## Usage
//! ```bash
//! # Generate 200 medicines (default)
//! cargo run -p medisync-db --bin seed
//!
//! # Generate custom amount
//! cargo run -p medisync-db --bin seed -- --count 1000
//!
//! # Specify database path
//! cargo run -p medisync-db --bin seed -- --db ./data/medisync.db
//! ```
//!
//! ## Generated Medicines
//! Spread across pharmacy categories (analgesics, antibiotics,
//! antihistamines, cardiovascular, gastrointestinal, vitamins).
//!
//! Each medicine has:
//! - Unique batch number: `{CATEGORY}-{YEAR}-{INDEX}`
//! - Name with strength, plus generic name
//! - Price: $1.99 - $24.99, cost 55-75% of price
//! - Stock: 0 - 150 (some out of stock, some low)
//! - Expiry: 10 days to ~3 years out (some inside the 30-day horizon)

use anyhow::Context;
use chrono::{Duration, Utc};
use std::env;

use medisync_core::input::NewMedicine;
use medisync_db::seed::ensure_defaults;
use medisync_db::{Database, DbConfig};

/// (batch prefix, category, [(brand, generic, prescription required)])
const CATEGORIES: &[(&str, &str, &[(&str, &str, bool)])] = &[
    (
        "ANL",
        "Analgesic",
        &[
            ("Panadol", "Paracetamol", false),
            ("Brufen", "Ibuprofen", false),
            ("Aspirin", "Acetylsalicylic Acid", false),
            ("Voltaren", "Diclofenac", true),
            ("Naprosyn", "Naproxen", true),
            ("Tramal", "Tramadol", true),
        ],
    ),
    (
        "ABX",
        "Antibiotic",
        &[
            ("Amoxil", "Amoxicillin", true),
            ("Augmentin", "Amoxicillin/Clavulanate", true),
            ("Zithromax", "Azithromycin", true),
            ("Cipro", "Ciprofloxacin", true),
            ("Keflex", "Cephalexin", true),
            ("Flagyl", "Metronidazole", true),
        ],
    ),
    (
        "AHS",
        "Antihistamine",
        &[
            ("Zyrtec", "Cetirizine", false),
            ("Claritin", "Loratadine", false),
            ("Allegra", "Fexofenadine", false),
            ("Benadryl", "Diphenhydramine", false),
            ("Phenergan", "Promethazine", true),
        ],
    ),
    (
        "CVS",
        "Cardiovascular",
        &[
            ("Norvasc", "Amlodipine", true),
            ("Lipitor", "Atorvastatin", true),
            ("Zestril", "Lisinopril", true),
            ("Tenormin", "Atenolol", true),
            ("Cozaar", "Losartan", true),
            ("Plavix", "Clopidogrel", true),
        ],
    ),
    (
        "GIT",
        "Gastrointestinal",
        &[
            ("Nexium", "Esomeprazole", false),
            ("Prilosec", "Omeprazole", false),
            ("Zantac", "Ranitidine", false),
            ("Imodium", "Loperamide", false),
            ("Motilium", "Domperidone", true),
        ],
    ),
    (
        "VIT",
        "Vitamin",
        &[
            ("Centrum", "Multivitamin", false),
            ("Caltrate", "Calcium + D3", false),
            ("Redoxon", "Ascorbic Acid", false),
            ("Neurobion", "Vitamin B Complex", false),
            ("Feroglobin", "Ferrous Sulfate", false),
        ],
    ),
];

/// Strength variants with price add-on in cents
const STRENGTHS: &[(&str, i64)] = &[
    ("100mg", 0),
    ("250mg", 150),
    ("500mg", 300),
    ("10mg", 0),
    ("20mg", 200),
    ("Syrup 100ml", 250),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 200;
    let mut db_path = String::from("./medisync_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(200);
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
                println!("MediSync Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of medicines to generate (default: 200)");
                println!("  -d, --db <PATH>    Database file path (default: ./medisync_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 MediSync Seed Data Generator");
    println!("===============================");
    println!("Database:  {}", db_path);
    println!("Medicines: {}", count);
    println!();

    let db = Database::new(DbConfig::new(&db_path))
        .await
        .with_context(|| format!("opening {}", db_path))?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    if ensure_defaults(&db).await? {
        println!("✓ Default admin and supplier created");
    }

    let existing = db.medicines().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} medicines", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let supplier_id = db.suppliers().list().await?.first().map(|s| s.id);

    println!();
    println!("Generating medicines...");

    let mut generated = 0;
    let start = std::time::Instant::now();

    'outer: for (category_idx, (prefix, category, products)) in CATEGORIES.iter().enumerate() {
        for (product_idx, product) in products.iter().enumerate() {
            for (strength_idx, strength) in STRENGTHS.iter().enumerate() {
                if generated >= count {
                    break 'outer;
                }

                let seed = category_idx * 1000 + product_idx * 20 + strength_idx;
                let medicine = generate_medicine(prefix, category, *product, *strength, seed, supplier_id);

                if let Err(e) = db.medicines().create(&medicine).await {
                    eprintln!("Failed to insert {}: {}", medicine.batch_number, e);
                    continue;
                }

                generated += 1;

                if generated % 50 == 0 {
                    println!("  Generated {} medicines...", generated);
                }
            }
        }
    }

    let elapsed = start.elapsed();
    println!();
    println!("✓ Generated {} medicines in {:?}", generated, elapsed);

    let summary = db.reports().stock_summary(Utc::now().date_naive()).await?;
    println!(
        "  Low stock: {}, out of stock: {}, expiring soon: {}",
        summary.low_stock, summary.out_of_stock, summary.expiring_soon
    );

    println!();
    println!("✓ Seed complete!");

    db.close().await;
    Ok(())
}

/// Generates a single medicine with plausible data.
fn generate_medicine(
    prefix: &str,
    category: &str,
    (brand, generic, prescription): (&str, &str, bool),
    (strength, price_addon): (&str, i64),
    seed: usize,
    supplier_id: Option<i64>,
) -> NewMedicine {
    let today = Utc::now().date_naive();

    let batch_number = format!("{}-{}-{:05}", prefix, today.format("%Y"), seed);

    // $1.99 - $21.99 base + strength add-on
    let price_cents = 199 + ((seed * 37) % 2000) as i64 + price_addon;
    let cost_pct = 55 + (seed % 21) as i64;

    // Every 13th medicine is out of stock, every 7th is low
    let quantity = match seed {
        s if s % 13 == 0 => 0,
        s if s % 7 == 0 => 1 + (s % 9) as i64,
        s => 15 + (s % 136) as i64,
    };

    // 10 days to ~3 years out
    let expiry_date = today + Duration::days(10 + ((seed * 53) % 1100) as i64);

    NewMedicine {
        name: format!("{} {}", brand, strength),
        generic_name: Some(generic.to_string()),
        category: Some(category.to_string()),
        batch_number,
        quantity,
        price_cents,
        cost_price_cents: Some(price_cents * cost_pct / 100),
        expiry_date,
        supplier_id,
        barcode: Some(format!("890{:010}", seed)),
        min_stock_level: 10,
        is_prescription_required: prescription,
    }
}
