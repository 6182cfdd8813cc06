//! # Seed Data Generator
//!
//! Populates a development database with a clinic catalogue.
//!
//! ## Usage
//! ```bash
//! cargo run -p vetpos-db --bin seed
//!
//! # Specify database path and admin identity
//! cargo run -p vetpos-db --bin seed -- --db ./data/vetpos.db --admin user-123
//! ```
//!
//! ## Generated Data
//! - Inventory items across medicine, vaccines, food, accessories, grooming
//!   (each with an opening stock movement)
//! - Clinic services: consultations, surgery, grooming, lab work
//! - One admin user so admin-only routes can be exercised

use std::env;
use vetpos_core::ADMIN_ROLE;
use vetpos_db::{Database, DbConfig, NewInventoryItem, NewService};

/// (category, name, price in cents, cost in cents, quantity, min stock)
const ITEMS: &[(&str, &str, i64, i64, i64, i64)] = &[
    ("medicine", "Amoxicillin 250mg (tablet)", 1_500, 600, 200, 40),
    ("medicine", "Meloxicam oral suspension 10ml", 18_000, 9_500, 15, 5),
    ("medicine", "Deworming tablet 10kg", 9_500, 4_000, 60, 10),
    ("medicine", "Flea and tick pipette M", 24_000, 13_000, 25, 6),
    ("vaccines", "Rabies vaccine", 30_000, 11_000, 30, 10),
    ("vaccines", "Canine polyvalent vaccine", 42_000, 17_500, 20, 8),
    ("vaccines", "Feline triple vaccine", 38_000, 16_000, 4, 5),
    ("food", "Adult dog kibble 10kg", 95_000, 68_000, 12, 3),
    ("food", "Kitten food 2kg", 32_000, 21_000, 9, 3),
    ("food", "Renal diet wet food can", 6_500, 3_900, 48, 12),
    ("accessories", "Nylon collar M", 8_000, 3_000, 18, 4),
    ("accessories", "Retractable leash 5m", 26_000, 14_000, 6, 2),
    ("accessories", "Elizabethan collar L", 12_000, 5_000, 0, 2),
    ("grooming", "Oatmeal shampoo 500ml", 16_500, 8_000, 14, 4),
    ("grooming", "Ear cleaner 120ml", 14_000, 6_500, 10, 3),
];

/// (category, name, price in cents)
const SERVICES: &[(&str, &str, i64)] = &[
    ("consultation", "General consultation", 45_000),
    ("consultation", "Emergency consultation", 90_000),
    ("surgery", "Spay (cat)", 180_000),
    ("surgery", "Neuter (dog, up to 20kg)", 220_000),
    ("grooming", "Bath and trim (small dog)", 30_000),
    ("lab", "Complete blood count", 55_000),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./vetpos_dev.db");
    let mut admin_id = String::from("admin-dev");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--admin" | "-a" => {
                if i + 1 < args.len() {
                    admin_id = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("VetPOS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./vetpos_dev.db)");
                println!("  -a, --admin <ID>   User id granted the admin role (default: admin-dev)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("VetPOS Seed Data Generator");
    println!("==========================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.inventory().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} inventory items", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let mut items = 0;
    for (category, name, price_cents, cost_cents, quantity, min_stock) in ITEMS {
        let new = NewInventoryItem {
            name: name.to_string(),
            category: category.to_string(),
            description: None,
            quantity: *quantity,
            min_stock: *min_stock,
            price_cents: *price_cents,
            cost_cents: *cost_cents,
        };
        match db.inventory().insert(&new, Some(&admin_id)).await {
            Ok(_) => items += 1,
            Err(e) => eprintln!("Failed to insert {}: {}", name, e),
        }
    }
    println!("✓ {} inventory items", items);

    let mut services = 0;
    for (category, name, price_cents) in SERVICES {
        let new = NewService {
            name: name.to_string(),
            category: category.to_string(),
            price_cents: *price_cents,
        };
        match db.services().insert(&new).await {
            Ok(_) => services += 1,
            Err(e) => eprintln!("Failed to insert {}: {}", name, e),
        }
    }
    println!("✓ {} services", services);

    db.users()
        .upsert(&admin_id, "admin@clinic.local", Some("Clinic Admin"))
        .await?;
    db.users().assign_role(&admin_id, ADMIN_ROLE).await?;
    println!("✓ Admin user: {} (send as x-user-id)", admin_id);

    println!();
    println!("✓ Seed complete!");

    db.close().await;
    Ok(())
}
