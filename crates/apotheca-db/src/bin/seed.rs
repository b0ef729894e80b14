//! # Seed Data Generator
//!
//! Populates a fresh database with a small pharmacy: vendors, a catalog
//! with a spread of stock levels and expiry dates, an opening cash float
//! and an admin login.
//!
//! ## Usage
//! ```bash
//! cargo run -p apotheca-db --bin seed
//! cargo run -p apotheca-db --bin seed -- --db ./data/apotheca.db
//! cargo run -p apotheca-db --bin seed -- --admin-password 's3cret-pass' --opening-cash 5000
//! ```
//!
//! ## Generated Products
//! Each catalog entry is seeded once. Stock and expiry are derived from
//! the entry's position so that the dashboard shows some expired, some
//! expiring-soon and some low-stock products.

use apotheca_core::{
    LedgerAccount, LedgerEntry, LedgerEntryKind, Money, ProductDraft, UserAccount, Vendor,
};
use apotheca_db::{Database, DbConfig};
use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHasher};
use chrono::{Duration, Utc};
use std::env;

/// (name, company, generic name, tabs per pack, pack price in rupees)
const CATALOG: &[(&str, &str, &str, i64, i64)] = &[
    ("Panadol 500mg", "GSK", "Paracetamol", 10, 50),
    ("Panadol Extra", "GSK", "Paracetamol + Caffeine", 10, 70),
    ("Brufen 400mg", "Abbott", "Ibuprofen", 10, 90),
    ("Augmentin 625mg", "GSK", "Amoxicillin + Clavulanate", 6, 420),
    ("Flagyl 400mg", "Sanofi", "Metronidazole", 10, 65),
    ("Risek 20mg", "Getz Pharma", "Omeprazole", 14, 280),
    ("Glucophage 500mg", "Merck", "Metformin", 20, 120),
    ("Concor 5mg", "Merck", "Bisoprolol", 30, 390),
    ("Ponstan 250mg", "Pfizer", "Mefenamic Acid", 10, 45),
    ("Arinac Forte", "Abbott", "Ibuprofen + Pseudoephedrine", 10, 110),
    ("Softin 10mg", "Searle", "Loratadine", 10, 85),
    ("Calpol Syrup", "GSK", "Paracetamol", 1, 140),
    ("Hydryllin Syrup", "Searle", "Diphenhydramine", 1, 120),
    ("ORS Sachet", "Searle", "Oral Rehydration Salts", 1, 25),
    ("Surbex Z", "Abbott", "Multivitamin + Zinc", 30, 450),
];

/// (name, company, phone)
const VENDORS: &[(&str, &str, &str)] = &[
    ("Imran Ali", "Ali Pharma Distributors", "0300-1234567"),
    ("Sana Raza", "Raza Medicos", "0321-7654321"),
    ("Bilal Khan", "Khan Traders", "0333-5550101"),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./apotheca_dev.db");
    let mut admin_password = String::from("apotheca-admin");
    let mut opening_cash = Money::from_rupees(10_000);

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--admin-password" => {
                if i + 1 < args.len() {
                    admin_password = args[i + 1].clone();
                    i += 1;
                }
            }
            "--opening-cash" => {
                if i + 1 < args.len() {
                    opening_cash = args[i + 1].parse()?;
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Apotheca Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>             Database file path (default: ./apotheca_dev.db)");
                println!("      --admin-password <PW>   Password for the 'admin' login");
                println!("      --opening-cash <AMOUNT> Opening Cash float (default: 10000)");
                println!("  -h, --help                  Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Apotheca Seed Data Generator");
    println!("===============================");
    println!("Database: {}", db_path);
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

    let now = Utc::now();
    let today = now.date_naive();

    // Vendors
    let mut vendor_ids = Vec::new();
    for (name, company, phone) in VENDORS {
        let id = db
            .vendors()
            .insert(&Vendor {
                id: String::new(),
                name: name.to_string(),
                company_name: company.to_string(),
                phone_number: phone.to_string(),
                created_at: now,
            })
            .await?;
        vendor_ids.push(id);
    }
    println!("✓ {} vendors", vendor_ids.len());

    // Catalog
    for (idx, (name, company, generic, tabs_per_pack, price)) in CATALOG.iter().enumerate() {
        let draft = ProductDraft {
            name: name.to_string(),
            company: company.to_string(),
            // 0, 3, 6, ... packs: the first few land under the low-stock line
            quantity: (idx as i64 * 3) % 40,
            tabs_per_pack: *tabs_per_pack,
            purchase_price: Money::from_minor(*price * 80),
            selling_price: Money::from_rupees(*price),
            // -20 days .. ~2 years, stepping 50 days
            expiry_date: today + Duration::days(idx as i64 * 50 - 20),
            vendor_id: Some(vendor_ids[idx % vendor_ids.len()].clone()),
            batch: Some(format!("B{:04}", 1000 + idx)),
            generic_name: Some(generic.to_string()),
        };
        db.products().insert(&draft.into_product(now)).await?;
    }
    println!("✓ {} products", CATALOG.len());

    // Opening float
    if opening_cash.is_positive() {
        db.ledger()
            .append(&LedgerEntry {
                id: String::new(),
                account: LedgerAccount::Cash,
                kind: LedgerEntryKind::Deposit,
                amount: opening_cash,
                reference_id: None,
                memo: Some("Opening float".to_string()),
                business_day: today,
                created_at: now,
            })
            .await?;
        println!("✓ Opening cash {}", opening_cash);
    }

    // Admin login
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(admin_password.as_bytes(), &salt)
        .map_err(|e| format!("Failed to hash password: {}", e))?
        .to_string();
    db.users()
        .insert(&UserAccount {
            id: String::new(),
            username: "admin".to_string(),
            password_hash,
            created_at: now,
        })
        .await?;
    println!("✓ Login 'admin'");

    println!();
    println!("✓ Seed complete!");

    Ok(())
}
