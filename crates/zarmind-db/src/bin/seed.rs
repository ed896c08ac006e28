//! # Seed Data Generator
//!
//! Populates the database with demo records for development.
//!
//! ## Usage
//! ```bash
//! # Seed ./zarmind_dev.db with 40 customers (default)
//! cargo run -p zarmind-db --bin seed
//!
//! # Custom amount
//! cargo run -p zarmind-db --bin seed -- --customers 200
//!
//! # Specify database path
//! cargo run -p zarmind-db --bin seed -- --db ./data/zarmind.db
//! ```
//!
//! ## Generated Data
//! - Two branches (one main)
//! - A handful of gold and stone suppliers
//! - Customers, alternating individual and business
//! - Products across every category, with stock at both branches
//! - Company, tax and currency settings
//! - Expense categories

use chrono::Utc;
use std::env;
use zarmind_core::codes::generate_code_with_suffix;
use zarmind_core::{
    Branch, BranchStock, Customer, CustomerStatus, CustomerType, ExpenseCategory, Money, Product,
    ProductCategory, ProductStatus, Setting, SettingCategory, SettingValueType, Supplier,
    SupplierStatus, DEFAULT_MINIMUM_STOCK,
};
use zarmind_db::{new_id, Database, DbConfig};

const BRANCHES: &[(&str, &str, bool)] = &[
    ("Central Bazaar", "Tehran", true),
    ("North Gallery", "Tabriz", false),
];

const SUPPLIERS: &[(&str, &str)] = &[
    ("Pars Gold Refinery", "Tehran"),
    ("Golden Crescent Traders", "Mashhad"),
    ("Azure Stone House", "Isfahan"),
    ("Sepahan Coin Mint", "Isfahan"),
];

const FIRST_NAMES: &[&str] = &[
    "Ali", "Sara", "Reza", "Maryam", "Hossein", "Niloufar", "Kian", "Parisa", "Omid", "Leila",
];

const LAST_NAMES: &[&str] = &[
    "Ahmadi", "Karimi", "Rostami", "Hosseini", "Moradi", "Jafari", "Rahimi", "Sadeghi",
];

/// (category, name, weight in grams, purity, purchase price, selling price, quantity)
const PRODUCTS: &[(ProductCategory, &str, Option<f64>, Option<&str>, f64, f64, i64)] = &[
    (ProductCategory::RawGold, "Melted Gold Bar", Some(100.0), Some("24K"), 6_500.0, 6_800.0, 4),
    (ProductCategory::ManufacturedProduct, "Twisted Bangle", Some(12.5), Some("18K"), 820.0, 990.0, 14),
    (ProductCategory::ManufacturedProduct, "Solitaire Ring", Some(3.2), Some("18K"), 410.0, 560.0, 6),
    (ProductCategory::ManufacturedProduct, "Chain Necklace", Some(8.0), Some("21K"), 600.0, 720.0, 25),
    (ProductCategory::Stone, "Turquoise Cabochon", Some(1.1), None, 45.0, 80.0, 40),
    (ProductCategory::Stone, "Ruby 1ct", Some(0.2), None, 900.0, 1_250.0, 3),
    (ProductCategory::Coin, "Bahar Azadi Full Coin", Some(8.13), Some("22K"), 540.0, 575.0, 30),
    (ProductCategory::Currency, "USD Cash", None, None, 1.0, 1.02, 5_000),
    (ProductCategory::GeneralGoods, "Velvet Ring Box", None, None, 2.5, 6.0, 120),
];

/// (name, English name)
const EXPENSE_CATEGORIES: &[(&str, &str)] = &[
    ("اجاره", "Rent"),
    ("حقوق و دستمزد", "Salaries"),
    ("آب و برق", "Utilities"),
    ("حمل و نقل", "Transport"),
];

/// (key, category, value, type, public, description)
const SETTINGS: &[(&str, SettingCategory, &str, SettingValueType, bool, &str)] = &[
    ("company.name", SettingCategory::Company, "Zarmind Jewelry", SettingValueType::String, true, "Trading name"),
    ("company.phone", SettingCategory::Company, "+98 21 5555 0100", SettingValueType::String, true, "Main phone"),
    ("tax.vat_rate", SettingCategory::Tax, "9", SettingValueType::Number, false, "VAT percent"),
    ("tax.inclusive_prices", SettingCategory::Tax, "false", SettingValueType::Boolean, false, "Prices include VAT"),
    ("currency.default", SettingCategory::Currency, "IRR", SettingValueType::String, true, "Base currency"),
    ("currency.display", SettingCategory::Currency, r#"{"symbol":"﷼","decimals":0}"#, SettingValueType::Json, true, "Display format"),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut customers: usize = 40;
    let mut db_path = String::from("./zarmind_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--customers" | "-c" => {
                if i + 1 < args.len() {
                    customers = args[i + 1].parse().unwrap_or(40);
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
                println!("Zarmind Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --customers <N>  Number of customers to generate (default: 40)");
                println!("  -d, --db <PATH>      Database file path (default: ./zarmind_dev.db)");
                println!("  -h, --help           Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Zarmind Seed Data Generator");
    println!("==============================");
    println!("Database:  {}", db_path);
    println!("Customers: {}", customers);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.branches().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} branches", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let start = std::time::Instant::now();
    let now = Utc::now();

    // Branches
    let mut branch_ids = Vec::new();
    for (idx, (name, city, main)) in BRANCHES.iter().enumerate() {
        let branch = Branch {
            id: new_id(),
            code: format!("BR-DEMO-{:02}", idx + 1),
            name: name.to_string(),
            city: Some(city.to_string()),
            address: None,
            phone: None,
            is_main_branch: *main,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        db.branches().insert(&branch).await?;
        branch_ids.push(branch.id);
    }
    println!("✓ {} branches", branch_ids.len());

    // Suppliers
    for (idx, (name, city)) in SUPPLIERS.iter().enumerate() {
        let supplier = Supplier {
            id: new_id(),
            code: format!("SUPP-DEMO-{:02}", idx + 1),
            name: name.to_string(),
            contact_person: Some(FIRST_NAMES[idx % FIRST_NAMES.len()].to_string()),
            phone: Some(format!("+98 21 5555 {:04}", 2000 + idx)),
            email: None,
            address: None,
            city: Some(city.to_string()),
            payment_terms: Some("Net 30".to_string()),
            rating: Some(3 + (idx as i64 % 3)),
            status: SupplierStatus::Active,
            notes: None,
            created_at: now,
            updated_at: now,
        };
        if let Err(e) = db.suppliers().insert(&supplier).await {
            eprintln!("Failed to insert {}: {}", supplier.code, e);
        }
    }
    println!("✓ {} suppliers", SUPPLIERS.len());

    // Customers
    let mut generated = 0;
    for seed in 0..customers {
        let customer = generate_customer(seed);
        if let Err(e) = db.customers().insert(&customer).await {
            eprintln!("Failed to insert {}: {}", customer.code, e);
            continue;
        }
        generated += 1;
    }
    println!("✓ {} customers", generated);

    // Products with stock at every branch
    for (seed, row) in PRODUCTS.iter().enumerate() {
        let (product, stock) = generate_product(row, seed, &branch_ids);
        if let Err(e) = db.products().insert(&product, &stock).await {
            eprintln!("Failed to insert {}: {}", product.sku, e);
        }
    }
    println!("✓ {} products", PRODUCTS.len());

    // Settings
    for (key, category, value, value_type, is_public, description) in SETTINGS {
        let setting = Setting {
            id: new_id(),
            key: key.to_string(),
            category: *category,
            value: value.to_string(),
            value_type: *value_type,
            description: Some(description.to_string()),
            is_public: *is_public,
            updated_by: None,
            created_at: now,
            updated_at: now,
        };
        db.settings().insert(&setting).await?;
    }
    println!("✓ {} settings", SETTINGS.len());

    for (name, name_en) in EXPENSE_CATEGORIES {
        let category = ExpenseCategory {
            id: new_id(),
            name: name.to_string(),
            name_en: Some(name_en.to_string()),
            description: None,
            parent_id: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        db.expenses().insert_category(&category).await?;
    }
    println!("✓ {} expense categories", EXPENSE_CATEGORIES.len());

    let totals = db.products().totals(None).await?;
    println!();
    println!("Inventory check:");
    println!("  Items:          {}", totals.item_count);
    println!("  Quantity:       {}", totals.total_quantity);
    println!("  Selling value:  {}", totals.total_selling_value);
    println!("  Low stock rows: {}", db.products().low_stock_count(None).await?);

    println!();
    println!("✓ Seed complete in {:?}", start.elapsed());

    Ok(())
}

/// Alternates individual and business customers.
fn generate_customer(seed: usize) -> Customer {
    let now = Utc::now();
    let first = FIRST_NAMES[seed % FIRST_NAMES.len()];
    let last = LAST_NAMES[(seed * 7) % LAST_NAMES.len()];
    let business = seed % 4 == 3;

    Customer {
        id: new_id(),
        code: generate_code_with_suffix("CUST"),
        customer_type: if business {
            CustomerType::Business
        } else {
            CustomerType::Individual
        },
        status: CustomerStatus::Active,
        first_name: Some(first.to_string()),
        last_name: Some(last.to_string()),
        business_name: business.then(|| format!("{} Gold Trading", last)),
        phone: format!("+98 912 {:03} {:04}", seed % 1000, (seed * 37) % 10_000),
        email: Some(format!("{}.{}{}@example.com", first, last, seed).to_lowercase()),
        national_id: None,
        address: None,
        city: Some(BRANCHES[seed % BRANCHES.len()].1.to_string()),
        credit_limit: Money::from_major(if business { 50_000.0 } else { 5_000.0 }),
        current_balance: Money::zero(),
        loyalty_points: (seed as i64 * 13) % 500,
        notes: None,
        created_at: now,
        updated_at: now,
    }
}

/// Splits the quantity across branches, the main branch taking the remainder.
fn generate_product(
    row: &(ProductCategory, &str, Option<f64>, Option<&str>, f64, f64, i64),
    seed: usize,
    branch_ids: &[String],
) -> (Product, Vec<BranchStock>) {
    let now = Utc::now();
    let (category, name, weight, purity, purchase, selling, quantity) = *row;

    let sku = format!("{}-DEMO-{:03}", category.sku_prefix(), seed + 1);
    let product = Product {
        id: new_id(),
        qr_code: format!("QR-{}", sku),
        sku,
        name: name.to_string(),
        description: None,
        category,
        status: ProductStatus::InStock,
        weight,
        gold_purity: purity.map(str::to_string),
        coin_type: (category == ProductCategory::Coin).then(|| "BAHAR_AZADI".to_string()),
        currency_code: (category == ProductCategory::Currency).then(|| "USD".to_string()),
        purchase_price: Money::from_major(purchase),
        selling_price: Money::from_major(selling),
        quantity,
        workshop_id: None,
        created_at: now,
        updated_at: now,
    };

    let share = quantity / branch_ids.len().max(1) as i64;
    let stock = branch_ids
        .iter()
        .enumerate()
        .map(|(idx, branch_id)| BranchStock {
            id: new_id(),
            product_id: product.id.clone(),
            branch_id: branch_id.clone(),
            quantity: if idx == 0 {
                quantity - share * (branch_ids.len() as i64 - 1)
            } else {
                share
            },
            minimum_stock: DEFAULT_MINIMUM_STOCK,
            location: Some(format!("Showcase {}", idx + 1)),
            updated_at: now,
        })
        .collect();

    (product, stock)
}
