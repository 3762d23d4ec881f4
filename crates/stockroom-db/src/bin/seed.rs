//! # Seed Data Generator
//!
//! Populates a database with a demo distributor: suppliers, customers with
//! addresses, a catalog, and a few sales placed through the ledger.
//!
//! ## Usage
//! ```bash
//! # Seed ./stockroom.db (or $STOCKROOM_DB_PATH)
//! cargo run -p stockroom-db --bin seed
//!
//! # Custom product count and path
//! cargo run -p stockroom-db --bin seed -- --count 200 --db ./data/demo.db
//! ```
//!
//! ## Generated Data
//! - One supplier per category (Beverages, Snacks, Cleaning, Grocery)
//! - Products: `{name} {size}`, price 1.99 - 9.99 plus size addon,
//!   stock 0 - 40, minimum stock 5 - 14
//! - Three customers in different states
//! - A handful of sales, so every report has rows

use std::env;

use stockroom_core::{
    CustomerId, NewAddress, NewProduct, OrderLine, PartyDetails, PartyRecord, SupplierId,
};
use stockroom_db::{init_tracing, Database, DbConfig};
use tracing::{info, warn};

/// Categories, each with its supplier and product names.
const CATEGORIES: &[(&str, &str, &[&str])] = &[
    (
        "Beverages",
        "Bebidas Atlântico",
        &[
            "Cola", "Guaraná", "Orange Soda", "Mineral Water", "Sparkling Water",
            "Grape Juice", "Iced Tea", "Coffee", "Energy Drink", "Coconut Water",
        ],
    ),
    (
        "Snacks",
        "Lanches Serra Azul",
        &[
            "Potato Chips", "Corn Chips", "Peanuts", "Cashews", "Wafer",
            "Cream Crackers", "Chocolate Bar", "Cereal Bar", "Popcorn", "Pretzels",
        ],
    ),
    (
        "Cleaning",
        "Limpa Tudo Distribuidora",
        &[
            "Dish Soap", "Laundry Powder", "Bleach", "Disinfectant", "Glass Cleaner",
            "Sponges", "Fabric Softener", "Floor Cleaner", "Trash Bags", "Bar Soap",
        ],
    ),
    (
        "Grocery",
        "Armazém Central",
        &[
            "Rice", "Black Beans", "Pasta", "Sugar", "Salt",
            "Coffee Beans", "Flour", "Soy Oil", "Tomato Sauce", "Oats",
        ],
    ),
];

/// Size variants and their price addon in cents.
const SIZES: &[(&str, i64)] = &[("Small", 0), ("Medium", 150), ("Large", 300), ("Bulk", 900)];

/// (name, phone, email, street, number, neighborhood, postal code, city, state)
const CUSTOMERS: &[(&str, &str, &str, &str, i64, &str, &str, &str, &str)] = &[
    (
        "Mercado Boa Vista", "11987654321", "compras@boavista.example",
        "Rua das Flores", 120, "Centro", "01310100", "São Paulo", "SP",
    ),
    (
        "Padaria Estrela", "2133334444", "pedidos@estrela.example",
        "Avenida Atlântica", 45, "Copacabana", "22021001", "Rio de Janeiro", "RJ",
    ),
    (
        "Empório Sul", "51999887766", "contato@emporiosul.example",
        "Rua da Praia", 0, "Centro Histórico", "90010000", "Porto Alegre", "RS",
    ),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let args: Vec<String> = env::args().collect();

    let mut config = DbConfig::from_env()?;
    let mut count: usize = 80;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(count);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    config.database_path = args[i + 1].clone().into();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Stockroom Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of products to generate (default: 80)");
                println!("  -d, --db <PATH>    Database file path (default: $STOCKROOM_DB_PATH or ./stockroom.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Stockroom Seed Data Generator");
    println!("=============================");
    println!("Database: {}", config.database_path.display());
    println!("Products: {}", count);
    println!();

    let db = Database::new(config).await?;
    println!("✓ Connected to database, migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    // Suppliers
    let mut suppliers: Vec<SupplierId> = Vec::new();
    for (idx, (category, supplier_name, _)) in CATEGORIES.iter().enumerate() {
        let supplier = db
            .suppliers()
            .insert(&PartyDetails {
                name: supplier_name.to_string(),
                phone: format!("1130000{:04}", idx),
                email: format!("vendas{}@fornecedor.example", idx),
                address_id: None,
            })
            .await?;
        info!(category = %category, supplier = %supplier.id, "Supplier created");
        suppliers.push(supplier.id().clone());
    }

    // Catalog
    let mut product_ids: Vec<String> = Vec::new();
    'outer: for (category_idx, (category, _, names)) in CATEGORIES.iter().enumerate() {
        for (name_idx, name) in names.iter().enumerate() {
            for (size_idx, (size, addon)) in SIZES.iter().enumerate() {
                if product_ids.len() >= count {
                    break 'outer;
                }

                let seed = category_idx * 1000 + name_idx * 20 + size_idx;
                let product = generate_product(category, name, size, *addon, seed, &suppliers[category_idx]);

                match db.products().insert(&product).await {
                    Ok(created) => product_ids.push(created.id),
                    Err(e) => warn!(name = %product.name, error = %e, "Failed to insert product"),
                }
            }
        }
    }
    println!("✓ Generated {} products", product_ids.len());

    // Customers
    let mut customers: Vec<CustomerId> = Vec::new();
    for (name, phone, email, street, number, neighborhood, postal_code, city, state) in CUSTOMERS {
        let address = db
            .addresses()
            .insert(&NewAddress {
                street: street.to_string(),
                number: *number,
                neighborhood: neighborhood.to_string(),
                postal_code: postal_code.to_string(),
                city_name: city.to_string(),
                state_id: state.to_string(),
            })
            .await?;

        let customer = db
            .customers()
            .insert(&PartyDetails {
                name: name.to_string(),
                phone: phone.to_string(),
                email: email.to_string(),
                address_id: Some(address.id),
            })
            .await?;
        customers.push(customer.id);
    }
    println!("✓ Created {} customers", customers.len());

    // Sales through the ledger, so stock moves the way it would in use
    let ledger = db.ledger();
    let mut committed = 0;
    for (idx, customer_id) in customers.iter().enumerate() {
        let lines: Vec<OrderLine> = product_ids
            .iter()
            .skip(idx * 7)
            .step_by(5)
            .take(3)
            .map(|id| OrderLine::new(id.clone(), 1 + idx as i64))
            .collect();
        if lines.is_empty() {
            continue;
        }

        let outcome = ledger.try_place_order(customer_id, &lines).await;
        if outcome.is_committed() {
            committed += 1;
        }
    }
    println!("✓ Placed {} sales", committed);

    let low = db.reports().low_stock().await?;
    println!();
    println!("Low stock: {} products", low.len());
    for product in low.iter().take(10) {
        println!(
            "  {:<32} {:>4} on hand (min {})",
            product.name, product.quantity_on_hand, product.min_stock
        );
    }

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Generates one catalog entry with deterministic pseudo-random numbers.
fn generate_product(
    category: &str,
    name: &str,
    size: &str,
    price_addon: i64,
    seed: usize,
    supplier_id: &SupplierId,
) -> NewProduct {
    // 1.99 - 9.99 plus the size addon
    let price_cents = 199 + ((seed * 17) % 800) as i64 + price_addon;

    NewProduct {
        name: format!("{} {}", name, size),
        category: category.to_string(),
        price_cents,
        quantity_on_hand: ((seed * 7) % 41) as i64,
        min_stock: 5 + (seed % 10) as i64,
        supplier_id: Some(supplier_id.clone()),
    }
}
