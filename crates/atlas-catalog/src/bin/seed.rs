//! # Seed Data Generator
//!
//! Populates the database with a demonstration catalog.
//!
//! ## Usage
//! ```bash
//! # Use the configured database (catalog.toml / ATLAS_DATABASE_PATH)
//! cargo run -p atlas-catalog --bin seed
//!
//! # Specify database path
//! cargo run -p atlas-catalog --bin seed -- --db ./data/catalog.db
//! ```
//!
//! ## Generated Catalog
//! - SIMPLE: `A`, `B`, `MUG`
//! - VIRTUAL: `GIFT-25`
//! - BUNDLE: `KIT-01` = A × 2 + B × 1
//! - GROUPED: `BREAKFAST-SET` = MUG + KIT-01
//! - CONFIGURABLE: `SHIRT` on Color × Size, with six generated variants

use std::env;
use std::path::PathBuf;

use atlas_catalog::telemetry::init_tracing;
use atlas_catalog::{Catalog, CatalogConfig, VariantSetup};
use atlas_core::{
    AxisInput, AxisValues, ComponentInput, GroupedItemInput, NewProduct, Product, ProductType,
};
use atlas_db::ProductRepository;

const SHIRT_COLORS: &[&str] = &["Red", "Navy Blue"];
const SHIRT_SIZES: &[&str] = &["S", "M", "L"];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path: Option<PathBuf> = None;
    let mut config_path: Option<PathBuf> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Atlas Catalog Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>       Database file path (overrides config)");
                println!("  -c, --config <PATH>   catalog.toml to load");
                println!("  -h, --help            Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    let mut config = CatalogConfig::load(config_path)?;
    if let Some(path) = db_path {
        config.database.path = path;
    }
    init_tracing(&config.logging.filter);

    println!("🌱 Atlas Catalog Seed Data Generator");
    println!("====================================");
    println!("Database: {}", config.database.path.display());
    println!();

    let catalog = Catalog::open(&config).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    {
        let mut conn = catalog.database().acquire().await?;
        if ProductRepository::exists_by_sku(&mut conn, "KIT-01").await? {
            println!("⚠ Database already has the demo catalog");
            println!("  Skipping seed to avoid duplicates.");
            println!("  Delete the database file to regenerate.");
            return Ok(());
        }
    }

    let start = std::time::Instant::now();

    // Simple + virtual
    println!();
    println!("Creating products...");
    let a = create(&catalog, "A", "Widget A", ProductType::Simple, Some(450), 5).await?;
    let b = create(&catalog, "B", "Widget B", ProductType::Simple, Some(300), 3).await?;
    let mug = create(&catalog, "MUG", "Coffee Mug", ProductType::Simple, Some(899), 24).await?;
    create(&catalog, "GIFT-25", "Gift Card $25", ProductType::Virtual, Some(2500), 0).await?;

    // Bundle
    let kit = create(&catalog, "KIT-01", "Starter Kit", ProductType::Bundle, None, 0).await?;
    catalog
        .composition()
        .set_components(
            &kit.id,
            vec![ComponentInput::new(&a.id, 2), ComponentInput::new(&b.id, 1)],
        )
        .await?;
    let price = catalog.composition().bundle_price(&kit.id).await?;
    println!("  ✓ KIT-01 bundle price: {}", price);

    // Grouped
    let set = create(&catalog, "BREAKFAST-SET", "Breakfast Set", ProductType::Grouped, None, 0).await?;
    catalog
        .composition()
        .set_grouped_items(
            &set.id,
            vec![GroupedItemInput::new(&mug.id), GroupedItemInput::new(&kit.id)],
        )
        .await?;
    println!("  ✓ BREAKFAST-SET grouped items: 2");

    // Configurable
    let shirt = create(&catalog, "SHIRT", "T-Shirt", ProductType::Configurable, Some(1999), 0).await?;
    let color = catalog
        .variants()
        .create_axis(AxisInput::new("color", "Color"))
        .await?;
    let mut size = AxisInput::new("size", "Size");
    size.position = Some(1);
    let size = catalog.variants().create_axis(size).await?;
    catalog
        .variants()
        .configure(&shirt.id, VariantSetup::new(vec![color.id, size.id]))
        .await?;

    let combinations: Vec<AxisValues> = SHIRT_COLORS
        .iter()
        .flat_map(|c| {
            SHIRT_SIZES.iter().map(move |s| {
                AxisValues::from([
                    ("color".to_string(), c.to_string()),
                    ("size".to_string(), s.to_string()),
                ])
            })
        })
        .collect();
    let variants = catalog.variants().bulk_create(&shirt.id, combinations).await?;
    for variant in &variants {
        println!("  ✓ {} ({})", variant.product.sku, variant.product.name);
    }

    let elapsed = start.elapsed();
    println!();
    println!("✓ Seeded demo catalog in {:?}", elapsed);

    // Verify
    println!();
    println!("Verifying...");
    let check = catalog.composition().validate_stock(&kit.id, 2).await?;
    println!("  KIT-01 × 2: {}", serde_json::to_string(&check)?);
    let check = catalog.composition().validate_stock(&kit.id, 3).await?;
    println!("  KIT-01 × 3: {}", serde_json::to_string(&check)?);
    let matrix = catalog.variants().matrix(&shirt.id).await?;
    println!(
        "  SHIRT matrix: {} combinations, {} existing",
        matrix.len(),
        matrix.iter().filter(|e| e.exists).count()
    );

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

async fn create(
    catalog: &Catalog,
    sku: &str,
    name: &str,
    product_type: ProductType,
    price_cents: Option<i64>,
    stock: i64,
) -> Result<Product, Box<dyn std::error::Error>> {
    let mut input = NewProduct::new(sku, name, product_type).with_stock(stock);
    input.price_cents = price_cents;
    let product = catalog.products().create(input).await?;
    println!("  ✓ {} {} ({})", product.product_type, product.sku, product.name);
    Ok(product)
}
