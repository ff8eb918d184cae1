//! # Seed Data Generator
//!
//! Populates the database with a demo store for development.
//!
//! ## Usage
//! ```bash
//! # Seed 20 boxes (default)
//! cargo run -p lotto-db --bin seed
//!
//! # Seed a custom number of boxes
//! cargo run -p lotto-db --bin seed -- --boxes 40
//!
//! # Specify database path
//! cargo run -p lotto-db --bin seed -- --db ./data/lotto.db
//! ```
//!
//! ## Generated Data
//! - Store settings: Maryland, descending tickets
//! - A realistic game catalog ($1 through $30 price points)
//! - Configured boxes cycling through the catalog, each with a book loaded
//!   at its full starting position

use std::env;

use lotto_core::types::{GameInfo, StateCode, TicketBox};
use lotto_core::{StoreSettings, DEFAULT_OWNER_ID};
use lotto_db::{Database, DbConfig};

/// Demo game catalog: (game number, price cents, tickets per book).
///
/// Price points mirror a typical scratch-off rack: cheap games come in big
/// books, expensive games in small ones.
const GAMES: &[(&str, i64, i64)] = &[
    ("101", 100, 300),
    ("205", 200, 150),
    ("330", 300, 100),
    ("412", 500, 60),
    ("746", 500, 60),
    ("518", 1000, 30),
    ("620", 1000, 60),
    ("777", 2000, 30),
    ("850", 3000, 20),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let args: Vec<String> = env::args().collect();

    let mut box_count: u32 = 20;
    let mut db_path = String::from("./lotto_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--boxes" | "-b" => {
                if i + 1 < args.len() {
                    box_count = args[i + 1].parse().unwrap_or(20);
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
                println!("Lotto POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -b, --boxes <N>    Number of boxes to seed (default: 20)");
                println!("  -d, --db <PATH>    Database file path (default: ./lotto_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🎟  Lotto POS Seed Data Generator");
    println!("=================================");
    println!("Database: {}", db_path);
    println!("Boxes:    {}", box_count);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let settings = StoreSettings::default();
    let state = settings.state_code;

    let existing = db.boxes().count(DEFAULT_OWNER_ID, state).await?;
    if existing > 0 {
        println!("⚠ Database already has {} boxes", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    db.settings().upsert(DEFAULT_OWNER_ID, settings).await?;
    println!("✓ Store settings: {} / {}", state.label(), settings.ticket_order);

    for (game_number, price_cents, per_book) in GAMES {
        let game = GameInfo {
            game_number: game_number.to_string(),
            ticket_price_cents: *price_cents,
            total_tickets_per_book: *per_book,
        };
        db.games().upsert(DEFAULT_OWNER_ID, state, &game).await?;
    }
    println!("✓ Seeded {} games", GAMES.len());

    for box_number in 1..=box_count {
        let (game_number, price_cents, per_book) = GAMES[(box_number as usize - 1) % GAMES.len()];

        let tb = TicketBox {
            box_number,
            ticket_price_cents: price_cents,
            total_tickets_per_book: per_book,
            starting_ticket_number: per_book,
            last_scanned_ticket_number: None,
            tickets_sold: 0,
            total_amount_sold_cents: 0,
            is_configured: true,
            game_number: Some(game_number.to_string()),
            // Unique demo book per box.
            book_number: Some(format!("{:06}", 40_000 + box_number)),
        };

        db.boxes().upsert(DEFAULT_OWNER_ID, state, &tb).await?;
    }
    println!("✓ Seeded {} configured boxes", box_count);

    println!();
    println!("✓ Seed complete!");

    Ok(())
}
