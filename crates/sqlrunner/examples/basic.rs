//! Basic usage example for sqlrunner
//!
//! Run with: cargo run --example basic -p sqlrunner
//!
//! Uses an in-memory SQLite database; set RUST_LOG=sqlrunner=debug to see
//! every executed statement.

use sqlrunner::monitor::StatsSink;
use sqlrunner::prelude::*;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Default, Record)]
struct Audit {
    #[orm(db = "created_by", json = "createdBy")]
    created_by: String,
}

#[derive(Debug, Default, Record)]
#[orm(table = "users")]
struct User {
    #[orm(db = "id", json = "id")]
    id: i64,
    #[orm(db = "user_name", json = "userName")]
    name: String,
    #[orm(column = "email")]
    email: Option<String>,
    #[orm(flatten)]
    audit: Audit,
}

#[tokio::main]
async fn main() -> Result<(), RunnerError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let db = SqliteExecutor::open_in_memory()?;
    db.execute_batch(
        "CREATE TABLE users (
            id INTEGER PRIMARY KEY,
            user_name TEXT NOT NULL,
            email TEXT,
            created_by TEXT NOT NULL
        )",
    )?;

    let stats = Arc::new(StatsSink::new());
    let config = RunnerConfig::new().with_sink(stats.clone()).enable_tracing();

    // ============================================
    // Example 1: Insert records in batches
    // ============================================
    println!("=== Insert ===");

    let users: Vec<User> = (1..=5)
        .map(|id| User {
            id,
            name: format!("user{id}"),
            email: (id % 2 == 0).then(|| format!("user{id}@example.com")),
            audit: Audit {
                created_by: "seed".to_string(),
            },
        })
        .collect();

    let mut runner = Runner::with_config(&db, config.clone());
    let res = runner.table_of::<User>().insert_batch(&users, 2).await?;
    println!("Inserted {} rows", res.rows_affected);

    // ============================================
    // Example 2: Read with a shared predicate
    // ============================================
    println!("\n=== Select ===");

    let mut runner = Runner::with_config(&db, config.clone());
    runner
        .table_of::<User>()
        .and_not_null("email")
        .order_by("id DESC");

    let with_email: Vec<User> = runner.all().await?;
    println!("Users with email: {with_email:?}");
    println!("Count: {}", runner.count().await?);

    let names: Vec<String> = runner.pluck("user_name").await?;
    println!("Names: {names:?}");

    // ============================================
    // Example 3: Grouped conditions
    // ============================================
    println!("\n=== Grouped conditions ===");

    let mut either = Predicate::new();
    either.and_eq("id", 1).or_eq("id", 5);

    let mut runner = Runner::with_config(&db, config.clone());
    runner
        .table_of::<User>()
        .and_eq("created_by", "seed")
        .and_group(&either);
    let picked: Vec<User> = runner.all().await?;
    println!("Picked: {:?}", picked.iter().map(|u| u.id).collect::<Vec<_>>());
    if let Some(stmt) = runner.last_statement() {
        println!("Last statement: {stmt}");
    }

    // ============================================
    // Example 4: Update and delete with the same predicate
    // ============================================
    println!("\n=== Update / Delete ===");

    let mut runner = Runner::with_config(&db, config);
    runner.table_of::<User>().and_eq("id", 3);
    runner.update_values([("user_name", "renamed")]).await?;
    let user: User = runner.get().await?;
    println!("Updated: {user:?}");

    runner.delete().await?;
    println!("Exists after delete: {}", runner.exists().await?);

    let s = stats.stats();
    println!(
        "\nStatements: {} (select {}, insert {}, update {}, delete {})",
        s.total_queries, s.select_count, s.insert_count, s.update_count, s.delete_count
    );

    Ok(())
}
