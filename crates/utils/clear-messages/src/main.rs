//! # Clear Messages Utility
//!
//! This binary deletes chat history from the database, either for a single
//! project or for every project at once.
//!
//! **WARNING**: This is a destructive operation that cannot be undone.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --package clear-messages --bin clear_messages
//! ```
//!
//! The program will:
//! 1. Connect to the database
//! 2. Count existing messages
//! 3. Ask which project to clear (or "all")
//! 4. Ask for confirmation
//! 5. Delete the selected history if confirmed
//! 6. Report the number of messages deleted

use lib_core::create_pool;
use lib_core::model::store::MessageRepository;
use sqlx::query_as;
use std::io::{self, Write};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    println!("============================================");
    println!("  Clear Messages Utility");
    println!("============================================");
    println!();
    println!("WARNING: Deleted chat history cannot be recovered.");
    println!();

    // Connect to database
    println!("Connecting to database...");
    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:data/workspace.db".to_string());
    let pool = create_pool(&database_url).await?;
    println!("Connected successfully.");
    println!();

    // Count existing messages
    let total: (i64,) = query_as("SELECT COUNT(*) FROM messages")
        .fetch_one(&pool)
        .await?;

    if total.0 == 0 {
        println!("No messages found in the database.");
        println!("Nothing to delete.");
        return Ok(());
    }

    println!("Found {} message(s) in the database.", total.0);
    println!();

    // Choose scope
    print!("Enter a project id to clear, or 'all' for every project: ");
    io::stdout().flush()?;

    let mut scope = String::new();
    io::stdin().read_line(&mut scope)?;
    let scope = scope.trim().to_lowercase();

    if scope == "all" {
        print!(
            "Are you sure you want to delete all {} message(s)? (yes/no): ",
            total.0
        );
        io::stdout().flush()?;

        let mut confirmation = String::new();
        io::stdin().read_line(&mut confirmation)?;
        let confirmation = confirmation.trim().to_lowercase();

        if confirmation != "yes" && confirmation != "y" {
            println!("Operation cancelled.");
            return Ok(());
        }

        println!();
        println!("Deleting all messages...");

        let deleted = MessageRepository::delete_all(&pool).await?;

        println!("Successfully deleted {} message(s).", deleted);
        println!();
        println!("Database cleared.");
        return Ok(());
    }

    let project_id: i64 = match scope.parse() {
        Ok(id) => id,
        Err(_) => {
            println!("'{}' is not a project id or 'all'.", scope);
            println!("Operation cancelled.");
            return Ok(());
        }
    };

    let project_total: (i64,) = query_as("SELECT COUNT(*) FROM messages WHERE project_id = ?")
        .bind(project_id)
        .fetch_one(&pool)
        .await?;

    if project_total.0 == 0 {
        println!("No messages found for project {}.", project_id);
        println!("Nothing to delete.");
        return Ok(());
    }

    print!(
        "Are you sure you want to delete {} message(s) from project {}? (yes/no): ",
        project_total.0, project_id
    );
    io::stdout().flush()?;

    let mut confirmation = String::new();
    io::stdin().read_line(&mut confirmation)?;
    let confirmation = confirmation.trim().to_lowercase();

    if confirmation != "yes" && confirmation != "y" {
        println!("Operation cancelled.");
        return Ok(());
    }

    println!();
    println!("Deleting messages for project {}...", project_id);

    let deleted = MessageRepository::purge_project(&pool, project_id).await?;

    println!("Successfully deleted {} message(s).", deleted);
    println!();
    println!("Project history cleared.");

    Ok(())
}
