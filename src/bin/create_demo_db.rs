use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use time::macros::date;
use tracing_subscriber::EnvFilter;

use spendshare::{
    UserID,
    balance::aggregate_shared_balance,
    category::CategoryName,
    dashboard::summarize_expenses,
    expense::{Expense, create_expense, list_expenses},
    group::create_group,
    initialize_db,
    user::create_user,
};

/// A utility for creating a demo database for spendshare.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

/// Create and populate a database for manual testing, then print the demo
/// user's spending summary and shared balance as JSON.
fn main() -> Result<(), Box<dyn Error>> {
    setup_logging();

    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        None => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    println!("Creating demo users...");
    let alice = create_user("Alice", "alice@example.com", "en", &conn)?;
    let bob = create_user("Bob", "bob@example.com", "en", &conn)?;
    let carol = create_user("Carol", "carol@example.com", "es", &conn)?;

    println!("Creating demo expenses...");
    create_expense(
        Expense::personal(
            alice.id,
            1200.0,
            date!(2025 - 06 - 01),
            CategoryName::new_unchecked("Rent"),
        ),
        &conn,
    )?;
    create_expense(
        Expense::personal(
            alice.id,
            86.4,
            date!(2025 - 06 - 07),
            CategoryName::new_unchecked("Supermarket"),
        )
        .description("weekly groceries"),
        &conn,
    )?;
    create_expense(
        Expense::shared(
            alice.id,
            90.0,
            date!(2025 - 06 - 14),
            CategoryName::new_unchecked("Dining"),
            vec![bob.id, carol.id],
        )
        .description("birthday dinner"),
        &conn,
    )?;
    create_expense(
        Expense::shared(
            bob.id,
            300.0,
            date!(2025 - 07 - 02),
            CategoryName::new_unchecked("Travel"),
            vec![alice.id, carol.id],
        )
        .description("train tickets"),
        &conn,
    )?;

    create_group(
        "Roommates",
        &["bob@example.com".to_string(), "carol@example.com".to_string()],
        alice.id,
        &conn,
    )?;

    print_report(alice.id, &conn)?;

    println!("Success!");

    Ok(())
}

fn print_report(user: UserID, conn: &Connection) -> Result<(), Box<dyn Error>> {
    let expenses = list_expenses(user, conn)?;

    let summary = summarize_expenses(&expenses);
    println!("Spending summary for user {user}:");
    println!("{}", serde_json::to_string_pretty(&summary)?);

    let balance = aggregate_shared_balance(&expenses, user);
    println!("Shared balance for user {user}:");
    println!("{}", serde_json::to_string_pretty(&balance)?);

    Ok(())
}

fn setup_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}
