//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `taskledger_core` linkage against a real database file.
//! - Seed demo accounts and the default catalog, then print store counts.
//!
//! Database path: first argument, then `TASKLEDGER_DB_PATH`, then
//! `taskledger.sqlite3` in the working directory.

use std::error::Error;
use std::path::PathBuf;
use taskledger_core::db::open_db;
use taskledger_core::{
    AuthService, CatalogService, SqliteItemRepository, SqliteTaskRepository,
    SqliteUserRepository, TaskRepository,
};

fn main() -> Result<(), Box<dyn Error>> {
    println!("taskledger_core ping={}", taskledger_core::ping());
    println!("taskledger_core version={}", taskledger_core::core_version());

    let db_path = resolve_db_path();
    let conn = open_db(&db_path)?;
    println!("db path={}", db_path.display());

    let auth = AuthService::new(SqliteUserRepository::try_new(&conn)?);
    let seeded = auth.initialize_demo_data()?;
    let catalog = CatalogService::new(SqliteItemRepository::try_new(&conn)?);
    let items = catalog.list_items()?;
    let tasks = SqliteTaskRepository::try_new(&conn)?;

    println!("demo users seeded={seeded}");
    println!("users={}", auth.list_users()?.len());
    println!("items={}", items.len());
    println!("tasks={}", tasks.list_tasks()?.len());
    println!("progress updates={}", tasks.get_task_item_updates(None)?.len());
    Ok(())
}

fn resolve_db_path() -> PathBuf {
    std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .or_else(|| {
            std::env::var("TASKLEDGER_DB_PATH")
                .ok()
                .map(|raw| raw.trim().to_string())
                .filter(|raw| !raw.is_empty())
                .map(PathBuf::from)
        })
        .unwrap_or_else(|| PathBuf::from("taskledger.sqlite3"))
}
