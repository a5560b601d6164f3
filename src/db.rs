//! Database bootstrap shared by the server and the one-shot collector

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use sea_orm_migration::MigratorTrait;
use std::path::Path;

/// Connect and bring the schema up to date
pub async fn connect_and_migrate(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    ensure_sqlite_dir(database_url)?;

    tracing::info!("Connecting to database...");
    let mut options = ConnectOptions::new(database_url.to_string());
    options.sqlx_logging(false);
    let db = Database::connect(options).await?;

    tracing::info!("Running migrations...");
    migration::Migrator::up(&db, None).await?;

    Ok(db)
}

/// SQLite will not create missing parent directories of the database file
fn ensure_sqlite_dir(database_url: &str) -> Result<(), DbErr> {
    let Some(path) = database_url.strip_prefix("sqlite://") else {
        return Ok(());
    };
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() || path.starts_with(':') {
        return Ok(());
    }

    if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| DbErr::Custom(format!("Cannot create {}: {}", parent.display(), e)))?;
    }
    Ok(())
}
