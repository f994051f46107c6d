//! Database initialization module
//!
//! Provides one-time analytics database setup for the pokebattle_init tool.

use std::path::Path;

use anyhow::{anyhow, bail, Result};
use tracing::info;

use crate::db::Database;

/// Initialize a new analytics database
///
/// # Errors
/// * Database file already exists
/// * Path is not valid UTF-8
/// * Database creation fails
pub async fn init_database(path: &Path) -> Result<()> {
    // Fail if database already exists
    if path.exists() {
        bail!(
            "Database file already exists: {}. Remove it first or use a different path.",
            path.display()
        );
    }

    let path_str = path
        .to_str()
        .ok_or_else(|| anyhow!("Invalid database path: {}", path.display()))?;

    info!("Creating new database at {}", path.display());

    // Create the database (runs migrations)
    let db = Database::new(Some(path_str)).await?;
    db.health_check().await?;

    info!("Database initialization complete");
    Ok(())
}
