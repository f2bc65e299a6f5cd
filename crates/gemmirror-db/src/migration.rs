use diesel::SqliteConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

use crate::error::{DbError, Result};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Applies any pending catalog migrations.
pub fn apply_migrations(conn: &mut SqliteConnection) -> Result<()> {
    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|e| DbError::MigrationError(e.to_string()))?;
    Ok(())
}
