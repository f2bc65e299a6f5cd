//! Database connection management.
//!
//! The service holds two [`Database`] handles: a primary for the write
//! path and, optionally, a follower for the dependency-snapshot read
//! path. Both wrap a single SQLite connection behind a mutex; the store
//! constraint, not the mutex, is what guarantees at-most-one persisted
//! version per identifier across service instances.

use std::{
    path::Path,
    sync::{Arc, Mutex},
};

use diesel::{sql_query, Connection, RunQueryDsl, SqliteConnection};

use crate::{
    error::{DbError, Result},
    migration::apply_migrations,
};

/// Connection wrapper with migration support.
pub struct DbConnection {
    conn: SqliteConnection,
}

impl DbConnection {
    /// Opens a catalog database connection and runs migrations.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_str = path.as_ref().to_string_lossy();
        let mut conn = SqliteConnection::establish(&path_str)?;

        // WAL mode for better concurrent access
        sql_query("PRAGMA journal_mode = WAL;")
            .execute(&mut conn)
            .map_err(|e| DbError::ConnectionError(e.to_string()))?;
        sql_query("PRAGMA foreign_keys = ON;")
            .execute(&mut conn)
            .map_err(|e| DbError::ConnectionError(e.to_string()))?;

        apply_migrations(&mut conn)?;

        Ok(Self { conn })
    }

    /// Opens a connection without running migrations. Used for follower
    /// databases whose schema is managed by the primary.
    pub fn open_without_migrations<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_str = path.as_ref().to_string_lossy();
        let conn = SqliteConnection::establish(&path_str)?;
        Ok(Self { conn })
    }

    /// Gets a mutable reference to the underlying connection.
    pub fn conn(&mut self) -> &mut SqliteConnection {
        &mut self.conn
    }
}

/// Thread-safe, clonable handle to a catalog database.
pub struct Database {
    conn: Arc<Mutex<DbConnection>>,
}

impl Database {
    /// Opens the primary catalog database, applying migrations.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = DbConnection::open(path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Opens a follower database for the read path.
    pub fn open_follower<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = DbConnection::open_without_migrations(path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Executes a function with the locked connection.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut SqliteConnection) -> diesel::QueryResult<T>,
    {
        let mut conn = self.conn.lock().map_err(|_| DbError::PoisonError)?;
        f(conn.conn()).map_err(DbError::from)
    }

    /// Cheap reachability probe for health checks.
    pub fn ping(&self) -> Result<()> {
        self.with_conn(|conn| sql_query("SELECT 1;").execute(conn))?;
        Ok(())
    }

    /// Executes a function within a transaction. Any error rolls the
    /// whole transaction back; no partial writes survive.
    pub fn transaction<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut SqliteConnection) -> diesel::QueryResult<T>,
    {
        let mut conn = self.conn.lock().map_err(|_| DbError::PoisonError)?;
        conn.conn().transaction(f).map_err(DbError::from)
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            conn: self.conn.clone(),
        }
    }
}
