//! Error types for gemmirror-db.

use miette::Diagnostic;
use thiserror::Error;

/// Database error type for catalog operations.
#[derive(Error, Diagnostic, Debug)]
pub enum DbError {
    #[error("Database connection failed: {0}")]
    #[diagnostic(
        code(gemmirror_db::connection),
        help("Check that the database path exists and is writable")
    )]
    ConnectionError(String),

    #[error("Database query failed: {0}")]
    #[diagnostic(code(gemmirror_db::query))]
    QueryError(String),

    #[error("Database migration failed: {0}")]
    #[diagnostic(
        code(gemmirror_db::migration),
        help("The catalog schema may be from an incompatible version")
    )]
    MigrationError(String),

    #[error("Record not found: {0}")]
    #[diagnostic(code(gemmirror_db::not_found))]
    NotFound(String),

    #[error("Connection mutex poisoned")]
    #[diagnostic(code(gemmirror_db::poison))]
    PoisonError,

    #[error("IO error: {0}")]
    #[diagnostic(code(gemmirror_db::io), help("Check file permissions and disk space"))]
    IoError(#[from] std::io::Error),
}

impl From<diesel::result::Error> for DbError {
    fn from(err: diesel::result::Error) -> Self {
        match err {
            diesel::result::Error::NotFound => DbError::NotFound("record not found".to_string()),
            diesel::result::Error::DatabaseError(_, info) => {
                DbError::QueryError(info.message().to_string())
            }
            other => DbError::QueryError(other.to_string()),
        }
    }
}

impl From<diesel::result::ConnectionError> for DbError {
    fn from(err: diesel::result::ConnectionError) -> Self {
        DbError::ConnectionError(err.to_string())
    }
}

/// Result type alias for catalog operations.
pub type Result<T> = std::result::Result<T, DbError>;
