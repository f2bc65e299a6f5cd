//! Error types for gemmirror-core.

use gemmirror_db::DbError;
use gemmirror_fetch::{FetchError, ParseError};
use miette::Diagnostic;
use thiserror::Error;

/// Aggregate error type for mirror operations.
///
/// Fetch failures are candidates for a bounded retry by the caller;
/// parse failures mark the input as poisoned and must not be retried;
/// persistence failures roll the transaction back, so a retry never
/// observes a partial write.
#[derive(Error, Diagnostic, Debug)]
pub enum MirrorError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Db(#[from] DbError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Parse(#[from] ParseError),

    #[error("Invalid configuration: {0}")]
    #[diagnostic(
        code(gemmirror::config),
        help("Check the GEMMIRROR_* environment variables")
    )]
    Config(String),

    #[error("Snapshot encoding failed: {0}")]
    #[diagnostic(code(gemmirror::encode))]
    Encode(String),
}
