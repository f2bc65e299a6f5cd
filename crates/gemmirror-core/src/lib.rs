//! Core ingestion pipeline and snapshot service for gemmirror.

use error::MirrorError;

pub mod config;
pub mod error;
pub mod job;
pub mod request;
pub mod snapshot;

pub type MirrorResult<T> = std::result::Result<T, MirrorError>;
