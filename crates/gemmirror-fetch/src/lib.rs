//! Gem archive retrieval and descriptor parsing.
//!
//! [`fetcher::ArtifactFetcher`] downloads a `.gem` archive from the
//! upstream origin and extracts the raw `metadata.gz` member;
//! [`descriptor::parse`] turns those bytes into a structured
//! [`descriptor::GemDescriptor`]. Both treat the archive as untrusted
//! input: nothing in the payload is ever executed or instantiated.

pub mod descriptor;
pub mod error;
pub mod fetcher;
pub mod http_client;

pub use descriptor::{DependencyDecl, GemDescriptor};
pub use error::{FetchError, ParseError};
pub use fetcher::ArtifactFetcher;
