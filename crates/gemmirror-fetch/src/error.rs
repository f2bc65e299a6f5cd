//! Error types for archive retrieval and descriptor parsing.

use miette::Diagnostic;
use thiserror::Error;

/// Errors raised while retrieving and unpacking a gem archive.
///
/// All variants are transient-or-environmental: a caller that wants a
/// retry policy can apply one around the whole fetch.
#[derive(Error, Diagnostic, Debug)]
pub enum FetchError {
    #[error("Invalid upstream URL: {0}")]
    #[diagnostic(code(gemmirror_fetch::invalid_url))]
    InvalidUrl(String),

    #[error(transparent)]
    #[diagnostic(
        code(gemmirror_fetch::network),
        help("Check connectivity to the upstream origin")
    )]
    Network(#[from] Box<ureq::Error>),

    #[error("HTTP {status}: {url}")]
    #[diagnostic(code(gemmirror_fetch::http_error))]
    HttpError { status: u16, url: String },

    #[error("Archive member not found: {0}")]
    #[diagnostic(
        code(gemmirror_fetch::missing_member),
        help("The archive does not look like a gem package")
    )]
    MissingMember(String),

    #[error("Archive member exceeds {limit} bytes")]
    #[diagnostic(
        code(gemmirror_fetch::member_too_large),
        help("The decompressed descriptor is suspiciously large; refusing it")
    )]
    MemberTooLarge { limit: u64 },

    #[error("Error while {action}")]
    #[diagnostic(code(gemmirror_fetch::io))]
    IoError {
        action: String,
        #[source]
        source: std::io::Error,
    },
}

impl From<ureq::Error> for FetchError {
    fn from(err: ureq::Error) -> Self {
        FetchError::Network(Box::new(err))
    }
}

/// Errors raised while extracting structured fields from a descriptor.
///
/// Parse failures are terminal for an ingestion attempt: the input is
/// treated as poisoned and never retried.
#[derive(Error, Diagnostic, Debug)]
pub enum ParseError {
    #[error(transparent)]
    #[diagnostic(
        code(gemmirror_fetch::yaml),
        help("The descriptor is not well-formed YAML")
    )]
    Yaml(#[from] serde_yaml::Error),

    #[error("Descriptor is not a mapping")]
    #[diagnostic(code(gemmirror_fetch::malformed))]
    NotAMapping,

    #[error("Descriptor is missing required field `{0}`")]
    #[diagnostic(code(gemmirror_fetch::missing_field))]
    MissingField(&'static str),
}

/// Extension trait for attaching action context to I/O errors.
pub trait ErrorContext<T> {
    fn with_context<C>(self, context: C) -> Result<T, FetchError>
    where
        C: FnOnce() -> String;
}

impl<T> ErrorContext<T> for std::io::Result<T> {
    fn with_context<C>(self, context: C) -> Result<T, FetchError>
    where
        C: FnOnce() -> String,
    {
        self.map_err(|err| FetchError::IoError {
            action: context(),
            source: err,
        })
    }
}
