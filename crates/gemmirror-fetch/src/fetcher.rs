//! Gem archive retrieval.
//!
//! A `.gem` file is a plain tar archive whose `metadata.gz` member
//! holds the gzipped descriptor. The fetcher downloads the archive,
//! unpacks it into a scratch directory that is removed on every exit
//! path, and returns the decompressed descriptor bytes. No retry is
//! performed here; retry policy belongs to the caller.

use std::io::{Cursor, Read};

use flate2::read::GzDecoder;
use tracing::debug;
use url::Url;

use crate::{
    error::{ErrorContext, FetchError},
    http_client::SHARED_AGENT,
};

/// Sentinel platform value meaning "platform-independent".
pub const RUBY_PLATFORM: &str = "ruby";

/// Archive member containing the gzipped descriptor.
const DESCRIPTOR_MEMBER: &str = "metadata.gz";

/// Ceiling on the decompressed descriptor size. The archive is
/// untrusted input; a tiny gzip member can expand without bound.
const MAX_DESCRIPTOR_BYTES: u64 = 8 * 1024 * 1024;

/// Ceiling on the downloaded archive size. Gems bundling native assets
/// routinely exceed the 10 MiB ureq default, so the body limit is set
/// explicitly.
const MAX_ARCHIVE_BYTES: u64 = 128 * 1024 * 1024;

/// Canonical artifact name: `{name}-{version}`, with the platform
/// appended unless it is the platform-independent sentinel.
pub fn artifact_name(name: &str, version: &str, platform: &str) -> String {
    if platform == RUBY_PLATFORM {
        format!("{name}-{version}")
    } else {
        format!("{name}-{version}-{platform}")
    }
}

/// Downloads gem archives from a configured upstream origin.
#[derive(Clone)]
pub struct ArtifactFetcher {
    upstream_url: String,
}

impl ArtifactFetcher {
    pub fn new(upstream_url: impl Into<String>) -> Self {
        let upstream_url = upstream_url.into();
        Self {
            upstream_url: upstream_url.trim_end_matches('/').to_string(),
        }
    }

    /// Retrieves the raw descriptor bytes for the given identifier.
    pub fn fetch(&self, name: &str, version: &str, platform: &str) -> Result<Vec<u8>, FetchError> {
        let full_name = artifact_name(name, version, platform);
        let url = format!("{}/downloads/{}.gem", self.upstream_url, full_name);
        Url::parse(&url).map_err(|e| FetchError::InvalidUrl(format!("{url}: {e}")))?;

        debug!("fetching gem archive from {url}");

        let resp = match SHARED_AGENT.get(&url).call() {
            Ok(resp) => resp,
            Err(ureq::Error::StatusCode(status)) => {
                return Err(FetchError::HttpError { status, url })
            }
            Err(err) => return Err(err.into()),
        };

        if !resp.status().is_success() {
            return Err(FetchError::HttpError {
                status: resp.status().as_u16(),
                url,
            });
        }

        let archive = resp
            .into_body()
            .with_config()
            .limit(MAX_ARCHIVE_BYTES)
            .read_to_vec()?;
        extract_descriptor(&archive)
    }
}

/// Unpacks the archive into a scratch directory and gunzips the
/// descriptor member. The scratch directory is dropped (and removed)
/// on success and on every error path.
pub fn extract_descriptor(archive: &[u8]) -> Result<Vec<u8>, FetchError> {
    let scratch = tempfile::tempdir().with_context(|| "creating scratch directory".to_string())?;

    let mut tar = tar::Archive::new(Cursor::new(archive));
    tar.unpack(scratch.path())
        .with_context(|| "unpacking gem archive".to_string())?;

    let member_path = scratch.path().join(DESCRIPTOR_MEMBER);
    if !member_path.is_file() {
        return Err(FetchError::MissingMember(DESCRIPTOR_MEMBER.to_string()));
    }

    let compressed = std::fs::read(&member_path)
        .with_context(|| format!("reading {}", member_path.display()))?;

    let mut descriptor = Vec::new();
    let mut decoder = GzDecoder::new(compressed.as_slice()).take(MAX_DESCRIPTOR_BYTES + 1);
    decoder
        .read_to_end(&mut descriptor)
        .with_context(|| format!("decompressing {DESCRIPTOR_MEMBER}"))?;

    if descriptor.len() as u64 > MAX_DESCRIPTOR_BYTES {
        return Err(FetchError::MemberTooLarge {
            limit: MAX_DESCRIPTOR_BYTES,
        });
    }

    Ok(descriptor)
}
