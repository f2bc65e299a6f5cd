//! Ingestion request payloads.

use gemmirror_fetch::fetcher::{artifact_name, RUBY_PLATFORM};
use serde::{Deserialize, Serialize};

/// Fields a webhook payload must carry, in the order they are checked.
pub const REQUIRED_FIELDS: [&str; 4] = ["name", "version", "platform", "prerelease"];

/// A validated ingestion identifier. Transient; never persisted as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestionRequest {
    pub name: String,
    pub version: String,
    pub platform: String,
    pub prerelease: bool,
}

impl IngestionRequest {
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        platform: impl Into<String>,
        prerelease: bool,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            platform: platform.into(),
            prerelease,
        }
    }

    /// Whether the request targets the platform-independent build.
    pub fn is_platform_independent(&self) -> bool {
        self.platform == RUBY_PLATFORM
    }

    /// Canonical display string for the requested artifact.
    pub fn full_name(&self) -> String {
        artifact_name(&self.name, &self.version, &self.platform)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_name_respects_platform_sentinel() {
        let req = IngestionRequest::new("foo", "1.0.0", "ruby", false);
        assert!(req.is_platform_independent());
        assert_eq!(req.full_name(), "foo-1.0.0");

        let req = IngestionRequest::new("foo", "1.0.0", "java", false);
        assert!(!req.is_platform_independent());
        assert_eq!(req.full_name(), "foo-1.0.0-java");
    }
}
