//! Service configuration.
//!
//! gemmirror is configured entirely through environment variables,
//! optionally overridden by CLI flags in the server binary.

use std::env;

use crate::{error::MirrorError, MirrorResult};

pub const DEFAULT_UPSTREAM_URL: &str = "https://rubygems.org";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";
pub const DEFAULT_DATABASE_PATH: &str = "gemmirror.db";

/// Runtime configuration for the mirror service.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path of the primary (write) catalog database.
    pub database_path: String,
    /// Optional follower database serving the dependency read path.
    /// Falls back to the primary when unset.
    pub follower_database_path: Option<String>,
    /// Shared-secret webhook token. When set, add/remove requests must
    /// carry an exactly matching `rubygems_token`.
    pub token: Option<String>,
    /// Upstream origin for gem archives and passthrough redirects.
    pub upstream_url: String,
    /// Listen address for the HTTP surface.
    pub bind_addr: String,
}

impl Config {
    /// Builds a config from `GEMMIRROR_*` environment variables,
    /// applying defaults for anything unset.
    pub fn from_env() -> MirrorResult<Self> {
        let config = Self {
            database_path: env_or("GEMMIRROR_DATABASE_URL", DEFAULT_DATABASE_PATH),
            follower_database_path: non_empty(env::var("GEMMIRROR_FOLLOWER_DATABASE_URL").ok()),
            token: non_empty(env::var("GEMMIRROR_TOKEN").ok()),
            upstream_url: env_or("GEMMIRROR_UPSTREAM_URL", DEFAULT_UPSTREAM_URL),
            bind_addr: env_or("GEMMIRROR_BIND_ADDR", DEFAULT_BIND_ADDR),
        };

        if !config.upstream_url.starts_with("http://") && !config.upstream_url.starts_with("https://")
        {
            return Err(MirrorError::Config(format!(
                "upstream URL must be http(s): {}",
                config.upstream_url
            )));
        }

        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: DEFAULT_DATABASE_PATH.to_string(),
            follower_database_path: None,
            token: None,
            upstream_url: DEFAULT_UPSTREAM_URL.to_string(),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    non_empty(env::var(key).ok()).unwrap_or_else(|| default.to_string())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
