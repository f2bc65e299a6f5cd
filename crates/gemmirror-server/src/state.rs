//! Shared application state.

use gemmirror_core::{
    config::Config,
    job::IngestionJob,
    snapshot::{DbResolver, SnapshotService},
    MirrorResult,
};
use gemmirror_db::Database;
use gemmirror_fetch::ArtifactFetcher;

pub struct AppState {
    /// Primary catalog handle; all mutation goes through here.
    pub write_db: Database,
    /// Read handle for the snapshot path. Follower when configured,
    /// otherwise the primary.
    pub read_db: Database,
    pub job: IngestionJob,
    pub snapshot: SnapshotService<DbResolver>,
    pub token: Option<String>,
    pub upstream_url: String,
}

impl AppState {
    pub fn from_config(config: &Config) -> MirrorResult<Self> {
        let write_db = Database::open(&config.database_path)?;
        let read_db = match &config.follower_database_path {
            Some(path) => Database::open_follower(path)?,
            None => write_db.clone(),
        };
        Ok(Self::new(write_db, read_db, config))
    }

    pub fn new(write_db: Database, read_db: Database, config: &Config) -> Self {
        let fetcher = ArtifactFetcher::new(config.upstream_url.clone());
        Self {
            job: IngestionJob::new(write_db.clone(), fetcher),
            snapshot: SnapshotService::new(DbResolver::new(read_db.clone())),
            write_db,
            read_db,
            token: config.token.clone(),
            upstream_url: config.upstream_url.trim_end_matches('/').to_string(),
        }
    }
}
