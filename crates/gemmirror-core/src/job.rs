//! The ingestion job: fetch, parse, persist.

use gemmirror_db::{
    models::{NewSpec, SpecDependency},
    Database, SpecStore,
};
use gemmirror_fetch::{descriptor, ArtifactFetcher, GemDescriptor};
use tracing::{debug, info};

use crate::{request::IngestionRequest, MirrorResult};

/// Terminal state of one ingestion run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    /// The identifier was already in the catalog; nothing was done.
    Skipped,
    /// The version and its dependency edges were persisted.
    Persisted { version_id: i32 },
    /// A concurrent writer persisted the same identifier first; the
    /// store is unchanged by this run.
    Deduplicated,
}

/// Runs the full ingestion sequence for one identifier:
/// check-existing, fetch, parse, persist. The job performs no internal
/// retry; every failure propagates to the caller.
pub struct IngestionJob {
    db: Database,
    fetcher: ArtifactFetcher,
}

impl IngestionJob {
    pub fn new(db: Database, fetcher: ArtifactFetcher) -> Self {
        Self { db, fetcher }
    }

    pub fn run(&self, request: &IngestionRequest) -> MirrorResult<JobOutcome> {
        let exists = self
            .db
            .with_conn(|conn| SpecStore::version_exists(conn, &request.name, &request.version))?;

        if exists {
            debug!(gem = request.full_name(), "version already mirrored, skipping");
            return Ok(JobOutcome::Skipped);
        }

        info!(gem = request.full_name(), "ingesting gem");

        let bytes = self
            .fetcher
            .fetch(&request.name, &request.version, &request.platform)?;
        let descriptor = descriptor::parse(&bytes)?;
        let spec = to_new_spec(&descriptor);

        let version_id = self
            .db
            .transaction(|conn| SpecStore::upsert_spec(conn, &spec))?;

        match version_id {
            Some(version_id) => Ok(JobOutcome::Persisted { version_id }),
            None => {
                debug!(gem = request.full_name(), "lost insert race, deduplicated");
                Ok(JobOutcome::Deduplicated)
            }
        }
    }
}

fn to_new_spec(descriptor: &GemDescriptor) -> NewSpec {
    NewSpec {
        name: descriptor.name.clone(),
        number: descriptor.version.clone(),
        platform: descriptor.platform.clone(),
        authors: descriptor.authors.clone(),
        description: descriptor.description.clone(),
        summary: descriptor.summary.clone(),
        full_name: descriptor.full_name(),
        dependencies: descriptor
            .dependencies
            .iter()
            .map(|dep| SpecDependency {
                name: dep.name.clone(),
                requirements: dep.requirements.clone(),
                scope: dep.scope.clone(),
            })
            .collect(),
    }
}
