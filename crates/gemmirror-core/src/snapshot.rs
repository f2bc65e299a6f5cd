//! Dependency snapshot service.
//!
//! The resolution algorithm lives behind [`DependencyResolver`]; the
//! default [`DbResolver`] serves previously-ingested dependency rows
//! straight from the catalog. One computed snapshot feeds both response
//! encodings.

use gemmirror_db::{Database, SpecStore};
use tracing::debug;

use crate::{error::MirrorError, MirrorResult};

pub use gemmirror_db::models::DependencyRecord;

/// Resolves a set of package names into dependency records.
pub trait DependencyResolver: Send + Sync {
    fn resolve(&self, names: &[String]) -> MirrorResult<Vec<DependencyRecord>>;
}

/// Catalog-backed resolver: every indexed version of the requested
/// packages, with its stored dependency edges.
pub struct DbResolver {
    db: Database,
}

impl DbResolver {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

impl DependencyResolver for DbResolver {
    fn resolve(&self, names: &[String]) -> MirrorResult<Vec<DependencyRecord>> {
        Ok(self.db.with_conn(|conn| SpecStore::deps_for(conn, names))?)
    }
}

/// Read-side wrapper shaping resolver output for the response encodings.
pub struct SnapshotService<R> {
    resolver: R,
}

impl<R: DependencyResolver> SnapshotService<R> {
    pub fn new(resolver: R) -> Self {
        Self { resolver }
    }

    pub fn snapshot_for(&self, names: &[String]) -> MirrorResult<Vec<DependencyRecord>> {
        let records = self.resolver.resolve(names)?;
        debug!(
            requested = names.len(),
            records = records.len(),
            "computed dependency snapshot"
        );
        Ok(records)
    }
}

/// Compact, deterministic binary encoding of a snapshot.
pub fn encode_binary(records: &[DependencyRecord]) -> MirrorResult<Vec<u8>> {
    bincode::serialize(records).map_err(|e| MirrorError::Encode(e.to_string()))
}

/// JSON encoding of the same snapshot.
pub fn encode_json(records: &[DependencyRecord]) -> MirrorResult<String> {
    serde_json::to_string(records).map_err(|e| MirrorError::Encode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedResolver(Vec<DependencyRecord>);

    impl DependencyResolver for FixedResolver {
        fn resolve(&self, _names: &[String]) -> MirrorResult<Vec<DependencyRecord>> {
            Ok(self.0.clone())
        }
    }

    fn sample() -> Vec<DependencyRecord> {
        vec![DependencyRecord {
            name: "foo".to_string(),
            version: "1.0.0".to_string(),
            platform: "ruby".to_string(),
            dependencies: vec![("bar".to_string(), ">= 2.0".to_string())],
        }]
    }

    #[test]
    fn both_encodings_serve_the_same_snapshot() {
        let service = SnapshotService::new(FixedResolver(sample()));
        let records = service.snapshot_for(&["foo".to_string()]).unwrap();

        let binary = encode_binary(&records).unwrap();
        let decoded: Vec<DependencyRecord> = bincode::deserialize(&binary).unwrap();
        assert_eq!(decoded, records);

        let json = encode_json(&records).unwrap();
        assert!(json.contains(r#""name":"foo""#));
        assert!(json.contains(r#""version":"1.0.0""#));
        assert!(json.contains(r#""platform":"ruby""#));
    }

    #[test]
    fn binary_encoding_is_deterministic() {
        let records = sample();
        assert_eq!(
            encode_binary(&records).unwrap(),
            encode_binary(&records).unwrap()
        );
    }
}
