//! Catalog repository: the transactional SpecStore operations.
//!
//! All operations take a `&mut SqliteConnection` so the caller decides
//! the transaction scope. [`SpecStore::upsert_spec`] must run inside a
//! transaction (see [`crate::Database::transaction`]); the other
//! operations are single statements.

use std::collections::HashMap;

use chrono::Utc;
use diesel::prelude::*;
use tracing::trace;

use crate::{
    models::{DependencyRecord, NewDependency, NewPackage, NewPackageVersion, NewSpec},
    schema::{dependencies, package_versions, packages},
};

/// Repository for catalog mutations and the snapshot read path.
pub struct SpecStore;

impl SpecStore {
    /// Returns whether any version row matches the given package name
    /// and version number.
    ///
    /// The platform is deliberately not part of this check: it mirrors
    /// the upstream webhook contract, where a re-publish of a known
    /// number is skipped regardless of platform. The unique index on
    /// (package_id, number, platform) is what actually enforces
    /// at-most-one row per identifier.
    pub fn version_exists(
        conn: &mut SqliteConnection,
        name: &str,
        number: &str,
    ) -> QueryResult<bool> {
        let count: i64 = package_versions::table
            .inner_join(packages::table)
            .filter(packages::name.eq(name))
            .filter(package_versions::number.eq(number))
            .count()
            .get_result(conn)?;
        Ok(count > 0)
    }

    /// Inserts a spec: find-or-create the package, insert the version
    /// row, insert one dependency edge per declared dependency whose
    /// target package is already known. Dependencies on unknown
    /// packages are skipped without error.
    ///
    /// Returns `None` when a concurrent writer already persisted the
    /// same (package, number, platform): the insert is a no-op and no
    /// dependency rows are written.
    ///
    /// Must be called inside a transaction.
    pub fn upsert_spec(conn: &mut SqliteConnection, spec: &NewSpec) -> QueryResult<Option<i32>> {
        let now = Utc::now().to_rfc3339();

        let package_id = Self::find_or_create_package(conn, &spec.name, &now)?;

        let new_version = NewPackageVersion {
            package_id,
            number: &spec.number,
            platform: &spec.platform,
            authors: spec.authors.as_deref(),
            description: spec.description.as_deref(),
            summary: spec.summary.as_deref(),
            full_name: &spec.full_name,
            indexed: true,
            prerelease: false,
            latest: true,
            created_at: &now,
            updated_at: &now,
        };

        // The unique index on (package_id, number, platform) closes the
        // check-then-act race: the loser of a concurrent insert gets no
        // row back and writes nothing further.
        let version_id: Option<i32> = diesel::insert_into(package_versions::table)
            .values(&new_version)
            .on_conflict_do_nothing()
            .returning(package_versions::id)
            .get_result(conn)
            .optional()?;

        let Some(version_id) = version_id else {
            trace!(
                name = spec.name,
                number = spec.number,
                platform = spec.platform,
                "version already present, skipping insert"
            );
            return Ok(None);
        };

        for dep in &spec.dependencies {
            let target_id: Option<i32> = packages::table
                .filter(packages::name.eq(dep.name.as_str()))
                .select(packages::id)
                .first(conn)
                .optional()?;

            let Some(target_id) = target_id else {
                trace!(
                    dependency = dep.name,
                    version = spec.full_name,
                    "dependency target unknown, dropping edge"
                );
                continue;
            };

            diesel::insert_into(dependencies::table)
                .values(&NewDependency {
                    version_id,
                    target_package_id: target_id,
                    requirements: &dep.requirements,
                    scope: &dep.scope,
                    created_at: &now,
                    updated_at: &now,
                })
                .execute(conn)?;
        }

        Ok(Some(version_id))
    }

    /// Marks the matching version as unindexed. Returns whether a row
    /// was affected; nothing is deleted.
    pub fn soft_remove(
        conn: &mut SqliteConnection,
        name: &str,
        number: &str,
        platform: &str,
    ) -> QueryResult<bool> {
        let package_id: Option<i32> = packages::table
            .filter(packages::name.eq(name))
            .select(packages::id)
            .first(conn)
            .optional()?;

        let Some(package_id) = package_id else {
            return Ok(false);
        };

        let now = Utc::now().to_rfc3339();
        let affected = diesel::update(
            package_versions::table
                .filter(package_versions::package_id.eq(package_id))
                .filter(package_versions::number.eq(number))
                .filter(package_versions::platform.eq(platform)),
        )
        .set((
            package_versions::indexed.eq(false),
            package_versions::updated_at.eq(now.as_str()),
        ))
        .execute(conn)?;

        Ok(affected > 0)
    }

    /// Returns every indexed version of the named packages together
    /// with its dependency edges, ordered by (name, number, platform)
    /// so both response encodings are deterministic.
    pub fn deps_for(
        conn: &mut SqliteConnection,
        names: &[String],
    ) -> QueryResult<Vec<DependencyRecord>> {
        let name_refs: Vec<&str> = names.iter().map(String::as_str).collect();

        let versions: Vec<(i32, String, String, String)> = package_versions::table
            .inner_join(packages::table)
            .filter(packages::name.eq_any(name_refs))
            .filter(package_versions::indexed.eq(true))
            .order((
                packages::name.asc(),
                package_versions::number.asc(),
                package_versions::platform.asc(),
            ))
            .select((
                package_versions::id,
                packages::name,
                package_versions::number,
                package_versions::platform,
            ))
            .load(conn)?;

        let ids: Vec<i32> = versions.iter().map(|(id, ..)| *id).collect();

        let edges: Vec<(i32, String, String)> = dependencies::table
            .inner_join(packages::table)
            .filter(dependencies::version_id.eq_any(ids.iter().copied()))
            .order(packages::name.asc())
            .select((
                dependencies::version_id,
                packages::name,
                dependencies::requirements,
            ))
            .load(conn)?;

        let mut by_version: HashMap<i32, Vec<(String, String)>> = HashMap::new();
        for (version_id, dep_name, requirements) in edges {
            by_version
                .entry(version_id)
                .or_default()
                .push((dep_name, requirements));
        }

        Ok(versions
            .into_iter()
            .map(|(id, name, number, platform)| DependencyRecord {
                name,
                version: number,
                platform,
                dependencies: by_version.remove(&id).unwrap_or_default(),
            })
            .collect())
    }

    fn find_or_create_package(
        conn: &mut SqliteConnection,
        name: &str,
        now: &str,
    ) -> QueryResult<i32> {
        // insert-or-ignore then select, so concurrent creators of the
        // same package converge on one row
        diesel::insert_into(packages::table)
            .values(&NewPackage {
                name,
                downloads: 0,
                created_at: now,
                updated_at: now,
            })
            .on_conflict_do_nothing()
            .execute(conn)?;

        packages::table
            .filter(packages::name.eq(name))
            .select(packages::id)
            .first(conn)
    }
}
