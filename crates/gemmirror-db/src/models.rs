//! Row and insert models for the catalog tables.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::schema::{dependencies, package_versions, packages};

/// A mirrored package, unique by name. Never deleted.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = packages)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Package {
    pub id: i32,
    pub name: String,
    pub downloads: i64,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = packages)]
pub struct NewPackage<'a> {
    pub name: &'a str,
    pub downloads: i64,
    pub created_at: &'a str,
    pub updated_at: &'a str,
}

/// One published version of a package, keyed by (package, number, platform).
/// `indexed = false` excludes the row from resolution without deleting it.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = package_versions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PackageVersion {
    pub id: i32,
    pub package_id: i32,
    pub number: String,
    pub platform: String,
    pub authors: Option<String>,
    pub description: Option<String>,
    pub summary: Option<String>,
    pub full_name: String,
    pub indexed: bool,
    pub prerelease: bool,
    pub latest: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = package_versions)]
pub struct NewPackageVersion<'a> {
    pub package_id: i32,
    pub number: &'a str,
    pub platform: &'a str,
    pub authors: Option<&'a str>,
    pub description: Option<&'a str>,
    pub summary: Option<&'a str>,
    pub full_name: &'a str,
    pub indexed: bool,
    pub prerelease: bool,
    pub latest: bool,
    pub created_at: &'a str,
    pub updated_at: &'a str,
}

/// A dependency edge from a version to a target package. The version
/// constraint is kept as a free-text requirement string.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = dependencies)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Dependency {
    pub id: i32,
    pub version_id: i32,
    pub target_package_id: i32,
    pub requirements: String,
    pub scope: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = dependencies)]
pub struct NewDependency<'a> {
    pub version_id: i32,
    pub target_package_id: i32,
    pub requirements: &'a str,
    pub scope: &'a str,
    pub created_at: &'a str,
    pub updated_at: &'a str,
}

/// Fully-described spec as handed to [`crate::SpecStore::upsert_spec`].
/// Produced by the descriptor parser; the store does not care where the
/// bytes came from.
#[derive(Debug, Clone)]
pub struct NewSpec {
    pub name: String,
    pub number: String,
    pub platform: String,
    pub authors: Option<String>,
    pub description: Option<String>,
    pub summary: Option<String>,
    pub full_name: String,
    pub dependencies: Vec<SpecDependency>,
}

/// One declared dependency of a spec.
#[derive(Debug, Clone)]
pub struct SpecDependency {
    pub name: String,
    pub requirements: String,
    pub scope: String,
}

/// One entry of a dependency snapshot: a version together with its
/// dependency edges as (name, requirement) pairs. Serialized as-is for
/// both the binary and the JSON response encodings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyRecord {
    pub name: String,
    pub version: String,
    pub platform: String,
    pub dependencies: Vec<(String, String)>,
}
