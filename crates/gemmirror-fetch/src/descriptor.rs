//! Structured extraction of gem descriptors.
//!
//! The descriptor inside a gem archive is a YAML document built from
//! tagged ruby objects (`!ruby/object:Gem::Specification` and friends).
//! Rather than feeding it to a self-describing deserializer, this
//! module walks the parsed value tree and extracts exactly the fields
//! the catalog needs, unwrapping tags structurally. Nothing described
//! by the payload is ever instantiated.

use serde_yaml::Value;

use crate::{
    error::ParseError,
    fetcher::{artifact_name, RUBY_PLATFORM},
};

/// Structured gem descriptor, see [`parse`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GemDescriptor {
    pub name: String,
    pub version: String,
    pub platform: String,
    pub authors: Option<String>,
    pub description: Option<String>,
    pub summary: Option<String>,
    pub dependencies: Vec<DependencyDecl>,
}

/// A declared dependency: target name, requirement string, scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyDecl {
    pub name: String,
    pub requirements: String,
    pub scope: String,
}

impl GemDescriptor {
    /// Display string `name-version`, platform-qualified unless the
    /// descriptor is platform-independent.
    pub fn full_name(&self) -> String {
        artifact_name(&self.name, &self.version, &self.platform)
    }
}

/// Parses raw descriptor bytes into a [`GemDescriptor`].
///
/// Fails when the document is not a mapping or is missing `name`,
/// `version` or `dependencies`.
pub fn parse(bytes: &[u8]) -> Result<GemDescriptor, ParseError> {
    let root: Value = serde_yaml::from_slice(bytes)?;
    let root = untag(&root);

    if !root.is_mapping() {
        return Err(ParseError::NotAMapping);
    }

    let name = field(root, "name")
        .and_then(scalar_string)
        .ok_or(ParseError::MissingField("name"))?;
    let version = field(root, "version")
        .and_then(version_string)
        .ok_or(ParseError::MissingField("version"))?;
    let deps = field(root, "dependencies").ok_or(ParseError::MissingField("dependencies"))?;

    let platform = field(root, "platform")
        .and_then(scalar_string)
        .unwrap_or_else(|| RUBY_PLATFORM.to_string());

    Ok(GemDescriptor {
        name,
        version,
        platform,
        authors: field(root, "authors").and_then(joined_strings),
        description: field(root, "description").and_then(scalar_string),
        summary: field(root, "summary").and_then(scalar_string),
        dependencies: parse_dependencies(deps),
    })
}

fn parse_dependencies(value: &Value) -> Vec<DependencyDecl> {
    let Value::Sequence(entries) = value else {
        return Vec::new();
    };

    entries
        .iter()
        .map(untag)
        .filter_map(|entry| {
            let name = field(entry, "name").and_then(scalar_string)?;
            let requirements = field(entry, "requirement")
                .map(requirement_string)
                .unwrap_or_else(|| ">= 0".to_string());
            let scope = field(entry, "type")
                .and_then(scalar_string)
                .map(|s| s.trim_start_matches(':').to_string())
                .unwrap_or_else(|| "runtime".to_string());

            Some(DependencyDecl {
                name,
                requirements,
                scope,
            })
        })
        .collect()
}

/// Formats a `Gem::Requirement` object (a list of `[operator, version]`
/// pairs) as a single requirement string such as `">= 1.0, < 2.0"`.
fn requirement_string(value: &Value) -> String {
    let value = untag(value);

    let Some(Value::Sequence(pairs)) = field(value, "requirements") else {
        // already a plain requirement string, or nothing usable
        return scalar_string(value).unwrap_or_else(|| ">= 0".to_string());
    };

    let parts: Vec<String> = pairs
        .iter()
        .map(untag)
        .filter_map(|pair| {
            let Value::Sequence(parts) = pair else {
                return None;
            };
            let op = parts.first().map(untag).and_then(scalar_string)?;
            let version = parts.get(1).map(untag).and_then(version_string)?;
            Some(format!("{op} {version}"))
        })
        .collect();

    if parts.is_empty() {
        ">= 0".to_string()
    } else {
        parts.join(", ")
    }
}

/// A version node is either a scalar or a `Gem::Version` object with a
/// nested `version` scalar.
fn version_string(value: &Value) -> Option<String> {
    let value = untag(value);
    match field(value, "version") {
        Some(inner) => scalar_string(inner),
        None => scalar_string(value),
    }
}

/// Recursively strips `!ruby/object:` (and any other) tags.
fn untag(value: &Value) -> &Value {
    match value {
        Value::Tagged(tagged) => untag(&tagged.value),
        other => other,
    }
}

fn field<'a>(map: &'a Value, key: &str) -> Option<&'a Value> {
    map.get(key).map(untag)
}

fn scalar_string(value: &Value) -> Option<String> {
    match untag(value) {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Scalar, or a sequence of scalars joined with `", "`.
fn joined_strings(value: &Value) -> Option<String> {
    match untag(value) {
        Value::Sequence(items) => {
            let joined: Vec<String> = items.iter().filter_map(scalar_string).collect();
            if joined.is_empty() {
                None
            } else {
                Some(joined.join(", "))
            }
        }
        other => scalar_string(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DESCRIPTOR: &str = r#"--- !ruby/object:Gem::Specification
name: foo
version: !ruby/object:Gem::Version
  version: 1.0.0
platform: ruby
authors:
- Jane Doe
- John Smith
autorequire:
summary: A test gem
description: A longer description of the test gem.
dependencies:
- !ruby/object:Gem::Dependency
  name: bar
  requirement: !ruby/object:Gem::Requirement
    requirements:
    - - ">="
      - !ruby/object:Gem::Version
        version: '2.0'
    - - "<"
      - !ruby/object:Gem::Version
        version: '3.0'
  type: :runtime
  prerelease: false
- !ruby/object:Gem::Dependency
  name: rake
  requirement: !ruby/object:Gem::Requirement
    requirements:
    - - ">="
      - !ruby/object:Gem::Version
        version: '0'
  type: :development
  prerelease: false
"#;

    #[test]
    fn parses_tagged_specification() {
        let spec = parse(DESCRIPTOR.as_bytes()).unwrap();

        assert_eq!(spec.name, "foo");
        assert_eq!(spec.version, "1.0.0");
        assert_eq!(spec.platform, "ruby");
        assert_eq!(spec.authors.as_deref(), Some("Jane Doe, John Smith"));
        assert_eq!(spec.summary.as_deref(), Some("A test gem"));
        assert_eq!(spec.full_name(), "foo-1.0.0");

        assert_eq!(spec.dependencies.len(), 2);
        assert_eq!(
            spec.dependencies[0],
            DependencyDecl {
                name: "bar".to_string(),
                requirements: ">= 2.0, < 3.0".to_string(),
                scope: "runtime".to_string(),
            }
        );
        assert_eq!(spec.dependencies[1].scope, "development");
        assert_eq!(spec.dependencies[1].requirements, ">= 0");
    }

    #[test]
    fn platform_defaults_to_ruby() {
        let spec = parse(b"name: foo\nversion: 1.0.0\ndependencies: []\n").unwrap();
        assert_eq!(spec.platform, "ruby");
        assert!(spec.dependencies.is_empty());
    }

    #[test]
    fn platform_qualifies_full_name() {
        let spec =
            parse(b"name: foo\nversion: 1.0.0\nplatform: x64-mingw32\ndependencies: []\n").unwrap();
        assert_eq!(spec.full_name(), "foo-1.0.0-x64-mingw32");
    }

    #[test]
    fn missing_required_fields() {
        assert!(matches!(
            parse(b"version: 1.0.0\ndependencies: []\n"),
            Err(ParseError::MissingField("name"))
        ));
        assert!(matches!(
            parse(b"name: foo\ndependencies: []\n"),
            Err(ParseError::MissingField("version"))
        ));
        assert!(matches!(
            parse(b"name: foo\nversion: 1.0.0\n"),
            Err(ParseError::MissingField("dependencies"))
        ));
    }

    #[test]
    fn rejects_non_mapping_documents() {
        assert!(matches!(parse(b"- just\n- a\n- list\n"), Err(ParseError::NotAMapping)));
    }

    #[test]
    fn rejects_invalid_yaml() {
        assert!(matches!(parse(b"\x00\xff\xfe"), Err(ParseError::Yaml(_))));
    }

    #[test]
    fn dependency_entries_without_a_name_are_skipped() {
        let spec = parse(
            b"name: foo\nversion: 1.0.0\ndependencies:\n- type: :runtime\n- name: bar\n",
        )
        .unwrap();
        assert_eq!(spec.dependencies.len(), 1);
        assert_eq!(spec.dependencies[0].name, "bar");
        // no requirement object present: open-ended constraint
        assert_eq!(spec.dependencies[0].requirements, ">= 0");
    }
}
