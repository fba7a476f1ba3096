//! Core domain types for registry discovery.
//!
//! This module holds two kinds of types:
//! - Wire types that mirror the registry's JSON documents
//!   (`ChangesResponse`, `PackageDocument`, `VersionManifest`)
//! - Normalized domain types produced by discovery (`PackageInfo`)

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;

// =============================================================================
// Identifiers
// =============================================================================

/// Registry document identifier pulled from the change feed (the package name)
pub type CandidateId = String;

/// Opaque resumption token for the change feed.
///
/// The registry reports `last_seq` either as a JSON number or as a string
/// depending on the replica; both are normalized to a string here and
/// handed back verbatim as `since=` on the next request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Cursor(String);

impl Cursor {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawSeq {
    Number(u64),
    Text(String),
}

impl<'de> Deserialize<'de> for Cursor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match RawSeq::deserialize(deserializer)? {
            RawSeq::Number(n) => Cursor(n.to_string()),
            RawSeq::Text(s) => Cursor(s),
        })
    }
}

// =============================================================================
// Change feed
// =============================================================================

/// One page of the registry's global change feed
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChangesResponse {
    #[serde(default)]
    pub results: Vec<ChangeEntry>,
    #[serde(default)]
    pub last_seq: Option<Cursor>,
}

/// A single change entry; only the document id matters to discovery
#[derive(Debug, Clone, Deserialize)]
pub struct ChangeEntry {
    pub id: String,
}

// =============================================================================
// Package documents
// =============================================================================

/// Full registry document for one package.
///
/// `versions` is kept as an insertion-ordered JSON map so that "the last
/// published key" is meaningful when no `latest` dist-tag exists.
///
/// Only `versions` has to have the right shape. Every other field that
/// holds an unexpected JSON type decodes as empty instead of failing the
/// whole document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PackageDocument {
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub description: Option<String>,
    #[serde(default)]
    pub versions: Map<String, Value>,
    #[serde(default, deserialize_with = "lenient")]
    pub time: Map<String, Value>,
    #[serde(default, rename = "dist-tags", deserialize_with = "lenient")]
    pub dist_tags: Map<String, Value>,
}

impl PackageDocument {
    /// Version pointed to by the `latest` dist-tag, or the last key of `versions`
    pub fn latest_version(&self) -> Option<&str> {
        self.dist_tags
            .get("latest")
            .and_then(Value::as_str)
            .or_else(|| self.versions.keys().last().map(String::as_str))
    }

    /// Decode one entry of the versions map.
    ///
    /// Fields of the wrong type are dropped one by one; an entry that is
    /// not a JSON object at all decodes as an empty manifest.
    pub fn version(&self, version: &str) -> Option<VersionManifest> {
        self.versions
            .get(version)
            .map(|raw| serde_json::from_value(raw.clone()).unwrap_or_default())
    }

    /// When the package was first published.
    ///
    /// Uses `time.created`. Documents without it fall back to the earliest
    /// per-version timestamp. A present but unparseable `created` yields
    /// `None`.
    pub fn first_published_at(&self) -> Option<DateTime<Utc>> {
        if let Some(created) = self.time.get("created") {
            return created.as_str().and_then(parse_timestamp);
        }
        self.versions
            .keys()
            .filter_map(|v| self.time.get(v).and_then(Value::as_str))
            .filter_map(parse_timestamp)
            .min()
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}

/// Metadata for a single published version
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VersionManifest {
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub version: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub description: Option<String>,
    /// Either a string (one executable named after the package) or a map
    /// of executable name to script path
    #[serde(default)]
    pub bin: Option<Value>,
    #[serde(default, deserialize_with = "lenient")]
    pub dist: Dist,
}

impl VersionManifest {
    /// Number of named executables this version installs
    pub fn executable_count(&self) -> usize {
        match &self.bin {
            Some(Value::String(path)) if !path.trim().is_empty() => 1,
            Some(Value::Object(entries)) => entries.keys().filter(|k| !k.is_empty()).count(),
            _ => 0,
        }
    }
}

/// Distribution info attached to a version manifest
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Dist {
    #[serde(default, deserialize_with = "lenient")]
    pub tarball: Option<String>,
}

/// Decode a field on its own, falling back to the default when the
/// registry sent a value of another JSON type.
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(raw).unwrap_or_default())
}

// =============================================================================
// Normalized package info
// =============================================================================

/// A package that passed the recency check, normalized for filtering and output.
///
/// `source_line_count` is filled lazily by the source-size filter, and
/// `ai_summary` only by an external summarizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageInfo {
    pub name: String,
    pub latest_version: String,
    pub description: String,
    pub first_published_at: DateTime<Utc>,
    pub npm_url: String,
    pub version_count: usize,
    pub has_executable: bool,
    pub source_line_count: Option<u64>,
    pub ai_summary: Option<String>,
}

impl PackageInfo {
    /// Public web page for a package
    pub fn npm_url_for(name: &str) -> String {
        format!("https://www.npmjs.com/package/{name}")
    }
}
