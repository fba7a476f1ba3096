//! Eligibility Resolver - is this candidate a *new* package?
//!
//! Fetches the full registry document for a candidate and decides whether
//! the package's first published version falls inside the recency window.
//!
//! ## Algorithm
//! 1. Fetch the package document (failure: log, treat as not eligible)
//! 2. Require at least one published version
//! 3. Require a known, parseable first-publish timestamp
//! 4. Reject timestamps after `now` (clock skew)
//! 5. Age in whole days = (now - first_published) / 86 400 000 ms, truncated;
//!    keep the package when `age <= recency_window_days`
//! 6. Normalize the document into a [`PackageInfo`]
//!
//! `now` is always passed in. A run captures the wall clock once and threads
//! it through every call so that all candidates are judged against the same
//! instant.

use crate::error::SourceError;
use chrono::{DateTime, Utc};
use registry::{PackageDocument, PackageInfo, RegistryApi};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Turns candidate ids into normalized package info, if recent enough
#[derive(Clone)]
pub struct EligibilityResolver {
    registry: Arc<dyn RegistryApi>,
}

impl EligibilityResolver {
    pub fn new(registry: Arc<dyn RegistryApi>) -> Self {
        Self { registry }
    }

    /// Resolve a candidate against the recency window.
    ///
    /// Metadata fetch failures are logged and reported as `None`; they never
    /// abort the caller.
    #[instrument(skip(self, now))]
    pub async fn resolve(
        &self,
        id: &str,
        recency_window_days: u32,
        now: DateTime<Utc>,
    ) -> Option<PackageInfo> {
        let document = match self.fetch_document(id).await {
            Ok(document) => document,
            Err(err) => {
                warn!("{}", err);
                return None;
            }
        };
        evaluate(id, &document, recency_window_days, now)
    }

    /// Fetch the raw registry document for a candidate.
    pub async fn fetch_document(&self, id: &str) -> Result<PackageDocument, SourceError> {
        self.registry
            .document(id)
            .await
            .map_err(|source| SourceError::MetadataFetchFailed {
                name: id.to_string(),
                source,
            })
    }
}

/// Apply the eligibility rules to an already-fetched document.
pub fn evaluate(
    id: &str,
    document: &PackageDocument,
    recency_window_days: u32,
    now: DateTime<Utc>,
) -> Option<PackageInfo> {
    if document.versions.is_empty() {
        debug!("{}: no published versions", id);
        return None;
    }

    let Some(first_published_at) = document.first_published_at() else {
        debug!("{}: first-publish time unknown", id);
        return None;
    };

    if !is_within_window(first_published_at, now, recency_window_days) {
        debug!(
            "{}: first published {} is outside the {}-day window",
            id, first_published_at, recency_window_days
        );
        return None;
    }

    let latest_version = document.latest_version()?.to_string();
    let manifest = document.version(&latest_version).unwrap_or_default();

    let description = document
        .description
        .as_deref()
        .filter(|d| !d.trim().is_empty())
        .or(manifest.description.as_deref())
        .map(normalize_description)
        .unwrap_or_default();

    Some(PackageInfo {
        name: id.to_string(),
        latest_version,
        description,
        first_published_at,
        npm_url: PackageInfo::npm_url_for(id),
        version_count: document.versions.len(),
        has_executable: manifest.executable_count() > 0,
        source_line_count: None,
        ai_summary: None,
    })
}

/// Whole days elapsed since `first_published_at`, or `None` if it lies in the future.
pub fn age_in_days(first_published_at: DateTime<Utc>, now: DateTime<Utc>) -> Option<i64> {
    let elapsed_ms = (now - first_published_at).num_milliseconds();
    (elapsed_ms >= 0).then(|| elapsed_ms / MILLIS_PER_DAY)
}

/// Inclusive window check: `0 <= age <= recency_window_days`.
pub fn is_within_window(
    first_published_at: DateTime<Utc>,
    now: DateTime<Utc>,
    recency_window_days: u32,
) -> bool {
    age_in_days(first_published_at, now).is_some_and(|age| age <= i64::from(recency_window_days))
}

/// Collapse embedded newlines and tabs into single spaces and trim.
pub fn normalize_description(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut in_break = false;
    for ch in raw.chars() {
        if matches!(ch, '\n' | '\r' | '\t') {
            if !in_break {
                out.push(' ');
                in_break = true;
            }
        } else {
            out.push(ch);
            in_break = false;
        }
    }
    out.trim().to_string()
}
