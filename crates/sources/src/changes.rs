//! Change Feed - paging through the registry's global change log
//!
//! Produces one batch of candidate package names per call, plus the cursor
//! to resume from.
//!
//! ## Algorithm
//! 1. Request `page_size` change entries, newest first, resuming at `cursor`
//! 2. Drop internal documents (ids starting with `_`, e.g. `_design/app`)
//! 3. Deduplicate ids within the page, keeping first-seen order
//! 4. Hand back the registry's `last_seq` as the next cursor
//!
//! Ids are only deduplicated within a page. The feed is not filtered
//! server-side, so the same package can show up again on a later page.

use crate::error::SourceError;
use registry::{CandidateId, Cursor, RegistryApi};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// One deduplicated batch of candidates
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Page {
    pub ids: Vec<CandidateId>,
    pub next_cursor: Option<Cursor>,
}

/// Paginator over the registry change feed
#[derive(Clone)]
pub struct ChangeFeed {
    registry: Arc<dyn RegistryApi>,
}

impl ChangeFeed {
    pub fn new(registry: Arc<dyn RegistryApi>) -> Self {
        Self { registry }
    }

    /// Fetch the next page of candidate ids.
    ///
    /// Any failure of the upstream request is reported as
    /// [`SourceError::FeedUnavailable`] and is not retried here.
    #[instrument(skip(self, cursor), fields(cursor = cursor.map(Cursor::as_str)))]
    pub async fn fetch_page(
        &self,
        page_size: usize,
        cursor: Option<&Cursor>,
    ) -> Result<Page, SourceError> {
        let response = self
            .registry
            .changes(page_size, cursor)
            .await
            .map_err(SourceError::FeedUnavailable)?;

        let raw_count = response.results.len();
        let ids = dedupe_ids(response.results.into_iter().map(|entry| entry.id));
        debug!(
            "Feed page: {} entries, {} unique candidates, next cursor {:?}",
            raw_count,
            ids.len(),
            response.last_seq
        );
        if ids.is_empty() && raw_count > 0 {
            info!(
                "Feed page had {} entries but no package candidates; it counts as an empty page",
                raw_count
            );
        }

        Ok(Page {
            ids,
            next_cursor: response.last_seq,
        })
    }
}

/// True for registry-internal documents that are never packages
pub fn is_internal_id(id: &str) -> bool {
    id.is_empty() || id.starts_with('_')
}

/// Strip internal ids and duplicates, preserving first-seen order.
pub fn dedupe_ids(ids: impl IntoIterator<Item = String>) -> Vec<CandidateId> {
    let mut seen = HashSet::new();
    ids.into_iter()
        .filter(|id| !is_internal_id(id))
        .filter(|id| seen.insert(id.clone()))
        .collect()
}
