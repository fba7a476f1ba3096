//! Shared state for one discovery run.
//!
//! Workers claim candidates from a [`PageQueue`] and append survivors to a
//! [`ResultSet`]. Neither type holds a lock across an `.await`: the queue
//! is a single atomic index, and the result set's mutex is only held for
//! the length check and the push.

use registry::{CandidateId, PackageInfo};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

/// One page of candidates, handed out to workers exactly once each
#[derive(Debug)]
pub struct PageQueue {
    ids: Vec<CandidateId>,
    next: AtomicUsize,
}

impl PageQueue {
    pub fn new(ids: Vec<CandidateId>) -> Self {
        Self {
            ids,
            next: AtomicUsize::new(0),
        }
    }

    /// Claim the next unprocessed candidate, or `None` once the page is drained.
    pub fn next(&self) -> Option<&CandidateId> {
        let index = self.next.fetch_add(1, Ordering::Relaxed);
        self.ids.get(index)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Accepted packages, capped at a fixed limit
#[derive(Debug)]
pub struct ResultSet {
    limit: usize,
    packages: Mutex<Vec<PackageInfo>>,
    full: AtomicBool,
}

impl ResultSet {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            packages: Mutex::new(Vec::with_capacity(limit.min(1024))),
            full: AtomicBool::new(limit == 0),
        }
    }

    /// Append `package` unless the set is already at its limit.
    ///
    /// Returns false when the package was dropped.
    pub fn push(&self, package: PackageInfo) -> bool {
        let mut packages = self.packages.lock().unwrap_or_else(PoisonError::into_inner);
        if packages.len() >= self.limit {
            return false;
        }
        packages.push(package);
        if packages.len() >= self.limit {
            self.full.store(true, Ordering::Release);
        }
        true
    }

    pub fn is_full(&self) -> bool {
        self.full.load(Ordering::Acquire)
    }

    pub fn len(&self) -> usize {
        self.packages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Take the accepted packages, in acceptance order.
    pub fn take(&self) -> Vec<PackageInfo> {
        std::mem::take(&mut *self.packages.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::collections::HashSet;
    use std::sync::Arc;

    fn package(name: &str) -> PackageInfo {
        PackageInfo {
            name: name.to_string(),
            latest_version: "1.0.0".to_string(),
            description: String::new(),
            first_published_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            npm_url: PackageInfo::npm_url_for(name),
            version_count: 1,
            has_executable: false,
            source_line_count: None,
            ai_summary: None,
        }
    }

    #[test]
    fn test_zero_limit_starts_full() {
        let results = ResultSet::new(0);
        assert!(results.is_full());
        assert!(!results.push(package("a")));
        assert!(results.is_empty());
    }

    #[test]
    fn test_push_stops_at_limit() {
        let results = ResultSet::new(2);
        assert!(results.push(package("a")));
        assert!(!results.is_full());
        assert!(results.push(package("b")));
        assert!(results.is_full());
        assert!(!results.push(package("c")));

        let names: Vec<_> = results.take().into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_pushes_never_exceed_limit() {
        let results = Arc::new(ResultSet::new(10));

        let mut handles = Vec::new();
        for i in 0..64 {
            let results = results.clone();
            handles.push(tokio::spawn(async move {
                results.push(package(&format!("pkg-{i}")))
            }));
        }
        let mut accepted = 0;
        for handle in handles {
            if handle.await.unwrap() {
                accepted += 1;
            }
        }

        assert_eq!(accepted, 10);
        assert_eq!(results.len(), 10);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_queue_hands_out_each_id_once() {
        let ids: Vec<String> = (0..500).map(|i| format!("pkg-{i}")).collect();
        let queue = Arc::new(PageQueue::new(ids));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let queue = queue.clone();
            handles.push(tokio::spawn(async move {
                let mut claimed = Vec::new();
                while let Some(id) = queue.next() {
                    claimed.push(id.clone());
                    tokio::task::yield_now().await;
                }
                claimed
            }));
        }

        let mut seen = HashSet::new();
        let mut total = 0;
        for handle in handles {
            for id in handle.await.unwrap() {
                seen.insert(id);
                total += 1;
            }
        }
        assert_eq!(total, 500);
        assert_eq!(seen.len(), 500);
        assert!(queue.next().is_none());
    }
}
