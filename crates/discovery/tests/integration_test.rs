//! End-to-end discovery runs against an in-memory registry.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use discovery::{Budget, DiscoveryError, DiscoveryOrchestrator, StopReason, discover};
use pipeline::{Filter, FilterPipeline, FilterSpec, LineCountFailurePolicy, Verdict};
use registry::PackageInfo;
use registry::memory::MemoryRegistry;
use serde_json::{Value, json};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
}

fn document(name: &str, age_days: i64, description: &str, bin: Option<Value>) -> Value {
    let created = (now() - Duration::days(age_days)).to_rfc3339();
    let mut manifest = json!({"name": name, "version": "1.0.0", "description": description});
    if let Some(bin) = bin {
        manifest["bin"] = bin;
    }
    json!({
        "name": name,
        "description": description,
        "dist-tags": {"latest": "1.0.0"},
        "versions": {"1.0.0": manifest},
        "time": {"created": created, "1.0.0": created}
    })
}

/// `pages` pages of `per_page` fresh packages each, chained by cursor.
fn paged_registry(pages: usize, per_page: usize) -> MemoryRegistry {
    let mut registry = MemoryRegistry::new().with_jitter(5);
    for page in 0..pages {
        let names: Vec<String> = (0..per_page).map(|i| format!("pkg-{page}-{i}")).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let since = (page > 0).then(|| page.to_string());
        let next = (page + 1).to_string();
        registry = registry.with_page(since.as_deref(), &refs, Some(next.as_str()));
        for name in &names {
            registry = registry.with_document(name, document(name, 1, "", None));
        }
    }
    registry
}

fn names(report: &discovery::DiscoveryReport) -> BTreeSet<String> {
    report.packages.iter().map(|p| p.name.clone()).collect()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_result_set_never_exceeds_max_results() {
    for concurrency in [1, 4, 16] {
        let registry = Arc::new(paged_registry(3, 20));
        let orchestrator = DiscoveryOrchestrator::new(registry.clone(), FilterPipeline::new());
        let budget = Budget {
            max_results: 5,
            concurrency,
            ..Budget::default()
        };

        let report = orchestrator.discover(&budget, now()).await.unwrap();
        assert_eq!(report.packages.len(), 5, "concurrency {concurrency}");
        assert_eq!(report.stop_reason, StopReason::ResultsFull);
        assert_eq!(registry.feed_calls(), 1);

        // Once full, no worker claims another candidate; only work already
        // in flight on the other workers may finish
        let fetched = registry.document_calls();
        if concurrency == 1 {
            assert_eq!(fetched, 5);
        } else {
            assert!(
                fetched <= 5 + concurrency - 1,
                "concurrency {concurrency} fetched {fetched} documents"
            );
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_membership_independent_of_concurrency() {
    let mut memberships = Vec::new();
    for concurrency in [1, 4, 16] {
        let registry = Arc::new(
            paged_registry(2, 15)
                .with_document("pkg-0-3", document("pkg-0-3", 30, "", None))
                .with_document("pkg-1-7", document("pkg-1-7", 8, "", None)),
        );
        let orchestrator = DiscoveryOrchestrator::new(registry, FilterPipeline::new());
        let budget = Budget {
            concurrency,
            ..Budget::default()
        };

        let report = orchestrator.discover(&budget, now()).await.unwrap();
        assert_eq!(report.stop_reason, StopReason::FeedExhausted);
        assert_eq!(report.candidates_seen, 30);
        memberships.push(names(&report));
    }

    assert_eq!(memberships[0].len(), 28);
    assert!(!memberships[0].contains("pkg-0-3"));
    assert!(!memberships[0].contains("pkg-1-7"));
    assert_eq!(memberships[0], memberships[1]);
    assert_eq!(memberships[1], memberships[2]);
}

#[tokio::test]
async fn test_empty_page_ends_pagination() {
    let registry = Arc::new(
        paged_registry(2, 3).with_page(Some("2"), &[], Some("3")),
    );
    let orchestrator = DiscoveryOrchestrator::new(registry.clone(), FilterPipeline::new());

    let report = orchestrator.discover(&Budget::default(), now()).await.unwrap();
    assert_eq!(report.stop_reason, StopReason::FeedExhausted);
    assert_eq!(report.pages_fetched, 3);
    assert_eq!(registry.feed_calls(), 3);
    assert_eq!(report.packages.len(), 6);
}

#[tokio::test]
async fn test_page_budget_limits_fetches() {
    let registry = Arc::new(paged_registry(5, 2));
    let orchestrator = DiscoveryOrchestrator::new(registry.clone(), FilterPipeline::new());
    let budget = Budget {
        max_pages: 2,
        ..Budget::default()
    };

    let report = orchestrator.discover(&budget, now()).await.unwrap();
    assert_eq!(report.stop_reason, StopReason::PageBudgetReached);
    assert_eq!(registry.feed_calls(), 2);
    assert_eq!(report.packages.len(), 4);
}

#[tokio::test]
async fn test_feed_failure_aborts_run() {
    let registry = Arc::new(paged_registry(1, 3).with_feed_failure(Some("1"), 503));
    let orchestrator = DiscoveryOrchestrator::new(registry, FilterPipeline::new());

    let err = orchestrator
        .discover(&Budget::default(), now())
        .await
        .unwrap_err();
    assert!(matches!(err, DiscoveryError::FeedUnavailable(_)));
}

#[tokio::test]
async fn test_metadata_failures_are_skipped() {
    // "ghost" has no document; "_design/app" is internal
    let registry = Arc::new(
        MemoryRegistry::new()
            .with_page(None, &["ghost", "real", "_design/app", "real"], Some("1"))
            .with_document("real", document("real", 0, "", None)),
    );
    let orchestrator = DiscoveryOrchestrator::new(registry.clone(), FilterPipeline::new());

    let report = orchestrator.discover(&Budget::default(), now()).await.unwrap();
    assert_eq!(names(&report), BTreeSet::from(["real".to_string()]));
    assert_eq!(report.candidates_seen, 2);
    assert_eq!(registry.document_calls(), 2);
}

#[tokio::test]
async fn test_discover_applies_filter_spec() {
    let registry = Arc::new(
        MemoryRegistry::new()
            .with_page(
                None,
                &["json-tool", "json-lib", "yaml-tool"],
                Some("1"),
            )
            .with_document(
                "json-tool",
                document("json-tool", 2, "Format JSON files", Some(json!("./cli.js"))),
            )
            .with_document("json-lib", document("json-lib", 2, "Parse JSON", None))
            .with_document(
                "yaml-tool",
                document("yaml-tool", 2, "Format YAML", Some(json!({"yt": "./cli.js"}))),
            ),
    );
    let spec = FilterSpec::new()
        .with_search_terms(["json"])
        .with_require_executable(true);

    let report = discover(registry, &spec, &Budget::default(), now())
        .await
        .unwrap();
    assert_eq!(names(&report), BTreeSet::from(["json-tool".to_string()]));
    assert!(report.packages[0].has_executable);
    assert_eq!(report.packages[0].source_line_count, None);
}

#[tokio::test]
async fn test_keep_uncounted_policy_through_orchestrator() {
    // No tarball URL anywhere, so every line count fails
    let registry = Arc::new(
        MemoryRegistry::new()
            .with_page(None, &["a", "b"], Some("1"))
            .with_document("a", document("a", 1, "", None))
            .with_document("b", document("b", 1, "", None)),
    );
    let spec = FilterSpec::new().with_min_source_lines(Some(10));

    let strict =
        DiscoveryOrchestrator::from_spec(registry.clone(), &spec, LineCountFailurePolicy::TreatAsZero)
            .unwrap();
    let report = strict.discover(&Budget::default(), now()).await.unwrap();
    assert!(report.packages.is_empty());

    let lenient = DiscoveryOrchestrator::from_spec(
        registry,
        &spec,
        LineCountFailurePolicy::KeepUncounted,
    )
    .unwrap();
    let report = lenient.discover(&Budget::default(), now()).await.unwrap();
    assert_eq!(report.packages.len(), 2);
    assert!(report.packages.iter().all(|p| p.source_line_count.is_none()));
}

/// Panics when it sees one particular package
struct PanicsOn(&'static str);

impl Filter for PanicsOn {
    fn name(&self) -> &str {
        "PanicsOn"
    }

    fn evaluate(&self, package: &PackageInfo) -> Verdict {
        if package.name == self.0 {
            panic!("filter failed on {}", package.name);
        }
        Verdict::Accept
    }
}

#[tokio::test]
async fn test_worker_failure_stops_remaining_workers() {
    let names: Vec<String> = std::iter::once("boom".to_string())
        .chain((0..100).map(|i| format!("pkg-{i}")))
        .collect();
    let refs: Vec<&str> = names.iter().map(String::as_str).collect();
    let mut registry = MemoryRegistry::new()
        .with_jitter(5)
        .with_page(None, &refs, Some("1"));
    for name in &names {
        registry = registry.with_document(name, document(name, 1, "", None));
    }
    let registry = Arc::new(registry);

    let orchestrator = DiscoveryOrchestrator::new(
        registry.clone(),
        FilterPipeline::new().add_filter(PanicsOn("boom")),
    );
    let budget = Budget {
        concurrency: 2,
        max_results: 200,
        ..Budget::default()
    };

    let err = orchestrator.discover(&budget, now()).await.unwrap_err();
    assert!(matches!(err, DiscoveryError::WorkerFailed(_)));

    // The surviving worker was aborted and makes no further requests
    let fetched = registry.document_calls();
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    assert_eq!(registry.document_calls(), fetched);
    assert!(fetched < names.len());
}
