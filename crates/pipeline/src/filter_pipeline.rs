//! The FilterPipeline evaluates filters against one package at a time.
//!
//! Filters run cheapest first and stop at the first rejection, so the
//! archive download behind the source-size filter only happens for
//! packages that already passed everything else.

use crate::filter_spec::FilterSpec;
use crate::filters::{ExecutableFilter, SourceSizeFilter, TextFilter};
use crate::traits::{Filter, Verdict};
use anyhow::Result;
use line_counter::LineCounter;
use registry::PackageInfo;
use std::sync::Arc;
use tracing;

/// What a failed line count means for the source-size filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LineCountFailurePolicy {
    /// Attach a count of 0 and let the threshold decide
    #[default]
    TreatAsZero,
    /// Skip the size check for this package and leave the count unset
    KeepUncounted,
}

/// Chains multiple filters together into an ordered, short-circuiting check.
///
/// ## Usage
/// ```ignore
/// let pipeline = FilterPipeline::new()
///     .with_line_counter(counter)
///     .add_filter(SourceSizeFilter::new(500))
///     .add_filter(ExecutableFilter);
///
/// // ExecutableFilter runs first: it is cheaper
/// let keep = pipeline.apply(&mut package).await;
/// ```
pub struct FilterPipeline {
    filters: Vec<Box<dyn Filter>>,
    line_counter: Option<Arc<dyn LineCounter>>,
    failure_policy: LineCountFailurePolicy,
}

impl FilterPipeline {
    /// Create a new empty FilterPipeline.
    pub fn new() -> Self {
        Self {
            filters: Vec::new(),
            line_counter: None,
            failure_policy: LineCountFailurePolicy::default(),
        }
    }

    /// Build the standard chain for a run: executable, text, source size.
    ///
    /// Only enabled filters are installed.
    pub fn from_spec(spec: &FilterSpec, line_counter: Arc<dyn LineCounter>) -> Result<Self> {
        let mut pipeline = Self::new().with_line_counter(line_counter);

        if spec.require_executable() {
            pipeline = pipeline.add_filter(ExecutableFilter);
        }
        if !spec.search_terms().is_empty() {
            let text = TextFilter::new(spec.search_terms(), spec.partial_match())?;
            pipeline = pipeline.add_filter(text);
        }
        if let Some(min_lines) = spec.min_source_lines() {
            pipeline = pipeline.add_filter(SourceSizeFilter::new(min_lines));
        }
        Ok(pipeline)
    }

    /// Add a filter to the pipeline (builder pattern).
    ///
    /// Filters stay sorted by cost; filters of equal cost keep insertion order.
    pub fn add_filter(mut self, filter: impl Filter + 'static) -> Self {
        self.filters.push(Box::new(filter));
        self.filters.sort_by_key(|f| f.cost());
        self
    }

    pub fn with_line_counter(mut self, counter: Arc<dyn LineCounter>) -> Self {
        self.line_counter = Some(counter);
        self
    }

    pub fn with_failure_policy(mut self, policy: LineCountFailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Names of the installed filters, in evaluation order
    pub fn filter_names(&self) -> Vec<&str> {
        self.filters.iter().map(|f| f.name()).collect()
    }

    /// Run every filter against `package`, in order.
    ///
    /// ## Algorithm
    /// 1. Evaluate the next filter
    /// 2. On `NeedsLineCount`, count lines, attach the count, evaluate again
    /// 3. On `Reject`, stop and return false
    /// 4. Return true once every filter accepted
    ///
    /// `package.source_line_count` is filled in as a side effect when a
    /// count was needed.
    pub async fn apply(&self, package: &mut PackageInfo) -> bool {
        for filter in &self.filters {
            let verdict = match filter.evaluate(package) {
                Verdict::NeedsLineCount => match self.count_lines(package).await {
                    Some(lines) => {
                        package.source_line_count = Some(lines);
                        filter.evaluate(package)
                    }
                    None => continue,
                },
                verdict => verdict,
            };

            if verdict == Verdict::Reject {
                tracing::debug!("{} rejected by {}", package.name, filter.name());
                return false;
            }
        }
        true
    }

    /// Count lines for `package`, applying the failure policy.
    ///
    /// `None` means the size check should be skipped.
    async fn count_lines(&self, package: &PackageInfo) -> Option<u64> {
        let result = match &self.line_counter {
            Some(counter) => counter
                .try_count(&package.name, &package.latest_version)
                .await
                .map_err(|err| err.to_string()),
            None => Err("no line counter configured".to_string()),
        };

        match (result, self.failure_policy) {
            (Ok(lines), _) => Some(lines),
            (Err(reason), LineCountFailurePolicy::TreatAsZero) => {
                tracing::warn!("{}: {}; counting as 0 lines", package.name, reason);
                Some(0)
            }
            (Err(reason), LineCountFailurePolicy::KeepUncounted) => {
                tracing::warn!("{}: {}; skipping size check", package.name, reason);
                None
            }
        }
    }
}

impl Default for FilterPipeline {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FixedLineCounter, package};

    #[tokio::test]
    async fn test_empty_pipeline_accepts() {
        let pipeline = FilterPipeline::new();
        let mut pkg = package("anything", "");

        assert!(pipeline.apply(&mut pkg).await);
        assert_eq!(pkg.source_line_count, None);
    }

    #[test]
    fn test_network_filter_sorted_last() {
        let pipeline = FilterPipeline::new()
            .add_filter(SourceSizeFilter::new(10))
            .add_filter(ExecutableFilter)
            .add_filter(TextFilter::new(&["x"], true).unwrap());

        assert_eq!(
            pipeline.filter_names(),
            vec!["ExecutableFilter", "TextFilter", "SourceSizeFilter"]
        );
    }

    #[test]
    fn test_from_spec_installs_enabled_filters_only() {
        let counter = Arc::new(FixedLineCounter::ok(0));

        let none = FilterPipeline::from_spec(&FilterSpec::new(), counter.clone()).unwrap();
        assert!(none.filter_names().is_empty());

        let spec = FilterSpec::new()
            .with_search_terms(["cli"])
            .with_min_source_lines(Some(0))
            .with_require_executable(true);
        let all = FilterPipeline::from_spec(&spec, counter).unwrap();
        assert_eq!(
            all.filter_names(),
            vec!["ExecutableFilter", "TextFilter", "SourceSizeFilter"]
        );
    }

    #[tokio::test]
    async fn test_cheap_rejection_skips_line_count() {
        let counter = Arc::new(FixedLineCounter::ok(1_000));
        let spec = FilterSpec::new()
            .with_require_executable(true)
            .with_min_source_lines(Some(10));
        let pipeline = FilterPipeline::from_spec(&spec, counter.clone()).unwrap();

        let mut lib = package("plain-lib", "");
        assert!(!pipeline.apply(&mut lib).await);
        assert_eq!(counter.calls(), 0);
        assert_eq!(lib.source_line_count, None);
    }

    #[tokio::test]
    async fn test_line_count_attached_and_compared() {
        let counter = Arc::new(FixedLineCounter::ok(42));

        let lenient = FilterPipeline::new()
            .with_line_counter(counter.clone())
            .add_filter(SourceSizeFilter::new(0));
        let mut pkg = package("measured", "");
        assert!(lenient.apply(&mut pkg).await);
        assert_eq!(pkg.source_line_count, Some(42));

        let strict = FilterPipeline::new()
            .with_line_counter(counter.clone())
            .add_filter(SourceSizeFilter::new(43));
        let mut pkg = package("measured", "");
        assert!(!strict.apply(&mut pkg).await);
        assert_eq!(pkg.source_line_count, Some(42));
        assert_eq!(counter.calls(), 2);
    }

    #[tokio::test]
    async fn test_failure_policies() {
        let counter = Arc::new(FixedLineCounter::failing());

        let as_zero = FilterPipeline::new()
            .with_line_counter(counter.clone())
            .add_filter(SourceSizeFilter::new(1));
        let mut pkg = package("unreachable", "");
        assert!(!as_zero.apply(&mut pkg).await);
        assert_eq!(pkg.source_line_count, Some(0));

        let keep = FilterPipeline::new()
            .with_line_counter(counter)
            .with_failure_policy(LineCountFailurePolicy::KeepUncounted)
            .add_filter(SourceSizeFilter::new(1));
        let mut pkg = package("unreachable", "");
        assert!(keep.apply(&mut pkg).await);
        assert_eq!(pkg.source_line_count, None);
    }
}
