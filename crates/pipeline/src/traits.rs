//! Core traits for the filter chain.
//!
//! A filter looks at one resolved package and answers with a [`Verdict`].
//! Filters are pure: anything that needs I/O is expressed as
//! [`Verdict::NeedsLineCount`] and satisfied by the pipeline.

use registry::PackageInfo;

/// Outcome of evaluating one filter against one package
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Accept,
    Reject,
    /// The filter cannot decide until `source_line_count` is known
    NeedsLineCount,
}

/// Relative cost of deciding a filter, cheapest first.
///
/// The pipeline orders filters by this, so anything that may trigger a
/// download always runs after every in-memory check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FilterCost {
    /// Decided from fields already on the package
    Cheap,
    /// May require downloading the package archive
    Network,
}

/// Core trait for filtering packages.
///
/// `Send + Sync` so one pipeline can be shared by every discovery worker.
pub trait Filter: Send + Sync {
    /// Returns the name of this filter (for logging/debugging)
    fn name(&self) -> &str;

    /// How expensive this filter is to decide
    fn cost(&self) -> FilterCost {
        FilterCost::Cheap
    }

    /// Evaluate this filter against one package.
    fn evaluate(&self, package: &PackageInfo) -> Verdict;
}
