//! Filter to ensure a minimum amount of source code.
//!
//! This is the only filter that may need network I/O: until the package
//! carries a `source_line_count` it answers [`Verdict::NeedsLineCount`]
//! and the pipeline fetches the count.

use crate::traits::{Filter, FilterCost, Verdict};
use registry::PackageInfo;

/// Rejects packages with fewer than `min_lines` source lines.
///
/// A threshold of zero never rejects, but still forces the count to be
/// computed so it can be reported.
pub struct SourceSizeFilter {
    min_lines: u64,
}

impl SourceSizeFilter {
    pub fn new(min_lines: u64) -> Self {
        Self { min_lines }
    }
}

impl Filter for SourceSizeFilter {
    fn name(&self) -> &str {
        "SourceSizeFilter"
    }

    fn cost(&self) -> FilterCost {
        FilterCost::Network
    }

    fn evaluate(&self, package: &PackageInfo) -> Verdict {
        match package.source_line_count {
            None => Verdict::NeedsLineCount,
            Some(lines) if lines >= self.min_lines => Verdict::Accept,
            Some(_) => Verdict::Reject,
        }
    }
}
