//! Filter for packages that install a command.

use crate::traits::{Filter, Verdict};
use registry::PackageInfo;

/// Keeps only packages whose latest version declares an executable.
pub struct ExecutableFilter;

impl Filter for ExecutableFilter {
    fn name(&self) -> &str {
        "ExecutableFilter"
    }

    fn evaluate(&self, package: &PackageInfo) -> Verdict {
        if package.has_executable {
            Verdict::Accept
        } else {
            Verdict::Reject
        }
    }
}
