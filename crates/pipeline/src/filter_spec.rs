//! User-supplied filter criteria for one discovery run.

/// Which filters are enabled, and with what parameters.
///
/// Search terms are stored lowercased, split on whitespace and without
/// duplicates, in the order they were first given.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSpec {
    search_terms: Vec<String>,
    partial_match: bool,
    min_source_lines: Option<u64>,
    require_executable: bool,
}

impl FilterSpec {
    /// Create a spec with every filter disabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the free-text terms; every term must match (AND).
    pub fn with_search_terms<I, S>(mut self, terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.search_terms.clear();
        for term in terms {
            for token in term.as_ref().split_whitespace() {
                let token = token.to_lowercase();
                if !self.search_terms.contains(&token) {
                    self.search_terms.push(token);
                }
            }
        }
        self
    }

    /// Substring matching instead of whole-word matching
    pub fn with_partial_match(mut self, partial: bool) -> Self {
        self.partial_match = partial;
        self
    }

    /// Minimum source lines; `Some(0)` still counts but never rejects
    pub fn with_min_source_lines(mut self, min: Option<u64>) -> Self {
        self.min_source_lines = min;
        self
    }

    pub fn with_require_executable(mut self, require: bool) -> Self {
        self.require_executable = require;
        self
    }

    pub fn search_terms(&self) -> &[String] {
        &self.search_terms
    }

    pub fn partial_match(&self) -> bool {
        self.partial_match
    }

    pub fn min_source_lines(&self) -> Option<u64> {
        self.min_source_lines
    }

    pub fn require_executable(&self) -> bool {
        self.require_executable
    }

    /// True when the run will download archives to count lines
    pub fn needs_line_count(&self) -> bool {
        self.min_source_lines.is_some()
    }
}
