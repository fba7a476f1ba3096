//! Free-text search over package names and descriptions.
//!
//! ## Matching rules
//! - Every term must match (AND); no terms means everything matches
//! - A package matches when its name OR its description matches the whole
//!   term set (terms are not split across the two fields)
//! - Partial mode: case-insensitive substring containment
//! - Whole-word mode: the term must not touch a word character on either
//!   side, so `react` matches `react-router` but not `ReactRouter`
//! - Empty text never matches a non-empty term set

use crate::traits::{Filter, Verdict};
use anyhow::Result;
use regex::Regex;
use registry::PackageInfo;

/// Keeps packages whose name or description contains all search terms.
pub struct TextFilter {
    terms: Vec<String>,
    /// Compiled once per run for whole-word mode; `None` in partial mode
    word_patterns: Option<Vec<Regex>>,
}

impl TextFilter {
    /// Create a new TextFilter.
    ///
    /// # Arguments
    /// * `terms` - Search terms, matched case-insensitively
    /// * `partial_match` - Substring matching instead of whole words
    pub fn new<S: AsRef<str>>(terms: &[S], partial_match: bool) -> Result<Self> {
        let terms: Vec<String> = terms.iter().map(|t| t.as_ref().to_lowercase()).collect();

        let word_patterns = if partial_match {
            None
        } else {
            let patterns = terms
                .iter()
                .map(|term| Regex::new(&format!(r"(?i)(?:^|\W){}(?:\W|$)", regex::escape(term))))
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Some(patterns)
        };

        Ok(Self {
            terms,
            word_patterns,
        })
    }

    /// Does `text` match every term?
    pub fn matches(&self, text: &str) -> bool {
        if self.terms.is_empty() {
            return true;
        }
        if text.trim().is_empty() {
            return false;
        }

        match &self.word_patterns {
            Some(patterns) => patterns.iter().all(|pattern| pattern.is_match(text)),
            None => {
                let haystack = text.to_lowercase();
                self.terms.iter().all(|term| haystack.contains(term.as_str()))
            }
        }
    }
}

impl Filter for TextFilter {
    fn name(&self) -> &str {
        "TextFilter"
    }

    fn evaluate(&self, package: &PackageInfo) -> Verdict {
        if self.matches(&package.name) || self.matches(&package.description) {
            Verdict::Accept
        } else {
            Verdict::Reject
        }
    }
}
