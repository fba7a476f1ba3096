//! Source line tally over an extracted package tree.

use std::fs;
use std::path::Path;

use walkdir::{DirEntry, WalkDir};

/// File extensions counted as source code
pub const SOURCE_EXTENSIONS: &[&str] = &["js", "jsx", "ts", "tsx", "mjs", "cjs", "mts", "cts"];

/// Dependency vendor directory, skipped wherever it appears
pub const VENDOR_DIR: &str = "node_modules";

/// Lines in one file: number of `\n` bytes plus one.
pub fn count_lines(bytes: &[u8]) -> u64 {
    bytes.iter().filter(|&&b| b == b'\n').count() as u64 + 1
}

pub fn is_source_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| SOURCE_EXTENSIONS.iter().any(|known| ext.eq_ignore_ascii_case(known)))
}

pub fn is_excluded_dir(name: &str) -> bool {
    name == VENDOR_DIR || name.starts_with('.')
}

fn keep_entry(entry: &DirEntry) -> bool {
    // The root is the scratch directory itself
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return true;
    }
    entry
        .file_name()
        .to_str()
        .is_none_or(|name| !is_excluded_dir(name))
}

/// Sum line counts of every source file under `root`.
///
/// Walk errors and unreadable files are skipped.
pub fn count_tree(root: &Path) -> u64 {
    WalkDir::new(root)
        .into_iter()
        .filter_entry(keep_entry)
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file() && is_source_file(entry.path()))
        .filter_map(|entry| fs::read(entry.path()).ok())
        .map(|bytes| count_lines(&bytes))
        .sum()
}
