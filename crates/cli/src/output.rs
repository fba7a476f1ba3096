//! Output sinks for a finished run: terminal table and CSV file.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::SecondsFormat;
use colored::Colorize;
use registry::PackageInfo;

pub const CSV_HEADER: &[&str] = &[
    "name",
    "version",
    "description",
    "first_published",
    "npm_url",
    "versions",
    "has_bin",
    "source_lines",
    "ai_summary",
];

const DESCRIPTION_WIDTH: usize = 60;

/// Print a ranked, colored summary of the accepted packages.
pub fn print_packages(packages: &[PackageInfo]) {
    if packages.is_empty() {
        println!("{}", "No new packages matched.".yellow());
        return;
    }

    println!("{}", format!("{} new packages:", packages.len()).bold().blue());
    for (rank, package) in packages.iter().enumerate() {
        let lines = package
            .source_line_count
            .map(|n| format!("{n} lines"))
            .unwrap_or_else(|| "-".to_string());
        let bin = if package.has_executable { " [bin]" } else { "" };

        println!(
            "{:>3}. {}@{}{}  {}  {}",
            (rank + 1).to_string().green(),
            package.name.bold(),
            package.latest_version,
            bin.cyan(),
            package.first_published_at.format("%Y-%m-%d"),
            lines.dimmed()
        );
        if !package.description.is_empty() {
            println!("     {}", truncate(&package.description, DESCRIPTION_WIDTH));
        }
        println!("     {}", package.npm_url.underline());
    }
}

/// Cut `text` to at most `width` characters, marking the cut with `...`.
fn truncate(text: &str, width: usize) -> String {
    match text.char_indices().nth(width) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

/// Quote a CSV field when it contains a separator, quote or line break.
pub fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// One CSV record, in [`CSV_HEADER`] order
pub fn csv_record(package: &PackageInfo) -> Vec<String> {
    vec![
        package.name.clone(),
        package.latest_version.clone(),
        package.description.clone(),
        package
            .first_published_at
            .to_rfc3339_opts(SecondsFormat::Millis, true),
        package.npm_url.clone(),
        package.version_count.to_string(),
        package.has_executable.to_string(),
        package
            .source_line_count
            .map(|n| n.to_string())
            .unwrap_or_default(),
        package.ai_summary.clone().unwrap_or_default(),
    ]
}

/// Render the header and one row per package, CRLF line endings.
pub fn render_csv(packages: &[PackageInfo]) -> String {
    let mut out = CSV_HEADER.join(",");
    out.push_str("\r\n");
    for package in packages {
        let row: Vec<String> = csv_record(package)
            .iter()
            .map(|field| escape_field(field))
            .collect();
        out.push_str(&row.join(","));
        out.push_str("\r\n");
    }
    out
}

pub fn write_csv(path: &Path, packages: &[PackageInfo]) -> Result<()> {
    fs::write(path, render_csv(packages))
        .with_context(|| format!("Failed to write CSV to {}", path.display()))
}
