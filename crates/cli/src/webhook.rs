//! Chat webhook notification for a finished run.
//!
//! Sends one Slack-compatible `{"text": ...}` message per run.

use anyhow::{bail, Context, Result};
use discovery::DiscoveryReport;
use serde_json::json;
use tracing::info;

/// Build the message body for `report`.
pub fn format_message(report: &DiscoveryReport, window_days: u32) -> String {
    if report.packages.is_empty() {
        return format!(
            "pkg-radar: no new packages in the last {} days ({} candidates checked)",
            window_days, report.candidates_seen
        );
    }

    let mut text = format!(
        "pkg-radar: {} new packages in the last {} days\n",
        report.packages.len(),
        window_days
    );
    for package in &report.packages {
        text.push_str(&format!(
            "• <{}|{}> {}",
            package.npm_url, package.name, package.latest_version
        ));
        if !package.description.is_empty() {
            text.push_str(&format!(": {}", package.description));
        }
        text.push('\n');
    }
    text
}

/// POST `text` to the webhook at `url`.
pub async fn post(client: &reqwest::Client, url: &str, text: &str) -> Result<()> {
    let response = client
        .post(url)
        .json(&json!({ "text": text }))
        .send()
        .await
        .with_context(|| format!("Failed to reach webhook {url}"))?;

    let status = response.status();
    if !status.is_success() {
        bail!("Webhook {url} answered with HTTP {status}");
    }
    info!("Posted results to webhook");
    Ok(())
}
