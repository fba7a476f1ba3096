use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use colored::Colorize;
use discovery::{Budget, DiscoveryOrchestrator};
use pipeline::{FilterSpec, LineCountFailurePolicy};
use registry::{HttpRegistry, RegistryConfig, DEFAULT_FEED_URL, DEFAULT_REGISTRY_URL};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

mod output;
mod webhook;
mod window;

/// pkg-radar - find packages published to the npm registry in the last few days
#[derive(Parser, Debug)]
#[command(name = "pkg-radar", version)]
#[command(about = "Discover newly published npm packages", long_about = None)]
struct Cli {
    /// Words that must all appear in the package name or description
    #[arg(env = "PKG_RADAR_TERMS", value_delimiter = ' ')]
    terms: Vec<String>,

    /// Match terms as substrings instead of whole words
    #[arg(long, env = "PKG_RADAR_PARTIAL")]
    partial: bool,

    /// How far back to look: 3d, 2w, 1m, 1y, or a number of days
    #[arg(long, env = "PKG_RADAR_SINCE", default_value = "1w", value_parser = window::parse_window)]
    since: u32,

    /// Only keep packages shipping at least this many lines of source
    #[arg(long, env = "PKG_RADAR_MIN_LINES")]
    min_lines: Option<u64>,

    /// Only keep packages that install a command-line executable
    #[arg(long, env = "PKG_RADAR_REQUIRE_BIN")]
    require_bin: bool,

    /// Keep packages whose source could not be downloaded instead of treating them as empty
    #[arg(long, env = "PKG_RADAR_KEEP_UNCOUNTED")]
    keep_uncounted: bool,

    /// Change entries requested per feed page
    #[arg(long, env = "PKG_RADAR_PAGE_SIZE", default_value_t = 100)]
    page_size: usize,

    /// Stop after this many matching packages
    #[arg(long, env = "PKG_RADAR_MAX_RESULTS", default_value_t = 50)]
    max_results: usize,

    /// Stop after this many feed pages
    #[arg(long, env = "PKG_RADAR_MAX_PAGES", default_value_t = 10)]
    max_pages: usize,

    /// Packages evaluated at the same time
    #[arg(long, env = "PKG_RADAR_CONCURRENCY", default_value_t = 8)]
    concurrency: usize,

    #[arg(long, env = "PKG_RADAR_REGISTRY_URL", default_value = DEFAULT_REGISTRY_URL)]
    registry_url: String,

    #[arg(long, env = "PKG_RADAR_FEED_URL", default_value = DEFAULT_FEED_URL)]
    feed_url: String,

    /// Per-request timeout in seconds
    #[arg(long, env = "PKG_RADAR_TIMEOUT_SECS", default_value_t = 30)]
    timeout_secs: u64,

    /// Also write the results to this CSV file
    #[arg(long, env = "PKG_RADAR_CSV")]
    csv: Option<PathBuf>,

    /// Also post the results to this chat webhook
    #[arg(long, env = "PKG_RADAR_WEBHOOK_URL")]
    webhook_url: Option<String>,
}

impl Cli {
    fn filter_spec(&self) -> FilterSpec {
        FilterSpec::new()
            .with_search_terms(&self.terms)
            .with_partial_match(self.partial)
            .with_min_source_lines(self.min_lines)
            .with_require_executable(self.require_bin)
    }

    fn budget(&self) -> Budget {
        Budget {
            page_size: self.page_size,
            max_results: self.max_results,
            recency_window_days: self.since,
            max_pages: self.max_pages,
            concurrency: self.concurrency,
        }
    }

    fn failure_policy(&self) -> LineCountFailurePolicy {
        if self.keep_uncounted {
            LineCountFailurePolicy::KeepUncounted
        } else {
            LineCountFailurePolicy::TreatAsZero
        }
    }

    fn registry_config(&self) -> RegistryConfig {
        RegistryConfig {
            registry_url: self.registry_url.clone(),
            feed_url: self.feed_url.clone(),
            request_timeout: Duration::from_secs(self.timeout_secs),
            ..RegistryConfig::default()
        }
    }
}

/// Load `.env` from the working directory if there is one.
fn load_dotenv() -> Result<bool> {
    dotenvy::dotenv().map(|_| true).or_else(|err| match err {
        dotenvy::Error::Io(_) => Ok(false),
        other => Err(other).context("Failed to parse .env file"),
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    // Environment fallbacks (and RUST_LOG) must be in place before anything reads them
    let loaded_dotenv = load_dotenv()?;

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
    if loaded_dotenv {
        tracing::debug!("Loaded .env");
    }

    let cli = Cli::parse();

    run(cli).await
}

async fn run(cli: Cli) -> Result<()> {
    let registry = Arc::new(
        HttpRegistry::new(cli.registry_config()).context("Failed to build registry client")?,
    );
    let orchestrator =
        DiscoveryOrchestrator::from_spec(registry, &cli.filter_spec(), cli.failure_policy())?;

    println!(
        "Searching packages first published in the last {} days...",
        cli.since
    );
    let start = Instant::now();
    let report = orchestrator
        .discover(&cli.budget(), Utc::now())
        .await
        .context("Discovery failed")?;
    println!(
        "{} Checked {} candidates over {} pages in {:.2?} ({:?})",
        "✓".green(),
        report.candidates_seen,
        report.pages_fetched,
        start.elapsed(),
        report.stop_reason
    );

    output::print_packages(&report.packages);

    if let Some(path) = &cli.csv {
        output::write_csv(path, &report.packages)?;
        println!("{} Wrote {}", "✓".green(), path.display());
    }

    if let Some(url) = &cli.webhook_url {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cli.timeout_secs))
            .build()
            .context("Failed to build webhook client")?;
        webhook::post(&client, url, &webhook::format_message(&report, cli.since)).await?;
        println!("{} Posted to webhook", "✓".green());
    }

    Ok(())
}
