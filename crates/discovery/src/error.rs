//! Error types for discovery runs.

use sources::SourceError;
use thiserror::Error;

/// Failures that abort a whole discovery run.
///
/// Per-candidate failures (metadata, archives) never surface here; they
/// are logged and the candidate is skipped or counted as empty.
#[derive(Error, Debug)]
pub enum DiscoveryError {
    /// The change feed could not be read
    #[error("discovery aborted: {0}")]
    FeedUnavailable(#[source] SourceError),

    /// A worker task panicked or was cancelled
    #[error("discovery worker failed: {0}")]
    WorkerFailed(#[source] tokio::task::JoinError),

    /// The filter configuration could not be compiled
    #[error(transparent)]
    InvalidFilter(anyhow::Error),
}
