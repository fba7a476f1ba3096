//! Error types for candidate sources.

use registry::RegistryError;
use thiserror::Error;

/// Failures while pulling candidates or their metadata from the registry
#[derive(Error, Debug)]
pub enum SourceError {
    /// The change feed could not be read; fatal to a discovery run
    #[error("change feed unavailable: {0}")]
    FeedUnavailable(#[source] RegistryError),

    /// One package's metadata could not be fetched; the candidate is skipped
    #[error("metadata fetch failed for {name}: {source}")]
    MetadataFetchFailed {
        name: String,
        #[source]
        source: RegistryError,
    },
}
