//! Error types for the registry crate.
//!
//! Every network operation against the registry collapses into one of
//! three failure shapes: the request never completed, the registry
//! answered with a non-2xx status, or the body was not what we expected.

use thiserror::Error;

/// Errors that can occur while talking to the package registry
#[derive(Error, Debug)]
pub enum RegistryError {
    /// The request did not complete (DNS, connect, TLS, timeout, ...)
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The registry answered, but not with a 2xx status
    #[error("{url} responded with HTTP {status}")]
    Status { url: String, status: u16 },

    /// The response body could not be decoded into the expected shape
    #[error("could not decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

impl RegistryError {
    /// HTTP status of the failed response, if the registry answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            RegistryError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, RegistryError>;
