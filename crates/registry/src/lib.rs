//! # Registry Crate
//!
//! This crate is everything discovery knows about the package registry.
//!
//! ## Main Components
//!
//! - **types**: Wire types for the change feed and package documents, plus
//!   the normalized [`PackageInfo`] record produced by discovery
//! - **client**: The [`RegistryApi`] trait and its HTTP implementation
//! - **error**: Error types for registry access
//!
//! ## Example Usage
//!
//! ```ignore
//! use registry::{HttpRegistry, RegistryApi, RegistryConfig};
//!
//! let registry = HttpRegistry::new(RegistryConfig::default())?;
//! let page = registry.changes(100, None).await?;
//! let doc = registry.document(&page.results[0].id).await?;
//! println!("latest: {:?}", doc.latest_version());
//! ```

// Public modules
pub mod client;
pub mod error;
pub mod types;

#[cfg(feature = "test-util")]
pub mod memory;

// Re-export commonly used types for convenience
pub use client::{
    DEFAULT_FEED_URL, DEFAULT_REGISTRY_URL, DEFAULT_REQUEST_TIMEOUT, HttpRegistry, RegistryApi,
    RegistryConfig, encode_package_name,
};
pub use error::{RegistryError, Result};
pub use types::{
    CandidateId, ChangeEntry, ChangesResponse, Cursor, Dist, PackageDocument, PackageInfo,
    VersionManifest,
};
