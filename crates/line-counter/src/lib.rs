//! Source line counting for published packages.
//!
//! This crate downloads a package's distribution archive and counts the
//! lines of source code it ships. It handles:
//! - Resolving the archive URL from the version manifest
//! - Downloading the archive bytes
//! - Extracting into a scratch directory that is always removed
//! - Walking the tree, skipping `node_modules` and hidden directories
//!
//! Counting is the most expensive step of discovery (two HTTP requests plus
//! disk I/O), so callers should only reach for it after every cheaper
//! check has passed.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use registry::{RegistryApi, RegistryError};
use thiserror::Error;
use tracing::{debug, instrument, warn};

pub mod archive;
pub mod tally;

pub use tally::{SOURCE_EXTENSIONS, VENDOR_DIR, count_lines, count_tree};

/// Errors that can occur while counting a package's source lines
#[derive(Error, Debug)]
pub enum LineCountError {
    #[error("could not fetch manifest for {package}: {source}")]
    ManifestFetchFailed {
        package: String,
        #[source]
        source: RegistryError,
    },

    #[error("manifest for {package} has no tarball URL")]
    MissingTarball { package: String },

    #[error("could not download archive for {package}: {source}")]
    ArchiveFetchFailed {
        package: String,
        #[source]
        source: RegistryError,
    },

    #[error("could not extract archive for {package}: {source}")]
    ExtractionFailed {
        package: String,
        #[source]
        source: io::Error,
    },
}

/// Counts source lines of a published package version.
#[async_trait]
pub trait LineCounter: Send + Sync {
    /// Count lines, reporting why counting failed.
    async fn try_count(&self, name: &str, version: &str) -> Result<u64, LineCountError>;

    /// Count lines, treating any failure as zero.
    ///
    /// A failed download and a package with no source files are
    /// indistinguishable here; use [`LineCounter::try_count`] to tell them
    /// apart.
    async fn count(&self, name: &str, version: &str) -> u64 {
        match self.try_count(name, version).await {
            Ok(lines) => lines,
            Err(err) => {
                warn!("{}", err);
                0
            }
        }
    }
}

/// Line counter backed by the registry's distribution archives
#[derive(Clone)]
pub struct TarballLineCounter {
    registry: Arc<dyn RegistryApi>,
    scratch_root: Option<PathBuf>,
}

impl TarballLineCounter {
    pub fn new(registry: Arc<dyn RegistryApi>) -> Self {
        Self {
            registry,
            scratch_root: None,
        }
    }

    /// Create scratch directories under `root` instead of the system temp dir
    pub fn with_scratch_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.scratch_root = Some(root.into());
        self
    }
}

#[async_trait]
impl LineCounter for TarballLineCounter {
    #[instrument(skip(self))]
    async fn try_count(&self, name: &str, version: &str) -> Result<u64, LineCountError> {
        let package = format!("{name}@{version}");

        let manifest = self
            .registry
            .version_manifest(name, version)
            .await
            .map_err(|source| LineCountError::ManifestFetchFailed {
                package: package.clone(),
                source,
            })?;

        let url = manifest
            .dist
            .tarball
            .ok_or_else(|| LineCountError::MissingTarball {
                package: package.clone(),
            })?;

        let bytes = self.registry.fetch_archive(&url).await.map_err(|source| {
            LineCountError::ArchiveFetchFailed {
                package: package.clone(),
                source,
            }
        })?;
        debug!("Downloaded {} bytes from {}", bytes.len(), url);

        let scratch_root = self.scratch_root.clone();
        tokio::task::spawn_blocking(move || {
            archive::count_archive(&bytes, scratch_root.as_deref())
        })
        .await
        .map_err(io::Error::other)
        .and_then(|result| result)
        .map_err(|source| LineCountError::ExtractionFailed { package, source })
    }
}

#[cfg(test)]
mod tests {
    use super::archive::fixtures::{lines, tarball};
    use super::*;
    use registry::memory::MemoryRegistry;
    use serde_json::json;

    const TARBALL_URL: &str = "memory://tiny/-/tiny-1.0.0.tgz";

    fn registry_with(archive: Vec<u8>) -> MemoryRegistry {
        MemoryRegistry::new()
            .with_document(
                "tiny",
                json!({"versions": {"1.0.0": {"dist": {"tarball": TARBALL_URL}}}}),
            )
            .with_document("bare", json!({"versions": {"1.0.0": {}}}))
            .with_archive(TARBALL_URL, archive)
    }

    #[tokio::test]
    async fn test_counts_only_recognized_extensions() {
        let ten = lines(10);
        let five = lines(5);
        let archive = tarball(&[
            ("package/src/index.ts", ten.as_str()),
            ("package/README.md", five.as_str()),
        ]);
        let counter = TarballLineCounter::new(Arc::new(registry_with(archive)));

        assert_eq!(counter.count("tiny", "1.0.0").await, 10);
        assert_eq!(counter.try_count("tiny", "1.0.0").await.unwrap(), 10);
    }

    #[tokio::test]
    async fn test_missing_package_counts_zero() {
        let counter = TarballLineCounter::new(Arc::new(registry_with(Vec::new())));

        assert_eq!(counter.count("does-not-exist", "0.0.0").await, 0);
        let err = counter.try_count("does-not-exist", "0.0.0").await.unwrap_err();
        assert!(matches!(err, LineCountError::ManifestFetchFailed { .. }));
    }

    #[tokio::test]
    async fn test_missing_tarball_url() {
        let counter = TarballLineCounter::new(Arc::new(registry_with(Vec::new())));

        let err = counter.try_count("bare", "1.0.0").await.unwrap_err();
        assert!(matches!(err, LineCountError::MissingTarball { .. }));
        assert_eq!(counter.count("bare", "1.0.0").await, 0);
    }

    #[tokio::test]
    async fn test_archive_download_failure() {
        let registry = MemoryRegistry::new().with_document(
            "tiny",
            json!({"versions": {"1.0.0": {"dist": {"tarball": TARBALL_URL}}}}),
        );
        let counter = TarballLineCounter::new(Arc::new(registry));

        let err = counter.try_count("tiny", "1.0.0").await.unwrap_err();
        assert!(matches!(err, LineCountError::ArchiveFetchFailed { .. }));
    }

    #[tokio::test]
    async fn test_corrupt_archive_cleans_up_scratch() {
        let scratch = tempfile::tempdir().unwrap();
        let counter = TarballLineCounter::new(Arc::new(registry_with(b"garbage".to_vec())))
            .with_scratch_root(scratch.path());

        let err = counter.try_count("tiny", "1.0.0").await.unwrap_err();
        assert!(matches!(err, LineCountError::ExtractionFailed { .. }));
        assert_eq!(std::fs::read_dir(scratch.path()).unwrap().count(), 0);
    }
}
