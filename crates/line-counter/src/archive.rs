//! Scratch extraction of distribution archives.
//!
//! Each call owns a fresh temporary directory. It is removed when the
//! `TempDir` guard drops, which covers the success path, every `?` early
//! return, and unwinding.

use std::io;
use std::path::Path;

use flate2::read::GzDecoder;
use tar::Archive;
use tempfile::TempDir;
use tracing::debug;

use crate::tally::count_tree;

const SCRATCH_PREFIX: &str = "pkg-radar-";

/// Unpack a gzip-compressed tarball into `dest`.
pub fn unpack(bytes: &[u8], dest: &Path) -> io::Result<()> {
    let mut archive = Archive::new(GzDecoder::new(bytes));
    archive.set_preserve_permissions(false);
    archive.set_overwrite(true);
    archive.unpack(dest)
}

/// Extract `bytes` into a scratch directory under `scratch_root` (or the
/// system temp dir) and count source lines in the extracted tree.
pub fn count_archive(bytes: &[u8], scratch_root: Option<&Path>) -> io::Result<u64> {
    let mut builder = tempfile::Builder::new();
    builder.prefix(SCRATCH_PREFIX);
    let scratch: TempDir = match scratch_root {
        Some(root) => builder.tempdir_in(root)?,
        None => builder.tempdir()?,
    };

    unpack(bytes, scratch.path())?;
    let lines = count_tree(scratch.path());
    debug!("Counted {} lines in {}", lines, scratch.path().display());
    Ok(lines)
}
