//! Filter chain for discovered packages.
//!
//! This crate provides:
//! - FilterSpec describing which filters a run enables
//! - Filter trait and implementations for package filtering
//! - FilterPipeline for composing filters, cheapest first
//!
//! ## Architecture
//! Each resolved package passes through the filters in cost order:
//! 1. ExecutableFilter: does the latest version install a command?
//! 2. TextFilter: do the name or description contain every search term?
//! 3. SourceSizeFilter: does the package ship enough source code?
//!    (downloads the archive, so it only runs for survivors of 1 and 2)
//!
//! ## Example Usage
//! ```ignore
//! use pipeline::{FilterPipeline, FilterSpec};
//!
//! let spec = FilterSpec::new()
//!     .with_search_terms(["cli"])
//!     .with_min_source_lines(Some(200));
//! let pipeline = FilterPipeline::from_spec(&spec, line_counter)?;
//!
//! if pipeline.apply(&mut package).await {
//!     println!("{} has {:?} lines", package.name, package.source_line_count);
//! }
//! ```

pub mod filter_pipeline;
pub mod filter_spec;
pub mod filters;
pub mod traits;

// Re-export main types
pub use filter_pipeline::{FilterPipeline, LineCountFailurePolicy};
pub use filter_spec::FilterSpec;
pub use traits::{Filter, FilterCost, Verdict};
