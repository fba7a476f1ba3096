//! Filter implementations for the package pipeline.
//!
//! This module contains all the concrete filters that can be composed
//! into a FilterPipeline.

pub mod executable;
pub mod source_size;
pub mod text;

// Re-export for convenience
pub use executable::ExecutableFilter;
pub use source_size::SourceSizeFilter;
pub use text::TextFilter;
