//! # Sources Crate
//!
//! This crate turns the registry into a stream of candidate packages.
//!
//! ## Components
//!
//! ### Change Feed
//! Pages through the registry's global change log:
//! - Newest changes first, resumed with an opaque cursor
//! - Internal documents stripped, duplicates removed within a page
//!
//! ### Eligibility Resolver
//! Decides whether a candidate is a *new* package:
//! - At least one published version
//! - First published no more than `recency_window_days` before `now`
//! - Normalized into a [`registry::PackageInfo`]
//!
//! ## Example Usage
//!
//! ```ignore
//! use sources::{ChangeFeed, EligibilityResolver};
//!
//! let feed = ChangeFeed::new(registry.clone());
//! let resolver = EligibilityResolver::new(registry.clone());
//!
//! let page = feed.fetch_page(100, None).await?;
//! for id in &page.ids {
//!     if let Some(info) = resolver.resolve(id, 7, now).await {
//!         println!("{} {}", info.name, info.latest_version);
//!     }
//! }
//! ```

// Public modules
pub mod changes;
pub mod eligibility;
pub mod error;

// Re-export commonly used types
pub use changes::{ChangeFeed, Page};
pub use eligibility::EligibilityResolver;
pub use error::SourceError;
