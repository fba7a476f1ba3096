//! Discovery crate for the pkg-radar new package finder.
//!
//! This crate contains the orchestrator that pages through the registry
//! change feed and runs every candidate through eligibility and filtering
//! on a bounded pool of workers.

pub mod error;
pub mod orchestrator;
pub mod work;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use pipeline::{FilterSpec, LineCountFailurePolicy};
use registry::RegistryApi;

pub use error::DiscoveryError;
pub use orchestrator::{Budget, DiscoveryOrchestrator, DiscoveryReport, StopReason};
pub use work::{PageQueue, ResultSet};

/// Run one discovery pass with the standard filter chain for `spec`.
///
/// Line-count failures count as zero lines; build a
/// [`DiscoveryOrchestrator`] directly to choose another policy.
pub async fn discover(
    registry: Arc<dyn RegistryApi>,
    spec: &FilterSpec,
    budget: &Budget,
    now: DateTime<Utc>,
) -> Result<DiscoveryReport, DiscoveryError> {
    DiscoveryOrchestrator::from_spec(registry, spec, LineCountFailurePolicy::TreatAsZero)
        .map_err(DiscoveryError::InvalidFilter)?
        .discover(budget, now)
        .await
}
