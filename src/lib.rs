//! ProjectFlow - Project, milestone, issue and sprint synchronization
//!
//! ProjectFlow drives an external project tracker through a narrow adapter
//! interface. It creates whole roadmaps (a project, its milestones and their
//! issues) in one call, plans sprints from existing issues, applies
//! version-checked updates and derives progress metrics.
//!
//! # Architecture
//!
//! - **model**: Entities, create inputs, patches and validation
//! - **adapter**: The `ProjectAdapter` trait, an in-memory tracker and a retrying decorator
//! - **sync**: `ResourceSynchronizer` (roadmaps, sprint plans, versioned updates)
//! - **metrics**: Completion percentages for sprints and milestones
//! - **config**: YAML configuration (owner, retry and batch behavior)
//! - **logging** / **telemetry**: tracing setup and Prometheus counters
//!
//! Custom field values are encoded and decoded by the `fieldcodec` crate.

pub mod adapter;
pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod model;
pub mod sync;
pub mod telemetry;

// Re-exports
pub use error::{ProjectFlowError, Result};
pub use sync::ResourceSynchronizer;
