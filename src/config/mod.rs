//! Configuration system
//!
//! Loads ~/.config/projectflow/config.yaml with support for:
//! - Default owner and visibility for new projects
//! - Retry policy for adapters
//! - Batch behavior for roadmap creation
//! - Log filter
//!
//! Configuration is an explicit value handed to constructors; nothing reads
//! it from global state.

mod projectflow_config;
pub mod validation;

pub use projectflow_config::{BatchSettings, ProjectFlowConfig, RetrySettings};
pub use validation::{validate_config, validate_config_result};
