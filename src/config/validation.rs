//! Configuration validation
//!
//! Checks a loaded configuration before it is handed to a synchronizer:
//! - Owner is set
//! - Retry backoff is well-formed
//! - Log filter parses

use super::ProjectFlowConfig;
use crate::model::{ValidationError, ValidationResult};
use crate::ProjectFlowError;
use tracing_subscriber::EnvFilter;

/// Validate a configuration, collecting every problem
pub fn validate_config(config: &ProjectFlowConfig) -> ValidationResult {
    let mut errors = Vec::new();

    if config.owner.trim().is_empty() {
        errors.push(ValidationError::new("owner", "Owner cannot be empty"));
    }

    let retry = &config.retry;
    if !retry.multiplier.is_finite() || retry.multiplier < 1.0 {
        errors.push(ValidationError::new(
            "retry.multiplier",
            format!("Multiplier must be at least 1.0, got {}", retry.multiplier),
        ));
    }
    if retry.max_backoff_ms < retry.initial_backoff_ms {
        errors.push(ValidationError::new(
            "retry.max_backoff_ms",
            format!(
                "Max backoff ({}ms) is shorter than initial backoff ({}ms)",
                retry.max_backoff_ms, retry.initial_backoff_ms
            ),
        ));
    }

    if let Err(e) = EnvFilter::try_new(&config.log_filter) {
        errors.push(ValidationError::new(
            "log_filter",
            format!("Invalid filter '{}': {}", config.log_filter, e),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate and convert problems into a single configuration error
pub fn validate_config_result(config: &ProjectFlowConfig) -> crate::Result<()> {
    validate_config(config).map_err(|errors| {
        let message = errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        ProjectFlowError::Config(message)
    })
}
