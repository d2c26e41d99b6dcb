//! Scheduler configuration.
//!
//! Configuration is plain data: it can be built in code or loaded from JSON.
//!
//! ```rust
//! use ripple_core::{ErrorPolicy, SchedulerConfig};
//!
//! let config = SchedulerConfig::from_json(r#"{ "error_policy": "isolate" }"#).unwrap();
//! assert_eq!(config.error_policy, ErrorPolicy::Isolate);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// What a flush does when a computation fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// Abort the pass and return the failure to the caller of `flush`.
    /// Computations of the pass that were not reached go back to the front
    /// of the queue.
    #[default]
    Propagate,

    /// Log the failure, record it in the flush report and keep going.
    Isolate,
}

/// Tunables for a [`Scheduler`](crate::Scheduler).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub error_policy: ErrorPolicy,

    /// Log a warning when the flush queue reaches this many computations.
    /// In batch mode nothing drains the queue but explicit flushes, so this
    /// catches callers that forgot to flush.
    pub queue_warn_threshold: Option<usize>,
}

impl SchedulerConfig {
    /// Parse a config from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_error_policy(mut self, error_policy: ErrorPolicy) -> Self {
        self.error_policy = error_policy;
        self
    }

    pub fn with_queue_warn_threshold(mut self, threshold: usize) -> Self {
        self.queue_warn_threshold = Some(threshold);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_gives_defaults() {
        let config = SchedulerConfig::from_json("{}").unwrap();
        assert_eq!(config, SchedulerConfig::default());
        assert_eq!(config.error_policy, ErrorPolicy::Propagate);
        assert_eq!(config.queue_warn_threshold, None);
    }

    #[test]
    fn parses_all_fields() {
        let config = SchedulerConfig::from_json(
            r#"{ "error_policy": "isolate", "queue_warn_threshold": 128 }"#,
        )
        .unwrap();

        assert_eq!(
            config,
            SchedulerConfig::default()
                .with_error_policy(ErrorPolicy::Isolate)
                .with_queue_warn_threshold(128)
        );
    }

    #[test]
    fn rejects_unknown_policy() {
        let err = SchedulerConfig::from_json(r#"{ "error_policy": "retry" }"#).unwrap_err();
        assert!(err.to_string().starts_with("invalid scheduler config"));
    }
}
