//! Platform configuration
//!
//! Controls the identity a platform advertises and the size of the pool it
//! uses for deferred work. Observer queue depth belongs to the observing
//! client; see `ClientConfig::delivery_queue_depth`.

use resource_model::{ResourceError, Result};
use serde::{Deserialize, Serialize};

/// Configuration for a [`crate::Platform`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlatformConfig {
    /// Host name this platform answers for
    /// Default: "localhost"
    pub host: String,

    /// Async worker threads in the platform pool
    /// Default: 2
    pub worker_threads: usize,

    /// Upper bound on blocking threads used for deferred reads
    /// Default: 8
    pub max_blocking_threads: usize,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            worker_threads: 2,
            max_blocking_threads: 8,
        }
    }
}

impl PlatformConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Default configuration answering for `host`
    pub fn for_host(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Self::default()
        }
    }

    /// Small footprint for constrained devices
    pub fn resource_efficient(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            worker_threads: 1,
            max_blocking_threads: 2,
        }
    }

    /// Parse a JSON document; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| ResourceError::Validation(format!("invalid platform config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(ResourceError::Validation("host must not be empty".to_string()));
        }
        if self.worker_threads == 0 || self.max_blocking_threads == 0 {
            return Err(ResourceError::Validation(
                "thread counts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = PlatformConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_blocking_threads, 8);
    }

    #[test]
    fn test_from_json_fills_defaults() {
        let config = PlatformConfig::from_json(r#"{"host": "kitchen"}"#).unwrap();
        assert_eq!(config.host, "kitchen");
        assert_eq!(config.worker_threads, 2);
    }

    #[test]
    fn test_from_json_rejects_zero_workers() {
        let result = PlatformConfig::from_json(r#"{"worker_threads": 0}"#);
        assert!(matches!(result, Err(ResourceError::Validation(_))));
    }

    #[test]
    fn test_resource_efficient_preset() {
        let config = PlatformConfig::resource_efficient("lamp");
        assert_eq!(config.worker_threads, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        let result = PlatformConfig::from_json(r#"{"host": "lamp", "observer_queue_depth": 4}"#);
        assert!(matches!(result, Err(ResourceError::Validation(_))));
    }
}
