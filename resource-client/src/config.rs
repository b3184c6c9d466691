//! Client configuration

use resource_model::{ResourceError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for a [`crate::ResourceClient`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// How long a read or update may take before it fails
    /// Default: 5 seconds
    #[serde(with = "millis")]
    pub request_timeout: Duration,

    /// Quiet period after which discovery stops waiting for new matches
    /// Default: 2 seconds
    #[serde(with = "millis")]
    pub discovery_timeout: Duration,

    /// Pending notifications buffered per observation
    /// Default: 32
    pub delivery_queue_depth: usize,

    /// Async worker threads running delivery tasks
    /// Default: 2
    pub worker_threads: usize,

    /// Upper bound on threads used for discovery and background requests
    /// Default: 4
    pub max_blocking_threads: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(5),
            discovery_timeout: Duration::from_secs(2),
            delivery_queue_depth: 32,
            worker_threads: 2,
            max_blocking_threads: 4,
        }
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Short timeouts for interactive use on a local network
    pub fn responsive() -> Self {
        Self {
            request_timeout: Duration::from_secs(1),
            discovery_timeout: Duration::from_millis(300),
            ..Self::default()
        }
    }

    /// Minimal threads and buffers
    pub fn resource_efficient() -> Self {
        Self {
            delivery_queue_depth: 8,
            worker_threads: 1,
            max_blocking_threads: 1,
            ..Self::default()
        }
    }

    /// Parse a JSON document; durations are in milliseconds
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| ResourceError::Validation(format!("invalid client config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.request_timeout.is_zero() || self.discovery_timeout.is_zero() {
            return Err(ResourceError::Validation(
                "timeouts must be greater than zero".to_string(),
            ));
        }
        if self.delivery_queue_depth == 0 {
            return Err(ResourceError::Validation(
                "delivery_queue_depth must be at least 1".to_string(),
            ));
        }
        if self.worker_threads == 0 || self.max_blocking_threads == 0 {
            return Err(ResourceError::Validation(
                "thread counts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}
