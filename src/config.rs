use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Retry and timeout policy for a `LoadCoordinator`.
///
/// Loaded from JSON, e.g.
///
/// ```json
/// {"retry_limit": 3, "request_timeout_ms": 5000, "failure_ttl_ms": 30000}
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct CoordinatorConfig {
    /// Total attempts per request chain, the first send included.
    pub retry_limit: u32,
    /// Deadline for a response to one attempt.
    pub request_timeout_ms: u64,
    /// How long a terminal failure answers identical requests without new
    /// traffic. Zero disables the failure cache.
    pub failure_ttl_ms: u64,
    /// Starting request token. Random when unset.
    pub token_seed: Option<u64>,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            retry_limit: 3,
            request_timeout_ms: 5_000,
            failure_ttl_ms: 30_000,
            token_seed: None,
        }
    }
}

impl CoordinatorConfig {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: CoordinatorConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.retry_limit == 0 {
            return Err(ConfigError::Invalid("retry_limit must be at least 1"));
        }
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::Invalid("request_timeout_ms must be positive"));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn failure_ttl(&self) -> Duration {
        Duration::from_millis(self.failure_ttl_ms)
    }
}
