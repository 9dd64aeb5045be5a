//! Token endpoint HTTP configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// HTTP client settings for the token endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl HttpConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.request_timeout_secs == 0 || self.request_timeout_secs > 300 {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout(),
        }
    }
}

fn default_request_timeout() -> u64 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_thirty_seconds() {
        let config = HttpConfig::default();
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn timeout_bounds() {
        assert!(HttpConfig { request_timeout_secs: 0 }.validate().is_err());
        assert!(HttpConfig { request_timeout_secs: 301 }.validate().is_err());
        assert!(HttpConfig { request_timeout_secs: 300 }.validate().is_ok());
    }
}
