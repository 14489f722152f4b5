//! Order service configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Order service configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OrderServiceConfig {
    /// Base URL of the order service's internal API
    pub base_url: String,

    /// Per-request timeout for order service calls, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl OrderServiceConfig {
    /// Validate order service configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.base_url.is_empty() {
            return Err(ValidationError::MissingRequired("ORDERS_BASE_URL"));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ValidationError::InvalidOrderServiceUrl);
        }
        if self.timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout("ORDERS_TIMEOUT_SECS"));
        }
        Ok(())
    }
}

impl Default for OrderServiceConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    10
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_url_is_rejected() {
        assert!(OrderServiceConfig::default().validate().is_err());
    }

    #[test]
    fn non_http_scheme_is_rejected() {
        let config = OrderServiceConfig {
            base_url: "ftp://orders.internal".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn http_urls_pass() {
        let config = OrderServiceConfig {
            base_url: "http://orders.internal:8081".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
        assert_eq!(config.timeout_secs, 10);
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let config = OrderServiceConfig {
            base_url: "http://orders.internal:8081".to_string(),
            timeout_secs: 0,
        };
        assert!(config.validate().is_err());
    }
}
