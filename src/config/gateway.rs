//! Payment gateway configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Payment gateway configuration (Stripe-compatible provider)
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// Provider to use: "stripe" or "mock"
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Secret API key
    #[serde(default)]
    pub api_key: String,

    /// Webhook signing secret
    #[serde(default)]
    pub webhook_secret: String,

    /// API base URL override, mostly for local stubs
    #[serde(default)]
    pub api_base_url: Option<String>,

    /// Reject test-mode webhook events
    #[serde(default)]
    pub require_livemode: bool,

    /// Per-request timeout for provider calls, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl GatewayConfig {
    pub fn is_mock(&self) -> bool {
        self.provider == "mock"
    }

    /// Check if using a test-mode API key
    pub fn is_test_mode(&self) -> bool {
        self.api_key.starts_with("sk_test_")
    }

    /// Validate gateway configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        // The mock provider needs no credentials.
        if self.is_mock() {
            return Ok(());
        }

        if self.api_key.is_empty() {
            return Err(ValidationError::MissingRequired("GATEWAY_API_KEY"));
        }
        if self.webhook_secret.is_empty() {
            return Err(ValidationError::MissingRequired("GATEWAY_WEBHOOK_SECRET"));
        }
        if !self.api_key.starts_with("sk_") {
            return Err(ValidationError::InvalidGatewayKey);
        }
        if !self.webhook_secret.starts_with("whsec_") {
            return Err(ValidationError::InvalidGatewayWebhookSecret);
        }
        if self.timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout("GATEWAY_TIMEOUT_SECS"));
        }

        Ok(())
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            api_key: String::new(),
            webhook_secret: String::new(),
            api_base_url: None,
            require_livemode: false,
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_provider() -> String {
    "stripe".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_provider_needs_no_credentials() {
        let config = GatewayConfig {
            provider: "mock".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn stripe_provider_requires_credentials() {
        assert!(GatewayConfig::default().validate().is_err());
    }

    #[test]
    fn wrong_key_prefixes_are_rejected() {
        let config = GatewayConfig {
            api_key: "pk_test_xxx".to_string(),
            webhook_secret: "whsec_xxx".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = GatewayConfig {
            api_key: "sk_test_xxx".to_string(),
            webhook_secret: "secret_xxx".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn valid_stripe_config_passes() {
        let config = GatewayConfig {
            api_key: "sk_test_abcd1234".to_string(),
            webhook_secret: "whsec_xyz789".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
        assert!(config.is_test_mode());
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let config = GatewayConfig {
            api_key: "sk_test_abcd1234".to_string(),
            webhook_secret: "whsec_xyz789".to_string(),
            timeout_secs: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
