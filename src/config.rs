use std::{collections::HashMap, time::Duration};

use config::{Config as ConfigLib, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

pub const DEFAULT_ENDPOINT: &str = "https://ideal.rabobank.nl/ideal/iDEALv3";
pub const DEFAULT_SUB_ID: &str = "0";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub merchant: MerchantConfig,
    pub http: HttpConfig,
}

/// Per-call merchant settings.
///
/// This is the whole configuration surface of an operation; it is passed by value
/// with every call and never mutated by the connector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerchantConfig {
    /// MerchantID as supplied to the merchant by the acquirer
    pub merchant_id: String,
    /// Merchant subID, `0` unless the acquirer assigned one
    pub sub_id: String,
    /// Acquirer endpoint the signed documents are posted to
    pub endpoint: String,
    /// Verify the acquirer's signature on non-error responses
    pub validate_signature: bool,
}

impl MerchantConfig {
    /// Settings for `merchant_id` with sub id `0`, the default endpoint and
    /// signature validation enabled.
    pub fn new(merchant_id: impl Into<String>) -> Self {
        Self {
            merchant_id: merchant_id.into(),
            sub_id: DEFAULT_SUB_ID.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            validate_signature: true,
        }
    }

    pub fn with_sub_id(mut self, sub_id: impl Into<String>) -> Self {
        self.sub_id = sub_id.into();
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_signature_validation(mut self, enabled: bool) -> Self {
        self.validate_signature = enabled;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Whole-request timeout, covering connect, send and body read
    pub timeout_secs: u64,
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with_sources(None)
    }

    pub fn load_with_sources(
        env_vars: Option<HashMap<String, String>>,
    ) -> Result<Self, ConfigError> {
        let mut builder = ConfigLib::builder()
            .set_default("merchant.sub_id", DEFAULT_SUB_ID)?
            .set_default("merchant.endpoint", DEFAULT_ENDPOINT)?
            .set_default("merchant.validate_signature", true)?
            .set_default("http.timeout_secs", DEFAULT_TIMEOUT_SECS)?
            .add_source(File::with_name("config/settings").required(false));

        // Explicit overrides replace the process environment, which keeps
        // tests independent of each other
        if let Some(vars) = env_vars {
            for (key, value) in vars {
                builder = builder.set_override(&key, value)?;
            }
        } else {
            // Format: IDEAL_MERCHANT__MERCHANT_ID, IDEAL_HTTP__TIMEOUT_SECS
            builder = builder.add_source(
                Environment::with_prefix("IDEAL")
                    .prefix_separator("_")
                    .separator("__"),
            );
        }

        let config: Self = builder.build()?.try_deserialize()?;
        if config.http.timeout_secs == 0 {
            return Err(ConfigError::Message(
                "http.timeout_secs must be greater than zero".into(),
            ));
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn merchant_only() -> HashMap<String, String> {
        let mut env_vars = HashMap::new();
        env_vars.insert(
            "merchant.merchant_id".to_string(),
            "002013788".to_string(),
        );
        env_vars
    }

    #[test]
    fn test_default_config() {
        let config = Config::load_with_sources(Some(merchant_only())).expect("Failed to load config");

        assert_eq!(config.merchant.merchant_id, "002013788");
        assert_eq!(config.merchant.sub_id, "0");
        assert_eq!(config.merchant.endpoint, DEFAULT_ENDPOINT);
        assert!(config.merchant.validate_signature);
        assert_eq!(config.http.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_env_config() {
        let mut env_vars = merchant_only();
        env_vars.insert("merchant.sub_id".to_string(), "7".to_string());
        env_vars.insert(
            "merchant.endpoint".to_string(),
            "https://www.ideal-checkout.nl/simulator/".to_string(),
        );
        env_vars.insert(
            "merchant.validate_signature".to_string(),
            "false".to_string(),
        );
        env_vars.insert("http.timeout_secs".to_string(), "5".to_string());

        let config = Config::load_with_sources(Some(env_vars)).expect("Failed to load config");

        assert_eq!(config.merchant.sub_id, "7");
        assert_eq!(
            config.merchant.endpoint,
            "https://www.ideal-checkout.nl/simulator/"
        );
        assert!(!config.merchant.validate_signature);
        assert_eq!(config.http.timeout_secs, 5);
    }

    #[test]
    fn test_zero_timeout_is_rejected() {
        let mut env_vars = merchant_only();
        env_vars.insert("http.timeout_secs".to_string(), "0".to_string());

        let result = Config::load_with_sources(Some(env_vars));
        assert!(matches!(result, Err(ConfigError::Message(_))));
    }

    #[test]
    fn test_missing_merchant_id() {
        let result = Config::load_with_sources(Some(HashMap::new()));
        assert!(result.is_err());
    }

    #[test]
    fn test_merchant_builder_defaults() {
        let merchant = MerchantConfig::new("002013788");
        assert_eq!(merchant.sub_id, "0");
        assert_eq!(merchant.endpoint, DEFAULT_ENDPOINT);
        assert!(merchant.validate_signature);

        let merchant = merchant
            .with_sub_id("1")
            .with_endpoint("http://localhost:8080")
            .with_signature_validation(false);
        assert_eq!(merchant.sub_id, "1");
        assert_eq!(merchant.endpoint, "http://localhost:8080");
        assert!(!merchant.validate_signature);
    }
}
