//! API configuration
//!
//! Read from `FEEBOOK_`-prefixed environment variables. Nested sections use
//! a double underscore, e.g. `FEEBOOK_GATEWAY__KEY_ID`.

use serde::Deserialize;

use domain_accounts::HostedOtpConfig;
use domain_billing::HostedGatewayConfig;

/// API configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Database URL
    pub database_url: String,
    pub database_max_connections: u32,
    /// Log level, used when `RUST_LOG` is not set
    pub log_level: String,
    /// Emit logs as JSON lines
    pub log_json: bool,
    /// Secret for signing session tokens
    pub jwt_secret: String,
    /// Session lifetime in seconds
    pub session_ttl_secs: u64,
    /// Adds `Secure` to the session cookie
    pub cookie_secure: bool,
    /// Browser app that payment returns redirect to
    pub frontend_url: String,
    /// Public origin of this API, used for upload URLs
    pub public_base_url: String,
    /// Country code applied to local phone numbers
    pub default_country_code: String,
    pub upload_dir: String,
    pub max_upload_bytes: usize,
    pub gateway: GatewaySettings,
    pub otp: OtpSettings,
    /// First moderator, created at startup when none exist
    pub bootstrap_moderator: Option<BootstrapModerator>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            database_url: "postgres://localhost/feebook".to_string(),
            database_max_connections: 10,
            log_level: "info".to_string(),
            log_json: false,
            jwt_secret: "change-me-in-production".to_string(),
            session_ttl_secs: 7 * 24 * 3600,
            cookie_secure: false,
            frontend_url: "http://localhost:3000".to_string(),
            public_base_url: "http://localhost:8080".to_string(),
            default_country_code: "91".to_string(),
            upload_dir: "uploads".to_string(),
            max_upload_bytes: 5 * 1024 * 1024,
            gateway: GatewaySettings::default(),
            otp: OtpSettings::default(),
            bootstrap_moderator: None,
        }
    }
}

/// Moderators are only ever created by other moderators, so the very first
/// one comes from configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BootstrapModerator {
    pub name: String,
    pub phone: String,
    pub email: String,
}

/// Hosted payment gateway credentials
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GatewaySettings {
    pub base_url: String,
    pub key_id: String,
    pub key_secret: String,
    /// Currency new fee plans are billed in
    pub currency: String,
    pub timeout_secs: u64,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.razorpay.com".to_string(),
            key_id: String::new(),
            key_secret: String::new(),
            currency: "INR".to_string(),
            timeout_secs: 15,
        }
    }
}

impl From<&GatewaySettings> for HostedGatewayConfig {
    fn from(settings: &GatewaySettings) -> Self {
        HostedGatewayConfig {
            base_url: settings.base_url.clone(),
            key_id: settings.key_id.clone(),
            key_secret: settings.key_secret.clone(),
            timeout_secs: settings.timeout_secs,
        }
    }
}

/// Which OTP backend to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OtpProvider {
    /// Hosted verification service
    Hosted,
    /// Accepts `fixed_code` for every phone; local development only
    Fixed,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OtpSettings {
    pub provider: OtpProvider,
    pub base_url: String,
    pub account_sid: String,
    pub auth_token: String,
    pub fixed_code: String,
    pub timeout_secs: u64,
}

impl Default for OtpSettings {
    fn default() -> Self {
        Self {
            provider: OtpProvider::Fixed,
            base_url: String::new(),
            account_sid: String::new(),
            auth_token: String::new(),
            fixed_code: "000000".to_string(),
            timeout_secs: 10,
        }
    }
}

impl From<&OtpSettings> for HostedOtpConfig {
    fn from(settings: &OtpSettings) -> Self {
        HostedOtpConfig {
            base_url: settings.base_url.clone(),
            account_sid: settings.account_sid.clone(),
            auth_token: settings.auth_token.clone(),
            timeout_secs: settings.timeout_secs,
        }
    }
}

impl ApiConfig {
    /// Loads configuration from environment
    pub fn from_env() -> Result<Self, config::ConfigError> {
        Self::from_environment(config::Environment::with_prefix("FEEBOOK"))
    }

    /// Values stay strings until serde asks for a typed field, so codes and
    /// phone numbers keep their leading `0` or `+`
    fn from_environment(environment: config::Environment) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(environment.prefix_separator("_").separator("__"))
            .build()?
            .try_deserialize()
    }

    /// Returns the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Settings that must be changed before serving real traffic
    pub fn insecure_defaults(&self) -> Vec<&'static str> {
        let mut warnings = Vec::new();
        if self.jwt_secret == ApiConfig::default().jwt_secret {
            warnings.push("jwt_secret is the built-in default");
        }
        if self.otp.provider == OtpProvider::Fixed {
            warnings.push("otp.provider is fixed; any phone can sign in with the fixed code");
        }
        if !self.cookie_secure {
            warnings.push("cookie_secure is off");
        }
        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ApiConfig::default();
        assert_eq!(config.server_addr(), "0.0.0.0:8080");
        assert_eq!(config.default_country_code, "91");
        assert_eq!(config.otp.provider, OtpProvider::Fixed);
        assert_eq!(config.gateway.currency, "INR");
    }

    #[test]
    fn test_missing_fields_fall_back_to_defaults() {
        let config: ApiConfig = serde_json::from_value(serde_json::json!({
            "port": 9090,
            "otp": { "provider": "hosted" }
        }))
        .unwrap();

        assert_eq!(config.port, 9090);
        assert_eq!(config.otp.provider, OtpProvider::Hosted);
        assert_eq!(config.otp.timeout_secs, 10);
        assert_eq!(config.session_ttl_secs, 604800);
    }

    fn environment(vars: &[(&str, &str)]) -> config::Environment {
        let vars = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        config::Environment::with_prefix("FEEBOOK").source(Some(vars))
    }

    #[test]
    fn test_environment_keeps_numeric_looking_strings() {
        let config = ApiConfig::from_environment(environment(&[
            ("FEEBOOK_OTP__FIXED_CODE", "012345"),
            ("FEEBOOK_JWT_SECRET", "0042"),
            ("FEEBOOK_BOOTSTRAP_MODERATOR__NAME", "Platform Admin"),
            ("FEEBOOK_BOOTSTRAP_MODERATOR__PHONE", "+919800000009"),
            ("FEEBOOK_BOOTSTRAP_MODERATOR__EMAIL", "admin@feebook.in"),
        ]))
        .unwrap();

        assert_eq!(config.otp.fixed_code, "012345");
        assert_eq!(config.jwt_secret, "0042");
        let moderator = config.bootstrap_moderator.unwrap();
        assert_eq!(moderator.phone, "+919800000009");
        assert!(core_kernel::PhoneNumber::parse(&moderator.phone, &config.default_country_code).is_ok());
    }

    #[test]
    fn test_environment_parses_typed_fields() {
        let config = ApiConfig::from_environment(environment(&[
            ("FEEBOOK_PORT", "9090"),
            ("FEEBOOK_LOG_JSON", "true"),
            ("FEEBOOK_MAX_UPLOAD_BYTES", "1048576"),
            ("FEEBOOK_OTP__PROVIDER", "hosted"),
            ("FEEBOOK_OTP__TIMEOUT_SECS", "3"),
        ]))
        .unwrap();

        assert_eq!(config.port, 9090);
        assert!(config.log_json);
        assert_eq!(config.max_upload_bytes, 1_048_576);
        assert_eq!(config.otp.provider, OtpProvider::Hosted);
        assert_eq!(config.otp.timeout_secs, 3);
        assert_eq!(config.otp.fixed_code, "000000");
    }

    #[test]
    fn test_insecure_defaults_reported() {
        let config = ApiConfig::default();
        assert_eq!(config.insecure_defaults().len(), 3);

        let hardened = ApiConfig {
            jwt_secret: "a-long-random-secret".to_string(),
            cookie_secure: true,
            otp: OtpSettings {
                provider: OtpProvider::Hosted,
                ..OtpSettings::default()
            },
            ..ApiConfig::default()
        };
        assert!(hardened.insecure_defaults().is_empty());
    }

    #[test]
    fn test_settings_convert_to_adapter_configs() {
        let gateway = HostedGatewayConfig::from(&GatewaySettings {
            key_id: "rzp_live_x".to_string(),
            ..GatewaySettings::default()
        });
        assert_eq!(gateway.key_id, "rzp_live_x");
        assert_eq!(gateway.timeout_secs, 15);
    }
}
