//! Session configuration module
//!
//! Type-safe configuration loaded from environment variables using the
//! `config` and `dotenvy` crates. Variables carry the `CHAT_CORE` prefix and
//! nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use chat_session_core::config::ChatConfig;
//!
//! let config = ChatConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! let context = config.connection_context();
//! println!("Chat session for brand {}", context.brand_id);
//! ```

mod connection;
mod environment;
mod error;
mod http;
mod logging;
mod storage;

pub use connection::ConnectionConfig;
pub use environment::EnvironmentConfig;
pub use error::{ConfigError, ValidationError};
pub use http::HttpConfig;
pub use logging::{init_tracing, LoggingConfig};
pub use storage::StorageConfig;

use serde::Deserialize;

use crate::domain::auth::ConnectionContext;

/// Root session configuration
///
/// Load using [`ChatConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatConfig {
    /// Brand, channel, authentication mode and customer identity
    pub connection: ConnectionConfig,

    /// Chat, socket, logger and token server endpoints
    pub environment: EnvironmentConfig,

    #[serde(default)]
    pub http: HttpConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ChatConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `CHAT_CORE` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    ///
    /// # Environment Variable Format
    ///
    /// - `CHAT_CORE__CONNECTION__BRAND_ID=1086` -> `connection.brand_id = 1086`
    /// - `CHAT_CORE__ENVIRONMENT__CHAT_URL=...` -> `environment.chat_url = ...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or values
    /// cannot be parsed into the expected types.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("CHAT_CORE")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for the first invalid value found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.connection.validate()?;
        self.environment.validate()?;
        self.http.validate()?;
        self.logging.validate()?;
        Ok(())
    }

    /// Owned per-session context handed to each component at construction.
    pub fn connection_context(&self) -> ConnectionContext {
        let connection = &self.connection;
        let mut context = ConnectionContext::new(
            connection.brand_id,
            connection.channel_id.clone(),
            connection.authentication_mode,
            self.environment.to_environment(),
        );

        if let Some(visitor_id) = connection.visitor_id {
            context = context.with_visitor_id(visitor_id);
        }
        if let Some(customer) = connection.customer() {
            context = context.with_customer(customer);
        }
        context.set_oauth_secrets(connection.authorization_code.clone(), connection.code_verifier.clone());

        context
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::AuthenticationMode;
    use std::env;
    use std::sync::Mutex;

    // Mutex to ensure tests don't run in parallel (env vars are global)
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    fn set_minimal_env() {
        env::set_var("CHAT_CORE__CONNECTION__BRAND_ID", "1086");
        env::set_var("CHAT_CORE__CONNECTION__CHANNEL_ID", "chat_51eb");
        env::set_var("CHAT_CORE__ENVIRONMENT__CHAT_URL", "https://channels-eu1.example.com/chat");
        env::set_var("CHAT_CORE__ENVIRONMENT__SOCKET_URL", "wss://chat-gateway-eu1.example.com");
    }

    fn clear_env() {
        for key in [
            "CHAT_CORE__CONNECTION__BRAND_ID",
            "CHAT_CORE__CONNECTION__CHANNEL_ID",
            "CHAT_CORE__CONNECTION__AUTHENTICATION_MODE",
            "CHAT_CORE__CONNECTION__AUTHORIZATION_CODE",
            "CHAT_CORE__CONNECTION__CODE_VERIFIER",
            "CHAT_CORE__CONNECTION__CUSTOMER_ID",
            "CHAT_CORE__ENVIRONMENT__CHAT_URL",
            "CHAT_CORE__ENVIRONMENT__SOCKET_URL",
            "CHAT_CORE__HTTP__REQUEST_TIMEOUT_SECS",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    fn test_load_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = ChatConfig::load();
        clear_env();

        assert!(result.is_ok(), "Failed to load config: {:?}", result.err());
        let config = result.unwrap();
        assert_eq!(config.connection.brand_id, 1086);
        assert_eq!(config.connection.channel_id, "chat_51eb");
        assert_eq!(config.connection.authentication_mode, AuthenticationMode::Anonymous);
        assert_eq!(config.http.request_timeout_secs, 30);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_custom_timeout() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        env::set_var("CHAT_CORE__HTTP__REQUEST_TIMEOUT_SECS", "5");
        let result = ChatConfig::load();
        clear_env();

        assert_eq!(result.unwrap().http.request_timeout_secs, 5);
    }

    #[test]
    fn test_missing_channel_fails_to_load() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        env::remove_var("CHAT_CORE__CONNECTION__CHANNEL_ID");
        let result = ChatConfig::load();
        clear_env();

        assert!(result.is_err());
    }

    #[test]
    fn test_oauth_context_carries_codes() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        env::set_var("CHAT_CORE__CONNECTION__AUTHENTICATION_MODE", "thirdPartyOAuth");
        env::set_var("CHAT_CORE__CONNECTION__AUTHORIZATION_CODE", "code-1");
        env::set_var("CHAT_CORE__CONNECTION__CODE_VERIFIER", "verifier-1");
        env::set_var("CHAT_CORE__CONNECTION__CUSTOMER_ID", "cust-1");
        let result = ChatConfig::load();
        clear_env();

        let config = result.unwrap();
        assert!(config.validate().is_ok());

        let context = config.connection_context();
        assert_eq!(context.authentication_mode, AuthenticationMode::ThirdPartyOAuth);
        assert_eq!(context.authorization_code(), Some("code-1"));
        assert_eq!(context.code_verifier(), Some("verifier-1"));
        assert_eq!(context.customer.unwrap().id_on_external_platform, "cust-1");
        assert!(context.visitor_id.is_none());
    }
}
