//! Gateway configuration loaded once at startup

use std::{env, str::FromStr, time::Duration};

use thiserror::Error;

use crate::admission::{ApiSecret, AuthPolicy, AuthenticatedQuota, RoutePolicies};

/// Default request timeout in seconds
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Default listening port
const DEFAULT_PORT: u16 = 8001;

/// Errors raised while loading configuration
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable holds a value that does not parse
    #[error("Invalid value {value:?} for {var}")]
    InvalidValue {
        /// Variable name
        var: &'static str,
        /// Raw value found
        value: String,
    },
}

/// Admission and HTTP settings for the gateway
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Secret bearer tokens are compared against
    pub api_secret: ApiSecret,
    /// Authorization policy per upload endpoint
    pub policies: RoutePolicies,
    /// Whether authenticated callers are charged quota
    pub authenticated_quota: AuthenticatedQuota,
    /// Deadline applied to every request
    pub request_timeout: Duration,
    /// Port the server listens on
    pub port: u16,
}

impl GatewayConfig {
    /// Loads the configuration from the process environment
    ///
    /// | Variable | Default |
    /// |---|---|
    /// | `API_SECRET_KEY` | not configured |
    /// | `UPLOAD_AUTH_POLICY` | `strict` |
    /// | `MULTI_UPLOAD_AUTH_POLICY` | value of `UPLOAD_AUTH_POLICY` |
    /// | `AUTHENTICATED_QUOTA` | `limited` |
    /// | `REQUEST_TIMEOUT_SECS` | `30` |
    /// | `PORT` | `8001` |
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any variable is set to a value that does not parse
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_secret = ApiSecret::from_value(env::var("API_SECRET_KEY").ok());
        if !api_secret.is_configured() {
            tracing::error!("API_SECRET_KEY is not set, every credential will be rejected");
        }

        let single_upload = parse_var("UPLOAD_AUTH_POLICY", AuthPolicy::Strict)?;
        let multi_upload = parse_var("MULTI_UPLOAD_AUTH_POLICY", single_upload)?;
        let authenticated_quota = parse_var("AUTHENTICATED_QUOTA", AuthenticatedQuota::Limited)?;
        let timeout_secs = parse_var("REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS)?;
        let port = parse_var("PORT", DEFAULT_PORT)?;

        Ok(Self {
            api_secret,
            policies: RoutePolicies {
                single_upload,
                multi_upload,
            },
            authenticated_quota,
            request_timeout: Duration::from_secs(timeout_secs),
            port,
        })
    }
}

fn parse_var<T: FromStr>(var: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(var) {
        Ok(value) if !value.trim().is_empty() => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { var, value }),
        _ => Ok(default),
    }
}
