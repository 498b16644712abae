//! Configuration types.

use std::time::Duration;

use crate::error::ConfigError;
use crate::flow::FlowConfig;

/// Where the registration service lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub base_url: String,
    pub status_path: String,
    pub send_code_path: String,
    pub check_code_path: String,
    pub registration_path: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://platform.astanahubcloud.com".to_string(),
            status_path: "/telegram/auth/check".to_string(),
            send_code_path: "/telegram/auth/send-code".to_string(),
            check_code_path: "/telegram/auth/check-code".to_string(),
            registration_path: "/telegram/auth/registration".to_string(),
        }
    }
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Port the HTTP server binds on 0.0.0.0.
    pub port: u16,
    pub api: ApiConfig,
    pub flow: FlowConfig,
    /// Sessions untouched for this long are dropped.
    pub session_idle_timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            api: ApiConfig::default(),
            flow: FlowConfig::default(),
            session_idle_timeout: Duration::from_secs(1800), // 30 minutes
        }
    }
}

impl AppConfig {
    /// Load from `SIGNUP_*` environment variables, defaulting anything unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using `lookup` in place of the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let port = match lookup("SIGNUP_PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|e| ConfigError::InvalidValue {
                key: "SIGNUP_PORT".into(),
                message: format!("{e}"),
            })?,
            None => defaults.port,
        };

        let flow = match lookup("SIGNUP_VARIANT") {
            Some(raw) => raw.parse::<FlowConfig>()?,
            None => defaults.flow,
        };

        let idle_secs = match lookup("SIGNUP_SESSION_IDLE_SECS") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(0) => {
                    return Err(ConfigError::InvalidValue {
                        key: "SIGNUP_SESSION_IDLE_SECS".into(),
                        message: "must be greater than zero".into(),
                    });
                }
                Ok(secs) => secs,
                Err(e) => {
                    return Err(ConfigError::InvalidValue {
                        key: "SIGNUP_SESSION_IDLE_SECS".into(),
                        message: format!("{e}"),
                    });
                }
            },
            None => defaults.session_idle_timeout.as_secs(),
        };

        let api = ApiConfig {
            base_url: lookup("SIGNUP_API_BASE_URL").unwrap_or(defaults.api.base_url),
            status_path: lookup("SIGNUP_STATUS_PATH").unwrap_or(defaults.api.status_path),
            send_code_path: lookup("SIGNUP_SEND_CODE_PATH").unwrap_or(defaults.api.send_code_path),
            check_code_path: lookup("SIGNUP_CHECK_CODE_PATH")
                .unwrap_or(defaults.api.check_code_path),
            registration_path: lookup("SIGNUP_REGISTRATION_PATH")
                .unwrap_or(defaults.api.registration_path),
        };

        Ok(Self {
            port,
            api,
            flow,
            session_idle_timeout: Duration::from_secs(idle_secs),
        })
    }
}
