/// Configuration management for the LemonPie state engine
use crate::error::{AppError, AppResult};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub auth: AuthPolicyConfig,
    pub api: ApiConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

/// Authentication policy configuration
///
/// Defaults reproduce the mock backend's limits: 5 attempts in a 5 minute
/// window, 15 minute lockout, 24 hour session TTL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthPolicyConfig {
    /// Failed attempts before lockout / rate limiting kicks in
    pub max_attempts: u32,
    /// Sliding window for the attempt ledger, in seconds
    pub attempt_window_secs: u64,
    /// Account lockout duration after repeated password failures, in seconds
    pub lockout_duration_secs: u64,
    /// Fixed TTL embedded in mock session tokens, in seconds
    pub session_ttl_secs: u64,
    /// Artificial latency injected into auth calls to mimic a real backend.
    /// Zero in tests so flows run synchronously.
    pub simulated_latency_ms: u64,
}

/// Backend API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    /// When true, auth and catalog operations stay fully in-process and the
    /// REST client is never consulted
    pub mock_mode: bool,
    pub request_timeout_secs: u64,
}

/// Durable client storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// File backing the key-value store in non-mock runs
    pub state_file: PathBuf,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for AuthPolicyConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            attempt_window_secs: 5 * 60,
            lockout_duration_secs: 15 * 60,
            session_ttl_secs: 24 * 60 * 60,
            simulated_latency_ms: 0,
        }
    }
}

impl AuthPolicyConfig {
    pub fn attempt_window(&self) -> Duration {
        Duration::seconds(self.attempt_window_secs as i64)
    }

    pub fn lockout_duration(&self) -> Duration {
        Duration::seconds(self.lockout_duration_secs as i64)
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::seconds(self.session_ttl_secs as i64)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/api/v1".to_string(),
            mock_mode: true,
            request_timeout_secs: 10,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            state_file: PathBuf::from("./data/lemonpie.json"),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            auth: AuthPolicyConfig::default(),
            api: ApiConfig::default(),
            storage: StorageConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> AppResult<Self> {
        dotenv::dotenv().ok();

        let max_attempts = env::var("LEMONPIE_AUTH_MAX_ATTEMPTS")
            .unwrap_or_else(|_| "5".to_string())
            .parse()
            .map_err(|_| AppError::Validation("Invalid max attempts".to_string()))?;
        let attempt_window_secs = env::var("LEMONPIE_AUTH_ATTEMPT_WINDOW_SECS")
            .unwrap_or_else(|_| "300".to_string())
            .parse()
            .unwrap_or(300);
        let lockout_duration_secs = env::var("LEMONPIE_AUTH_LOCKOUT_SECS")
            .unwrap_or_else(|_| "900".to_string())
            .parse()
            .unwrap_or(900);
        let session_ttl_secs = env::var("LEMONPIE_AUTH_SESSION_TTL_SECS")
            .unwrap_or_else(|_| "86400".to_string())
            .parse()
            .unwrap_or(86400);
        let simulated_latency_ms = env::var("LEMONPIE_AUTH_SIMULATED_LATENCY_MS")
            .unwrap_or_else(|_| "0".to_string())
            .parse()
            .unwrap_or(0);

        let base_url = env::var("LEMONPIE_API_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:8000/api/v1".to_string());
        let mock_mode = env::var("LEMONPIE_API_MOCK_MODE")
            .unwrap_or_else(|_| "true".to_string())
            .parse()
            .unwrap_or(true);
        let request_timeout_secs = env::var("LEMONPIE_API_TIMEOUT_SECS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .unwrap_or(10);

        let state_file = env::var("LEMONPIE_STATE_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./data/lemonpie.json"));

        let level = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Ok(AppConfig {
            auth: AuthPolicyConfig {
                max_attempts,
                attempt_window_secs,
                lockout_duration_secs,
                session_ttl_secs,
                simulated_latency_ms,
            },
            api: ApiConfig {
                base_url,
                mock_mode,
                request_timeout_secs,
            },
            storage: StorageConfig { state_file },
            logging: LoggingConfig { level },
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> AppResult<()> {
        if self.auth.max_attempts == 0 {
            return Err(AppError::Validation(
                "max_attempts must be at least 1".to_string(),
            ));
        }

        if self.auth.attempt_window_secs == 0 {
            return Err(AppError::Validation(
                "attempt_window_secs must be positive".to_string(),
            ));
        }

        if !self.api.mock_mode && self.api.base_url.is_empty() {
            return Err(AppError::Validation(
                "base_url required when mock mode is disabled".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_mock_backend_limits() {
        let config = AppConfig::default();
        assert_eq!(config.auth.max_attempts, 5);
        assert_eq!(config.auth.attempt_window(), Duration::minutes(5));
        assert_eq!(config.auth.lockout_duration(), Duration::minutes(15));
        assert_eq!(config.auth.session_ttl(), Duration::hours(24));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_max_attempts_rejected() {
        let mut config = AppConfig::default();
        config.auth.max_attempts = 0;
        assert!(config.validate().is_err());
    }
}
