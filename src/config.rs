use std::env;
use std::time::Duration;

/// Backend endpoints and transport settings, loaded from environment
/// variables with workable local-development defaults.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the scan API (history storage and retrieval).
    pub scan_api_url: String,
    /// Base URL of the ingredient-analysis service.
    pub analysis_api_url: String,
    /// Per-request timeout.
    pub request_timeout: Duration,
    /// Chunk size for streamed image uploads.
    pub upload_chunk_size: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            scan_api_url: "http://localhost:8080".to_string(),
            analysis_api_url: "http://127.0.0.1:5001".to_string(),
            request_timeout: Duration::from_secs(30),
            upload_chunk_size: 64 * 1024,
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables, falling back to the
    /// defaults for anything unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let request_timeout = match env::var("SCAN_REQUEST_TIMEOUT_SECS") {
            Ok(raw) => Duration::from_secs(raw.parse().map_err(|_| {
                ConfigError::InvalidValue(
                    "SCAN_REQUEST_TIMEOUT_SECS must be a number of seconds".to_string(),
                )
            })?),
            Err(_) => defaults.request_timeout,
        };

        let upload_chunk_size = match env::var("SCAN_UPLOAD_CHUNK_SIZE") {
            Ok(raw) => raw.parse().map_err(|_| {
                ConfigError::InvalidValue("SCAN_UPLOAD_CHUNK_SIZE must be a byte count".to_string())
            })?,
            Err(_) => defaults.upload_chunk_size,
        };

        Ok(Self {
            scan_api_url: env::var("SCAN_API_URL").unwrap_or(defaults.scan_api_url),
            analysis_api_url: env::var("ANALYSIS_API_URL").unwrap_or(defaults.analysis_api_url),
            request_timeout,
            upload_chunk_size,
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_local_backends() {
        let config = ClientConfig::default();
        assert_eq!(config.scan_api_url, "http://localhost:8080");
        assert_eq!(config.analysis_api_url, "http://127.0.0.1:5001");
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert!(config.upload_chunk_size > 0);
    }
}
