use thiserror::Error;

/// Failures surfaced to callers of the rate fetcher and converter.
#[derive(Debug, Error)]
pub enum RateError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("request timed out")]
    Timeout,

    #[error("HTTP {0}")]
    Http(u16),

    #[error("{0}")]
    Api(String),

    #[error("No rate for {0}")]
    NoRate(String),

    #[error("invalid amount: {0}")]
    InvalidAmount(f64),
}

/// Persisted cache failures. These never leave the cache store.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache read failed: {0}")]
    Read(String),

    #[error("cache write failed: {0}")]
    Write(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {reason}")]
    InvalidValue { var: String, reason: String },

    #[error("could not determine a cache directory")]
    NoCacheDir,
}

pub type RateResult<T> = Result<T, RateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(RateError::Http(503).to_string(), "HTTP 503");
        assert_eq!(
            RateError::Api("invalid-base".to_string()).to_string(),
            "invalid-base"
        );
        assert_eq!(RateError::NoRate("XYZ".to_string()).to_string(), "No rate for XYZ");

        let err = ConfigError::InvalidValue {
            var: "RATES_API_URL".to_string(),
            reason: "Must start with http:// or https://".to_string(),
        };
        assert!(err.to_string().contains("RATES_API_URL"));
    }
}
