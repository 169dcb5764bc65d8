use crate::error::ConfigError;
use directories::ProjectDirs;
use std::{env, path::PathBuf, time::Duration};

pub static CACHE_TTL: Duration = Duration::from_secs(12 * 60 * 60); // 12 hours
pub static REQUEST_TIMEOUT: Duration = Duration::from_secs(8);

/// Name of the persisted blob. Bump the suffix when the stored format changes.
pub const CACHE_KEY: &str = "rates_cache_v1";
pub const DEFAULT_API_URL: &str = "https://open.er-api.com/v6/latest";

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub cache_dir: PathBuf,
    pub request_timeout: Duration,
}

impl Config {
    /// Reads `RATES_API_URL`, `RATES_CACHE_DIR` and `RATES_REQUEST_TIMEOUT_SECS`,
    /// loading a `.env` file first when one exists.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_with(Overrides::default())
    }

    /// Like [`from_env`](Self::from_env), but values given in `overrides` win
    /// over the environment and go through the same validation.
    pub fn from_env_with(overrides: Overrides) -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        let api_url = match overrides.api_url {
            Some(url) => {
                validate_api_url("--api-url", &url)?;
                url
            }
            None => {
                let url =
                    env::var("RATES_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
                validate_api_url("RATES_API_URL", &url)?;
                url
            }
        };

        let cache_dir = match (overrides.cache_dir, env::var("RATES_CACHE_DIR")) {
            (Some(dir), _) => dir,
            (None, Ok(dir)) => PathBuf::from(dir),
            (None, Err(_)) => default_cache_dir()?,
        };

        let timeout_env = env::var("RATES_REQUEST_TIMEOUT_SECS");
        let request_timeout = match (overrides.timeout_secs, timeout_env) {
            (Some(secs), _) => positive_timeout("--timeout-secs", secs)?,
            (None, Ok(val)) => parse_timeout_secs("RATES_REQUEST_TIMEOUT_SECS", &val)?,
            (None, Err(_)) => REQUEST_TIMEOUT,
        };

        Ok(Config {
            api_url,
            cache_dir,
            request_timeout,
        })
    }
}

/// Command-line values that take precedence over the environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub api_url: Option<String>,
    pub cache_dir: Option<PathBuf>,
    pub timeout_secs: Option<u64>,
}

fn validate_api_url(var: &str, url: &str) -> Result<(), ConfigError> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            var: var.to_string(),
            reason: "Must start with http:// or https://".to_string(),
        })
    }
}

fn parse_timeout_secs(var: &str, val: &str) -> Result<Duration, ConfigError> {
    let secs = val.trim().parse::<u64>().map_err(|_| ConfigError::InvalidValue {
        var: var.to_string(),
        reason: format!("Must be a positive number, got: {}", val),
    })?;
    positive_timeout(var, secs)
}

fn positive_timeout(var: &str, secs: u64) -> Result<Duration, ConfigError> {
    if secs == 0 {
        return Err(ConfigError::InvalidValue {
            var: var.to_string(),
            reason: "Must be a positive number, got: 0".to_string(),
        });
    }
    Ok(Duration::from_secs(secs))
}

fn default_cache_dir() -> Result<PathBuf, ConfigError> {
    ProjectDirs::from("", "", "currency_rates")
        .map(|dirs| dirs.cache_dir().to_path_buf())
        .ok_or(ConfigError::NoCacheDir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    struct EnvGuard {
        vars: Vec<String>,
    }

    impl EnvGuard {
        fn new() -> Self {
            EnvGuard { vars: Vec::new() }
        }

        fn set(&mut self, key: &str, value: &str) {
            env::set_var(key, value);
            self.vars.push(key.to_string());
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            for var in &self.vars {
                env::remove_var(var);
            }
        }
    }

    #[test]
    #[serial]
    fn test_config_from_env_overrides() {
        let mut guard = EnvGuard::new();
        guard.set("RATES_API_URL", "http://localhost:9999/latest");
        guard.set("RATES_CACHE_DIR", "/tmp/rates-test");
        guard.set("RATES_REQUEST_TIMEOUT_SECS", "3");

        let config = Config::from_env().unwrap();
        assert_eq!(config.api_url, "http://localhost:9999/latest");
        assert_eq!(config.cache_dir, PathBuf::from("/tmp/rates-test"));
        assert_eq!(config.request_timeout, Duration::from_secs(3));
    }

    #[test]
    #[serial]
    fn test_config_rejects_bad_url() {
        let mut guard = EnvGuard::new();
        guard.set("RATES_API_URL", "not-a-url");
        guard.set("RATES_CACHE_DIR", "/tmp/rates-test");

        match Config::from_env() {
            Err(ConfigError::InvalidValue { var, .. }) => assert_eq!(var, "RATES_API_URL"),
            other => panic!("Expected InvalidValue error, got: {:?}", other),
        }
    }

    #[test]
    #[serial]
    fn test_overrides_win_over_env() {
        let mut guard = EnvGuard::new();
        guard.set("RATES_API_URL", "http://localhost:9999/latest");
        guard.set("RATES_CACHE_DIR", "/tmp/rates-test");
        guard.set("RATES_REQUEST_TIMEOUT_SECS", "3");

        let config = Config::from_env_with(Overrides {
            api_url: Some("https://rates.example.com/latest".to_string()),
            cache_dir: Some(PathBuf::from("/tmp/rates-override")),
            timeout_secs: Some(20),
        })
        .unwrap();
        assert_eq!(config.api_url, "https://rates.example.com/latest");
        assert_eq!(config.cache_dir, PathBuf::from("/tmp/rates-override"));
        assert_eq!(config.request_timeout, Duration::from_secs(20));
    }

    #[test]
    #[serial]
    fn test_overrides_are_validated() {
        let mut guard = EnvGuard::new();
        guard.set("RATES_CACHE_DIR", "/tmp/rates-test");

        let result = Config::from_env_with(Overrides {
            api_url: Some("not-a-url".to_string()),
            ..Overrides::default()
        });
        match result {
            Err(ConfigError::InvalidValue { var, .. }) => assert_eq!(var, "--api-url"),
            other => panic!("Expected InvalidValue error, got: {:?}", other),
        }

        let result = Config::from_env_with(Overrides {
            timeout_secs: Some(0),
            ..Overrides::default()
        });
        match result {
            Err(ConfigError::InvalidValue { var, .. }) => assert_eq!(var, "--timeout-secs"),
            other => panic!("Expected InvalidValue error, got: {:?}", other),
        }
    }

    #[test]
    fn test_parse_timeout_secs() {
        assert_eq!(parse_timeout_secs("T", "8").unwrap(), Duration::from_secs(8));
        assert!(parse_timeout_secs("T", "0").is_err());
        assert!(parse_timeout_secs("T", "soon").is_err());
    }

    #[test]
    fn test_ttl_is_twelve_hours() {
        assert_eq!(CACHE_TTL.as_millis(), 12 * 60 * 60 * 1000);
    }
}
