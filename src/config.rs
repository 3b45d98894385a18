use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::time::Duration;

/// Chart ranges the upstream accepts for daily bars.
pub const SUPPORTED_RANGES: &[&str] = &["5d", "1mo", "3mo", "6mo", "1y"];

// YAML-serializable configuration structure. Every key is optional.
#[derive(Serialize, Deserialize, Debug, Default)]
pub struct ConfigYaml {
    pub app_name: Option<String>,
    pub environment: Option<String>,
    pub port: Option<u16>,
    pub market_data_url: Option<String>,
    pub upstream_timeout_secs: Option<u64>,
    pub history_range: Option<String>,
    pub cache_ttl_secs: Option<u64>,
    pub rate_limit_per_second: Option<u64>,
    pub rate_limit_burst: Option<u32>,
}

/// Sustained requests per second per client IP, plus how many may arrive at once.
#[derive(Clone, Debug)]
pub struct RateLimitConfig {
    pub per_second: u64,
    pub burst_size: u32,
}

// Holds application-wide settings
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub app_name: String,
    pub environment: String,
    pub port: u16,
    pub market_data_url: String,
    pub upstream_timeout: Duration,
    pub history_range: String,
    pub cache_ttl: Duration,
    pub rate_limit: RateLimitConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app_name: "market-watcher".to_string(),
            environment: "development".to_string(),
            port: 5000,
            market_data_url: "https://query1.finance.yahoo.com".to_string(),
            upstream_timeout: Duration::from_secs(10),
            history_range: "5d".to_string(),
            cache_ttl: Duration::from_secs(300),
            rate_limit: RateLimitConfig { per_second: 10, burst_size: 20 },
        }
    }
}

impl AppConfig {
    // Load configuration from YAML file or environment variables
    pub fn load() -> Result<Self, ConfigError> {
        if let Ok(config_file) = env::var("CONFIG_FILE") {
            Self::from_yaml(&config_file)
        } else {
            Self::from_env()
        }
    }

    pub fn from_yaml(file_path: &str) -> Result<Self, ConfigError> {
        let yaml_content = fs::read_to_string(file_path).map_err(|source| ConfigError::Read {
            path: file_path.to_string(),
            source,
        })?;
        Self::from_yaml_str(&yaml_content)
    }

    pub fn from_yaml_str(yaml_content: &str) -> Result<Self, ConfigError> {
        let yaml: ConfigYaml = serde_yaml::from_str(yaml_content)?;
        Self::default().merge(yaml)
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from a key lookup, so environment parsing can be
    /// exercised without touching the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let yaml = ConfigYaml {
            app_name: lookup("APP_NAME"),
            environment: lookup("ENVIRONMENT"),
            port: parse_var(&lookup, "PORT")?,
            market_data_url: lookup("MARKET_DATA_URL"),
            upstream_timeout_secs: parse_var(&lookup, "UPSTREAM_TIMEOUT_SECS")?,
            history_range: lookup("HISTORY_RANGE"),
            cache_ttl_secs: parse_var(&lookup, "CACHE_TTL_SECS")?,
            rate_limit_per_second: parse_var(&lookup, "RATE_LIMIT_PER_SECOND")?,
            rate_limit_burst: parse_var(&lookup, "RATE_LIMIT_BURST")?,
        };
        Self::default().merge(yaml)
    }

    fn merge(self, yaml: ConfigYaml) -> Result<Self, ConfigError> {
        let history_range = yaml.history_range.unwrap_or(self.history_range);
        if !SUPPORTED_RANGES.contains(&history_range.as_str()) {
            return Err(ConfigError::InvalidValue { key: "history_range", value: history_range });
        }

        let rate_limit = RateLimitConfig {
            per_second: yaml.rate_limit_per_second.unwrap_or(self.rate_limit.per_second),
            burst_size: yaml.rate_limit_burst.unwrap_or(self.rate_limit.burst_size),
        };
        if rate_limit.per_second == 0 || rate_limit.per_second > 1000 || rate_limit.burst_size == 0 {
            return Err(ConfigError::InvalidValue {
                key: "rate_limit",
                value: format!("{}/s burst {}", rate_limit.per_second, rate_limit.burst_size),
            });
        }

        Ok(Self {
            app_name: yaml.app_name.unwrap_or(self.app_name),
            environment: yaml.environment.unwrap_or(self.environment),
            port: yaml.port.unwrap_or(self.port),
            market_data_url: yaml
                .market_data_url
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(self.market_data_url),
            upstream_timeout: yaml
                .upstream_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(self.upstream_timeout),
            history_range,
            cache_ttl: yaml.cache_ttl_secs.map(Duration::from_secs).unwrap_or(self.cache_ttl),
            rate_limit,
        })
    }
}

fn parse_var<F, T>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { key, value }),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_nothing_set() {
        let config = AppConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.port, 5000);
        assert_eq!(config.history_range, "5d");
        assert_eq!(config.cache_ttl, Duration::from_secs(300));
        assert_eq!(config.market_data_url, "https://query1.finance.yahoo.com");
    }

    #[test]
    fn test_env_overrides() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("PORT", "8080"),
            ("CACHE_TTL_SECS", "0"),
            ("MARKET_DATA_URL", "http://localhost:9999/"),
            ("HISTORY_RANGE", "1mo"),
        ]))
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.cache_ttl, Duration::ZERO);
        assert_eq!(config.market_data_url, "http://localhost:9999");
        assert_eq!(config.history_range, "1mo");
    }

    #[test]
    fn test_bad_number_is_an_error() {
        let err = AppConfig::from_lookup(lookup_from(&[("PORT", "eighty")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "PORT", .. }));
    }

    #[test]
    fn test_unsupported_range_is_an_error() {
        let err = AppConfig::from_lookup(lookup_from(&[("HISTORY_RANGE", "7d")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "history_range", .. }));
    }

    #[test]
    fn test_rate_limit_bounds() {
        for rate in ["0", "1001"] {
            let err = AppConfig::from_lookup(lookup_from(&[("RATE_LIMIT_PER_SECOND", rate)])).unwrap_err();
            assert!(matches!(err, ConfigError::InvalidValue { key: "rate_limit", .. }));
        }
        let config = AppConfig::from_lookup(lookup_from(&[("RATE_LIMIT_PER_SECOND", "1000")])).unwrap();
        assert_eq!(config.rate_limit.per_second, 1000);
    }

    #[test]
    fn test_yaml_partial_config() {
        let config = AppConfig::from_yaml_str(
            "app_name: watcher-eu\nport: 7000\nupstream_timeout_secs: 3\nrate_limit_burst: 5\n",
        )
        .unwrap();
        assert_eq!(config.app_name, "watcher-eu");
        assert_eq!(config.port, 7000);
        assert_eq!(config.upstream_timeout, Duration::from_secs(3));
        assert_eq!(config.rate_limit.burst_size, 5);
        assert_eq!(config.rate_limit.per_second, 10);
    }

    #[test]
    fn test_yaml_parse_error() {
        assert!(matches!(AppConfig::from_yaml_str("port: [1, 2"), Err(ConfigError::Yaml(_))));
    }

    #[test]
    fn test_missing_file() {
        let err = AppConfig::from_yaml("/nonexistent/market-watcher.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
