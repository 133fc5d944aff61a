use std::{
    env,
    net::{IpAddr, SocketAddr},
    path::PathBuf,
    time::Duration,
};

use thiserror::Error;

const DEFAULT_PORT: u16 = 5000;
const DEFAULT_BODY_LIMIT_MB: usize = 5;
const DEFAULT_MODEL_PATH: &str = "./model/outfit_classifier.pb";
const DEFAULT_DOWNLOAD_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} must be {expected}, got '{value}'")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelConfig {
    pub path: PathBuf,
    /// Where to fetch the model from when `path` does not exist yet.
    pub url: Option<String>,
    /// Upper bound for the whole model download, connect through last byte.
    pub download_timeout: Duration,
    pub input_op: String,
    pub output_op: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_MODEL_PATH),
            url: None,
            download_timeout: Duration::from_secs(DEFAULT_DOWNLOAD_TIMEOUT_SECS),
            input_op: "x".to_string(),
            output_op: "Identity".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub body_limit_bytes: usize,
    pub model: ModelConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: IpAddr::from([0, 0, 0, 0]),
            port: DEFAULT_PORT,
            body_limit_bytes: DEFAULT_BODY_LIMIT_MB * 1024 * 1024,
            model: ModelConfig::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds a config from an arbitrary variable source, so tests don't touch
    /// the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let host = parse_var(&lookup, "HOST", "an IP address", defaults.host)?;
        let port = parse_var(&lookup, "PORT", "a number between 0 and 65535", DEFAULT_PORT)?;
        let body_limit_mb: usize = parse_var(
            &lookup,
            "BODY_LIMIT_MB",
            "a valid integer",
            DEFAULT_BODY_LIMIT_MB,
        )?;
        let download_timeout_secs: u64 = parse_var(
            &lookup,
            "MODEL_DOWNLOAD_TIMEOUT_SECS",
            "a whole number of seconds",
            DEFAULT_DOWNLOAD_TIMEOUT_SECS,
        )?;

        let model = ModelConfig {
            path: lookup("MODEL_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.model.path),
            url: lookup("MODEL_URL").filter(|url| !url.trim().is_empty()),
            download_timeout: Duration::from_secs(download_timeout_secs),
            input_op: lookup("MODEL_INPUT_OP").unwrap_or(defaults.model.input_op),
            output_op: lookup("MODEL_OUTPUT_OP").unwrap_or(defaults.model.output_op),
        };

        Ok(Config {
            host,
            port,
            body_limit_bytes: body_limit_mb * 1024 * 1024,
            model,
        })
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn parse_var<F, T>(
    lookup: &F,
    name: &'static str,
    expected: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(name) {
        Some(value) => value.trim().parse::<T>().map_err(|_| ConfigError::Invalid {
            name,
            expected,
            value,
        }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:5000");
        assert_eq!(config.body_limit_bytes, 5 * 1024 * 1024);
    }

    #[test]
    fn reads_overrides() {
        let config = config_from(&[
            ("HOST", "127.0.0.1"),
            ("PORT", "8080"),
            ("BODY_LIMIT_MB", "12"),
            ("MODEL_PATH", "/models/clothes.pb"),
            ("MODEL_URL", "https://example.com/clothes.pb"),
            ("MODEL_OUTPUT_OP", "softmax"),
            ("MODEL_DOWNLOAD_TIMEOUT_SECS", "15"),
        ])
        .unwrap();

        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:8080");
        assert_eq!(config.body_limit_bytes, 12 * 1024 * 1024);
        assert_eq!(config.model.path, PathBuf::from("/models/clothes.pb"));
        assert_eq!(
            config.model.url.as_deref(),
            Some("https://example.com/clothes.pb")
        );
        assert_eq!(config.model.input_op, "x");
        assert_eq!(config.model.output_op, "softmax");
        assert_eq!(config.model.download_timeout, Duration::from_secs(15));
    }

    #[test]
    fn download_timeout_defaults_to_a_minute() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.model.download_timeout, Duration::from_secs(60));

        let err = config_from(&[("MODEL_DOWNLOAD_TIMEOUT_SECS", "-1")]).unwrap_err();
        assert!(err.to_string().starts_with("MODEL_DOWNLOAD_TIMEOUT_SECS must be"));
    }

    #[test]
    fn blank_model_url_is_ignored() {
        let config = config_from(&[("MODEL_URL", "  ")]).unwrap();
        assert_eq!(config.model.url, None);
    }

    #[test]
    fn rejects_bad_numbers() {
        let err = config_from(&[("PORT", "70000")]).unwrap_err();
        assert!(err.to_string().starts_with("PORT must be"));

        let err = config_from(&[("BODY_LIMIT_MB", "lots")]).unwrap_err();
        assert!(err.to_string().contains("'lots'"));
    }
}
