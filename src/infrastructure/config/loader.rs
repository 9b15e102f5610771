use std::path::{Path, PathBuf};

use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::domain::models::config::Config;
use crate::domain::models::{ConnectionConfig, Privilege};

/// Project config file read when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = ".barback/config.yaml";

/// Dotenv file read when `--env-file` is not given.
pub const DEFAULT_ENV_FILE: &str = ".env.local";

/// Plain credential variables, each with the older name accepted as a fallback.
const CREDENTIAL_SOURCES: [(&str, [&str; 2]); 3] = [
    (
        "backend.endpoint_url",
        ["BACKEND_ENDPOINT_URL", "VITE_SUPABASE_URL"],
    ),
    (
        "backend.public_key",
        [
            Privilege::Restricted.key_variable(),
            Privilege::Restricted.legacy_key_variable(),
        ],
    ),
    (
        "backend.service_key",
        [
            Privilege::Elevated.key_variable(),
            Privilege::Elevated.legacy_key_variable(),
        ],
    ),
];

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing backend endpoint: set BACKEND_ENDPOINT_URL (or VITE_SUPABASE_URL)")]
    MissingEndpoint,

    #[error("Missing {privilege} key: set {variable}")]
    MissingKey {
        privilege: Privilege,
        variable: &'static str,
    },

    #[error("Invalid backend endpoint '{url}': {reason}")]
    InvalidEndpoint { url: String, reason: String },

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Invalid log rotation: {0}. Must be one of: daily, hourly, never")]
    InvalidLogRotation(String),

    #[error("Invalid retry configuration: {0}")]
    InvalidRetry(String),

    #[error("Invalid rate limit: {0}")]
    InvalidRateLimit(String),

    #[error("Invalid timeout_secs: {0}. Must be between 1 and 600")]
    InvalidTimeout(u64),

    #[error("Config file not found: {}", .0.display())]
    ConfigFileNotFound(PathBuf),

    #[error("Failed to read env file {}: {source}", path.display())]
    EnvFile {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },

    #[error("Failed to extract configuration: {0}")]
    Extraction(#[from] Box<figment::Error>),
}

/// Where configuration is read from.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// YAML file; defaults to [`DEFAULT_CONFIG_FILE`], missing is fine.
    pub config_file: Option<PathBuf>,
    /// Dotenv file; defaults to [`DEFAULT_ENV_FILE`], missing is fine.
    /// An explicitly named file must exist.
    pub env_file: Option<PathBuf>,
    /// Skip dotenv loading entirely.
    pub skip_env_file: bool,
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .barback/config.yaml, or the file given with `--config`
    /// 3. BARBACK_* environment variables, nested with `__`
    /// 4. BACKEND_ENDPOINT_URL / BACKEND_PUBLIC_KEY / BACKEND_SERVICE_KEY
    ///    and their legacy names
    ///
    /// The dotenv file is loaded into the process environment first and
    /// never overrides variables that are already set.
    pub fn load(options: &LoadOptions) -> Result<Config, ConfigError> {
        if !options.skip_env_file {
            Self::load_env_file(options.env_file.as_deref())?;
        }

        let config_file = match &options.config_file {
            Some(path) if !path.exists() => {
                return Err(ConfigError::ConfigFileNotFound(path.clone()));
            }
            Some(path) => path.clone(),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        let config: Config = Self::figment(&config_file)
            .extract()
            .map_err(|e| ConfigError::Extraction(Box::new(e)))?;

        Self::validate(&config)?;
        Ok(config)
    }

    fn figment(config_file: &Path) -> Figment {
        let mut figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(config_file))
            .merge(Env::prefixed("BARBACK_").split("__"));

        for (key, names) in CREDENTIAL_SOURCES {
            if let Some(value) = names.iter().find_map(|name| env_value(name)) {
                figment = figment.merge(Serialized::default(key, value));
            }
        }
        figment
    }

    fn load_env_file(explicit: Option<&Path>) -> Result<(), ConfigError> {
        let path = explicit.map_or_else(|| PathBuf::from(DEFAULT_ENV_FILE), Path::to_path_buf);
        match dotenvy::from_path(&path) {
            Ok(()) => {
                debug!(path = %path.display(), "loaded env file");
                Ok(())
            }
            Err(err) if err.not_found() && explicit.is_none() => Ok(()),
            Err(source) => Err(ConfigError::EnvFile { path, source }),
        }
    }

    /// Validate configuration after loading
    ///
    /// Credentials and the endpoint are not checked here. Offline commands
    /// never need them, and [`ConfigLoader::resolve_connection`] checks them
    /// for the commands that do.
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&config.logging.rotation.as_str()) {
            return Err(ConfigError::InvalidLogRotation(
                config.logging.rotation.clone(),
            ));
        }

        if config.rate_limit.requests_per_second == 0 {
            return Err(ConfigError::InvalidRateLimit(
                "requests_per_second must be at least 1".to_string(),
            ));
        }
        if config.rate_limit.burst_size == 0 {
            return Err(ConfigError::InvalidRateLimit(
                "burst_size must be at least 1".to_string(),
            ));
        }

        if config.retry.max_retries > 10 {
            return Err(ConfigError::InvalidRetry(format!(
                "max_retries ({}) must be at most 10",
                config.retry.max_retries
            )));
        }
        if config.retry.initial_backoff_ms == 0
            || config.retry.initial_backoff_ms > config.retry.max_backoff_ms
        {
            return Err(ConfigError::InvalidRetry(format!(
                "initial_backoff_ms ({}) must be positive and not above max_backoff_ms ({})",
                config.retry.initial_backoff_ms, config.retry.max_backoff_ms
            )));
        }

        if config.backend.timeout_secs == 0 || config.backend.timeout_secs > 600 {
            return Err(ConfigError::InvalidTimeout(config.backend.timeout_secs));
        }

        Ok(())
    }

    /// Endpoint and key for `privilege`.
    ///
    /// Fails without touching the network when the endpoint or the selected
    /// key is absent or blank. The other key is never consulted, so a
    /// missing service key does not block read-only commands.
    pub fn resolve_connection(
        config: &Config,
        privilege: Privilege,
    ) -> Result<ConnectionConfig, ConfigError> {
        let endpoint = non_blank(config.backend.endpoint_url.as_deref())
            .ok_or(ConfigError::MissingEndpoint)?;
        let endpoint = parse_endpoint(endpoint)?;

        let key = match privilege {
            Privilege::Restricted => config.backend.public_key.as_deref(),
            Privilege::Elevated => config.backend.service_key.as_deref(),
        };
        let key = non_blank(key).ok_or(ConfigError::MissingKey {
            privilege,
            variable: privilege.key_variable(),
        })?;

        Ok(ConnectionConfig::new(endpoint, key.to_string(), privilege))
    }
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .and_then(|v| non_blank(Some(&v)).map(str::to_string))
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn parse_endpoint(raw: &str) -> Result<Url, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidEndpoint {
        url: raw.to_string(),
        reason,
    };
    let url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    if url.host_str().is_none() {
        return Err(invalid("missing host".to_string()));
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_backend(endpoint: Option<&str>, public: Option<&str>, service: Option<&str>) -> Config {
        let mut config = Config::default();
        config.backend.endpoint_url = endpoint.map(str::to_string);
        config.backend.public_key = public.map(str::to_string);
        config.backend.service_key = service.map(str::to_string);
        config
    }

    #[test]
    fn test_default_config_is_valid() {
        ConfigLoader::validate(&Config::default()).expect("Default config should be valid");
    }

    #[test]
    fn test_resolve_restricted_uses_public_key() {
        let config = with_backend(Some("https://abc.supabase.co"), Some("anon"), Some("svc"));
        let conn = ConfigLoader::resolve_connection(&config, Privilege::Restricted).unwrap();
        assert_eq!(conn.key(), "anon");
        assert_eq!(conn.privilege(), Privilege::Restricted);

        let conn = ConfigLoader::resolve_connection(&config, Privilege::Elevated).unwrap();
        assert_eq!(conn.key(), "svc");
    }

    #[test]
    fn test_missing_endpoint() {
        let config = with_backend(None, Some("anon"), None);
        assert!(matches!(
            ConfigLoader::resolve_connection(&config, Privilege::Restricted),
            Err(ConfigError::MissingEndpoint)
        ));
    }

    #[test]
    fn test_blank_key_is_missing() {
        let config = with_backend(Some("https://abc.supabase.co"), Some("anon"), Some("   "));
        match ConfigLoader::resolve_connection(&config, Privilege::Elevated) {
            Err(ConfigError::MissingKey { privilege, variable }) => {
                assert_eq!(privilege, Privilege::Elevated);
                assert_eq!(variable, "BACKEND_SERVICE_KEY");
            }
            other => panic!("Expected MissingKey, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_service_key_does_not_block_reads() {
        let config = with_backend(Some("https://abc.supabase.co"), Some("anon"), None);
        assert!(ConfigLoader::resolve_connection(&config, Privilege::Restricted).is_ok());
    }

    #[test]
    fn test_invalid_endpoint_scheme() {
        let config = with_backend(Some("ftp://abc.supabase.co"), Some("anon"), None);
        assert!(ConfigLoader::validate(&config).is_ok());
        assert!(matches!(
            ConfigLoader::resolve_connection(&config, Privilege::Restricted),
            Err(ConfigError::InvalidEndpoint { .. })
        ));
        let config = with_backend(Some("not a url"), Some("anon"), None);
        assert!(matches!(
            ConfigLoader::resolve_connection(&config, Privilege::Restricted),
            Err(ConfigError::InvalidEndpoint { .. })
        ));
    }

    #[test]
    fn test_validate_invalid_log_level() {
        let mut config = Config::default();
        config.logging.level = "verbose".to_string();
        match ConfigLoader::validate(&config) {
            Err(ConfigError::InvalidLogLevel(level)) => assert_eq!(level, "verbose"),
            other => panic!("Expected InvalidLogLevel, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_invalid_log_format() {
        let mut config = Config::default();
        config.logging.format = "xml".to_string();
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidLogFormat(_))
        ));
    }

    #[test]
    fn test_validate_zero_rate_limit() {
        let mut config = Config::default();
        config.rate_limit.requests_per_second = 0;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidRateLimit(_))
        ));
    }

    #[test]
    fn test_validate_backoff_order() {
        let mut config = Config::default();
        config.retry.initial_backoff_ms = 10_000;
        config.retry.max_backoff_ms = 1_000;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidRetry(_))
        ));
    }

    #[test]
    fn test_zero_retries_is_allowed() {
        let mut config = Config::default();
        config.retry.max_retries = 0;
        assert!(ConfigLoader::validate(&config).is_ok());
    }

    #[test]
    fn test_validate_timeout_bounds() {
        let mut config = Config::default();
        config.backend.timeout_secs = 0;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidTimeout(0))
        ));
    }

    #[test]
    fn test_yaml_merging() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "backend:\n  endpoint_url: https://abc.supabase.co\nlogging:\n  level: debug"
        )
        .unwrap();
        file.flush().unwrap();

        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(file.path()))
            .extract()
            .unwrap();

        assert_eq!(
            config.backend.endpoint_url.as_deref(),
            Some("https://abc.supabase.co")
        );
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, "pretty", "Default should persist");
    }
}
