use std::env;
use std::fs;
use std::path::PathBuf;

use secrecy::SecretString;
use serde::Deserialize;
use thiserror::Error;

use crate::lang::Dialect;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub llm: LlmConfig,
    pub server: ServerConfig,
    pub engine: EngineConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LlmConfig {
    pub base_url: Option<String>,
    pub api_key: Option<SecretString>,
    pub model: String,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
}

#[derive(Clone, Debug)]
pub struct EngineConfig {
    pub deployment: String,
    pub flows_dir: PathBuf,
    pub default_dialect: Dialect,
    pub history_limit: u32,
    pub rate_limit_per_minute: u32,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
struct RawConfig {
    database: RawDatabase,
    llm: RawLlm,
    server: RawServer,
    engine: RawEngine,
    logging: RawLogging,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
struct RawDatabase {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
struct RawLlm {
    base_url: Option<String>,
    api_key: Option<String>,
    model: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
struct RawServer {
    bind_address: Option<String>,
    port: Option<u16>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
struct RawEngine {
    deployment: Option<String>,
    flows_dir: Option<PathBuf>,
    default_dialect: Option<String>,
    history_limit: Option<u32>,
    rate_limit_per_minute: Option<u32>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
struct RawLogging {
    level: Option<String>,
    format: Option<LogFormat>,
}

impl AppConfig {
    /// Load from `anihan.toml` (or `ANIHAN_CONFIG`), then apply `ANIHAN_*`
    /// environment overrides. Every field has a development default, so a
    /// missing file is only an error when the caller demands one.
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let path = options
            .config_path
            .or_else(|| env::var("ANIHAN_CONFIG").ok().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("anihan.toml"));

        let raw = match fs::read_to_string(&path) {
            Ok(contents) => toml::from_str::<RawConfig>(&contents)
                .map_err(|source| ConfigError::ParseFile { path: path.clone(), source })?,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                if options.require_file {
                    return Err(ConfigError::MissingConfigFile(path));
                }
                RawConfig::default()
            }
            Err(source) => return Err(ConfigError::ReadFile { path, source }),
        };

        Self::from_raw(raw, &|key| env::var(key).ok())
    }

    fn from_raw(
        mut raw: RawConfig,
        env_lookup: &dyn Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        apply_env_overrides(&mut raw, env_lookup)?;

        let config = Self {
            database: DatabaseConfig {
                url: raw.database.url.unwrap_or_else(|| "sqlite:anihan.db".to_owned()),
                max_connections: raw.database.max_connections.unwrap_or(5),
                timeout_secs: raw.database.timeout_secs.unwrap_or(30),
            },
            llm: LlmConfig {
                base_url: raw.llm.base_url,
                api_key: raw.llm.api_key.map(SecretString::from),
                model: raw.llm.model.unwrap_or_else(|| "gpt-4o-mini".to_owned()),
                timeout_secs: raw.llm.timeout_secs.unwrap_or(30),
            },
            server: ServerConfig {
                bind_address: raw.server.bind_address.unwrap_or_else(|| "127.0.0.1".to_owned()),
                port: raw.server.port.unwrap_or(8080),
            },
            engine: EngineConfig {
                deployment: raw.engine.deployment.unwrap_or_else(|| "development".to_owned()),
                flows_dir: raw.engine.flows_dir.unwrap_or_else(|| PathBuf::from("flows")),
                default_dialect: match raw.engine.default_dialect.as_deref() {
                    None => Dialect::English,
                    Some(value) => Dialect::parse(value).ok_or_else(|| {
                        ConfigError::InvalidEnvOverride {
                            key: "engine.default_dialect".to_owned(),
                            value: value.to_owned(),
                        }
                    })?,
                },
                history_limit: raw.engine.history_limit.unwrap_or(20),
                rate_limit_per_minute: raw.engine.rate_limit_per_minute.unwrap_or(30),
            },
            logging: LoggingConfig {
                level: raw.logging.level.unwrap_or_else(|| "info".to_owned()),
                format: raw.logging.format.unwrap_or(LogFormat::Compact),
            },
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.database.max_connections == 0 {
            return Err(ConfigError::Validation(
                "database.max_connections must be at least 1".to_owned(),
            ));
        }
        if self.llm.model.trim().is_empty() {
            return Err(ConfigError::Validation("llm.model must not be empty".to_owned()));
        }
        if self.engine.history_limit == 0 {
            return Err(ConfigError::Validation(
                "engine.history_limit must be at least 1".to_owned(),
            ));
        }
        if self.engine.rate_limit_per_minute == 0 {
            return Err(ConfigError::Validation(
                "engine.rate_limit_per_minute must be at least 1".to_owned(),
            ));
        }
        Ok(())
    }
}

fn apply_env_overrides(
    raw: &mut RawConfig,
    lookup: &dyn Fn(&str) -> Option<String>,
) -> Result<(), ConfigError> {
    if let Some(url) = lookup("ANIHAN_DATABASE_URL") {
        raw.database.url = Some(url);
    }
    if let Some(base_url) = lookup("ANIHAN_LLM_BASE_URL") {
        raw.llm.base_url = Some(base_url);
    }
    if let Some(api_key) = lookup("ANIHAN_LLM_API_KEY") {
        raw.llm.api_key = Some(api_key);
    }
    if let Some(model) = lookup("ANIHAN_LLM_MODEL") {
        raw.llm.model = Some(model);
    }
    if let Some(bind_address) = lookup("ANIHAN_BIND_ADDRESS") {
        raw.server.bind_address = Some(bind_address);
    }
    if let Some(port) = lookup("ANIHAN_PORT") {
        raw.server.port = Some(port.parse().map_err(|_| ConfigError::InvalidEnvOverride {
            key: "ANIHAN_PORT".to_owned(),
            value: port.clone(),
        })?);
    }
    if let Some(deployment) = lookup("ANIHAN_DEPLOYMENT") {
        raw.engine.deployment = Some(deployment);
    }
    if let Some(flows_dir) = lookup("ANIHAN_FLOWS_DIR") {
        raw.engine.flows_dir = Some(PathBuf::from(flows_dir));
    }
    if let Some(dialect) = lookup("ANIHAN_DEFAULT_DIALECT") {
        raw.engine.default_dialect = Some(dialect);
    }
    if let Some(level) = lookup("ANIHAN_LOG_LEVEL") {
        raw.logging.level = Some(level);
    }
    if let Some(format) = lookup("ANIHAN_LOG_FORMAT") {
        raw.logging.format = Some(match format.as_str() {
            "compact" => LogFormat::Compact,
            "pretty" => LogFormat::Pretty,
            "json" => LogFormat::Json,
            other => {
                return Err(ConfigError::InvalidEnvOverride {
                    key: "ANIHAN_LOG_FORMAT".to_owned(),
                    value: other.to_owned(),
                })
            }
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;
    use std::path::PathBuf;

    use super::{AppConfig, ConfigError, LoadOptions, LogFormat, RawConfig};
    use crate::lang::Dialect;

    fn from_raw_with_env(
        raw: RawConfig,
        env: &[(&str, &str)],
    ) -> Result<AppConfig, ConfigError> {
        let env: HashMap<String, String> =
            env.iter().map(|(key, value)| ((*key).to_owned(), (*value).to_owned())).collect();
        AppConfig::from_raw(raw, &move |key| env.get(key).cloned())
    }

    #[test]
    fn defaults_cover_every_field() {
        let config = from_raw_with_env(RawConfig::default(), &[]).expect("config");
        assert_eq!(config.database.url, "sqlite:anihan.db");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.engine.deployment, "development");
        assert_eq!(config.engine.default_dialect, Dialect::English);
        assert_eq!(config.engine.flows_dir, PathBuf::from("flows"));
        assert_eq!(config.logging.format, LogFormat::Compact);
        assert!(config.llm.api_key.is_none());
    }

    #[test]
    fn env_overrides_take_precedence() {
        let config = from_raw_with_env(
            RawConfig::default(),
            &[
                ("ANIHAN_DATABASE_URL", "sqlite::memory:"),
                ("ANIHAN_DEPLOYMENT", "pilot"),
                ("ANIHAN_DEFAULT_DIALECT", "fil"),
                ("ANIHAN_PORT", "9090"),
                ("ANIHAN_LOG_FORMAT", "json"),
            ],
        )
        .expect("config");

        assert_eq!(config.database.url, "sqlite::memory:");
        assert_eq!(config.engine.deployment, "pilot");
        assert_eq!(config.engine.default_dialect, Dialect::Filipino);
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn invalid_env_override_is_rejected() {
        let error = from_raw_with_env(RawConfig::default(), &[("ANIHAN_PORT", "not-a-port")])
            .expect_err("bad port must fail");
        assert!(matches!(error, ConfigError::InvalidEnvOverride { .. }));

        let error = from_raw_with_env(RawConfig::default(), &[("ANIHAN_LOG_FORMAT", "xml")])
            .expect_err("bad format must fail");
        assert!(matches!(error, ConfigError::InvalidEnvOverride { .. }));
    }

    #[test]
    fn toml_file_values_are_honored() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(
            file,
            r#"
[database]
url = "sqlite:data/agri.db"

[engine]
deployment = "production"
rate_limit_per_minute = 10

[llm]
model = "llama-3.1-8b"
timeout_secs = 10
"#
        )
        .expect("write config");

        let config = AppConfig::load(LoadOptions {
            config_path: Some(file.path().to_path_buf()),
            require_file: true,
        })
        .expect("config");

        assert_eq!(config.database.url, "sqlite:data/agri.db");
        assert_eq!(config.engine.deployment, "production");
        assert_eq!(config.engine.rate_limit_per_minute, 10);
        assert_eq!(config.llm.model, "llama-3.1-8b");
        assert_eq!(config.llm.timeout_secs, 10);
    }

    #[test]
    fn missing_required_file_is_an_error() {
        let error = AppConfig::load(LoadOptions {
            config_path: Some(PathBuf::from("/definitely/not/here.toml")),
            require_file: true,
        })
        .expect_err("missing file must fail");
        assert!(matches!(error, ConfigError::MissingConfigFile(_)));
    }

    #[test]
    fn zero_rate_limit_fails_validation() {
        let mut raw = RawConfig::default();
        raw.engine.rate_limit_per_minute = Some(0);
        let error = from_raw_with_env(raw, &[]).expect_err("zero rate limit must fail");
        assert!(matches!(error, ConfigError::Validation(_)));
    }
}
