use std::env;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use thiserror::Error;

/// Port used when `PORT` is not set.
pub const DEFAULT_PORT: u16 = 8010;
/// API key used when `API_KEY` is not set.
pub const DEFAULT_API_KEY: &str = "dev-only-key";
/// Directory served at the web root when `STATIC_DIR` is not set.
pub const DEFAULT_STATIC_DIR: &str = "public";

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration for the ingestion server.
#[derive(Debug, Clone)]
pub struct Config {
    /// TCP port the HTTP listener binds to.
    pub port: u16,
    /// Expected API key presented by clients.
    pub api_key: String,
    /// Whether a missing or wrong API key rejects the request.
    pub api_key_enforcement: bool,
    /// Directory of static assets served at `/`.
    pub static_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            api_key: DEFAULT_API_KEY.to_string(),
            api_key_enforcement: false,
            static_dir: PathBuf::from(DEFAULT_STATIC_DIR),
        }
    }
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            port: load_env_optional("PORT")
                .map(|value| {
                    value
                        .trim()
                        .parse()
                        .map_err(|_| ConfigError::InvalidValue("PORT".into()))
                })
                .transpose()?
                .unwrap_or(DEFAULT_PORT),
            api_key: load_env_optional("API_KEY").unwrap_or_else(|| DEFAULT_API_KEY.to_string()),
            api_key_enforcement: load_env_optional("API_KEY_ENFORCEMENT")
                .map(|value| {
                    parse_flag(&value)
                        .ok_or_else(|| ConfigError::InvalidValue("API_KEY_ENFORCEMENT".into()))
                })
                .transpose()?
                .unwrap_or(false),
            static_dir: load_env_optional("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STATIC_DIR)),
        })
    }
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Load an env file into the process environment. Variables already set are kept.
///
/// With no explicit path, `.env` is looked up from the working directory upward and a missing
/// file is not an error. Call this before [`crate::logging::init_tracing`] so `RUST_LOG` and
/// `INVENTORY_LOG_FILE` from the file take effect.
pub fn load_dotenv(path: Option<&Path>) -> Result<Option<PathBuf>, dotenvy::Error> {
    match path {
        Some(path) => dotenvy::from_path(path).map(|()| Some(path.to_path_buf())),
        None => match dotenvy::dotenv() {
            Ok(found) => Ok(Some(found)),
            Err(err) if err.not_found() => Ok(None),
            Err(err) => Err(err),
        },
    }
}

/// Global configuration cache populated during process start.
pub static CONFIG: OnceLock<Config> = OnceLock::new();

/// Retrieve the loaded configuration, panicking if initialization has not occurred.
pub fn get_config() -> &'static Config {
    CONFIG.get().expect("Config not initialized")
}

/// Load configuration from the environment and install it in the global cache.
///
/// `overrides` is applied after the environment is read so command-line flags win.
pub fn init_config(overrides: impl FnOnce(&mut Config)) {
    let mut config = Config::from_env().expect("Failed to load config from environment");
    overrides(&mut config);
    tracing::debug!(
        port = config.port,
        api_key_enforcement = config.api_key_enforcement,
        static_dir = %config.static_dir.display(),
        "Loaded configuration"
    );
    CONFIG.set(config).expect("Failed to set config");
}
