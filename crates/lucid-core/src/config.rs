use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

pub const ENV_PORT: &str = "PORT";
pub const ENV_API_URL: &str = "VITE_API_URL";
pub const ENV_ASSET_BUCKET: &str = "VITE_ASSET_BUCKET";
pub const ENV_SERVER_ROOT: &str = "LUCID_SERVER_ROOT";

const ASSET_HOST: &str = "https://storage.googleapis.com";

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LucidConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Published to the browser as `VITE_API_URL`.
    #[serde(default)]
    pub api_url: String,

    /// Published to the browser as `VITE_ASSET_BUCKET`.
    #[serde(default)]
    pub asset_bucket: String,
}

/// What a failed profile refresh means for the stored token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProfileFailurePolicy {
    /// Any failure, including transport errors, logs the user out.
    #[default]
    AnyFailure,
    /// Only 401/403 responses log the user out.
    UnauthorizedOnly,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,

    #[serde(default)]
    pub asset_bucket: String,

    #[serde(default = "default_page_size")]
    pub page_size: u32,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Token store location; defaults to `<data_dir>/lucid/storage.json`.
    #[serde(default)]
    pub storage_path: Option<PathBuf>,

    #[serde(default)]
    pub profile_failure: ProfileFailurePolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub json_format: bool,

    #[serde(default)]
    pub file_path: String,
}

fn default_port() -> u16 {
    8080
}

fn default_root() -> PathBuf {
    PathBuf::from("dist")
}

fn default_api_url() -> String {
    "http://localhost:8000/api/v1".to_string()
}

fn default_page_size() -> u32 {
    50
}

fn default_request_timeout() -> u64 {
    60
}

fn default_connect_timeout() -> u64 {
    5
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            root: default_root(),
            api_url: String::new(),
            asset_bucket: String::new(),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            asset_bucket: String::new(),
            page_size: default_page_size(),
            request_timeout_secs: default_request_timeout(),
            connect_timeout_secs: default_connect_timeout(),
            storage_path: None,
            profile_failure: ProfileFailurePolicy::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json_format: false,
            file_path: String::new(),
        }
    }
}

impl LucidConfig {
    pub fn load() -> Result<Self, ConfigLoadError> {
        Self::load_from_paths(get_config_paths())
    }

    pub fn load_from_paths(paths: Vec<PathBuf>) -> Result<Self, ConfigLoadError> {
        load_dotenv_files();

        let mut builder = ConfigBuilder::builder();

        for path in paths {
            if path.exists() {
                builder = builder.add_source(File::from(path).required(false));
            }
        }

        builder = builder.add_source(
            Environment::with_prefix("LUCID")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let mut lucid_config: LucidConfig = builder.build()?.try_deserialize()?;
        lucid_config.apply_env_overrides()?;
        lucid_config.validate()?;

        Ok(lucid_config)
    }

    /// Plain deployment variables (`PORT`, `VITE_*`) win over file and
    /// `LUCID_*` settings.
    fn apply_env_overrides(&mut self) -> Result<(), ConfigLoadError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Empty values count as unset, except `VITE_*` which are published
    /// verbatim. Only an absolute `VITE_API_URL` is usable by the terminal
    /// client; relative ones reach the browser alone.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigLoadError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup(ENV_PORT).filter(|p| !p.trim().is_empty()) {
            self.server.port = port.trim().parse().map_err(|_| ConfigLoadError::InvalidValue {
                key: ENV_PORT.to_string(),
                message: format!("'{}' is not a valid port", port),
            })?;
        }

        if let Some(root) = lookup(ENV_SERVER_ROOT).filter(|r| !r.is_empty()) {
            self.server.root = PathBuf::from(root);
        }

        if let Some(url) = lookup(ENV_API_URL) {
            if is_absolute_url(&url) {
                self.client.api_url = url.clone();
            }
            self.server.api_url = url;
        }

        if let Some(bucket) = lookup(ENV_ASSET_BUCKET) {
            self.server.asset_bucket = bucket.clone();
            self.client.asset_bucket = bucket;
        }

        if let Some(level) = lookup("LUCID_LOG_LEVEL").filter(|l| !l.is_empty()) {
            self.logging.level = level;
        }

        Ok(())
    }

    /// Checks shared by every binary. The asset server publishes its URLs
    /// as opaque strings, so client settings are left to `validate_client`.
    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        let level_lower = self.logging.level.to_lowercase();
        if !valid_levels.contains(&level_lower.as_str()) && !level_lower.contains('=') {
            return Err(ConfigLoadError::InvalidValue {
                key: "logging.level".to_string(),
                message: format!(
                    "Invalid log level '{}'. Must be one of: {:?}",
                    self.logging.level, valid_levels
                ),
            });
        }

        Ok(())
    }

    pub fn validate_client(&self) -> Result<(), ConfigLoadError> {
        if self.client.api_url.is_empty() {
            return Err(ConfigLoadError::MissingRequired("client.api_url".to_string()));
        }

        if !is_absolute_url(&self.client.api_url) {
            return Err(ConfigLoadError::InvalidValue {
                key: "client.api_url".to_string(),
                message: "Must start with http:// or https://".to_string(),
            });
        }

        if self.client.page_size == 0 {
            return Err(ConfigLoadError::InvalidValue {
                key: "client.page_size".to_string(),
                message: "Must be greater than 0".to_string(),
            });
        }

        if self.client.request_timeout_secs == 0 {
            return Err(ConfigLoadError::InvalidValue {
                key: "client.request_timeout_secs".to_string(),
                message: "Must be greater than 0".to_string(),
            });
        }

        Ok(())
    }

    pub fn storage_path(&self) -> Option<PathBuf> {
        self.client
            .storage_path
            .clone()
            .or_else(|| get_data_dir().map(|d| d.join("storage.json")))
    }
}

fn is_absolute_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Base URL for hero imagery; empty when no bucket is configured.
pub fn asset_base(bucket: &str) -> String {
    if bucket.is_empty() {
        String::new()
    } else {
        format!("{}/{}", ASSET_HOST, bucket)
    }
}

pub fn hero_image_urls(bucket: &str) -> Vec<String> {
    let base = asset_base(bucket);
    (1..=3)
        .map(|i| format!("{}/images/signup-hero-{}.jpg", base, i))
        .collect()
}

fn get_config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        paths.push(cwd.join("lucid.toml"));
    }

    if let Some(config_dir) = get_config_dir() {
        paths.push(config_dir.join("config.toml"));
    }

    paths
}

fn load_dotenv_files() {
    for path in get_dotenv_paths() {
        if path.exists() {
            let _ = dotenvy::from_path(&path);
        }
    }
}

fn get_dotenv_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        paths.push(cwd.join(".env"));
        paths.push(cwd.join(".env.local"));
    }

    if let Some(config_dir) = get_config_dir() {
        paths.push(config_dir.join(".env"));
    }

    paths
}

pub fn get_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("lucid"))
}

pub fn get_data_dir() -> Option<PathBuf> {
    dirs::data_dir().map(|d| d.join("lucid"))
}
