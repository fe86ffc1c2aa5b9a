//! Settings for the `trackonomy` binary.
//!
//! Values come from an optional TOML file (`config/trackonomy.toml` unless
//! `--config` names another one) and from `TRACKONOMY__*` environment
//! variables, where `__` separates nested keys:
//! `TRACKONOMY__AUTH__JWT_SECRET`, `TRACKONOMY__SERVER__PORT`, ...
use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

pub const DEFAULT_CONFIG_FILE: &str = "config/trackonomy.toml";

#[derive(Debug, Deserialize)]
pub struct App {
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    #[default]
    Memory,
    Sqlite(String),
    Postgres(String),
}

#[derive(Debug, Deserialize)]
pub struct Server {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub database: Database,
    #[serde(default = "default_db_connect_timeout")]
    pub db_connect_timeout_secs: u64,
}

impl Default for Server {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
            request_timeout_secs: default_request_timeout(),
            database: Database::default(),
            db_connect_timeout_secs: default_db_connect_timeout(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Auth {
    pub jwt_secret: String,
    #[serde(default = "default_token_ttl")]
    pub token_ttl_hours: i64,
}

#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    Local,
    Cloudinary,
}

#[derive(Debug, Deserialize)]
pub struct Cloudinary {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    #[serde(default = "default_cloudinary_folder")]
    pub folder: String,
}

#[derive(Debug, Deserialize)]
pub struct Uploads {
    #[serde(default)]
    pub provider: Provider,
    #[serde(default = "default_local_dir")]
    pub local_dir: PathBuf,
    /// Base of the URLs handed out for locally stored receipts.
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,
    pub cloudinary: Option<Cloudinary>,
}

impl Default for Uploads {
    fn default() -> Self {
        Self {
            provider: Provider::default(),
            local_dir: default_local_dir(),
            public_base_url: default_public_base_url(),
            cloudinary: None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub app: App,
    #[serde(default)]
    pub server: Server,
    pub auth: Auth,
    #[serde(default)]
    pub uploads: Uploads,
}

impl Settings {
    /// Loads `path`, or the default file when it exists, then applies the
    /// environment on top.
    pub fn new(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::with_environment(path, Environment::with_prefix("TRACKONOMY"))
    }

    fn with_environment(path: Option<&Path>, env: Environment) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        Config::builder()
            .add_source(file)
            .add_source(
                env.prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

fn default_level() -> String {
    "info".to_string()
}

fn default_bind() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_request_timeout() -> u64 {
    30
}

fn default_db_connect_timeout() -> u64 {
    10
}

fn default_token_ttl() -> i64 {
    server::DEFAULT_TOKEN_TTL_HOURS
}

fn default_cloudinary_folder() -> String {
    server::DEFAULT_CLOUDINARY_FOLDER.to_string()
}

fn default_local_dir() -> PathBuf {
    PathBuf::from("uploads")
}

fn default_public_base_url() -> String {
    "http://localhost:8080".to_string()
}
