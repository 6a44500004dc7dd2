use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub scripts: ScriptsConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub log: LogConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scripts.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "scripts.timeout_secs must be greater than 0".into(),
            ));
        }
        if self.server.request_timeout_secs <= self.scripts.timeout_secs {
            return Err(ConfigError::Validation(format!(
                "server.request_timeout_secs ({}) must exceed scripts.timeout_secs ({})",
                self.server.request_timeout_secs, self.scripts.timeout_secs
            )));
        }
        if self.auth.hash_rounds == 0 {
            return Err(ConfigError::Validation(
                "auth.hash_rounds must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Origins accepted by CORS. Scheme and host must match exactly; an
    /// entry without a port accepts any port.
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5800
}

fn default_request_timeout_secs() -> u64 {
    330
}

fn default_allowed_origins() -> Vec<String> {
    vec![
        "http://localhost".to_string(),
        "https://localhost".to_string(),
        "http://127.0.0.1".to_string(),
        "https://127.0.0.1".to_string(),
    ]
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout_secs(),
            allowed_origins: default_allowed_origins(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptsConfig {
    /// Interpreter binary; resolved from PATH when unset.
    #[serde(default)]
    pub python: Option<String>,

    #[serde(default = "default_query_script")]
    pub query_script: String,

    #[serde(default = "default_compare_script")]
    pub compare_script: String,

    #[serde(default = "default_script_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub workdir: Option<String>,

    /// Extra environment for the answer processes.
    #[serde(default)]
    pub envs: HashMap<String, String>,
}

fn default_query_script() -> String {
    "scripts/rag_query.py".to_string()
}

fn default_compare_script() -> String {
    "scripts/rag_query_compare.py".to_string()
}

fn default_script_timeout_secs() -> u64 {
    300
}

impl Default for ScriptsConfig {
    fn default() -> Self {
        Self {
            python: None,
            query_script: default_query_script(),
            compare_script: default_compare_script(),
            timeout_secs: default_script_timeout_secs(),
            workdir: None,
            envs: HashMap::new(),
        }
    }
}

impl ScriptsConfig {
    /// Configured interpreter, else `python3`/`python` from PATH, else the
    /// bare name `python` (spawn then reports the failure).
    pub fn resolve_python(&self) -> String {
        if let Some(p) = self.python.as_deref() {
            if !p.trim().is_empty() {
                return p.to_string();
            }
        }
        for candidate in ["python3", "python"] {
            if let Ok(path) = which::which(candidate) {
                return path.to_string_lossy().into_owned();
            }
        }
        "python".to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub jwt_secret: String,

    /// SHA-256 iterations for password hashing.
    #[serde(default = "default_hash_rounds")]
    pub hash_rounds: u32,
}

fn default_hash_rounds() -> u32 {
    10_000
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            hash_rounds: default_hash_rounds(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreProvider {
    Memory,
    Sqlite,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_provider")]
    pub provider: StoreProvider,

    /// SQLite database file; defaults to `~/.arena/arena.db`.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

fn default_store_provider() -> StoreProvider {
    StoreProvider::Memory
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            provider: default_store_provider(),
            path: None,
        }
    }
}

impl StoreConfig {
    pub fn resolved_path(&self) -> PathBuf {
        if let Some(p) = &self.path {
            return p.clone();
        }
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".arena")
            .join("arena.db")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogConfig {
    /// When set, logs are also written to a daily rolling file here.
    #[serde(default)]
    pub dir: Option<PathBuf>,
}
