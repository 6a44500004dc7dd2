use std::path::Path;

use anyhow::Context;

use crate::error::ConfigError;

use super::types::{AppConfig, StoreProvider};

const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// `config.toml` in the working directory if present, otherwise defaults;
/// environment overrides applied on top.
pub fn load_default() -> Result<AppConfig, ConfigError> {
    load(None)
}

pub fn load(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut cfg = match path {
        Some(p) => load_from_path(p)?,
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
            load_from_path(Path::new(DEFAULT_CONFIG_FILE))?
        }
        None => AppConfig::default(),
    };

    apply_env_overrides(&mut cfg, |key| std::env::var(key).ok())?;
    cfg.validate()?;
    Ok(cfg)
}

pub fn load_from_path(path: &Path) -> Result<AppConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound(path.display().to_string()));
    }
    let s = std::fs::read_to_string(path)
        .with_context(|| format!("read {}", path.display()))
        .map_err(ConfigError::Parse)?;
    toml::from_str::<AppConfig>(&s)
        .with_context(|| format!("parse {}", path.display()))
        .map_err(ConfigError::Parse)
}

fn apply_env_overrides<F>(cfg: &mut AppConfig, get: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |key: &str| get(key).filter(|v| !v.trim().is_empty());

    if let Some(v) = non_empty("ARENA_HOST") {
        cfg.server.host = v;
    }
    if let Some(v) = non_empty("ARENA_PORT") {
        cfg.server.port = v.trim().parse().map_err(|e| ConfigError::EnvInvalid {
            key: "ARENA_PORT".into(),
            source: anyhow::Error::new(e),
        })?;
    }
    if let Some(v) = non_empty("ARENA_PYTHON") {
        cfg.scripts.python = Some(v);
    }
    if let Some(v) = non_empty("ARENA_QUERY_SCRIPT") {
        cfg.scripts.query_script = v;
    }
    if let Some(v) = non_empty("ARENA_COMPARE_SCRIPT") {
        cfg.scripts.compare_script = v;
    }
    if let Some(v) = non_empty("JWT_SECRET") {
        cfg.auth.jwt_secret = v;
    }
    if let Some(v) = non_empty("ARENA_STORE") {
        cfg.store.provider = match v.trim().to_ascii_lowercase().as_str() {
            "memory" => StoreProvider::Memory,
            "sqlite" => StoreProvider::Sqlite,
            other => {
                return Err(ConfigError::EnvInvalid {
                    key: "ARENA_STORE".into(),
                    source: anyhow::anyhow!("unknown store provider '{other}'"),
                })
            }
        };
    }
    if let Some(v) = non_empty("ARENA_DB_PATH") {
        cfg.store.path = Some(v.into());
    }

    Ok(())
}
