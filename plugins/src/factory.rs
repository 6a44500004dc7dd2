use std::sync::Arc;

use anyhow::{Context, Result};

use arena_core::api::{ArenaStore, StoreConfig, StoreProvider};

use crate::store::memory::MemoryStore;
use crate::store::sqlite::SqliteStore;

pub fn build_store(cfg: &StoreConfig) -> Result<Arc<dyn ArenaStore>> {
    match cfg.provider {
        StoreProvider::Memory => {
            tracing::warn!("using in-memory store; users, chats and votes are lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreProvider::Sqlite => {
            let path = cfg.resolved_path();
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("create store directory {}", parent.display()))?;
            }
            tracing::info!(path = %path.display(), "opening sqlite store");
            Ok(Arc::new(SqliteStore::open(&path)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_memory_store_by_default() {
        let store = build_store(&StoreConfig::default()).unwrap();
        assert_eq!(store.name(), "memory");
    }

    #[test]
    fn builds_sqlite_store_in_nested_dir() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = StoreConfig {
            provider: StoreProvider::Sqlite,
            path: Some(dir.path().join("nested").join("arena.db")),
        };
        let store = build_store(&cfg).unwrap();
        assert_eq!(store.name(), "sqlite");
        assert!(dir.path().join("nested").join("arena.db").exists());
    }
}
