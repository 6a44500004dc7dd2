//! ServicesFactory implementation: builds the configured store for the CLI and server.
use arena_core::api::{AppConfig, Services, ServicesFactory};

use crate::factory;

#[derive(Default)]
pub struct PluginServicesFactory;

impl ServicesFactory for PluginServicesFactory {
    fn build_services(&self, cfg: &AppConfig) -> anyhow::Result<Services> {
        let store = factory::build_store(&cfg.store)?;
        Ok(Services { store })
    }
}
