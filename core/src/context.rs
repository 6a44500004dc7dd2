use std::sync::Arc;

use crate::auth::{PasswordHasher, TokenSigner};
use crate::config::AppConfig;
use crate::dispatch::Dispatcher;
use crate::store::ArenaStore;

/// Pluggable collaborators built from config.
#[derive(Clone)]
pub struct Services {
    pub store: Arc<dyn ArenaStore>,
}

pub trait ServicesFactory: Send + Sync {
    fn build_services(&self, cfg: &AppConfig) -> anyhow::Result<Services>;
}

/// Everything a request handler needs; cheap to clone.
#[derive(Clone)]
pub struct AppContext {
    cfg: Arc<AppConfig>,
    services: Services,
    dispatcher: Arc<Dispatcher>,
    signer: TokenSigner,
    hasher: PasswordHasher,
}

impl AppContext {
    pub fn new(cfg: AppConfig, services: Services) -> Self {
        let dispatcher = Dispatcher::from_config(&cfg.scripts);
        Self::with_dispatcher(cfg, services, dispatcher)
    }

    pub fn with_dispatcher(cfg: AppConfig, services: Services, dispatcher: Dispatcher) -> Self {
        let signer = TokenSigner::new(cfg.auth.jwt_secret.as_bytes());
        let hasher = PasswordHasher::new(cfg.auth.hash_rounds);
        Self {
            cfg: Arc::new(cfg),
            services,
            dispatcher: Arc::new(dispatcher),
            signer,
            hasher,
        }
    }

    pub fn build(cfg: AppConfig, factory: &dyn ServicesFactory) -> anyhow::Result<Self> {
        let services = factory.build_services(&cfg)?;
        Ok(Self::new(cfg, services))
    }

    pub fn cfg(&self) -> &AppConfig {
        &self.cfg
    }

    pub fn store(&self) -> &Arc<dyn ArenaStore> {
        &self.services.store
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn signer(&self) -> &TokenSigner {
        &self.signer
    }

    pub fn hasher(&self) -> &PasswordHasher {
        &self.hasher
    }
}
