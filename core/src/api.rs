//! Stable re-exports for consumers (`cli`, `plugins`, and external crates).
//!
//! Prefer importing from `arena_core::api` instead of reaching into internal modules.

pub use crate::auth::{is_valid_email, Claims, FieldError, PasswordHasher, TokenSigner};
pub use crate::config::{
    AppConfig, AuthConfig, LogConfig, ScriptsConfig, ServerConfig, StoreConfig, StoreProvider,
};
pub use crate::context::{AppContext, Services, ServicesFactory};
pub use crate::dispatch::{DispatchMode, Dispatcher};
pub use crate::error::{AuthError, ConfigError, DispatchError, RunnerError, StoreError};
pub use crate::models::{Chat, NewUser, NewVote, User, Vote};
pub use crate::protocol::{ProtocolReader, ScoredAnswer};
pub use crate::runner::{run_script, RunStatus, ScriptSpec};
pub use crate::store::ArenaStore;
