mod auth_error;
mod config_error;
mod dispatch_error;
mod runner_error;
mod store_error;

pub use auth_error::AuthError;
pub use config_error::ConfigError;
pub use dispatch_error::DispatchError;
pub use runner_error::RunnerError;
pub use store_error::StoreError;
