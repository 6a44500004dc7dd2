pub mod api;
pub mod auth;
pub mod config;
pub mod context;
pub mod dispatch;
pub mod error;
pub mod models;
pub mod protocol;
pub mod runner;
pub mod store;

pub use context::AppContext;
