//! HTTP surface: answer dispatch, auth, chat history and votes.

mod auth;
mod chat;
pub mod error;
mod extract;
pub mod middleware;
pub mod models;
mod rag;
pub mod routes;
pub mod server;
pub mod state;

pub use state::AppState;
