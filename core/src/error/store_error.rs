// core/src/error/store_error.rs
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("duplicate {entity}: {key}")]
    Conflict { entity: &'static str, key: String },

    #[error("store backend error")]
    Backend(#[source] anyhow::Error),

    #[error("stored record could not be decoded")]
    Decode(#[source] anyhow::Error),
}
