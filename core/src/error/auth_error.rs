// core/src/error/auth_error.rs
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("token is malformed")]
    Malformed,

    #[error("token signature mismatch")]
    BadSignature,

    #[error("signing key rejected")]
    InvalidKey,

    #[error("token payload decode error")]
    Decode(#[source] serde_json::Error),
}
