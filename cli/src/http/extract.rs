//! 认证提取器：从 `auth-token` 头解析当前用户

use crate::http::{error::ApiError, AppState};
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

pub const AUTH_HEADER: &str = "auth-token";

/// 已认证用户的ID
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: String,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTH_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|t| !t.is_empty())
            .ok_or(ApiError::Unauthorized)?;

        let claims = state.ctx.signer().verify(token).map_err(|e| {
            tracing::debug!(error = %e, "Rejected auth token");
            ApiError::Unauthorized
        })?;

        Ok(AuthUser { id: claims.user.id })
    }
}
