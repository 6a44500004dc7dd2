//! 路由级错误类型及其HTTP响应映射

use arena_core::api::{DispatchError, DispatchMode, FieldError, StoreError};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// 路由处理器统一错误
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("answer dispatch failed ({mode:?}): {source}")]
    Dispatch {
        mode: DispatchMode,
        #[source]
        source: DispatchError,
    },

    #[error("validation failed")]
    Validation(Vec<FieldError>),

    /// 业务错误：400 `{success:false, error}`
    #[error("{0}")]
    BadRequest(&'static str),

    #[error("{0}")]
    NotFound(&'static str),

    #[error("Please authenticate using a valid token")]
    Unauthorized,

    #[error("store failure: {0}")]
    Store(#[from] StoreError),

    #[error("internal failure: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn dispatch(mode: DispatchMode, source: DispatchError) -> Self {
        ApiError::Dispatch { mode, source }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Dispatch { source, .. } => match source {
                DispatchError::EmptyQuery => StatusCode::BAD_REQUEST,
                DispatchError::TimedOut { .. } => StatusCode::GATEWAY_TIMEOUT,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Validation(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Store(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn body(&self) -> serde_json::Value {
        match self {
            ApiError::Dispatch { mode, source } => dispatch_body(*mode, source),
            ApiError::Validation(errors) => json!({ "success": false, "errors": errors }),
            ApiError::BadRequest(msg) | ApiError::NotFound(msg) => {
                json!({ "success": false, "error": msg })
            }
            ApiError::Unauthorized => json!({ "error": "Please authenticate using a valid token" }),
            ApiError::Store(_) | ApiError::Internal(_) => {
                json!({ "success": false, "error": "Internal Server Error" })
            }
        }
    }
}

/// 答案进程错误的响应体；文案与前端约定一致
pub fn dispatch_body(mode: DispatchMode, err: &DispatchError) -> serde_json::Value {
    if matches!(err, DispatchError::EmptyQuery) {
        return json!({ "error": "Query is required" });
    }
    let error = match (mode, err) {
        (DispatchMode::Single, DispatchError::TimedOut { .. }) => "Query timed out",
        (DispatchMode::Compare, DispatchError::TimedOut { .. }) => "Comparison query timed out",
        (
            DispatchMode::Single,
            DispatchError::MissingFields { .. } | DispatchError::InvalidDocument { .. },
        ) => "Failed to parse Python script output",
        (
            DispatchMode::Compare,
            DispatchError::MissingFields { .. } | DispatchError::InvalidDocument { .. },
        ) => "Failed to parse Python script output for comparison",
        (DispatchMode::Single, _) => "Failed to process query",
        (DispatchMode::Compare, _) => "Failed to process query for comparison",
    };
    json!({ "error": error, "details": err.details() })
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = %status.as_u16(), error = %self, "Request handler failed");
        }
        (status, Json(self.body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_query_is_bad_request() {
        let err = ApiError::dispatch(DispatchMode::Single, DispatchError::EmptyQuery);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.body(), json!({ "error": "Query is required" }));
    }

    #[test]
    fn process_failure_messages_per_mode() {
        let failed = || DispatchError::ProcessFailed {
            exit_code: 2,
            stderr: "boom\n".into(),
        };
        assert_eq!(
            dispatch_body(DispatchMode::Single, &failed()),
            json!({ "error": "Failed to process query", "details": "boom\n" })
        );
        assert_eq!(
            dispatch_body(DispatchMode::Compare, &failed()),
            json!({ "error": "Failed to process query for comparison", "details": "boom\n" })
        );
    }

    #[test]
    fn timeout_maps_to_gateway_timeout() {
        let err = ApiError::dispatch(
            DispatchMode::Compare,
            DispatchError::TimedOut {
                after_secs: 1,
                stderr: String::new(),
            },
        );
        assert_eq!(err.status(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(err.body()["error"], "Comparison query timed out");
    }

    #[test]
    fn store_errors_hide_details() {
        let err = ApiError::Store(StoreError::Backend(anyhow::anyhow!("disk on fire")));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            err.body(),
            json!({ "success": false, "error": "Internal Server Error" })
        );
    }
}
