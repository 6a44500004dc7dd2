//! 答案路由：`/api/rag/query` 与 `/api/rag/compare`

use crate::http::{error::ApiError, AppState};
use arena_core::api::{DispatchError, DispatchMode, ScoredAnswer};
use axum::{body::Bytes, extract::State, Json};
use serde_json::Value;

/// 从请求体中取出 `query` 字段；非JSON或非字符串按缺失处理
fn extract_query(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    value.get("query")?.as_str().map(str::to_owned)
}

/// POST /api/rag/query - 单答案模式
pub async fn query_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ScoredAnswer>, ApiError> {
    state.record_request("/api/rag/query");

    let query = extract_query(&body).unwrap_or_default();
    match state.ctx.dispatcher().query(&query).await {
        Ok(answer) => Ok(Json(answer)),
        Err(e) => Err(failed(&state, DispatchMode::Single, e)),
    }
}

/// POST /api/rag/compare - 对比模式，原样转发脚本输出的JSON文档
pub async fn compare_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    state.record_request("/api/rag/compare");

    let query = extract_query(&body).unwrap_or_default();
    match state.ctx.dispatcher().compare(&query).await {
        Ok(doc) => Ok(Json(doc)),
        Err(e) => Err(failed(&state, DispatchMode::Compare, e)),
    }
}

fn failed(state: &AppState, mode: DispatchMode, err: DispatchError) -> ApiError {
    state.record_error();
    if !matches!(err, DispatchError::EmptyQuery) {
        tracing::warn!(mode = mode.as_str(), error = %err, "Answer dispatch failed");
    }
    ApiError::dispatch(mode, err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_must_be_a_string() {
        assert_eq!(extract_query(br#"{"query":"hi"}"#).as_deref(), Some("hi"));
        assert_eq!(extract_query(br#"{"query":42}"#), None);
        assert_eq!(extract_query(br#"{}"#), None);
        assert_eq!(extract_query(b"not json"), None);
        assert_eq!(extract_query(b""), None);
    }
}
