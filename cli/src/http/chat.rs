//! 聊天记录与投票路由（均需认证）

use crate::http::{
    error::ApiError,
    extract::AuthUser,
    models::{RateRequest, SaveChatRequest},
    AppState,
};
use arena_core::api::{NewVote, StoreError};
use axum::{
    body::Bytes,
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};

/// POST /api/chat/save - 保存一次对话
pub async fn save_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    state.record_request("/api/chat/save");

    let messages = serde_json::from_slice::<SaveChatRequest>(&body)
        .map(|req| req.messages)
        .unwrap_or_default();

    let chat = state.ctx.store().save_chat(&auth.id, messages).await?;
    Ok(Json(json!({ "success": true, "chat": chat })))
}

/// GET /api/chat/history - 当前用户的对话，最新在前
pub async fn history_handler(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Value>, ApiError> {
    state.record_request("/api/chat/history");

    let chats = state.ctx.store().list_chats(&auth.id).await?;
    Ok(Json(json!({ "success": true, "chats": chats })))
}

/// GET /api/chat/:id
pub async fn get_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state.record_request("/api/chat/:id");

    let chat = state
        .ctx
        .store()
        .get_chat(&auth.id, &id)
        .await?
        .ok_or(ApiError::NotFound("Chat not found or unauthorized"))?;
    Ok(Json(json!({ "success": true, "chat": chat })))
}

/// DELETE /api/chat/:id
pub async fn delete_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state.record_request("/api/chat/:id");

    if !state.ctx.store().delete_chat(&auth.id, &id).await? {
        return Err(ApiError::NotFound("Chat not found or unauthorized"));
    }
    Ok(Json(json!({ "success": true, "message": "Chat deleted successfully" })))
}

/// POST /api/chat/rate - 记录投票，每个 query_id 只能投一次
pub async fn rate_handler(
    State(state): State<AppState>,
    _auth: AuthUser,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    state.record_request("/api/chat/rate");

    let req: RateRequest = serde_json::from_slice(&body).unwrap_or_default();
    let non_empty = |v: Option<String>| v.filter(|s| !s.is_empty());
    let (Some(query_id), Some(model), Some(vote)) =
        (non_empty(req.query_id), non_empty(req.model), non_empty(req.vote))
    else {
        return Err(ApiError::BadRequest("query_id, model and vote are required"));
    };

    match state
        .ctx
        .store()
        .record_vote(NewVote {
            query_id,
            model,
            vote,
        })
        .await
    {
        Ok(vote) => {
            tracing::info!(query_id = %vote.query_id, model = %vote.model, "Vote recorded");
            Ok(Json(json!({ "success": true, "message": "Vote saved successfully" })))
        }
        Err(StoreError::Conflict { .. }) => {
            Err(ApiError::BadRequest("Vote already recorded for this query"))
        }
        Err(e) => {
            state.record_error();
            Err(e.into())
        }
    }
}
