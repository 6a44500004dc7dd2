//! HTTP路由表

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use chrono::Local;

use crate::http::{auth, chat, models::HealthResponse, rag, state::AppState};

/// 创建所有路由
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/rag", rag_routes())
        .nest("/api/auth", auth_routes())
        .nest("/api/chat", chat_routes())
        .route("/health", get(health_handler))
        .with_state(state)
}

fn rag_routes() -> Router<AppState> {
    Router::new()
        .route("/query", post(rag::query_handler))
        .route("/compare", post(rag::compare_handler))
}

fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(auth::signup_handler))
        .route("/login", post(auth::login_handler))
        .route("/getuser", post(auth::getuser_handler))
}

fn chat_routes() -> Router<AppState> {
    Router::new()
        .route("/save", post(chat::save_handler))
        .route("/history", get(chat::history_handler))
        .route("/rate", post(chat::rate_handler))
        .route("/:id", get(chat::get_handler).delete(chat::delete_handler))
}

/// GET /health - 健康检查
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    state.record_request("/health");

    let (uptime_seconds, requests_handled) = state
        .stats
        .read()
        .map(|s| (s.uptime_seconds(), s.requests_total))
        .unwrap_or_default();

    Json(HealthResponse {
        status: "healthy".into(),
        uptime_seconds,
        requests_handled,
        timestamp: Local::now().to_rfc3339(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::extract::AUTH_HEADER;
    use serde_json::{json, Value};
    use arena_core::api::{AppConfig, AppContext, Dispatcher, ScriptSpec, Services};
    use arena_plugins::store::memory::MemoryStore;
    use axum::{
        body::{to_bytes, Body},
        http::{Method, Request, StatusCode},
        response::Response,
    };
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::broadcast;
    use tower::ServiceExt;

    fn sh(script: &str) -> ScriptSpec {
        ScriptSpec::new("sh").arg("-c").arg(script)
    }

    fn state_with(query: &str, compare: &str) -> AppState {
        let mut cfg = AppConfig::default();
        cfg.auth.jwt_secret = "test-secret".into();
        cfg.auth.hash_rounds = 10;
        let services = Services {
            store: Arc::new(MemoryStore::new()),
        };
        let dispatcher = Dispatcher::new(sh(query), sh(compare), Duration::from_secs(2));
        let ctx = AppContext::with_dispatcher(cfg, services, dispatcher);
        let (shutdown_tx, _) = broadcast::channel(1);
        AppState::new(ctx, shutdown_tx)
    }

    fn app_with(query: &str, compare: &str) -> Router {
        create_router(state_with(query, compare))
    }

    fn app() -> Router {
        app_with("exit 1", "exit 1")
    }

    fn post_json(uri: &str, body: Value, token: Option<&str>) -> Request<Body> {
        let mut req = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header("content-type", "application/json");
        if let Some(token) = token {
            req = req.header(AUTH_HEADER, token);
        }
        req.body(Body::from(body.to_string())).unwrap()
    }

    fn get_with(method: Method, uri: &str, token: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(AUTH_HEADER, token)
            .body(Body::empty())
            .unwrap()
    }

    async fn json_body(resp: Response) -> Value {
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn signup(app: &Router, email: &str) -> String {
        let resp = app
            .clone()
            .oneshot(post_json(
                "/api/auth/signup",
                json!({ "name": "Ada Lovelace", "email": email, "password": "secret1" }),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = json_body(resp).await;
        body["authtoken"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_health_check() {
        let resp = app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = json_body(resp).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["requests_handled"], 1);
    }

    #[tokio::test]
    async fn test_no_remote_shutdown_route() {
        let state = state_with("exit 1", "exit 1");
        let mut shutdown_rx = state.shutdown_tx.subscribe();
        let resp = create_router(state)
            .oneshot(
                Request::post("/api/shutdown")
                    .header("Origin", "http://attacker.example")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert!(shutdown_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_query_success() {
        let app = app_with(
            r#"cat >/dev/null; echo '{"type":"final_answer","answer":"X"}'; echo '{"type":"reward_score","score":0.87}'"#,
            "exit 1",
        );
        let resp = app
            .oneshot(post_json("/api/rag/query", json!({ "query": "q" }), None))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            json_body(resp).await,
            json!({ "answer": "X", "reward_score": 0.87 })
        );
    }

    #[tokio::test]
    async fn test_query_process_failure() {
        let app = app_with("cat >/dev/null; echo boom >&2; exit 2", "exit 1");
        let resp = app
            .oneshot(post_json("/api/rag/query", json!({ "query": "q" }), None))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json_body(resp).await;
        assert_eq!(body["error"], "Failed to process query");
        assert!(body["details"].as_str().unwrap().contains("boom"));
    }

    #[tokio::test]
    async fn test_query_missing_score() {
        let app = app_with(
            r#"cat >/dev/null; echo '{"type":"final_answer","answer":"X"}'"#,
            "exit 1",
        );
        let resp = app
            .oneshot(post_json("/api/rag/query", json!({ "query": "q" }), None))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            json_body(resp).await["error"],
            "Failed to parse Python script output"
        );
    }

    #[tokio::test]
    async fn test_query_required() {
        for body in [json!({}), json!({ "query": "" }), json!({ "query": 7 })] {
            let resp = app()
                .oneshot(post_json("/api/rag/query", body, None))
                .await
                .unwrap();
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
            assert_eq!(json_body(resp).await, json!({ "error": "Query is required" }));
        }

        let resp = app()
            .oneshot(
                Request::post("/api/rag/compare")
                    .body(Body::from("not json"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_compare_forwards_document() {
        let app = app_with(
            "exit 1",
            r#"cat >/dev/null; printf '{\n  "rag": {"answer": "a"},\n'; sleep 0.1; printf '  "llm": {"answer": "b"}\n}\n'"#,
        );
        let resp = app
            .oneshot(post_json("/api/rag/compare", json!({ "query": "q" }), None))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            json_body(resp).await,
            json!({ "rag": { "answer": "a" }, "llm": { "answer": "b" } })
        );
    }

    #[tokio::test]
    async fn test_compare_invalid_document() {
        let app = app_with("exit 1", "cat >/dev/null; printf 'not json'");
        let resp = app
            .oneshot(post_json("/api/rag/compare", json!({ "query": "q" }), None))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            json_body(resp).await,
            json!({
                "error": "Failed to parse Python script output for comparison",
                "details": "not json"
            })
        );
    }

    #[tokio::test]
    async fn test_signup_login_getuser() {
        let app = app();
        signup(&app, "ada@example.com").await;

        let resp = app
            .clone()
            .oneshot(post_json(
                "/api/auth/login",
                json!({ "email": "ada@example.com", "password": "secret1" }),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = json_body(resp).await;
        assert_eq!(body["email"], "ada@example.com");
        let token = body["authtoken"].as_str().unwrap().to_string();

        let resp = app
            .clone()
            .oneshot(post_json("/api/auth/getuser", json!({}), Some(&token)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = json_body(resp).await;
        assert_eq!(body["user"]["name"], "Ada Lovelace");
        assert!(body["user"].get("password_hash").is_none());
    }

    #[tokio::test]
    async fn test_signup_rejects_duplicates_and_bad_fields() {
        let app = app();
        signup(&app, "ada@example.com").await;

        let resp = app
            .clone()
            .oneshot(post_json(
                "/api/auth/signup",
                json!({ "name": "Ada Again", "email": "ada@example.com", "password": "secret1" }),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            json_body(resp).await,
            json!({ "success": false, "error": "User with this email already exists" })
        );

        let resp = app
            .oneshot(post_json(
                "/api/auth/signup",
                json!({ "name": "Al", "email": "al@example.com", "password": "secret1" }),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            json_body(resp).await,
            json!({
                "success": false,
                "errors": [{ "field": "name", "msg": "Name must be at least 3 characters" }]
            })
        );
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let app = app();
        signup(&app, "ada@example.com").await;
        let resp = app
            .oneshot(post_json(
                "/api/auth/login",
                json!({ "email": "ada@example.com", "password": "wrong-one" }),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(resp).await["error"], "Invalid Credentials");
    }

    #[tokio::test]
    async fn test_chat_requires_token() {
        let resp = app()
            .oneshot(Request::get("/api/chat/history").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let resp = app()
            .oneshot(get_with(Method::GET, "/api/chat/history", "forged.token"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            json_body(resp).await,
            json!({ "error": "Please authenticate using a valid token" })
        );
    }

    #[tokio::test]
    async fn test_chat_lifecycle() {
        let app = app();
        let token = signup(&app, "ada@example.com").await;
        let other = signup(&app, "bob@example.com").await;

        let resp = app
            .clone()
            .oneshot(post_json(
                "/api/chat/save",
                json!({ "messages": [{ "role": "user", "text": "hi" }] }),
                Some(&token),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let chat_id = json_body(resp).await["chat"]["_id"]
            .as_str()
            .unwrap()
            .to_string();

        let resp = app
            .clone()
            .oneshot(get_with(Method::GET, "/api/chat/history", &token))
            .await
            .unwrap();
        assert_eq!(json_body(resp).await["chats"].as_array().unwrap().len(), 1);

        let uri = format!("/api/chat/{chat_id}");
        let resp = app
            .clone()
            .oneshot(get_with(Method::GET, &uri, &other))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = app
            .clone()
            .oneshot(get_with(Method::DELETE, &uri, &token))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(json_body(resp).await["message"], "Chat deleted successfully");

        let resp = app
            .oneshot(get_with(Method::DELETE, &uri, &token))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_vote_once_per_query() {
        let app = app();
        let token = signup(&app, "ada@example.com").await;
        let vote = json!({ "query_id": "q-1", "model": "rag", "vote": "up" });

        let resp = app
            .clone()
            .oneshot(post_json("/api/chat/rate", vote.clone(), Some(&token)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = app
            .clone()
            .oneshot(post_json("/api/chat/rate", vote, Some(&token)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            json_body(resp).await["error"],
            "Vote already recorded for this query"
        );

        let resp = app
            .oneshot(post_json(
                "/api/chat/rate",
                json!({ "query_id": "q-2" }),
                Some(&token),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
