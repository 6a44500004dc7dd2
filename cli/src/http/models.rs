//! HTTP API请求/响应数据模型

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Default, Deserialize)]
pub struct SignupRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub success: bool,
    pub authtoken: String,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub authtoken: String,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct SaveChatRequest {
    #[serde(default)]
    pub messages: Vec<Value>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RateRequest {
    #[serde(default)]
    pub query_id: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub vote: Option<String>,
}

/// 健康检查响应
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_seconds: f64,
    pub requests_handled: u64,
    pub timestamp: String,
}
