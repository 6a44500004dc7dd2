//! HTTP中间件配置

use arena_core::api::ServerConfig;
use axum::{
    body::Body,
    http::{header, HeaderName, HeaderValue, Method, Request, Uri},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{info, warn};

/// 创建中间件栈
pub fn create_middleware_stack(
    config: &ServerConfig,
) -> tower::layer::util::Stack<CorsLayer, TimeoutLayer> {
    tower::layer::util::Stack::new(
        create_cors_layer(&config.allowed_origins),
        create_timeout_layer(config.request_timeout_secs),
    )
}

/// 创建CORS中间件 - 仅允许配置中的 origin
fn create_cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let allowed: Arc<Vec<String>> = Arc::new(allowed_origins.to_vec());
    CorsLayer::new()
        .allow_origin(tower_http::cors::AllowOrigin::predicate(
            move |origin: &HeaderValue, _| {
                origin
                    .to_str()
                    .map(|s| origin_allowed(s, &allowed))
                    .unwrap_or(false)
            },
        ))
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::ACCEPT,
            HeaderName::from_static("auth-token"),
        ])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600))
}

/// scheme 与 host 必须完全一致；配置项未写端口时允许任意端口
fn origin_allowed(origin: &str, allowed: &[String]) -> bool {
    let Ok(origin) = origin.parse::<Uri>() else {
        return false;
    };
    let (Some(scheme), Some(host)) = (origin.scheme_str(), origin.host()) else {
        return false;
    };

    allowed.iter().filter_map(|a| a.parse::<Uri>().ok()).any(|a| {
        a.scheme_str().is_some_and(|s| s.eq_ignore_ascii_case(scheme))
            && a.host().is_some_and(|h| h.eq_ignore_ascii_case(host))
            && a.port_u16().map_or(true, |p| origin.port_u16() == Some(p))
    })
}

/// 创建超时中间件；需大于脚本超时，让脚本超时先返回504
fn create_timeout_layer(secs: u64) -> TimeoutLayer {
    TimeoutLayer::new(Duration::from_secs(secs))
}

/// 创建请求日志layer（用于HTTP请求追踪）
pub fn create_trace_layer(
) -> TraceLayer<tower_http::classify::SharedClassifier<tower_http::classify::ServerErrorsAsFailures>>
{
    TraceLayer::new_for_http()
}

/// 请求日志中间件（手动实现，用于记录详细信息）
pub async fn request_logger(req: Request<Body>, next: Next) -> Response {
    let method = req.method().clone();
    let uri = req.uri().clone();
    let start = Instant::now();

    let response = next.run(req).await;

    let duration = start.elapsed();
    let status = response.status();

    // 根据状态码选择日志级别
    if status.is_client_error() || status.is_server_error() {
        warn!(
            method = %method,
            uri = %uri,
            status = %status.as_u16(),
            duration_ms = %duration.as_millis(),
            "Request failed"
        );
    } else {
        info!(
            method = %method,
            uri = %uri,
            status = %status.as_u16(),
            duration_ms = %duration.as_millis(),
            "Request completed"
        );
    }

    response
}
