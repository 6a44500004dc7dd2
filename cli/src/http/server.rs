//! HTTP服务器生命周期管理

use crate::http::{
    middleware::{create_middleware_stack, create_trace_layer, request_logger},
    routes::create_router,
    AppState,
};
use anyhow::Context;
use axum::middleware;
use std::net::SocketAddr;
use tokio::signal;
use tracing::{info, warn};

/// 使用上下文中的服务器配置启动HTTP服务器，直到收到关闭信号
pub async fn start_server(host: &str, port: u16, state: AppState) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .with_context(|| format!("invalid listen address {host}:{port}"))?;
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    serve(listener, state).await
}

/// 在已绑定的监听器上运行服务器
pub async fn serve(listener: tokio::net::TcpListener, state: AppState) -> anyhow::Result<()> {
    let server_cfg = state.ctx.cfg().server.clone();

    // 构建路由并添加中间件
    let app = create_router(state.clone())
        .layer(middleware::from_fn(request_logger))
        .layer(create_trace_layer())
        .layer(create_middleware_stack(&server_cfg));

    let addr = listener.local_addr()?;
    info!(
        store = state.ctx.store().name(),
        script_timeout_secs = state.ctx.dispatcher().timeout().as_secs(),
        "HTTP server listening on http://{}",
        addr
    );

    let mut shutdown_rx = state.shutdown_tx.subscribe();

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::select! {
                _ = signal::ctrl_c() => {
                    info!("Received Ctrl+C signal");
                }
                _ = shutdown_rx.recv() => {
                    info!("Received in-process shutdown signal");
                }
                _ = wait_for_sigterm() => {
                    info!("Received SIGTERM signal");
                }
            }

            info!("Starting graceful shutdown...");
        })
        .await?;

    if let Ok(stats) = state.stats.read() {
        info!(
            requests_total = stats.requests_total,
            errors_total = stats.errors_total,
            per_route = ?stats.per_route,
            uptime_seconds = stats.uptime_seconds(),
            "Server shutdown complete"
        );
    }
    Ok(())
}

/// 等待 SIGTERM 信号（Unix系统）
#[cfg(unix)]
async fn wait_for_sigterm() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        }
        Err(e) => {
            warn!("Failed to install SIGTERM handler: {}", e);
            std::future::pending::<()>().await
        }
    }
}

/// Windows 系统不支持 SIGTERM，使用空操作
#[cfg(not(unix))]
async fn wait_for_sigterm() {
    std::future::pending::<()>().await
}
