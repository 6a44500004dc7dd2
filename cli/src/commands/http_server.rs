//! HTTP服务器命令处理器

use crate::commands::cli::ServeArgs;
use crate::http::{server, AppState};
use anyhow::bail;
use arena_core::api::AppContext;
use tokio::sync::broadcast;

/// 处理 serve 命令
pub async fn handle_serve(args: ServeArgs, ctx: AppContext) -> anyhow::Result<()> {
    if ctx.cfg().auth.jwt_secret.is_empty() {
        bail!("auth.jwt_secret is empty; set it in the config file or via JWT_SECRET");
    }

    // CLI 参数优先，配置文件作为默认值
    let host = args.host.unwrap_or_else(|| ctx.cfg().server.host.clone());
    let port = args.port.unwrap_or(ctx.cfg().server.port);

    let (shutdown_tx, _) = broadcast::channel(1);
    let state = AppState::new(ctx, shutdown_tx);

    tracing::info!("Starting HTTP server on {}:{}", host, port);
    server::start_server(&host, port, state).await
}
