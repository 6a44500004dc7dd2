//! HTTP服务器共享状态

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Instant;

use arena_core::api::AppContext;
use tokio::sync::broadcast;

/// 请求统计
#[derive(Debug)]
pub struct ServerStats {
    started: Instant,
    pub requests_total: u64,
    pub errors_total: u64,
    pub per_route: HashMap<&'static str, u64>,
}

impl ServerStats {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            requests_total: 0,
            errors_total: 0,
            per_route: HashMap::new(),
        }
    }

    pub fn increment_request(&mut self, route: &'static str) {
        self.requests_total += 1;
        *self.per_route.entry(route).or_insert(0) += 1;
    }

    pub fn increment_error(&mut self) {
        self.errors_total += 1;
    }

    pub fn uptime_seconds(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }
}

impl Default for ServerStats {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone)]
pub struct AppState {
    pub ctx: AppContext,
    pub stats: Arc<RwLock<ServerStats>>,
    /// 进程内关闭句柄，不对外暴露为路由
    pub shutdown_tx: broadcast::Sender<()>,
}

impl AppState {
    pub fn new(ctx: AppContext, shutdown_tx: broadcast::Sender<()>) -> Self {
        Self {
            ctx,
            stats: Arc::new(RwLock::new(ServerStats::new())),
            shutdown_tx,
        }
    }

    pub fn record_request(&self, route: &'static str) {
        if let Ok(mut stats) = self.stats.write() {
            stats.increment_request(route);
        }
    }

    pub fn record_error(&self) {
        if let Ok(mut stats) = self.stats.write() {
            stats.increment_error();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_count_per_route() {
        let mut stats = ServerStats::new();
        stats.increment_request("/api/rag/query");
        stats.increment_request("/api/rag/query");
        stats.increment_request("/health");
        stats.increment_error();

        assert_eq!(stats.requests_total, 3);
        assert_eq!(stats.errors_total, 1);
        assert_eq!(stats.per_route.get("/api/rag/query"), Some(&2));
    }
}
