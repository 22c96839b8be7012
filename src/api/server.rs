// ==========================================
// 看板补货调度 - HTTP 服务
// ==========================================
// 路由:
//   GET /health            存活检查
//   GET /api/kanban/{id}   调度 (JSON)
//   GET /x/kanban/{id}     扫码入口壳页面 (HTML)
// 生命周期: 启动 outbox worker, ctrl_c 后优雅关闭
// ==========================================

use std::sync::Arc;

use anyhow::Context;
use axum::routing::get;
use axum::{Json, Router};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::trace::TraceLayer;

use crate::api::kanban_api::get_kanban_dispatch;
use crate::api::shell::get_kanban_shell;
use crate::api::SharedState;
use crate::app::{planning_services_for, AppState};
use crate::config::ServerConfig;

pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/kanban/{id}", get(get_kanban_dispatch))
        .route("/x/kanban/{id}", get(get_kanban_shell))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

pub async fn start_server(config: ServerConfig) -> anyhow::Result<()> {
    let planning = planning_services_for(config.functions_url.as_deref());
    let state = Arc::new(
        AppState::new(config.db_path.clone(), planning).map_err(anyhow::Error::msg)?,
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let worker = tokio::spawn(
        state
            .auto_release_worker()
            .run(config.worker_poll_interval, shutdown_rx),
    );

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("无法监听 {}", addr))?;
    tracing::info!(addr = %addr, db_path = %config.db_path, "看板调度服务已启动");

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP 服务异常退出")?;

    // worker 已退出时发送失败可忽略
    let _ = shutdown_tx.send(true);
    if let Err(e) = worker.await {
        tracing::error!(error = %e, "outbox worker 异常退出");
    }

    tracing::info!("看板调度服务已停止");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "无法监听 ctrl_c");
    }
    tracing::info!("收到关闭信号");
}
