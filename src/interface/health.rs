//! 存活探针
//!
//! 与迁移状态无关的裸 HTTP 200 端点，供托管平台探活。

use anyhow::{Context, Result};
use axum::Router;
use axum::routing::get;
use tracing::info;

use crate::config::ServerConfig;

async fn health() -> &'static str {
    "Bot is running"
}

/// 启动存活探针 HTTP 服务（常驻）
pub async fn serve(config: &ServerConfig) -> Result<()> {
    let app = Router::new().route("/", get(health));
    let addr = format!("{}:{}", config.address, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("bind health endpoint on {addr}"))?;
    info!(%addr, "health endpoint listening");
    axum::serve(listener, app).await.context("health endpoint failed")
}
