//! 时序采集网关：HTTP 接收数据点 → 按通道批量聚合 → line protocol 写入下游时序库。

mod collector;
mod handlers;
mod middleware;
mod routes;
mod utils;

use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use ts_config::AppConfig;
use ts_ingest::Ingestor;
use ts_pipeline::{ChannelRegistry, spawn_flush_ticker};
use ts_telemetry::init_tracing;

#[derive(Clone)]
pub struct AppState {
    pub registry: ChannelRegistry,
    pub ingestor: Ingestor,
}

impl AppState {
    pub fn new(registry: ChannelRegistry) -> Self {
        let sink = Arc::new(collector::RegistrySink::new(registry.clone()));
        Self {
            registry,
            ingestor: Ingestor::new(sink),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 加载本地 .env（如存在），便于直接 cargo run 启动
    dotenvy::dotenv().ok();
    // 启动参数指定 JSON 配置文件时优先使用，否则读取环境变量
    let config = match std::env::args().nth(1) {
        Some(path) => AppConfig::from_json_file(path)?,
        None => AppConfig::from_env()?,
    };
    // 初始化结构化日志
    init_tracing();

    // 每个通道一个聚合器与投递任务，共享同一个下游 HTTP 客户端
    let registry = collector::build_registry(&config)?;
    let ticker = config
        .flush_interval_ms
        .map(|ms| spawn_flush_ticker(registry.clone(), Duration::from_millis(ms)));

    let app = routes::create_router(AppState::new(registry.clone()), &config.channel_path_prefix);

    let listener = tokio::net::TcpListener::bind(&config.http_addr).await?;
    info!(
        target: "ts.collector",
        addr = %config.http_addr,
        channels = ?registry.channels(),
        prefix = %config.channel_path_prefix,
        "collector_listening"
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // 停机：停止定时 flush，切出剩余数据并等待在途写入
    if let Some(ticker) = ticker {
        ticker.abort();
    }
    registry.shutdown().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(target: "ts.collector", error = %err, "shutdown_signal_unavailable");
        std::future::pending::<()>().await;
    }
    info!(target: "ts.collector", "shutdown_requested");
}
