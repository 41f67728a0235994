//! 探活、通道列表与指标快照
//!
//! - GET /
//! - GET /health
//! - GET /channels
//! - GET /metrics

use api_contract::{ApiResponse, ChannelsDto, MetricsSnapshotDto};
use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use ts_telemetry::metrics;

use crate::AppState;

pub async fn ping() -> &'static str {
    "TimeSeries Collector"
}

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "ok": true }))
}

pub async fn list_channels(State(state): State<AppState>) -> Response {
    (
        StatusCode::OK,
        Json(ApiResponse::success(ChannelsDto {
            channels: state.registry.channels(),
        })),
    )
        .into_response()
}

pub async fn get_metrics() -> Response {
    let snapshot = metrics().snapshot();
    (
        StatusCode::OK,
        Json(ApiResponse::success(MetricsSnapshotDto {
            datapoints_received: snapshot.datapoints_received,
            datapoints_rejected: snapshot.datapoints_rejected,
            unknown_channel: snapshot.unknown_channel,
            batches_emitted: snapshot.batches_emitted,
            batches_delivered: snapshot.batches_delivered,
            delivery_failures: snapshot.delivery_failures,
            encode_failures: snapshot.encode_failures,
            bytes_written: snapshot.bytes_written,
            write_latency_ms_total: snapshot.write_latency_ms_total,
            write_latency_ms_count: snapshot.write_latency_ms_count,
        })),
    )
        .into_response()
}
