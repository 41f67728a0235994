//! 数据点接收
//!
//! - POST <prefix>/:channel

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use ts_ingest::IngestError;

use crate::AppState;
use crate::utils::{bad_request_error, channel_not_found_error, pipeline_unavailable_error};

/// 接收单个数据点或数据点数组；受理后立即返回 204，不等待下游写入。
pub async fn store_datapoints(
    State(state): State<AppState>,
    Path(channel): Path<String>,
    body: Bytes,
) -> Response {
    match state.ingestor.ingest(&channel, &body).await {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(IngestError::InvalidPayload(message)) => bad_request_error(message),
        Err(IngestError::UnknownChannel(name)) => channel_not_found_error(&name),
        Err(err @ IngestError::Pipeline(_)) => pipeline_unavailable_error(err.to_string()),
    }
}
