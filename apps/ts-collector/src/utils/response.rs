//! HTTP 错误响应辅助函数
//!
//! 所有错误返回统一的 ApiResponse 格式，HTTP 状态码与错误码对应。

use api_contract::ApiResponse;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// 错误请求响应（报文格式错误、数据点不完整）
pub fn bad_request_error(message: impl Into<String>) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiResponse::<()>::error("INVALID.REQUEST", message.into())),
    )
        .into_response()
}

/// 未注册通道响应
pub fn channel_not_found_error(channel: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ApiResponse::<()>::error(
            "CHANNEL.NOT_FOUND",
            format!("unknown channel: {channel}"),
        )),
    )
        .into_response()
}

/// 流水线不可用（停机中）
pub fn pipeline_unavailable_error(message: impl Into<String>) -> Response {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(ApiResponse::<()>::error("PIPELINE.UNAVAILABLE", message.into())),
    )
        .into_response()
}
