//! 稳定的 JSON 数据点格式与 API 响应契约。

use domain::{DEFAULT_MEASUREMENT, Datapoint, FieldValue};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 标准 API 响应封装。
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ApiError>,
}

/// 失败响应的错误体。
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ApiError {
                code: code.into(),
                message: message.into(),
            }),
        }
    }
}

/// JSON 中的单个字段值：数值、布尔或字符串。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PayloadValue {
    Integer(i64),
    Float(f64),
    Boolean(bool),
    String(String),
}

impl From<PayloadValue> for FieldValue {
    fn from(value: PayloadValue) -> Self {
        match value {
            PayloadValue::Integer(v) => FieldValue::Integer(v),
            PayloadValue::Float(v) => FieldValue::Float(v),
            PayloadValue::Boolean(v) => FieldValue::Boolean(v),
            PayloadValue::String(v) => FieldValue::String(v),
        }
    }
}

impl From<&FieldValue> for PayloadValue {
    fn from(value: &FieldValue) -> Self {
        match value {
            FieldValue::Integer(v) => PayloadValue::Integer(*v),
            FieldValue::Float(v) => PayloadValue::Float(*v),
            FieldValue::Boolean(v) => PayloadValue::Boolean(*v),
            FieldValue::String(v) => PayloadValue::String(v.clone()),
        }
    }
}

/// 数据点 JSON 格式。
///
/// ```json
/// {"name":"measure","timestamp":1234567890,"tags":{"k":"v"},"values":{"f":1.23}}
/// ```
///
/// `name` 缺省为 `measure`，`tags` 缺省为空，`timestamp` 与 `values` 必填。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatapointPayload {
    #[serde(default = "default_name")]
    pub name: String,
    pub timestamp: i64,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    pub values: BTreeMap<String, PayloadValue>,
}

fn default_name() -> String {
    DEFAULT_MEASUREMENT.to_string()
}

impl From<&Datapoint> for DatapointPayload {
    fn from(datapoint: &Datapoint) -> Self {
        Self {
            name: datapoint.name().to_string(),
            timestamp: datapoint.timestamp(),
            tags: datapoint.tags().clone(),
            values: datapoint
                .values()
                .iter()
                .map(|(key, value)| (key.clone(), PayloadValue::from(value)))
                .collect(),
        }
    }
}

impl From<DatapointPayload> for Datapoint {
    fn from(payload: DatapointPayload) -> Self {
        let datapoint = payload
            .tags
            .into_iter()
            .fold(Datapoint::new(payload.name, payload.timestamp), |dp, (k, v)| {
                dp.with_tag(k, v)
            });
        payload
            .values
            .into_iter()
            .fold(datapoint, |dp, (k, v)| dp.with_value(k, FieldValue::from(v)))
    }
}

/// 采集网关请求体：单个数据点或数据点数组。
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum IngestBody {
    One(DatapointPayload),
    Many(Vec<DatapointPayload>),
}

impl IngestBody {
    pub fn into_payloads(self) -> Vec<DatapointPayload> {
        match self {
            IngestBody::One(payload) => vec![payload],
            IngestBody::Many(payloads) => payloads,
        }
    }
}

/// 已注册通道列表。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelsDto {
    pub channels: Vec<String>,
}

/// 计数指标快照。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshotDto {
    pub datapoints_received: u64,
    pub datapoints_rejected: u64,
    pub unknown_channel: u64,
    pub batches_emitted: u64,
    pub batches_delivered: u64,
    pub delivery_failures: u64,
    pub encode_failures: u64,
    pub bytes_written: u64,
    pub write_latency_ms_total: u64,
    pub write_latency_ms_count: u64,
}
