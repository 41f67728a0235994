use api_contract::IngestBody;
use async_trait::async_trait;
use domain::Datapoint;
use std::sync::Arc;
use tracing::{debug, warn};

/// 采集错误。
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
    #[error("unknown channel: {0}")]
    UnknownChannel(String),
    #[error("pipeline error: {0}")]
    Pipeline(String),
}

/// 数据点下游（通常是通道注册表）。
#[async_trait]
pub trait DatapointSink: Send + Sync {
    /// 通道是否已注册。
    fn accepts(&self, channel: &str) -> bool;

    async fn publish(&self, channel: &str, datapoint: Datapoint) -> Result<(), IngestError>;
}

/// 解码请求体：单个数据点对象或数据点数组。
///
/// 任一元素不合法时整体拒绝。
pub fn decode_datapoints(body: &[u8]) -> Result<Vec<Datapoint>, IngestError> {
    let body: IngestBody =
        serde_json::from_slice(body).map_err(|err| IngestError::InvalidPayload(err.to_string()))?;
    let datapoints: Vec<Datapoint> = body
        .into_payloads()
        .into_iter()
        .map(Datapoint::from)
        .collect();
    for (index, datapoint) in datapoints.iter().enumerate() {
        datapoint
            .validate()
            .map_err(|err| IngestError::InvalidPayload(format!("datapoint {index}: {err}")))?;
    }
    Ok(datapoints)
}

/// 采集入口：校验通道 → 解码 → 逐个投递。
#[derive(Clone)]
pub struct Ingestor {
    sink: Arc<dyn DatapointSink>,
}

impl Ingestor {
    pub fn new(sink: Arc<dyn DatapointSink>) -> Self {
        Self { sink }
    }

    /// 返回接收的数据点数量。
    ///
    /// 数组中途投递失败时，已投递的数据点不会回滚：它们照常计入接收数，
    /// 再返回该错误。
    pub async fn ingest(&self, channel: &str, body: &[u8]) -> Result<usize, IngestError> {
        if !self.sink.accepts(channel) {
            ts_telemetry::record_unknown_channel();
            warn!(target: "ts.ingest", channel = %channel, "unknown_channel");
            return Err(IngestError::UnknownChannel(channel.to_string()));
        }

        let datapoints = match decode_datapoints(body) {
            Ok(datapoints) => datapoints,
            Err(err) => {
                ts_telemetry::record_datapoints_rejected();
                warn!(target: "ts.ingest", channel = %channel, error = %err, "payload_rejected");
                return Err(err);
            }
        };

        let count = datapoints.len();
        let mut published = 0usize;
        for datapoint in datapoints {
            if let Err(err) = self.sink.publish(channel, datapoint).await {
                ts_telemetry::record_datapoints_received(published as u64);
                warn!(
                    target: "ts.ingest",
                    channel = %channel,
                    published,
                    total = count,
                    error = %err,
                    "partial_publish"
                );
                return Err(err);
            }
            published += 1;
        }
        ts_telemetry::record_datapoints_received(count as u64);
        debug!(target: "ts.ingest", channel = %channel, count, "datapoints_accepted");
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_single_object_with_defaults() {
        let datapoints =
            decode_datapoints(br#"{"timestamp":10,"values":{"v":1.5}}"#).expect("decode");
        assert_eq!(datapoints.len(), 1);
        assert_eq!(datapoints[0].name(), "measure");
        assert!(datapoints[0].tags().is_empty());
    }

    #[test]
    fn rejects_missing_timestamp() {
        let err = decode_datapoints(br#"{"values":{"v":1}}"#).unwrap_err();
        assert!(matches!(err, IngestError::InvalidPayload(_)));
    }

    #[test]
    fn rejects_empty_values() {
        let err = decode_datapoints(br#"{"timestamp":1,"values":{}}"#).unwrap_err();
        assert!(matches!(err, IngestError::InvalidPayload(_)));
    }

    #[test]
    fn rejects_nested_value() {
        let err = decode_datapoints(br#"{"timestamp":1,"values":{"v":{"x":1}}}"#).unwrap_err();
        assert!(matches!(err, IngestError::InvalidPayload(_)));
    }
}
