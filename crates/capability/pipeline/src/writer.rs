use crate::PipelineError;
use async_trait::async_trait;
use ts_writer::InfluxWriter;

/// 写入结果。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteResult {
    pub channel: String,
    pub bytes: usize,
    pub status: Option<u16>,
    pub latency_ms: u64,
}

/// 已编码批次写入器抽象。
#[async_trait]
pub trait BatchWriter: Send + Sync {
    async fn write(&self, channel: &str, payload: String) -> Result<WriteResult, PipelineError>;
}

/// 空写入器（用于接线与测试）。
#[derive(Debug, Default)]
pub struct NoopWriter;

#[async_trait]
impl BatchWriter for NoopWriter {
    async fn write(&self, channel: &str, payload: String) -> Result<WriteResult, PipelineError> {
        Ok(WriteResult {
            channel: channel.to_string(),
            bytes: payload.len(),
            status: None,
            latency_ms: 0,
        })
    }
}

/// 基于 HTTP 的写入器（下游时序库 /write）。
#[derive(Clone)]
pub struct HttpBatchWriter {
    writer: InfluxWriter,
}

impl HttpBatchWriter {
    pub fn new(writer: InfluxWriter) -> Self {
        Self { writer }
    }
}

#[async_trait]
impl BatchWriter for HttpBatchWriter {
    async fn write(&self, channel: &str, payload: String) -> Result<WriteResult, PipelineError> {
        let receipt = self
            .writer
            .send(channel, payload)
            .await
            .map_err(|err| PipelineError::Writer(err.to_string()))?;
        Ok(WriteResult {
            channel: channel.to_string(),
            bytes: receipt.bytes,
            status: Some(receipt.status),
            latency_ms: receipt.latency_ms,
        })
    }
}
