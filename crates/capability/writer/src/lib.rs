//! 下游时序库写入。
//!
//! 所有通道共享同一个带连接池的 HTTP 客户端；每次写入是一个
//! `POST <base_url><write_path>?db=<channel>&precision=<p>`，请求体为
//! line protocol 原始文本。状态码 >= 400 视为投递失败，记录状态码与响应体；
//! 不做重试。

use domain::TimestampPrecision;
use reqwest::{Client, Url};
use std::time::{Duration, Instant};
use tracing::{trace, warn};

/// 写入器构造错误。
#[derive(Debug, thiserror::Error)]
pub enum WriterError {
    #[error("invalid endpoint: {0}")]
    Endpoint(String),
    #[error("http client error: {0}")]
    Client(String),
}

/// 批次投递失败。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeliveryError {
    #[error("downstream responded {status}: {body}")]
    Status { status: u16, body: String },
    #[error("transport error: {0}")]
    Transport(String),
}

impl DeliveryError {
    /// 下游返回的状态码（传输层失败时为 None）。
    pub fn status(&self) -> Option<u16> {
        match self {
            DeliveryError::Status { status, .. } => Some(*status),
            DeliveryError::Transport(_) => None,
        }
    }
}

/// 写入器配置。
#[derive(Debug, Clone)]
pub struct WriterConfig {
    /// 下游地址，如 `http://127.0.0.1:8086`
    pub base_url: String,
    /// 写入路径，默认 `/write`
    pub write_path: String,
    /// 时间戳单位
    pub precision: TimestampPrecision,
    /// 单次请求超时
    pub timeout: Duration,
    /// 接受无效证书（仅测试环境）
    pub tls_insecure: bool,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8086".to_string(),
            write_path: "/write".to_string(),
            precision: TimestampPrecision::default(),
            timeout: Duration::from_secs(10),
            tls_insecure: false,
        }
    }
}

/// 成功写入的回执。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteReceipt {
    pub status: u16,
    pub bytes: usize,
    pub latency_ms: u64,
}

/// 下游时序库写入器。
#[derive(Debug, Clone)]
pub struct InfluxWriter {
    client: Client,
    write_url: Url,
    precision: TimestampPrecision,
}

impl InfluxWriter {
    pub fn new(config: WriterConfig) -> Result<Self, WriterError> {
        let raw = format!(
            "{}/{}",
            config.base_url.trim_end_matches('/'),
            config.write_path.trim_start_matches('/')
        );
        let write_url = Url::parse(&raw).map_err(|err| WriterError::Endpoint(format!("{raw}: {err}")))?;
        let client = Client::builder()
            .timeout(config.timeout)
            .danger_accept_invalid_certs(config.tls_insecure)
            .build()
            .map_err(|err| WriterError::Client(err.to_string()))?;
        Ok(Self {
            client,
            write_url,
            precision: config.precision,
        })
    }

    /// 写入地址（不含查询参数）。
    pub fn write_url(&self) -> &str {
        self.write_url.as_str()
    }

    pub fn precision(&self) -> TimestampPrecision {
        self.precision
    }

    /// 投递一个已编码批次。
    pub async fn send(&self, channel: &str, payload: String) -> Result<WriteReceipt, DeliveryError> {
        let bytes = payload.len();
        trace!(target: "ts.writer", channel = %channel, bytes, "sending_batch");

        let started_at = Instant::now();
        let response = self
            .client
            .post(self.write_url.clone())
            .query(&[("db", channel), ("precision", self.precision.as_str())])
            .body(payload)
            .send()
            .await;

        let response = match response {
            Ok(response) => response,
            Err(err) => {
                warn!(target: "ts.writer", channel = %channel, bytes, error = %err, "delivery_failed");
                return Err(DeliveryError::Transport(err.to_string()));
            }
        };

        let status = response.status().as_u16();
        if status >= 400 {
            let body = response.text().await.unwrap_or_default();
            warn!(
                target: "ts.writer",
                channel = %channel,
                status,
                body = %body,
                bytes,
                "delivery_failed"
            );
            return Err(DeliveryError::Status { status, body });
        }

        Ok(WriteReceipt {
            status,
            bytes,
            latency_ms: millis_saturating(started_at.elapsed()),
        })
    }
}

fn millis_saturating(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latency_millis_saturate_instead_of_wrapping() {
        assert_eq!(millis_saturating(Duration::from_millis(1500)), 1500);
        assert_eq!(millis_saturating(Duration::MAX), u64::MAX);
    }

    #[test]
    fn write_url_joins_base_and_path() {
        let writer = InfluxWriter::new(WriterConfig {
            base_url: "http://influx.local:8086/".to_string(),
            write_path: "write".to_string(),
            ..WriterConfig::default()
        })
        .expect("writer");
        assert_eq!(writer.write_url(), "http://influx.local:8086/write");
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let err = InfluxWriter::new(WriterConfig {
            base_url: "not a url".to_string(),
            ..WriterConfig::default()
        })
        .expect_err("invalid");
        assert!(matches!(err, WriterError::Endpoint(_)));
    }
}
