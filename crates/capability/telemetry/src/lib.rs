//! 追踪、请求 ID 生成与进程级计数指标。

use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing_subscriber::{EnvFilter, fmt};

/// 请求级追踪标识。
#[derive(Debug, Clone)]
pub struct RequestIds {
    pub request_id: String,
    pub trace_id: String,
}

/// 指标快照。
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsSnapshot {
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

/// 采集链路计数器。
pub struct TelemetryMetrics {
    datapoints_received: AtomicU64,
    datapoints_rejected: AtomicU64,
    unknown_channel: AtomicU64,
    batches_emitted: AtomicU64,
    batches_delivered: AtomicU64,
    delivery_failures: AtomicU64,
    encode_failures: AtomicU64,
    bytes_written: AtomicU64,
    write_latency_ms_total: AtomicU64,
    write_latency_ms_count: AtomicU64,
}

impl TelemetryMetrics {
    pub fn new() -> Self {
        Self {
            datapoints_received: AtomicU64::new(0),
            datapoints_rejected: AtomicU64::new(0),
            unknown_channel: AtomicU64::new(0),
            batches_emitted: AtomicU64::new(0),
            batches_delivered: AtomicU64::new(0),
            delivery_failures: AtomicU64::new(0),
            encode_failures: AtomicU64::new(0),
            bytes_written: AtomicU64::new(0),
            write_latency_ms_total: AtomicU64::new(0),
            write_latency_ms_count: AtomicU64::new(0),
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            datapoints_received: self.datapoints_received.load(Ordering::Relaxed),
            datapoints_rejected: self.datapoints_rejected.load(Ordering::Relaxed),
            unknown_channel: self.unknown_channel.load(Ordering::Relaxed),
            batches_emitted: self.batches_emitted.load(Ordering::Relaxed),
            batches_delivered: self.batches_delivered.load(Ordering::Relaxed),
            delivery_failures: self.delivery_failures.load(Ordering::Relaxed),
            encode_failures: self.encode_failures.load(Ordering::Relaxed),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
            write_latency_ms_total: self.write_latency_ms_total.load(Ordering::Relaxed),
            write_latency_ms_count: self.write_latency_ms_count.load(Ordering::Relaxed),
        }
    }
}

impl Default for TelemetryMetrics {
    fn default() -> Self {
        Self::new()
    }
}

static METRICS: OnceLock<TelemetryMetrics> = OnceLock::new();

/// 获取全局指标实例。
pub fn metrics() -> &'static TelemetryMetrics {
    METRICS.get_or_init(TelemetryMetrics::new)
}

/// 初始化 tracing（默认 info）。
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).try_init();
}

/// 生成新的 request_id 与 trace_id。
pub fn new_request_ids() -> RequestIds {
    RequestIds {
        request_id: uuid::Uuid::new_v4().to_string(),
        trace_id: uuid::Uuid::new_v4().to_string(),
    }
}

/// 记录接收的数据点数量。
pub fn record_datapoints_received(count: u64) {
    metrics()
        .datapoints_received
        .fetch_add(count, Ordering::Relaxed);
}

/// 记录被拒绝（格式错误/不完整）的请求次数。
pub fn record_datapoints_rejected() {
    metrics().datapoints_rejected.fetch_add(1, Ordering::Relaxed);
}

/// 记录未知通道次数。
pub fn record_unknown_channel() {
    metrics().unknown_channel.fetch_add(1, Ordering::Relaxed);
}

/// 记录批次产出次数。
pub fn record_batch_emitted() {
    metrics().batches_emitted.fetch_add(1, Ordering::Relaxed);
}

/// 记录批次投递成功（字节数与耗时）。
pub fn record_batch_delivered(bytes: u64, latency_ms: u64) {
    let metrics = metrics();
    metrics.batches_delivered.fetch_add(1, Ordering::Relaxed);
    metrics.bytes_written.fetch_add(bytes, Ordering::Relaxed);
    metrics
        .write_latency_ms_total
        .fetch_add(latency_ms, Ordering::Relaxed);
    metrics
        .write_latency_ms_count
        .fetch_add(1, Ordering::Relaxed);
}

/// 记录批次投递失败次数。
pub fn record_delivery_failure() {
    metrics().delivery_failures.fetch_add(1, Ordering::Relaxed);
}

/// 记录批次编码失败次数。
pub fn record_encode_failure() {
    metrics().encode_failures.fetch_add(1, Ordering::Relaxed);
}
