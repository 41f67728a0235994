//! 采集链路装配
//!
//! 下游写入器 → 通道注册表 → 网关使用的 DatapointSink。

use async_trait::async_trait;
use domain::Datapoint;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use ts_config::AppConfig;
use ts_ingest::{DatapointSink, IngestError};
use ts_pipeline::{ChannelRegistry, HttpBatchWriter, PipelineConfig, PipelineError, PushOutcome};
use ts_writer::{InfluxWriter, WriterConfig, WriterError};

/// 按配置构建下游写入器与通道注册表。
pub fn build_registry(config: &AppConfig) -> Result<ChannelRegistry, WriterError> {
    let writer = InfluxWriter::new(WriterConfig {
        base_url: config.influx_url.clone(),
        write_path: config.influx_write_path.clone(),
        precision: config.timestamp_precision,
        timeout: Duration::from_millis(config.influx_timeout_ms),
        tls_insecure: config.influx_tls_insecure,
    })?;
    info!(
        target: "ts.collector",
        write_url = %writer.write_url(),
        precision = %writer.precision(),
        "downstream_configured"
    );

    let pipeline_config = PipelineConfig {
        max_row_limit: config.max_row_limit,
        dispatch_queue_capacity: config.dispatch_queue_capacity,
        max_in_flight_writes: config.max_in_flight_writes,
    };
    Ok(ChannelRegistry::start(
        &config.channels,
        pipeline_config,
        Arc::new(HttpBatchWriter::new(writer)),
    ))
}

/// 将网关解码后的数据点投递到通道注册表。
pub struct RegistrySink {
    registry: ChannelRegistry,
}

impl RegistrySink {
    pub fn new(registry: ChannelRegistry) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl DatapointSink for RegistrySink {
    fn accepts(&self, channel: &str) -> bool {
        self.registry.contains(channel)
    }

    async fn publish(&self, channel: &str, datapoint: Datapoint) -> Result<(), IngestError> {
        match self.registry.push(channel, datapoint).await {
            Ok(PushOutcome::Emitted { sequence, size }) => {
                debug!(target: "ts.ingest", channel = %channel, sequence, size, "batch_threshold_reached");
                Ok(())
            }
            Ok(PushOutcome::Buffered { .. }) => Ok(()),
            Err(PipelineError::UnknownChannel(name)) => Err(IngestError::UnknownChannel(name)),
            Err(err) => {
                warn!(target: "ts.ingest", channel = %channel, error = %err, "publish_failed");
                Err(IngestError::Pipeline(err.to_string()))
            }
        }
    }
}
