use crate::aggregator::Batch;
use crate::writer::BatchWriter;
use std::sync::Arc;
use tokio::sync::{Semaphore, mpsc};
use tracing::{debug, info, warn};

/// 单通道投递任务：按队列顺序编码批次，获取全局写入许可后派生写入。
pub struct DeliveryWorker {
    channel: String,
    rx: mpsc::Receiver<Batch>,
    writer: Arc<dyn BatchWriter>,
    permits: Arc<Semaphore>,
}

impl DeliveryWorker {
    pub fn new(
        channel: impl Into<String>,
        rx: mpsc::Receiver<Batch>,
        writer: Arc<dyn BatchWriter>,
        permits: Arc<Semaphore>,
    ) -> Self {
        Self {
            channel: channel.into(),
            rx,
            writer,
            permits,
        }
    }

    /// 运行直到队列关闭且清空。
    pub async fn run(mut self) {
        while let Some(batch) = self.rx.recv().await {
            self.dispatch(batch).await;
        }
        debug!(target: "ts.pipeline", channel = %self.channel, "delivery_worker_stopped");
    }

    async fn dispatch(&self, batch: Batch) {
        let sequence = batch.sequence;
        let size = batch.datapoints.len();
        let payload = match ts_protocol::encode_batch(&batch.datapoints) {
            Ok(payload) => payload,
            Err(err) => {
                ts_telemetry::record_encode_failure();
                warn!(
                    target: "ts.pipeline",
                    channel = %self.channel,
                    sequence,
                    size,
                    error = %err,
                    "batch_encode_failed"
                );
                return;
            }
        };

        let permit = match self.permits.clone().acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => {
                warn!(target: "ts.pipeline", channel = %self.channel, sequence, "write_permits_closed");
                return;
            }
        };

        let writer = Arc::clone(&self.writer);
        let channel = self.channel.clone();
        tokio::spawn(async move {
            let _permit = permit;
            match writer.write(&channel, payload).await {
                Ok(result) => {
                    ts_telemetry::record_batch_delivered(result.bytes as u64, result.latency_ms);
                    info!(
                        target: "ts.pipeline",
                        channel = %channel,
                        sequence,
                        size,
                        bytes = result.bytes,
                        latency_ms = result.latency_ms,
                        "batch_delivered"
                    );
                }
                Err(err) => {
                    ts_telemetry::record_delivery_failure();
                    warn!(
                        target: "ts.pipeline",
                        channel = %channel,
                        sequence,
                        size,
                        error = %err,
                        "batch_dropped"
                    );
                }
            }
        });
    }
}
