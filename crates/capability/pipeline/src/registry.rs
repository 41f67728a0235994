use crate::aggregator::{BatchAggregator, PushOutcome};
use crate::delivery::DeliveryWorker;
use crate::writer::BatchWriter;
use crate::{PipelineConfig, PipelineError};
use domain::Datapoint;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Semaphore, mpsc};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

struct RegistryInner {
    aggregators: HashMap<String, BatchAggregator>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    permits: Arc<Semaphore>,
    max_in_flight_writes: usize,
}

/// 通道注册表：启动时固定，每个通道一个聚合器与一个投递任务。
#[derive(Clone)]
pub struct ChannelRegistry {
    inner: Arc<RegistryInner>,
}

impl ChannelRegistry {
    /// 构建注册表并派生各通道投递任务（需在 tokio 运行时内调用）。
    pub fn start<I, S>(channels: I, config: PipelineConfig, writer: Arc<dyn BatchWriter>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let config = config.sanitized();
        let permits = Arc::new(Semaphore::new(config.max_in_flight_writes));
        let mut aggregators = HashMap::new();
        let mut workers = Vec::new();

        for channel in channels {
            let name = channel.as_ref().trim();
            if name.is_empty() || aggregators.contains_key(name) {
                continue;
            }
            let (tx, rx) = mpsc::channel(config.dispatch_queue_capacity);
            let worker = DeliveryWorker::new(name, rx, Arc::clone(&writer), Arc::clone(&permits));
            workers.push(tokio::spawn(worker.run()));
            aggregators.insert(
                name.to_string(),
                BatchAggregator::new(name, config.max_row_limit, tx),
            );
        }

        info!(
            target: "ts.pipeline",
            channels = aggregators.len(),
            max_row_limit = config.max_row_limit,
            max_in_flight_writes = config.max_in_flight_writes,
            "channel_registry_started"
        );

        Self {
            inner: Arc::new(RegistryInner {
                aggregators,
                workers: Mutex::new(workers),
                permits,
                max_in_flight_writes: config.max_in_flight_writes,
            }),
        }
    }

    pub fn resolve(&self, channel: &str) -> Result<&BatchAggregator, PipelineError> {
        self.inner
            .aggregators
            .get(channel)
            .ok_or_else(|| PipelineError::UnknownChannel(channel.to_string()))
    }

    pub fn contains(&self, channel: &str) -> bool {
        self.inner.aggregators.contains_key(channel)
    }

    pub async fn push(&self, channel: &str, datapoint: Datapoint) -> Result<PushOutcome, PipelineError> {
        self.resolve(channel)?.push(datapoint).await
    }

    /// 已注册通道名（排序）。
    pub fn channels(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inner.aggregators.keys().cloned().collect();
        names.sort();
        names
    }

    /// 切出所有非空缓冲，返回切出的批次数。
    pub async fn flush_all(&self) -> usize {
        let mut emitted = 0;
        for aggregator in self.inner.aggregators.values() {
            match aggregator.flush().await {
                Ok(Some(_)) => emitted += 1,
                Ok(None) => {}
                Err(err) => {
                    warn!(target: "ts.pipeline", channel = %aggregator.channel(), error = %err, "flush_failed");
                }
            }
        }
        emitted
    }

    /// 切出剩余数据、关闭队列并等待所有投递任务与在途写入结束。
    pub async fn shutdown(&self) {
        for aggregator in self.inner.aggregators.values() {
            if let Err(err) = aggregator.close().await {
                warn!(target: "ts.pipeline", channel = %aggregator.channel(), error = %err, "close_failed");
            }
        }

        let workers = std::mem::take(&mut *self.inner.workers.lock().await);
        for worker in workers {
            if let Err(err) = worker.await {
                warn!(target: "ts.pipeline", error = %err, "delivery_worker_join_failed");
            }
        }

        let total = u32::try_from(self.inner.max_in_flight_writes).unwrap_or(u32::MAX);
        if self.inner.permits.acquire_many(total).await.is_err() {
            warn!(target: "ts.pipeline", "write_permits_closed");
        }
        info!(target: "ts.pipeline", "channel_registry_stopped");
    }
}

/// 周期性 flush_all，用于限制未满批次的滞留时间。
pub fn spawn_flush_ticker(registry: ChannelRegistry, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // 首个 tick 立即返回
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let emitted = registry.flush_all().await;
            if emitted > 0 {
                tracing::debug!(target: "ts.pipeline", emitted, "interval_flush");
            }
        }
    })
}
