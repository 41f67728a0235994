//! 数据流水线：通道注册表 → 批量聚合 → 编码 → 异步投递。
//!
//! ```text
//! ChannelRegistry::push(channel, datapoint)
//!       │
//!       ▼
//! BatchAggregator（每通道一把锁，达到 max_row_limit 即切批）
//!       │  有界队列
//!       ▼
//! DeliveryWorker（每通道一个任务：编码 → 获取全局写入许可 → spawn 写入）
//!       │
//!       ▼
//! BatchWriter（HttpBatchWriter → InfluxWriter）
//! ```

mod aggregator;
mod delivery;
mod registry;
mod writer;

pub use aggregator::{Batch, BatchAggregator, PushOutcome};
pub use delivery::DeliveryWorker;
pub use registry::{ChannelRegistry, spawn_flush_ticker};
pub use writer::{BatchWriter, HttpBatchWriter, NoopWriter, WriteResult};

/// Pipeline 处理错误。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PipelineError {
    #[error("unknown channel: {0}")]
    UnknownChannel(String),
    #[error("channel closed: {0}")]
    Closed(String),
    #[error("writer error: {0}")]
    Writer(String),
}

/// Pipeline 参数。
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// 单批最大行数，达到即切批投递
    pub max_row_limit: usize,
    /// 每通道待投递批次队列容量
    pub dispatch_queue_capacity: usize,
    /// 全局同时在途的下游写入数
    pub max_in_flight_writes: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_row_limit: 10_000,
            dispatch_queue_capacity: 16,
            max_in_flight_writes: 64,
        }
    }
}

impl PipelineConfig {
    fn sanitized(mut self) -> Self {
        if self.max_row_limit == 0 {
            self.max_row_limit = 1;
        }
        if self.dispatch_queue_capacity == 0 {
            self.dispatch_queue_capacity = 1;
        }
        if self.max_in_flight_writes == 0 {
            self.max_in_flight_writes = 1;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitized_replaces_zero_limits() {
        let config = PipelineConfig {
            max_row_limit: 0,
            dispatch_queue_capacity: 0,
            max_in_flight_writes: 0,
        }
        .sanitized();
        assert_eq!(config.max_row_limit, 1);
        assert_eq!(config.dispatch_queue_capacity, 1);
        assert_eq!(config.max_in_flight_writes, 1);
    }
}
