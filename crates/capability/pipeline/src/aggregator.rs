use crate::PipelineError;
use domain::Datapoint;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, warn};

/// 已切出的批次，交由投递任务独占。
#[derive(Debug, Clone)]
pub struct Batch {
    pub channel: String,
    /// 通道内单调递增的批次序号
    pub sequence: u64,
    pub datapoints: Vec<Datapoint>,
}

/// 单次 push 的结果。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    Buffered { buffered: usize },
    Emitted { sequence: u64, size: usize },
}

struct AggregatorState {
    buffer: Vec<Datapoint>,
    next_sequence: u64,
    dispatch: Option<mpsc::Sender<Batch>>,
}

struct AggregatorInner {
    channel: String,
    max_row_limit: usize,
    state: Mutex<AggregatorState>,
}

/// 单通道批量聚合器。
///
/// 追加与切批在同一把锁下完成，批次在持锁期间送入有界队列，
/// 因此队列中的批次顺序与追加顺序一致。单个批次不超过 `max_row_limit`。
#[derive(Clone)]
pub struct BatchAggregator {
    inner: Arc<AggregatorInner>,
}

impl BatchAggregator {
    pub fn new(
        channel: impl Into<String>,
        max_row_limit: usize,
        dispatch: mpsc::Sender<Batch>,
    ) -> Self {
        let max_row_limit = max_row_limit.max(1);
        Self {
            inner: Arc::new(AggregatorInner {
                channel: channel.into(),
                max_row_limit,
                state: Mutex::new(AggregatorState {
                    buffer: Vec::new(),
                    next_sequence: 0,
                    dispatch: Some(dispatch),
                }),
            }),
        }
    }

    pub fn channel(&self) -> &str {
        &self.inner.channel
    }

    pub fn max_row_limit(&self) -> usize {
        self.inner.max_row_limit
    }

    pub async fn push(&self, datapoint: Datapoint) -> Result<PushOutcome, PipelineError> {
        let mut state = self.inner.state.lock().await;
        if state.dispatch.is_none() {
            return Err(PipelineError::Closed(self.inner.channel.clone()));
        }
        state.buffer.push(datapoint);
        if state.buffer.len() < self.inner.max_row_limit {
            return Ok(PushOutcome::Buffered {
                buffered: state.buffer.len(),
            });
        }
        let (sequence, size) = self.emit_locked(&mut state).await?;
        Ok(PushOutcome::Emitted { sequence, size })
    }

    /// 切出当前未满批次；缓冲为空时返回 None。
    pub async fn flush(&self) -> Result<Option<(u64, usize)>, PipelineError> {
        let mut state = self.inner.state.lock().await;
        if state.buffer.is_empty() || state.dispatch.is_none() {
            return Ok(None);
        }
        self.emit_locked(&mut state).await.map(Some)
    }

    pub async fn buffered(&self) -> usize {
        self.inner.state.lock().await.buffer.len()
    }

    /// 切出剩余数据并关闭投递队列；之后的 push 返回 `Closed`。
    pub async fn close(&self) -> Result<(), PipelineError> {
        let mut state = self.inner.state.lock().await;
        if state.dispatch.is_none() {
            return Ok(());
        }
        let flushed = if state.buffer.is_empty() {
            Ok(())
        } else {
            self.emit_locked(&mut state).await.map(|_| ())
        };
        state.dispatch = None;
        flushed
    }

    /// 先占到队列位置再切批：等待期间被取消时缓冲保持原样。
    async fn emit_locked(&self, state: &mut AggregatorState) -> Result<(u64, usize), PipelineError> {
        let Some(dispatch) = state.dispatch.clone() else {
            return Err(PipelineError::Closed(self.inner.channel.clone()));
        };
        let permit = match dispatch.reserve().await {
            Ok(permit) => permit,
            Err(_) => {
                ts_telemetry::record_delivery_failure();
                warn!(
                    target: "ts.pipeline",
                    channel = %self.inner.channel,
                    buffered = state.buffer.len(),
                    "dispatch_queue_closed"
                );
                return Err(PipelineError::Closed(self.inner.channel.clone()));
            }
        };

        let datapoints = if state.buffer.len() > self.inner.max_row_limit {
            let rest = state.buffer.split_off(self.inner.max_row_limit);
            std::mem::replace(&mut state.buffer, rest)
        } else {
            std::mem::take(&mut state.buffer)
        };
        let sequence = state.next_sequence;
        state.next_sequence = state.next_sequence.saturating_add(1);
        let size = datapoints.len();

        permit.send(Batch {
            channel: self.inner.channel.clone(),
            sequence,
            datapoints,
        });

        ts_telemetry::record_batch_emitted();
        debug!(
            target: "ts.pipeline",
            channel = %self.inner.channel,
            sequence,
            size,
            "batch_emitted"
        );
        Ok((sequence, size))
    }
}
