//! 编码错误类型定义

use domain::DatapointError;

/// Line protocol 编码错误
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EncodeError {
    /// 批次中第 `index` 个数据点不可编码，整个批次放弃编码
    #[error("datapoint #{index} in batch: {source}")]
    InvalidDatapoint {
        index: usize,
        #[source]
        source: DatapointError,
    },
}

impl EncodeError {
    /// 出错数据点在批次中的位置。
    pub fn index(&self) -> usize {
        match self {
            EncodeError::InvalidDatapoint { index, .. } => *index,
        }
    }

    /// 底层数据点错误。
    pub fn datapoint_error(&self) -> &DatapointError {
        match self {
            EncodeError::InvalidDatapoint { source, .. } => source,
        }
    }
}
