//! 时序数据点领域模型与 line protocol 转义规则。

pub mod data;
mod escape;
mod precision;

pub use data::{DEFAULT_MEASUREMENT, Datapoint, DatapointError, FieldValue, encode_value};
pub use escape::{escape, unescape};
pub use precision::TimestampPrecision;
