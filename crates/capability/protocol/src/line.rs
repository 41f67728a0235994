//! Line protocol 行编码
//!
//! ```text
//! measurement[,tag_key=tag_value]* field_key=field_value[,field_key=field_value]* timestamp
//! ```

use crate::error::EncodeError;
use domain::{Datapoint, DatapointError, encode_value, escape};

/// 编码单个数据点为一行（不含换行符）。
pub fn encode_line(datapoint: &Datapoint) -> Result<String, DatapointError> {
    let mut line = String::with_capacity(64);
    write_line(&mut line, datapoint)?;
    Ok(line)
}

/// 编码整个批次，行之间以 `\n` 分隔，末尾无换行。
///
/// 任一数据点不合法时整个批次放弃编码，不产生部分结果。
pub fn encode_batch(batch: &[Datapoint]) -> Result<String, EncodeError> {
    let mut payload = String::with_capacity(batch.len() * 64);
    for (index, datapoint) in batch.iter().enumerate() {
        if index > 0 {
            payload.push('\n');
        }
        write_line(&mut payload, datapoint)
            .map_err(|source| EncodeError::InvalidDatapoint { index, source })?;
    }
    Ok(payload)
}

fn write_line(out: &mut String, datapoint: &Datapoint) -> Result<(), DatapointError> {
    datapoint.validate()?;

    out.push_str(&escape(datapoint.name()));
    for (key, value) in datapoint.tags() {
        out.push(',');
        out.push_str(&escape(key));
        out.push('=');
        out.push_str(&escape(value));
    }

    out.push(' ');
    for (index, (key, value)) in datapoint.values().iter().enumerate() {
        if index > 0 {
            out.push(',');
        }
        out.push_str(&escape(key));
        out.push('=');
        out.push_str(&encode_value(value));
    }

    out.push(' ');
    out.push_str(&datapoint.timestamp().to_string());
    Ok(())
}
