use crate::escape::{escape, has_line_break};
use std::collections::BTreeMap;
use std::fmt;

/// 未指定名称时使用的默认 measurement。
pub const DEFAULT_MEASUREMENT: &str = "measure";

/// 数据点校验错误。
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DatapointError {
    #[error("incomplete datapoint '{name}': at least one value is required")]
    IncompleteDatapoint { name: String },
    #[error("datapoint name must not be empty")]
    MissingName,
    #[error("datapoint '{name}' has a non-finite value for field '{field}'")]
    NonFiniteValue { name: String, field: String },
    #[error("datapoint '{name}' contains a line break in {part}")]
    LineBreak { name: String, part: String },
}

/// 字段值的数据类型。
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Integer(i64),
    Float(f64),
    Boolean(bool),
    String(String),
}

impl FieldValue {
    fn is_finite(&self) -> bool {
        match self {
            FieldValue::Float(v) => v.is_finite(),
            _ => true,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&encode_value(self))
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Integer(i64::from(value))
    }
}

impl From<u32> for FieldValue {
    fn from(value: u32) -> Self {
        FieldValue::Integer(i64::from(value))
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

impl From<f32> for FieldValue {
    fn from(value: f32) -> Self {
        FieldValue::Float(f64::from(value))
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Boolean(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::String(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::String(value)
    }
}

/// 字段值的文本形式：数值与布尔值按字面输出，字符串加引号并转义。
pub fn encode_value(value: &FieldValue) -> String {
    match value {
        FieldValue::Integer(v) => v.to_string(),
        FieldValue::Float(v) => v.to_string(),
        FieldValue::Boolean(v) => v.to_string(),
        FieldValue::String(v) => format!("\"{}\"", escape(v)),
    }
}

/// 某一时刻的单个数据点，可带多个值与多个标签。
///
/// 标签与字段按 key 排序存储，编码顺序因此是确定的。
/// 交给流水线后不再修改，只会被编码进一个批次。
#[derive(Debug, Clone, PartialEq)]
pub struct Datapoint {
    name: String,
    timestamp: i64,
    tags: BTreeMap<String, String>,
    values: BTreeMap<String, FieldValue>,
}

impl Datapoint {
    /// 为指定 measurement 与时间戳创建数据点。
    pub fn new(name: impl Into<String>, timestamp: i64) -> Self {
        Self {
            name: name.into(),
            timestamp,
            tags: BTreeMap::new(),
            values: BTreeMap::new(),
        }
    }

    /// 使用默认 measurement（`measure`）创建数据点。
    pub fn measure(timestamp: i64) -> Self {
        Self::new(DEFAULT_MEASUREMENT, timestamp)
    }

    /// 添加标签，例如 host、stage。同名标签会被覆盖。
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// 添加值。至少需要一个值，否则数据点不完整。
    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn tags(&self) -> &BTreeMap<String, String> {
        &self.tags
    }

    pub fn values(&self) -> &BTreeMap<String, FieldValue> {
        &self.values
    }

    /// 校验数据点是否可编码。
    pub fn validate(&self) -> Result<(), DatapointError> {
        if self.name.is_empty() {
            return Err(DatapointError::MissingName);
        }
        if self.values.is_empty() {
            return Err(DatapointError::IncompleteDatapoint {
                name: self.name.clone(),
            });
        }
        if let Some((field, _)) = self.values.iter().find(|(_, value)| !value.is_finite()) {
            return Err(DatapointError::NonFiniteValue {
                name: self.name.clone(),
                field: field.clone(),
            });
        }
        if let Some(part) = self.line_break_part() {
            return Err(DatapointError::LineBreak {
                name: self.name.clone(),
                part,
            });
        }
        Ok(())
    }

    fn line_break_part(&self) -> Option<String> {
        if has_line_break(&self.name) {
            return Some("name".to_string());
        }
        for (key, value) in &self.tags {
            if has_line_break(key) || has_line_break(value) {
                return Some(format!("tag '{}'", key.escape_debug()));
            }
        }
        for (key, value) in &self.values {
            let in_value = matches!(value, FieldValue::String(text) if has_line_break(text));
            if has_line_break(key) || in_value {
                return Some(format!("field '{}'", key.escape_debug()));
            }
        }
        None
    }
}
