use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// 时间戳单位。
///
/// 数据点时间戳原样透传给下游，单位通过 `precision` 参数显式声明。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimestampPrecision {
    Nanoseconds,
    Microseconds,
    #[default]
    Milliseconds,
    Seconds,
}

impl TimestampPrecision {
    /// 解析 `ns|n|us|u|ms|s`。
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "ns" | "n" => Some(Self::Nanoseconds),
            "us" | "u" => Some(Self::Microseconds),
            "ms" => Some(Self::Milliseconds),
            "s" => Some(Self::Seconds),
            _ => None,
        }
    }

    /// 下游 `precision` 查询参数的取值。
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Nanoseconds => "ns",
            Self::Microseconds => "u",
            Self::Milliseconds => "ms",
            Self::Seconds => "s",
        }
    }

    /// 当前时间（以本单位计）。
    pub fn now(&self) -> i64 {
        let duration = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        let value = match self {
            Self::Nanoseconds => duration.as_nanos(),
            Self::Microseconds => duration.as_micros(),
            Self::Milliseconds => duration.as_millis(),
            Self::Seconds => u128::from(duration.as_secs()),
        };
        i64::try_from(value).unwrap_or(i64::MAX)
    }
}

impl fmt::Display for TimestampPrecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_aliases() {
        assert_eq!(TimestampPrecision::parse("n"), Some(TimestampPrecision::Nanoseconds));
        assert_eq!(TimestampPrecision::parse("US"), Some(TimestampPrecision::Microseconds));
        assert_eq!(TimestampPrecision::parse("ms"), Some(TimestampPrecision::Milliseconds));
        assert_eq!(TimestampPrecision::parse("h"), None);
    }

    #[test]
    fn now_scales_with_unit() {
        let seconds = TimestampPrecision::Seconds.now();
        let millis = TimestampPrecision::Milliseconds.now();
        assert!(millis / 1000 >= seconds);
    }
}
