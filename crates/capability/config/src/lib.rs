//! 应用运行配置加载。
//!
//! 两种来源：`TS_*` 环境变量，或启动参数指定的 JSON 配置文件。

use domain::TimestampPrecision;
use serde::Deserialize;
use std::env;
use std::path::Path;

/// 配置加载错误。
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required env: {0}")]
    Missing(String),
    #[error("invalid value for {0}: {1}")]
    Invalid(String, String),
    #[error("read config file {0}: {1}")]
    Io(String, String),
    #[error("parse config file {0}: {1}")]
    Parse(String, String),
}

/// 应用运行配置。
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub http_addr: String,
    /// 已注册通道（下游数据库名）
    pub channels: Vec<String>,
    pub channel_path_prefix: String,
    pub influx_url: String,
    pub influx_write_path: String,
    pub influx_timeout_ms: u64,
    pub influx_tls_insecure: bool,
    pub timestamp_precision: TimestampPrecision,
    pub max_row_limit: usize,
    pub flush_interval_ms: Option<u64>,
    pub dispatch_queue_capacity: usize,
    pub max_in_flight_writes: usize,
}

impl AppConfig {
    /// 从环境变量读取配置。
    pub fn from_env() -> Result<Self, ConfigError> {
        let channels = env::var("TS_CHANNELS")
            .map(|value| split_channels(&value))
            .map_err(|_| ConfigError::Missing("TS_CHANNELS".to_string()))?;
        if channels.is_empty() {
            return Err(ConfigError::Missing("TS_CHANNELS".to_string()));
        }
        let http_addr = env::var("TS_HTTP_ADDR").unwrap_or_else(|_| "0.0.0.0:4040".to_string());
        let channel_path_prefix = normalize_prefix(
            &env::var("TS_CHANNEL_PATH_PREFIX").unwrap_or_else(|_| "/store".to_string()),
        );
        let influx_url =
            env::var("TS_INFLUX_URL").unwrap_or_else(|_| "http://127.0.0.1:8086".to_string());
        let influx_write_path =
            env::var("TS_INFLUX_WRITE_PATH").unwrap_or_else(|_| "/write".to_string());
        let influx_timeout_ms = read_u64_with_default("TS_INFLUX_TIMEOUT_MS", 10_000)?;
        let influx_tls_insecure = read_bool_with_default("TS_INFLUX_TLS_INSECURE", false);
        let timestamp_precision = match read_optional("TS_TIMESTAMP_PRECISION") {
            Some(value) => parse_precision("TS_TIMESTAMP_PRECISION", &value)?,
            None => TimestampPrecision::default(),
        };
        let max_row_limit = read_usize_with_default("TS_MAX_ROW_LIMIT", 10_000)?;
        let flush_interval_ms =
            read_optional_u64("TS_FLUSH_INTERVAL_MS")?.filter(|value| *value > 0);
        let dispatch_queue_capacity = read_usize_with_default("TS_DISPATCH_QUEUE_CAPACITY", 16)?;
        let max_in_flight_writes = read_usize_with_default("TS_MAX_IN_FLIGHT_WRITES", 64)?;

        Ok(Self {
            http_addr,
            channels,
            channel_path_prefix,
            influx_url,
            influx_write_path,
            influx_timeout_ms,
            influx_tls_insecure,
            timestamp_precision,
            max_row_limit,
            flush_interval_ms,
            dispatch_queue_capacity,
            max_in_flight_writes,
        })
    }

    /// 从 JSON 配置文件读取。
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let raw = std::fs::read_to_string(path)
            .map_err(|err| ConfigError::Io(display.clone(), err.to_string()))?;
        Self::from_json_str(&raw).map_err(|err| match err {
            ConfigError::Parse(_, message) => ConfigError::Parse(display, message),
            other => other,
        })
    }

    /// 解析 JSON 配置文本。
    ///
    /// ```json
    /// {
    ///   "port": 4040,
    ///   "dbnames": ["metrics"],
    ///   "maxRowLimit": 10000,
    ///   "defaultHost": "influx.local",
    ///   "defaultPort": 8086,
    ///   "ssl": false,
    ///   "trustAll": false,
    ///   "connectTimeout": 10000
    /// }
    /// ```
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let file: FileConfig = serde_json::from_str(raw)
            .map_err(|err| ConfigError::Parse("<inline>".to_string(), err.to_string()))?;

        let channels = file
            .dbnames
            .iter()
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .collect::<Vec<_>>();
        if channels.is_empty() {
            return Err(ConfigError::Missing("dbnames".to_string()));
        }

        let timestamp_precision = match file.precision.as_deref() {
            Some(value) => parse_precision("precision", value)?,
            None => TimestampPrecision::default(),
        };
        let scheme = if file.ssl { "https" } else { "http" };

        Ok(Self {
            http_addr: format!("{}:{}", file.host, file.port),
            channels,
            channel_path_prefix: normalize_prefix(&file.path_prefix),
            influx_url: format!("{scheme}://{}:{}", file.default_host, file.default_port),
            influx_write_path: file.write_path,
            influx_timeout_ms: file.connect_timeout,
            influx_tls_insecure: file.trust_all,
            timestamp_precision,
            max_row_limit: file.max_row_limit,
            flush_interval_ms: file.flush_interval_ms.filter(|value| *value > 0),
            dispatch_queue_capacity: file.dispatch_queue_capacity,
            max_in_flight_writes: file.max_in_flight_writes,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileConfig {
    #[serde(default = "default_host")]
    host: String,
    #[serde(default = "default_port")]
    port: u16,
    #[serde(default)]
    dbnames: Vec<String>,
    #[serde(default = "default_path_prefix")]
    path_prefix: String,
    #[serde(default = "default_influx_host")]
    default_host: String,
    #[serde(default = "default_influx_port")]
    default_port: u16,
    #[serde(default)]
    ssl: bool,
    #[serde(default)]
    trust_all: bool,
    #[serde(default = "default_timeout_ms")]
    connect_timeout: u64,
    #[serde(default = "default_write_path")]
    write_path: String,
    #[serde(default)]
    precision: Option<String>,
    #[serde(default = "default_max_row_limit")]
    max_row_limit: usize,
    #[serde(default)]
    flush_interval_ms: Option<u64>,
    #[serde(default = "default_dispatch_queue_capacity")]
    dispatch_queue_capacity: usize,
    #[serde(default = "default_max_in_flight_writes")]
    max_in_flight_writes: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    4040
}

fn default_path_prefix() -> String {
    "/store".to_string()
}

fn default_influx_host() -> String {
    "127.0.0.1".to_string()
}

fn default_influx_port() -> u16 {
    8086
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_write_path() -> String {
    "/write".to_string()
}

fn default_max_row_limit() -> usize {
    10_000
}

fn default_dispatch_queue_capacity() -> usize {
    16
}

fn default_max_in_flight_writes() -> usize {
    64
}

fn split_channels(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// `/store/` → `/store`，`store` → `/store`。
fn normalize_prefix(value: &str) -> String {
    let trimmed = value.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}

fn parse_precision(key: &str, value: &str) -> Result<TimestampPrecision, ConfigError> {
    TimestampPrecision::parse(value)
        .ok_or_else(|| ConfigError::Invalid(key.to_string(), value.to_string()))
}

fn read_u64_with_default(key: &str, default: u64) -> Result<u64, ConfigError> {
    let value = match env::var(key) {
        Ok(value) => value,
        Err(_) => return Ok(default),
    };
    value
        .parse::<u64>()
        .map_err(|_| ConfigError::Invalid(key.to_string(), value))
}

fn read_usize_with_default(key: &str, default: usize) -> Result<usize, ConfigError> {
    let value = match env::var(key) {
        Ok(value) => value,
        Err(_) => return Ok(default),
    };
    value
        .parse::<usize>()
        .map_err(|_| ConfigError::Invalid(key.to_string(), value))
}

fn read_optional(key: &str) -> Option<String> {
    match env::var(key) {
        Ok(value) if !value.is_empty() => Some(value),
        _ => None,
    }
}

fn read_optional_u64(key: &str) -> Result<Option<u64>, ConfigError> {
    match env::var(key) {
        Ok(value) if value.is_empty() => Ok(None),
        Ok(value) => value
            .parse::<u64>()
            .map(Some)
            .map_err(|_| ConfigError::Invalid(key.to_string(), value)),
        Err(_) => Ok(None),
    }
}

fn read_bool_with_default(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(value) => matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "on"),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_is_normalized() {
        assert_eq!(normalize_prefix("/store/"), "/store");
        assert_eq!(normalize_prefix("store"), "/store");
        assert_eq!(normalize_prefix("/"), "");
    }

    #[test]
    fn channel_list_skips_blanks() {
        assert_eq!(split_channels(" a, ,b,"), vec!["a".to_string(), "b".to_string()]);
    }
}
