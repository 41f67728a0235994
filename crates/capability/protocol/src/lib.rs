//! # Line protocol 编码模块
//!
//! 将一个通道的数据点批次编码为下游时序库 `/write` 接口的请求体。
//!
//! ## 报文格式
//!
//! ```text
//! <measurement>[,<tag_key>=<tag_value>...] <field_key>=<field_value>[,<field_key>=<field_value>...] <timestamp>
//! ```
//!
//! - 每个数据点一行，行之间以 `\n` 分隔
//! - 无标签时省略整个标签段
//! - 标签与字段按 key 排序输出
//! - measurement、标签键值、字段键均经过转义；字符串字段值加引号
//! - 时间戳原样输出，单位由写入请求的 `precision` 参数声明
//!
//! ## 使用示例
//!
//! ```rust
//! use domain::Datapoint;
//! use ts_protocol::encode_batch;
//!
//! let batch = vec![
//!     Datapoint::new("m", 1000).with_value("temp", 20),
//!     Datapoint::new("m", 2000).with_tag("host", "a b").with_value("temp", 21),
//! ];
//! let payload = encode_batch(&batch).unwrap();
//! assert_eq!(payload, "m temp=20 1000\nm,host=a\\ b temp=21 2000");
//! ```

mod error;
mod line;

pub use error::EncodeError;
pub use line::{encode_batch, encode_line};
