//! 采集端客户端：把数据点以 JSON POST 到采集网关。

use api_contract::DatapointPayload;
use domain::{Datapoint, DatapointError};
use reqwest::{Client, StatusCode, Url};
use tokio::task::JoinHandle;
use tracing::warn;

/// 客户端错误。
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error(transparent)]
    Datapoint(#[from] DatapointError),
    #[error("invalid target: {0}")]
    Target(String),
    #[error("request failed: {0}")]
    Request(String),
    #[error("collector responded {0}")]
    Status(u16),
}

/// 采集网关客户端。
#[derive(Debug, Clone)]
pub struct TimeSeriesClient {
    client: Client,
    target: Url,
}

impl TimeSeriesClient {
    /// 直接指定完整目标地址。
    pub fn for_target(target: &str) -> Result<Self, ClientError> {
        let target =
            Url::parse(target).map_err(|err| ClientError::Target(format!("{target}: {err}")))?;
        Ok(Self {
            client: Client::new(),
            target,
        })
    }

    /// 目标为 `<base_url>/store/<channel>`。
    pub fn for_channel(base_url: &str, channel: &str) -> Result<Self, ClientError> {
        let target = format!("{}/store/{}", base_url.trim_end_matches('/'), channel);
        Self::for_target(&target)
    }

    pub fn target(&self) -> &str {
        self.target.as_str()
    }

    /// 校验后在当前运行时后台发送；失败只记录日志。
    pub fn store(&self, datapoint: &Datapoint) -> Result<JoinHandle<()>, ClientError> {
        let body = encode(datapoint)?;
        let client = self.client.clone();
        let target = self.target.clone();
        Ok(tokio::spawn(async move {
            if let Err(err) = post(&client, target.clone(), body).await {
                warn!(target: "ts.client", url = %target, error = %err, "store_failed");
            }
        }))
    }

    /// 发送并等待网关响应。
    pub async fn send(&self, datapoint: &Datapoint) -> Result<StatusCode, ClientError> {
        let body = encode(datapoint)?;
        post(&self.client, self.target.clone(), body).await
    }
}

fn encode(datapoint: &Datapoint) -> Result<String, ClientError> {
    datapoint.validate()?;
    serde_json::to_string(&DatapointPayload::from(datapoint))
        .map_err(|err| ClientError::Request(err.to_string()))
}

async fn post(client: &Client, target: Url, body: String) -> Result<StatusCode, ClientError> {
    let response = client
        .post(target)
        .header(reqwest::header::CONTENT_TYPE, "application/json")
        .body(body)
        .send()
        .await
        .map_err(|err| ClientError::Request(err.to_string()))?;
    let status = response.status();
    if status.as_u16() >= 400 {
        return Err(ClientError::Status(status.as_u16()));
    }
    Ok(status)
}
