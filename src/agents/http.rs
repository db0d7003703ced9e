//! HTTP 数据源：GET 配置的 URL，期望返回 JSON 数组
//!
//! 请求带超时与 User-Agent；片区 / 坐标作为查询参数透传给后端做粗筛。

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::agents::{AlertSource, EventSource};
use crate::core::SourceError;
use crate::envelope::{AlertRecord, CityEvent, RequestEnvelope};

const USER_AGENT: &str = concat!("beacon/", env!("CARGO_PKG_VERSION"));

/// TLS 后端初始化失败时 build 会出错，直接交给调用方处理
fn build_client(timeout_secs: u64) -> Result<Client, SourceError> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs.max(1)))
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| SourceError::Http(format!("failed to build HTTP client: {e}")))
}

/// 由请求生成查询参数（area / lat / lon / radius_km）
fn query_pairs(request: &RequestEnvelope) -> Vec<(&'static str, String)> {
    let mut pairs = Vec::new();
    if let Some(area) = request.area() {
        pairs.push(("area", area.to_string()));
    }
    if let Some((lat, lon)) = request.coordinates() {
        pairs.push(("lat", lat.to_string()));
        pairs.push(("lon", lon.to_string()));
    }
    if let Some(radius) = request.radius_km() {
        pairs.push(("radius_km", radius.to_string()));
    }
    pairs
}

async fn get_json_array<T: serde::de::DeserializeOwned>(
    client: &Client,
    url: &str,
    request: &RequestEnvelope,
) -> Result<Vec<T>, SourceError> {
    let response = client
        .get(url)
        .query(&query_pairs(request))
        .header("X-Request-Id", request.request_id())
        .send()
        .await
        .map_err(|e| SourceError::Http(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(SourceError::Unavailable(format!("{url} returned {status}")));
    }

    response
        .json::<Vec<T>>()
        .await
        .map_err(|e| SourceError::Malformed(e.to_string()))
}

/// HTTP 事件源
pub struct HttpEventSource {
    client: Client,
    url: String,
}

impl HttpEventSource {
    pub fn new(url: impl Into<String>, timeout_secs: u64) -> Result<Self, SourceError> {
        Ok(Self {
            client: build_client(timeout_secs)?,
            url: url.into(),
        })
    }
}

#[async_trait]
impl EventSource for HttpEventSource {
    fn name(&self) -> &str {
        &self.url
    }

    async fn fetch_events(&self, request: &RequestEnvelope) -> Result<Vec<CityEvent>, SourceError> {
        get_json_array(&self.client, &self.url, request).await
    }
}

/// HTTP 预警源
pub struct HttpAlertSource {
    client: Client,
    url: String,
}

impl HttpAlertSource {
    pub fn new(url: impl Into<String>, timeout_secs: u64) -> Result<Self, SourceError> {
        Ok(Self {
            client: build_client(timeout_secs)?,
            url: url.into(),
        })
    }
}

#[async_trait]
impl AlertSource for HttpAlertSource {
    fn name(&self) -> &str {
        &self.url
    }

    async fn fetch_alerts(&self, request: &RequestEnvelope) -> Result<Vec<AlertRecord>, SourceError> {
        get_json_array(&self.client, &self.url, request).await
    }
}
