//! 请求信封
//!
//! 不可变值对象：字段私有，只能通过 RequestBuilder 构造；
//! 内部扇出时用 derive_sub_request 复制父请求并追加后缀 id（`<id>_<suffix>`），便于日志关联。

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::envelope::{EventCategory, Severity};

fn new_request_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// 请求位置：坐标 / 片区 / 半径均可缺省
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestLocation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius_km: Option<f64>,
}

impl RequestLocation {
    pub fn area(area: impl Into<String>) -> Self {
        Self {
            area: Some(area.into()),
            ..Self::default()
        }
    }

    pub fn point(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude: Some(latitude),
            longitude: Some(longitude),
            ..Self::default()
        }
    }

    pub fn with_radius_km(mut self, radius_km: f64) -> Self {
        self.radius_km = Some(radius_km);
        self
    }

    pub fn coordinates(&self) -> Option<(f64, f64)> {
        Some((self.latitude?, self.longitude?))
    }
}

/// 时间窗口，两端均为可选闭区间
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeWindow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<DateTime<Utc>>,
}

impl TimeWindow {
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start.map_or(true, |s| at >= s) && self.end.map_or(true, |e| at <= e)
    }
}

/// 扩展参数：已知字段显式命名，未知字段原样保留在 extra（Handler 忽略）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestParameters {
    /// 页面标签（chat / events / alerts / dashboard），参与分发
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,
    /// 为真时 Events Agent 不做严重度过滤
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        alias = "include_all_severities"
    )]
    pub include_all_severities: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "session_id")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "user_id")]
    pub user_id: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl RequestParameters {
    pub fn include_all_severities(&self) -> bool {
        self.include_all_severities.unwrap_or(false)
    }

    pub fn page(&self) -> Option<&str> {
        self.page.as_deref().map(str::trim).filter(|p| !p.is_empty())
    }
}

/// 请求信封
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestEnvelope {
    #[serde(default = "new_request_id")]
    request_id: String,
    request_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    location: Option<RequestLocation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    category: Option<EventCategory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    severity_filter: Option<Severity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    time_window: Option<TimeWindow>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    max_results: Option<usize>,
    #[serde(default)]
    parameters: RequestParameters,
    #[serde(default = "Utc::now")]
    created_at: DateTime<Utc>,
}

impl RequestEnvelope {
    pub fn builder(request_type: impl Into<String>) -> RequestBuilder {
        RequestBuilder::new(request_type)
    }

    /// 派生子请求：复制当前请求，id 变为 `<id>_<suffix>`，请求类型替换；父请求不变
    pub fn derive_sub_request(
        &self,
        suffix: &str,
        request_type: impl Into<String>,
    ) -> RequestBuilder {
        let mut inner = self.clone();
        inner.request_id = format!("{}_{}", self.request_id, suffix);
        inner.request_type = request_type.into();
        inner.created_at = Utc::now();
        RequestBuilder { inner }
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn request_type(&self) -> &str {
        &self.request_type
    }

    /// 去除首尾空白后的非空查询
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref().map(str::trim).filter(|q| !q.is_empty())
    }

    pub fn location(&self) -> Option<&RequestLocation> {
        self.location.as_ref()
    }

    pub fn area(&self) -> Option<&str> {
        self.location
            .as_ref()
            .and_then(|l| l.area.as_deref())
            .map(str::trim)
            .filter(|a| !a.is_empty())
    }

    pub fn coordinates(&self) -> Option<(f64, f64)> {
        self.location.as_ref().and_then(RequestLocation::coordinates)
    }

    pub fn radius_km(&self) -> Option<f64> {
        self.location
            .as_ref()
            .and_then(|l| l.radius_km)
            .filter(|r| *r > 0.0)
    }

    pub fn category(&self) -> Option<EventCategory> {
        self.category
    }

    pub fn severity_filter(&self) -> Option<Severity> {
        self.severity_filter
    }

    pub fn time_window(&self) -> Option<&TimeWindow> {
        self.time_window.as_ref()
    }

    pub fn max_results(&self) -> Option<usize> {
        self.max_results
    }

    pub fn parameters(&self) -> &RequestParameters {
        &self.parameters
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// 请求构建器：build 后得到不可变 RequestEnvelope
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    inner: RequestEnvelope,
}

impl RequestBuilder {
    pub fn new(request_type: impl Into<String>) -> Self {
        Self {
            inner: RequestEnvelope {
                request_id: new_request_id(),
                request_type: request_type.into(),
                query: None,
                location: None,
                category: None,
                severity_filter: None,
                time_window: None,
                max_results: None,
                parameters: RequestParameters::default(),
                created_at: Utc::now(),
            },
        }
    }

    pub fn request_id(mut self, request_id: impl Into<String>) -> Self {
        self.inner.request_id = request_id.into();
        self
    }

    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.inner.query = Some(query.into());
        self
    }

    pub fn location(mut self, location: RequestLocation) -> Self {
        self.inner.location = Some(location);
        self
    }

    /// 只设置片区，保留已有坐标与半径
    pub fn area(mut self, area: impl Into<String>) -> Self {
        self.inner
            .location
            .get_or_insert_with(RequestLocation::default)
            .area = Some(area.into());
        self
    }

    pub fn category(mut self, category: EventCategory) -> Self {
        self.inner.category = Some(category);
        self
    }

    pub fn severity_filter(mut self, severity: Severity) -> Self {
        self.inner.severity_filter = Some(severity);
        self
    }

    pub fn time_window(mut self, window: TimeWindow) -> Self {
        self.inner.time_window = Some(window);
        self
    }

    pub fn max_results(mut self, max_results: usize) -> Self {
        self.inner.max_results = Some(max_results);
        self
    }

    pub fn parameters(mut self, parameters: RequestParameters) -> Self {
        self.inner.parameters = parameters;
        self
    }

    pub fn page(mut self, page: impl Into<String>) -> Self {
        self.inner.parameters.page = Some(page.into());
        self
    }

    pub fn include_all_severities(mut self, include: bool) -> Self {
        self.inner.parameters.include_all_severities = Some(include);
        self
    }

    pub fn session_id(mut self, session_id: impl Into<String>) -> Self {
        self.inner.parameters.session_id = Some(session_id.into());
        self
    }

    pub fn user_id(mut self, user_id: impl Into<String>) -> Self {
        self.inner.parameters.user_id = Some(user_id.into());
        self
    }

    pub fn build(self) -> RequestEnvelope {
        self.inner
    }
}
