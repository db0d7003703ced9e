//! 城市事件（Events Agent 产出，Handler 只读消费）
//!
//! 严重度有序：Low < Moderate < High < Critical；提供过期、近期与 haversine 距离等派生判断。

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// 地球半径（米），haversine 计算使用
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// 「近期」窗口（天）
pub const RECENT_WINDOW_DAYS: i64 = 7;

/// 严重度（派生 Ord，按声明顺序比较）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[serde(alias = "LOW", alias = "Low")]
    Low,
    #[serde(alias = "MODERATE", alias = "Moderate", alias = "medium", alias = "MEDIUM")]
    Moderate,
    #[serde(alias = "HIGH", alias = "High")]
    High,
    #[serde(alias = "CRITICAL", alias = "Critical")]
    Critical,
}

impl Severity {
    pub const ALL: [Severity; 4] = [
        Severity::Low,
        Severity::Moderate,
        Severity::High,
        Severity::Critical,
    ];

    /// 宽松解析（大小写不敏感，medium 视为 moderate），用于来源不统一的预警记录
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "low" => Some(Severity::Low),
            "moderate" | "medium" => Some(Severity::Moderate),
            "high" => Some(Severity::High),
            "critical" => Some(Severity::Critical),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Moderate => "moderate",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 事件类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    Traffic,
    Weather,
    Infrastructure,
    PublicSafety,
    Civic,
    Cultural,
    Health,
    Utilities,
    Other,
}

impl EventCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventCategory::Traffic => "traffic",
            EventCategory::Weather => "weather",
            EventCategory::Infrastructure => "infrastructure",
            EventCategory::PublicSafety => "public_safety",
            EventCategory::Civic => "civic",
            EventCategory::Cultural => "cultural",
            EventCategory::Health => "health",
            EventCategory::Utilities => "utilities",
            EventCategory::Other => "other",
        }
    }
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 事件来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventSource {
    Official,
    Citizen,
    Social,
    Sensor,
    News,
    #[default]
    System,
}

/// 事件位置：坐标、片区、地址均可缺省
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventLocation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl EventLocation {
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        Some((self.latitude?, self.longitude?))
    }
}

/// 城市事件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CityEvent {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub category: EventCategory,
    pub severity: Severity,
    #[serde(default)]
    pub source: EventSource,
    #[serde(default)]
    pub location: EventLocation,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl CityEvent {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        category: EventCategory,
        severity: Severity,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            category,
            severity,
            source: EventSource::default(),
            location: EventLocation::default(),
            timestamp: Utc::now(),
            expires_at: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_source(mut self, source: EventSource) -> Self {
        self.source = source;
        self
    }

    pub fn with_area(mut self, area: impl Into<String>) -> Self {
        self.location.area = Some(area.into());
        self
    }

    pub fn with_coordinates(mut self, latitude: f64, longitude: f64) -> Self {
        self.location.latitude = Some(latitude);
        self.location.longitude = Some(longitude);
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// expires_at 已设置且早于 now 时为真
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at < now)
    }

    pub fn is_recent(&self) -> bool {
        self.is_recent_at(Utc::now())
    }

    /// timestamp 落在最近 7 天内（未来时间也算近期）
    pub fn is_recent_at(&self, now: DateTime<Utc>) -> bool {
        now - self.timestamp <= Duration::days(RECENT_WINDOW_DAYS)
    }

    /// 到给定坐标的大圆距离（米）；事件无坐标时返回 None
    pub fn distance_from_meters(&self, latitude: f64, longitude: f64) -> Option<f64> {
        let (lat, lon) = self.location.coordinates()?;
        Some(haversine_meters(lat, lon, latitude, longitude))
    }
}

/// haversine 大圆距离（米）
pub fn haversine_meters(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    // 近对跖点时浮点误差可能让 a 略大于 1
    let a = ((d_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2))
    .clamp(0.0, 1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_M * c
}
