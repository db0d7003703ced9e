//! 预警记录（Alert Agent 产出）
//!
//! 预警结构随部门 / 来源变化，故以 JSON 对象承载，只对常用字段提供访问器。

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::envelope::Severity;

/// 宽松的预警记录：透明序列化为 JSON 对象
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlertRecord(Map<String, Value>);

impl AlertRecord {
    pub fn new(title: impl Into<String>, severity: impl Into<String>) -> Self {
        Self::default()
            .with_field("title", Value::String(title.into()))
            .with_field("severity", Value::String(severity.into()))
    }

    pub fn from_map(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.0.insert(key.into(), value);
        self
    }

    pub fn with_area(self, area: impl Into<String>) -> Self {
        self.with_field("area", Value::String(area.into()))
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    fn str_field(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub fn title(&self) -> &str {
        self.str_field("title").unwrap_or("Untitled alert")
    }

    /// 原始严重度文本（不同部门写法不一，如 HIGH / high / medium）
    pub fn severity_label(&self) -> Option<&str> {
        self.str_field("severity")
    }

    pub fn severity(&self) -> Option<Severity> {
        self.severity_label().and_then(Severity::parse)
    }

    /// 片区；缺省表示全城范围
    pub fn area(&self) -> Option<&str> {
        self.str_field("area")
    }

    pub fn department(&self) -> Option<&str> {
        self.str_field("department")
    }
}
