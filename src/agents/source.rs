//! 后端数据源抽象
//!
//! Agent 只负责协议与过滤，检索交给 EventSource / AlertSource。
//! 内存实现持有静态快照（可从 JSON 文件加载），供测试与本地运行使用。

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use crate::core::SourceError;
use crate::envelope::{AlertRecord, CityEvent, RequestEnvelope};

/// 事件数据源
#[async_trait]
pub trait EventSource: Send + Sync {
    /// 数据源名称（用于日志）
    fn name(&self) -> &str;

    /// 拉取候选事件；过滤由 Agent 完成，数据源可借助 request 做粗筛
    async fn fetch_events(&self, request: &RequestEnvelope) -> Result<Vec<CityEvent>, SourceError>;
}

/// 预警数据源
#[async_trait]
pub trait AlertSource: Send + Sync {
    fn name(&self) -> &str;

    async fn fetch_alerts(&self, request: &RequestEnvelope) -> Result<Vec<AlertRecord>, SourceError>;
}

fn read_json_array<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Vec<T>, SourceError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| SourceError::Io(format!("{}: {}", path.display(), e)))?;
    serde_json::from_str(&raw)
        .map_err(|e| SourceError::Malformed(format!("{}: {}", path.display(), e)))
}

/// 内存事件源：返回快照副本
#[derive(Debug, Default, Clone)]
pub struct InMemoryEventSource {
    events: Arc<Vec<CityEvent>>,
}

impl InMemoryEventSource {
    pub fn new(events: Vec<CityEvent>) -> Self {
        Self {
            events: Arc::new(events),
        }
    }

    /// 从 JSON 数组文件加载快照
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        read_json_array(path.as_ref()).map(Self::new)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[async_trait]
impl EventSource for InMemoryEventSource {
    fn name(&self) -> &str {
        "in_memory_events"
    }

    async fn fetch_events(&self, _request: &RequestEnvelope) -> Result<Vec<CityEvent>, SourceError> {
        Ok(self.events.as_ref().clone())
    }
}

/// 内存预警源
#[derive(Debug, Default, Clone)]
pub struct InMemoryAlertSource {
    alerts: Arc<Vec<AlertRecord>>,
}

impl InMemoryAlertSource {
    pub fn new(alerts: Vec<AlertRecord>) -> Self {
        Self {
            alerts: Arc::new(alerts),
        }
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        read_json_array(path.as_ref()).map(Self::new)
    }

    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }
}

#[async_trait]
impl AlertSource for InMemoryAlertSource {
    fn name(&self) -> &str {
        "in_memory_alerts"
    }

    async fn fetch_alerts(&self, _request: &RequestEnvelope) -> Result<Vec<AlertRecord>, SourceError> {
        Ok(self.alerts.as_ref().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_event_snapshot_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"id":"e1","title":"Waterlogging","category":"weather","severity":"HIGH","timestamp":"2026-01-01T00:00:00Z","location":{{"area":"Bellandur"}}}}]"#
        )
        .unwrap();

        let source = InMemoryEventSource::from_json_file(file.path()).unwrap();
        assert_eq!(source.len(), 1);
    }

    #[test]
    fn test_malformed_file_is_reported() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{not json").unwrap();
        let err = InMemoryAlertSource::from_json_file(file.path()).unwrap_err();
        assert!(matches!(err, SourceError::Malformed(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = InMemoryEventSource::from_json_file("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, SourceError::Io(_)));
    }
}
