use crate::models::{CameraGroup, CameraId};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Fixed event type stamped on every audit event emitted by this service
pub const AUDIT_EVENT_TYPE: &str = "Push RTSPULR into Queue by API";

/// Message published to the framer fanout exchange, one per camera group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FramerMessage {
    pub camera_ids: Vec<CameraId>,
    pub camera_urls: Vec<String>,
    pub running: bool,
    pub user_id: String,
    pub events: Map<String, Value>,
    pub event_rules: Option<Map<String, Value>>,
}

impl From<&CameraGroup> for FramerMessage {
    fn from(group: &CameraGroup) -> Self {
        Self {
            camera_ids: group.camera_ids.clone(),
            camera_urls: group.urls.clone(),
            running: group.running,
            user_id: group.user_id.clone(),
            events: group.events.clone(),
            event_rules: group.event_rules.clone(),
        }
    }
}

/// Audit log levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Info,
    Exception,
}

/// Event written to the audit queue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub log_level: LogLevel,
    pub event_type: String,
    pub message: String,
    /// Local time, `%Y-%m-%d %H:%M:%S`
    pub timestamp: String,
}

impl AuditEvent {
    pub fn new(log_level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            log_level,
            event_type: AUDIT_EVENT_TYPE.to_string(),
            message: message.into(),
            timestamp: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}
