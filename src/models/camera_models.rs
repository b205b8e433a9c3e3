use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::fmt::{Display, Formatter};

/// Camera identifier as sent by the management UI, numeric or textual.
///
/// Numbers are kept as JSON numbers so ids beyond `i64` and floats such as
/// `3.0` are forwarded exactly as received.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CameraId {
    Numeric(Number),
    Named(String),
}

impl Display for CameraId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Numeric(id) => write!(f, "{}", id),
            Self::Named(id) => write!(f, "{}", id),
        }
    }
}

/// One camera configuration block of an ingest batch.
///
/// All cameras in `camera_ids` share the stream `urls` and the event
/// configuration; the group is published as a single message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraGroup {
    #[serde(rename = "camera_id")]
    pub camera_ids: Vec<CameraId>,
    #[serde(rename = "url")]
    pub urls: Vec<String>,
    pub events: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_rules: Option<Map<String, Value>>,
    pub running: bool,
    pub user_id: String,
}

impl CameraGroup {
    /// Camera ids rendered as `[1, 2, "lobby"]` for log lines
    pub fn camera_ids_display(&self) -> String {
        let ids: Vec<String> = self.camera_ids.iter().map(|id| id.to_string()).collect();
        format!("[{}]", ids.join(", "))
    }

    pub fn urls_display(&self) -> String {
        format!("[{}]", self.urls.join(", "))
    }
}
