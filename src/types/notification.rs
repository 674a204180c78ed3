use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Caller-supplied notification. Display fields are optional here; the
/// payload adapter fills in defaults when building the wire form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub badge: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actions: Option<Vec<NotificationAction>>,
    /// Generation time in milliseconds since the epoch, set by the caller.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,
}

impl NotificationPayload {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            body: Some(body.into()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationAction {
    pub action: String,
    pub title: String,
}

/// Platform-specific JSON body sent to a push service.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum WireNotification {
    Standard(StandardNotification),
    Apple(AppleNotification),
}

impl WireNotification {
    pub fn to_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StandardNotification {
    pub title: String,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub badge: Option<String>,
    pub data: Map<String, Value>,
    pub vibrate: Vec<u32>,
    pub require_interaction: bool,
    pub tag: String,
    pub actions: Vec<NotificationAction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,
}

/// Flat display fields plus the nested `aps` dictionary Apple's web push
/// service expects.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppleNotification {
    #[serde(flatten)]
    pub display: StandardNotification,
    pub aps: Aps,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Aps {
    pub alert: ApsAlert,
    pub badge: u32,
    #[serde(rename = "content-available")]
    pub content_available: u8,
    pub sound: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ApsAlert {
    Titled { title: String, body: String },
    Body(String),
}
