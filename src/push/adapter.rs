//! Turns a caller's [`NotificationPayload`] into the JSON body a specific
//! push service expects.
//!
//! Everything here is pure: the same payload and platform always produce the
//! same [`WireNotification`].

use crate::error::ValidationError;
use crate::types::notification::{
    AppleNotification, Aps, ApsAlert, NotificationPayload, StandardNotification, WireNotification,
};
use crate::types::subscription::Platform;

use serde_json::{Map, Value};

pub const DEFAULT_TITLE: &str = "StockHub Update";
pub const DEFAULT_BODY: &str = "You have a new notification";
pub const PRODUCT_NAME: &str = "StockHub";
pub const FALLBACK_TITLE: &str = "New Notification";
pub const FALLBACK_BODY: &str = "No payload";
pub const NOTIFICATION_TAG: &str = "stockhub-notification";
pub const VIBRATE_PATTERN: [u32; 3] = [100, 50, 100];
const DEFAULT_URL: &str = "/";

/// Normalises the raw `notification` value of a broadcast request.
///
/// A missing value or a bare string becomes a fallback notification; an
/// object must match [`NotificationPayload`].
pub fn payload_from_raw(raw: Option<Value>) -> Result<NotificationPayload, ValidationError> {
    match raw {
        None | Some(Value::Null) => Ok(NotificationPayload::new(FALLBACK_TITLE, FALLBACK_BODY)),
        Some(Value::String(text)) => Ok(NotificationPayload::new(FALLBACK_TITLE, text)),
        Some(value @ Value::Object(_)) => serde_json::from_value(value)
            .map_err(|err| ValidationError::InvalidNotification(err.to_string())),
        Some(_) => Err(ValidationError::InvalidNotification(
            "expected an object or a string".to_string(),
        )),
    }
}

pub fn adapt(payload: &NotificationPayload, platform: Platform) -> WireNotification {
    match platform {
        Platform::Standard => WireNotification::Standard(standard(payload, DEFAULT_TITLE)),
        Platform::Apple => WireNotification::Apple(apple(payload)),
    }
}

fn standard(payload: &NotificationPayload, default_title: &str) -> StandardNotification {
    StandardNotification {
        title: payload
            .title
            .clone()
            .unwrap_or_else(|| default_title.to_string()),
        body: payload
            .body
            .clone()
            .unwrap_or_else(|| DEFAULT_BODY.to_string()),
        icon: payload.icon.clone(),
        badge: payload.badge.clone(),
        data: payload.data.clone().unwrap_or_else(default_data),
        vibrate: VIBRATE_PATTERN.to_vec(),
        require_interaction: true,
        tag: NOTIFICATION_TAG.to_string(),
        actions: payload.actions.clone().unwrap_or_default(),
        timestamp: payload.timestamp,
    }
}

fn apple(payload: &NotificationPayload) -> AppleNotification {
    let display = standard(payload, PRODUCT_NAME);
    let alert = match payload.title {
        Some(_) => ApsAlert::Titled {
            title: display.title.clone(),
            body: display.body.clone(),
        },
        None => ApsAlert::Body(display.body.clone()),
    };
    AppleNotification {
        display,
        aps: Aps {
            alert,
            badge: 1,
            content_available: 1,
            sound: "default".to_string(),
        },
    }
}

fn default_data() -> Map<String, Value> {
    let mut data = Map::new();
    data.insert("url".to_string(), Value::String(DEFAULT_URL.to_string()));
    data
}
