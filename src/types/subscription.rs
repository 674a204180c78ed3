use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A browser push subscription in the shape produced by
/// `PushSubscription.toJSON()`.
///
/// Missing fields deserialize as empty strings so that [`Subscription::validate`]
/// can report exactly what is absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    #[serde(default)]
    pub endpoint: String,
    #[serde(default)]
    pub keys: SubscriptionKeys,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionKeys {
    #[serde(default)]
    pub p256dh: String,
    #[serde(default)]
    pub auth: String,
}

impl Subscription {
    pub fn new(
        endpoint: impl Into<String>,
        p256dh: impl Into<String>,
        auth: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            keys: SubscriptionKeys {
                p256dh: p256dh.into(),
                auth: auth.into(),
            },
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.endpoint.trim().is_empty() {
            return Err(ValidationError::MissingEndpoint);
        }
        if self.keys.p256dh.trim().is_empty() || self.keys.auth.trim().is_empty() {
            return Err(ValidationError::MissingKeys);
        }
        Ok(())
    }
}

/// Push-service family of an endpoint. Only selects the wire payload shape
/// and request parameters; never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Standard,
    Apple,
}
