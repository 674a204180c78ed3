use serde::Serialize;
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryResult {
    Success,
    Failed,
    Gone,
}

/// Result of one delivery attempt to one subscriber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryOutcome {
    pub subscriber_id: String,
    pub result: DeliveryResult,
    pub status_code: Option<u16>,
    pub error: Option<String>,
    pub timestamp: OffsetDateTime,
}

/// What a broadcast reports per subscriber. `Gone` collapses into `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BroadcastStatus {
    Success,
    Failed,
}

impl From<DeliveryResult> for BroadcastStatus {
    fn from(result: DeliveryResult) -> Self {
        match result {
            DeliveryResult::Success => BroadcastStatus::Success,
            DeliveryResult::Failed | DeliveryResult::Gone => BroadcastStatus::Failed,
        }
    }
}

/// Per-request push parameters. Unset fields leave the push library's
/// defaults in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryOptions {
    pub ttl: Option<u32>,
    /// Sends `Urgency: high` instead of leaving the header out.
    pub high_urgency: bool,
    /// Value of the `Topic` header; a newer message with the same topic
    /// replaces an undelivered older one.
    pub topic: Option<String>,
}
