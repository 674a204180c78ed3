use crate::error::{DeliveryError, ValidationError};
use crate::ports;
use crate::push::adapter;
use crate::types::delivery::{DeliveryOptions, DeliveryOutcome, DeliveryResult};
use crate::types::notification::NotificationPayload;
use crate::types::subscription::{Platform, Subscription};

use axum::http::Uri;
use time::OffsetDateTime;
use tracing::{debug, info, warn};

/// Store-and-forward lifetime for Apple endpoints.
pub const APPLE_TTL_SECONDS: u32 = 24 * 60 * 60;
/// Collapses repeated notifications on Apple endpoints into the latest one.
pub const APPLE_TOPIC: &str = "stockhub-update";

/// Infers the push-service family from the endpoint host.
///
/// Apple endpoints live under `*.push.apple.<tld>`; anything else, including
/// an unparsable endpoint, is treated as a standard Web Push service.
pub fn detect_platform(endpoint: &str) -> Platform {
    let Ok(uri) = endpoint.parse::<Uri>() else {
        return Platform::Standard;
    };
    let Some(host) = uri.host() else {
        return Platform::Standard;
    };
    let labels: Vec<String> = host
        .split('.')
        .map(|label| label.to_ascii_lowercase())
        .collect();
    if labels
        .windows(2)
        .any(|pair| pair[0] == "push" && pair[1] == "apple")
    {
        Platform::Apple
    } else {
        Platform::Standard
    }
}

pub fn delivery_options(platform: Platform) -> DeliveryOptions {
    match platform {
        Platform::Standard => DeliveryOptions::default(),
        Platform::Apple => DeliveryOptions {
            ttl: Some(APPLE_TTL_SECONDS),
            high_urgency: true,
            topic: Some(APPLE_TOPIC.to_string()),
        },
    }
}

/// Performs one delivery to one subscription and classifies the result.
#[derive(Debug, Clone)]
pub struct DeliveryEngine<S, T> {
    sender: S,
    time: T,
}

impl<S, T> DeliveryEngine<S, T>
where
    S: ports::PushSender,
    T: ports::TimeProvider,
{
    pub fn new(sender: S, time: T) -> Self {
        Self { sender, time }
    }

    /// Delivery failures never surface as `Err`; they come back as a
    /// `Failed` or `Gone` outcome. `Err` is reserved for a subscription that
    /// should never have been registered.
    ///
    /// A `Gone` outcome obliges the caller to deregister `subscriber_id`.
    pub async fn send_one(
        &self,
        subscriber_id: &str,
        subscription: &Subscription,
        payload: &NotificationPayload,
    ) -> Result<DeliveryOutcome, ValidationError> {
        subscription.validate()?;

        let platform = detect_platform(&subscription.endpoint);
        let wire = adapter::adapt(payload, platform);
        let result = match wire.to_bytes() {
            Ok(body) => {
                let options = delivery_options(platform);
                self.sender.send(subscription, &body, &options).await
            }
            Err(err) => Err(DeliveryError::Encoding(err.to_string())),
        };

        Ok(self.classify(subscriber_id, platform, result))
    }

    pub fn now(&self) -> OffsetDateTime {
        self.time.now()
    }

    fn classify(
        &self,
        subscriber_id: &str,
        platform: Platform,
        result: Result<(), DeliveryError>,
    ) -> DeliveryOutcome {
        let timestamp = self.time.now();
        match result {
            Ok(()) => {
                debug!(subscriber_id, ?platform, "push delivered");
                DeliveryOutcome {
                    subscriber_id: subscriber_id.to_string(),
                    result: DeliveryResult::Success,
                    status_code: None,
                    error: None,
                    timestamp,
                }
            }
            Err(err) => {
                let result = if err.is_gone() {
                    info!(subscriber_id, status = ?err.status(), "push subscription gone");
                    DeliveryResult::Gone
                } else {
                    warn!(subscriber_id, ?platform, error = %err, "push delivery failed");
                    DeliveryResult::Failed
                };
                DeliveryOutcome {
                    subscriber_id: subscriber_id.to_string(),
                    result,
                    status_code: err.status(),
                    error: Some(err.to_string()),
                    timestamp,
                }
            }
        }
    }
}
