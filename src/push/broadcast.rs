use crate::error::NotFoundError;
use crate::ports;
use crate::push::delivery::DeliveryEngine;
use crate::registry::SubscriptionRegistry;
use crate::types::delivery::{BroadcastStatus, DeliveryOutcome, DeliveryResult};
use crate::types::notification::NotificationPayload;
use crate::types::subscription::Subscription;

use futures_util::StreamExt;
use futures_util::stream;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Per-subscriber results of one broadcast, one entry per subscriber in the
/// snapshot the broadcast started from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    results: BTreeMap<String, BroadcastStatus>,
}

impl BroadcastReport {
    pub fn get(&self, subscriber_id: &str) -> Option<BroadcastStatus> {
        self.results.get(subscriber_id).copied()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn succeeded(&self) -> usize {
        self.results
            .values()
            .filter(|status| **status == BroadcastStatus::Success)
            .count()
    }

    pub fn failed(&self) -> usize {
        self.len() - self.succeeded()
    }
}

/// Fans one notification out to every registered subscription.
pub struct BroadcastCoordinator<S, T> {
    registry: Arc<SubscriptionRegistry>,
    engine: DeliveryEngine<S, T>,
    concurrency: usize,
}

impl<S, T> BroadcastCoordinator<S, T>
where
    S: ports::PushSender,
    T: ports::TimeProvider,
{
    pub fn new(
        registry: Arc<SubscriptionRegistry>,
        engine: DeliveryEngine<S, T>,
        concurrency: usize,
    ) -> Self {
        Self {
            registry,
            engine,
            concurrency: concurrency.max(1),
        }
    }

    pub fn registry(&self) -> &Arc<SubscriptionRegistry> {
        &self.registry
    }

    /// Delivers `payload` to a snapshot of the registry, at most
    /// `concurrency` deliveries at a time. Gone subscribers are removed from
    /// the registry before their result is recorded, unless they registered a
    /// new subscription while the delivery was in flight.
    pub async fn broadcast(&self, payload: &NotificationPayload) -> BroadcastReport {
        let targets = self.registry.list();
        if targets.is_empty() {
            return BroadcastReport::default();
        }

        let deliveries: Vec<_> = targets
            .into_iter()
            .map(|(subscriber_id, subscription)| {
                self.deliver(subscriber_id, subscription, payload)
            })
            .collect();
        let outcomes: Vec<DeliveryOutcome> = stream::iter(deliveries)
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let results = outcomes
            .into_iter()
            .map(|outcome| (outcome.subscriber_id, BroadcastStatus::from(outcome.result)))
            .collect();
        BroadcastReport { results }
    }

    /// Delivers `payload` to a single registered subscriber.
    pub async fn deliver_to(
        &self,
        subscriber_id: &str,
        payload: &NotificationPayload,
    ) -> Result<DeliveryOutcome, NotFoundError> {
        let subscription = self
            .registry
            .get(subscriber_id)
            .ok_or_else(|| NotFoundError::Subscriber(subscriber_id.to_string()))?;
        Ok(self
            .deliver(subscriber_id.to_string(), subscription, payload)
            .await)
    }

    async fn deliver(
        &self,
        subscriber_id: String,
        subscription: Subscription,
        payload: &NotificationPayload,
    ) -> DeliveryOutcome {
        let outcome = match self
            .engine
            .send_one(&subscriber_id, &subscription, payload)
            .await
        {
            Ok(outcome) => outcome,
            Err(err) => {
                error!(
                    subscriber_id = %subscriber_id,
                    error = %err,
                    "registered subscription is invalid"
                );
                DeliveryOutcome {
                    subscriber_id: subscriber_id.clone(),
                    result: DeliveryResult::Failed,
                    status_code: None,
                    error: Some(err.to_string()),
                    timestamp: self.engine.now(),
                }
            }
        };

        if outcome.result == DeliveryResult::Gone
            && self
                .registry
                .remove_if_unchanged(&subscriber_id, &subscription)
        {
            info!(subscriber_id = %subscriber_id, "removed gone push subscription");
        }
        outcome
    }

    /// Runs [`Self::broadcast`] on a background task. Completion is only
    /// visible through the returned handle and the logs.
    pub fn spawn(self: &Arc<Self>, payload: NotificationPayload) -> JoinHandle<BroadcastReport> {
        let coordinator = Arc::clone(self);
        tokio::spawn(async move {
            let report = coordinator.broadcast(&payload).await;
            info!(
                recipients = report.len(),
                succeeded = report.succeeded(),
                failed = report.failed(),
                "broadcast finished"
            );
            report
        })
    }
}
