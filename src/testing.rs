//! Fakes for the push ports, shared by unit and router tests.

use crate::error::DeliveryError;
use crate::ports;
use crate::types::delivery::DeliveryOptions;
use crate::types::subscription::Subscription;

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use time::OffsetDateTime;
use tokio::sync::Notify;

#[derive(Debug, Clone)]
pub(crate) struct SentPush {
    pub(crate) endpoint: String,
    pub(crate) payload: serde_json::Value,
    pub(crate) options: DeliveryOptions,
}

/// Records every send and fails the endpoints it was told to fail.
#[derive(Clone, Default)]
pub(crate) struct RecordingSender {
    sent: Arc<Mutex<Vec<SentPush>>>,
    failures: Arc<Mutex<HashMap<String, DeliveryError>>>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
    notify: Arc<Notify>,
}

impl RecordingSender {
    pub(crate) fn fail_endpoint(&self, endpoint: &str, error: DeliveryError) {
        self.failures
            .lock()
            .expect("failures lock")
            .insert(endpoint.to_string(), error);
    }

    pub(crate) fn sent(&self) -> Vec<SentPush> {
        self.sent.lock().expect("sent lock").clone()
    }

    pub(crate) fn sent_to(&self, endpoint: &str) -> Option<SentPush> {
        self.sent()
            .into_iter()
            .find(|push| push.endpoint == endpoint)
    }

    pub(crate) fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub(crate) async fn wait_for_sends(&self, count: usize) {
        let wait = async {
            loop {
                let notified = self.notify.notified();
                if self.sent.lock().expect("sent lock").len() >= count {
                    return;
                }
                notified.await;
            }
        };
        tokio::time::timeout(Duration::from_secs(5), wait)
            .await
            .expect("timed out waiting for sends");
    }
}

impl ports::PushSender for RecordingSender {
    type Fut<'a>
        = Pin<Box<dyn Future<Output = Result<(), DeliveryError>> + Send + 'a>>
    where
        Self: 'a;

    fn send<'a>(
        &'a self,
        subscription: &'a Subscription,
        payload: &'a [u8],
        options: &'a DeliveryOptions,
    ) -> Self::Fut<'a> {
        Box::pin(async move {
            let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(current, Ordering::SeqCst);
            tokio::task::yield_now().await;

            let payload = serde_json::from_slice(payload).expect("payload is json");
            self.sent.lock().expect("sent lock").push(SentPush {
                endpoint: subscription.endpoint.clone(),
                payload,
                options: options.clone(),
            });
            let result = match self
                .failures
                .lock()
                .expect("failures lock")
                .get(&subscription.endpoint)
            {
                Some(error) => Err(error.clone()),
                None => Ok(()),
            };

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.notify.notify_waiters();
            result
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct FixedTime(pub(crate) OffsetDateTime);

impl Default for FixedTime {
    fn default() -> Self {
        Self(OffsetDateTime::from_unix_timestamp(1_736_674_200).expect("valid timestamp"))
    }
}

impl ports::TimeProvider for FixedTime {
    fn now(&self) -> OffsetDateTime {
        self.0
    }
}
