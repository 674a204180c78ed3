use crate::error::ValidationError;
use crate::types::subscription::Subscription;

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Whether an upsert created a new entry or replaced an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Created,
    Replaced,
}

/// In-memory map from subscriber id to its current push subscription.
///
/// Shared as `Arc<SubscriptionRegistry>` between the HTTP handlers and the
/// broadcast coordinator. Every operation takes the lock once, so readers
/// never observe a half-written entry. Contents are lost on restart.
#[derive(Debug, Default)]
pub struct SubscriptionRegistry {
    subscriptions: Mutex<HashMap<String, Subscription>>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `subscription` under `subscriber_id`, replacing any previous
    /// entry wholesale.
    pub fn upsert(
        &self,
        subscriber_id: &str,
        subscription: Subscription,
    ) -> Result<Upsert, ValidationError> {
        if subscriber_id.trim().is_empty() {
            return Err(ValidationError::MissingSubscriberId);
        }
        subscription.validate()?;

        let previous = self
            .entries()
            .insert(subscriber_id.to_string(), subscription);
        Ok(match previous {
            Some(_) => Upsert::Replaced,
            None => Upsert::Created,
        })
    }

    pub fn remove(&self, subscriber_id: &str) -> bool {
        self.entries().remove(subscriber_id).is_some()
    }

    /// Removes `subscriber_id` only while it still maps to `expected`.
    ///
    /// A subscriber that re-registered after `expected` was read keeps its
    /// new subscription.
    pub fn remove_if_unchanged(&self, subscriber_id: &str, expected: &Subscription) -> bool {
        let mut entries = self.entries();
        if entries.get(subscriber_id) != Some(expected) {
            return false;
        }
        entries.remove(subscriber_id).is_some()
    }

    pub fn get(&self, subscriber_id: &str) -> Option<Subscription> {
        self.entries().get(subscriber_id).cloned()
    }

    /// Point-in-time copy of every entry.
    pub fn list(&self) -> Vec<(String, Subscription)> {
        self.entries()
            .iter()
            .map(|(id, subscription)| (id.clone(), subscription.clone()))
            .collect()
    }

    pub fn count(&self) -> usize {
        self.entries().len()
    }

    // No operation panics while holding the lock, so a poisoned map is still
    // consistent.
    fn entries(&self) -> MutexGuard<'_, HashMap<String, Subscription>> {
        self.subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
