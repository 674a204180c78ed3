use crate::adapters::SystemTimeProvider;
use crate::config::AppConfig;
use crate::ports;
use crate::push::{BroadcastCoordinator, DeliveryEngine};
use crate::registry::SubscriptionRegistry;

use std::sync::Arc;

pub struct AppState<S, T = SystemTimeProvider> {
    pub registry: Arc<SubscriptionRegistry>,
    pub push: Arc<BroadcastCoordinator<S, T>>,
    pub vapid_public_key: Arc<str>,
}

impl<S, T> AppState<S, T>
where
    S: ports::PushSender,
    T: ports::TimeProvider,
{
    pub fn new(config: &AppConfig, vapid_public_key: &str, sender: S, time: T) -> Self {
        let registry = Arc::new(SubscriptionRegistry::new());
        let push = BroadcastCoordinator::new(
            Arc::clone(&registry),
            DeliveryEngine::new(sender, time),
            config.broadcast_concurrency,
        );
        Self {
            registry,
            push: Arc::new(push),
            vapid_public_key: Arc::from(vapid_public_key),
        }
    }
}

impl<S, T> Clone for AppState<S, T> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            push: Arc::clone(&self.push),
            vapid_public_key: Arc::clone(&self.vapid_public_key),
        }
    }
}
