use std::time::Duration;

/// Rejected input from a subscriber or broadcast caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("subscriberId is required")]
    MissingSubscriberId,
    #[error("subscription is required")]
    MissingSubscription,
    #[error("subscription endpoint is required")]
    MissingEndpoint,
    #[error("subscription keys p256dh and auth are required")]
    MissingKeys,
    #[error("invalid notification: {0}")]
    InvalidNotification(String),
    #[error("invalid request body: {0}")]
    InvalidBody(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotFoundError {
    #[error("no subscription registered for '{0}'")]
    Subscriber(String),
}

/// Failure of a single delivery attempt.
///
/// These never escape a broadcast: the coordinator folds them into the
/// subscriber's `failed` result and logs them.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeliveryError {
    #[error("push service rejected the message (HTTP {status})")]
    Rejected { status: u16 },
    #[error("push service error: {0}")]
    Push(String),
    #[error("delivery timed out after {0:?}")]
    TimedOut(Duration),
    #[error("failed to prepare push message: {0}")]
    Encoding(String),
}

impl DeliveryError {
    pub fn status(&self) -> Option<u16> {
        match self {
            DeliveryError::Rejected { status } => Some(*status),
            _ => None,
        }
    }

    /// The push service reported the subscription as permanently invalid.
    pub fn is_gone(&self) -> bool {
        matches!(self.status(), Some(404 | 410))
    }
}

/// Startup configuration problems. The relay refuses to serve when any of
/// these is raised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("VAPID configuration is missing")]
    MissingVapid,
    #[error("VAPID configuration is incomplete: private key, public key and subject are all required")]
    IncompleteVapid,
    #[error("invalid VAPID private key: {0}")]
    InvalidVapidKey(String),
    #[error("VAPID public key does not match the private key")]
    VapidKeyMismatch,
    #[error("failed to initialise push client: {0}")]
    PushClient(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ServeError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}
