use std::net::SocketAddr;
use std::time::Duration;

pub const DEFAULT_DELIVERY_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_BROADCAST_CONCURRENCY: usize = 8;

#[derive(Clone)]
pub struct AppConfig {
    pub bind: SocketAddr,
    pub vapid_private_key: Option<String>,
    pub vapid_public_key: Option<String>,
    pub vapid_subject: Option<String>,
    /// Upper bound for a single push-service request.
    pub delivery_timeout: Duration,
    /// Deliveries a broadcast keeps in flight at once.
    pub broadcast_concurrency: usize,
    /// Origins allowed to call the relay from a browser; empty allows any.
    pub cors_origins: Vec<String>,
}

#[cfg(test)]
impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 3000)),
            vapid_private_key: None,
            vapid_public_key: None,
            vapid_subject: None,
            delivery_timeout: DEFAULT_DELIVERY_TIMEOUT,
            broadcast_concurrency: DEFAULT_BROADCAST_CONCURRENCY,
            cors_origins: Vec::new(),
        }
    }
}
