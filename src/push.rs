use crate::adapters::WebPushSender;
use crate::config;
use crate::error::ConfigurationError;
use crate::types::vapid::VapidConfig;

pub mod adapter;
pub mod broadcast;
pub mod delivery;
pub mod vapid;

pub use broadcast::{BroadcastCoordinator, BroadcastReport};
pub use delivery::{DeliveryEngine, detect_platform};
pub use vapid::{VapidCredentials, generate_vapid_credentials, load_vapid_config};

use tracing::info;

/// Loads the VAPID configuration and builds the production sender.
///
/// Without complete, consistent signing keys the relay cannot authenticate
/// to push services, so this is the startup gate for serving at all.
pub fn init_sender(
    config: &config::AppConfig,
) -> Result<(VapidConfig, WebPushSender), ConfigurationError> {
    let vapid = load_vapid_config(config)?;
    let sender = WebPushSender::new(vapid.clone(), config.delivery_timeout)
        .map_err(|err| ConfigurationError::PushClient(err.to_string()))?;
    info!(
        subject = %vapid.subject,
        timeout = ?config.delivery_timeout,
        "push delivery enabled"
    );
    Ok((vapid, sender))
}
