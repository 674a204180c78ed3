use crate::error::DeliveryError;
use crate::types::delivery::DeliveryOptions;
use crate::types::subscription::Subscription;

/// Sends one already-serialized notification to one subscription.
///
/// Implementations encrypt and authenticate the request and report any
/// non-2xx response as [`DeliveryError::Rejected`] so callers can tell a
/// gone subscription from a transient failure.
pub trait PushSender: Clone + Send + Sync + 'static {
    type Fut<'a>: Future<Output = Result<(), DeliveryError>> + Send + 'a
    where
        Self: 'a;

    fn send<'a>(
        &'a self,
        subscription: &'a Subscription,
        payload: &'a [u8],
        options: &'a DeliveryOptions,
    ) -> Self::Fut<'a>;
}
