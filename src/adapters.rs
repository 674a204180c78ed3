use std::pin::Pin;
use std::time::Duration;

use isahc::AsyncReadResponseExt;
use isahc::http::{HeaderValue, Request};
use isahc::{AsyncBody, HttpClient};
use time::OffsetDateTime;
use tracing::debug;

use crate::error::DeliveryError;
use crate::ports;
use crate::types::delivery::DeliveryOptions;
use crate::types::subscription::Subscription;
use crate::types::vapid::VapidConfig;

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeProvider;

impl ports::TimeProvider for SystemTimeProvider {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// Web Push sender: aes128gcm payload encryption plus a VAPID assertion
/// signed with the relay's key pair. Each attempt is bounded by `timeout`.
///
/// The message is encrypted and signed by `web-push`; the request itself is
/// sent here so the `Topic` header can be attached.
#[derive(Clone)]
pub struct WebPushSender {
    vapid: VapidConfig,
    timeout: Duration,
    client: HttpClient,
}

impl WebPushSender {
    pub fn new(vapid: VapidConfig, timeout: Duration) -> Result<Self, isahc::Error> {
        let client = HttpClient::new()?;
        Ok(Self {
            vapid,
            timeout,
            client,
        })
    }

    fn build_request(
        &self,
        subscription: &Subscription,
        payload: &[u8],
        options: &DeliveryOptions,
    ) -> Result<Request<AsyncBody>, DeliveryError> {
        let message = self
            .build_message(subscription, payload, options)
            .map_err(|err| DeliveryError::Encoding(err.to_string()))?;
        let mut request = web_push::request_builder::build_request::<AsyncBody>(message);
        if let Some(topic) = &options.topic {
            let value = HeaderValue::from_str(topic)
                .map_err(|err| DeliveryError::Encoding(err.to_string()))?;
            request.headers_mut().insert("topic", value);
        }
        Ok(request)
    }

    fn build_message(
        &self,
        subscription: &Subscription,
        payload: &[u8],
        options: &DeliveryOptions,
    ) -> Result<web_push::WebPushMessage, web_push::WebPushError> {
        let subscription_info = web_push::SubscriptionInfo::new(
            subscription.endpoint.clone(),
            subscription.keys.p256dh.clone(),
            subscription.keys.auth.clone(),
        );
        let mut builder = web_push::WebPushMessageBuilder::new(&subscription_info)?;
        builder.set_payload(web_push::ContentEncoding::Aes128Gcm, payload);
        if let Some(ttl) = options.ttl {
            builder.set_ttl(ttl);
        }
        if options.high_urgency {
            builder.set_urgency(web_push::Urgency::High);
        }
        let mut signature_builder = web_push::VapidSignatureBuilder::from_base64(
            &self.vapid.private_key,
            web_push::URL_SAFE_NO_PAD,
            &subscription_info,
        )?;
        signature_builder.add_claim("sub", self.vapid.subject.as_str());
        builder.set_vapid_signature(signature_builder.build()?);
        builder.build()
    }

    async fn post(&self, request: Request<AsyncBody>) -> Result<(), DeliveryError> {
        let mut response = self
            .client
            .send_async(request)
            .await
            .map_err(|err| DeliveryError::Push(err.to_string()))?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        debug!(status = status.as_u16(), body = %body, "push service rejected message");
        Err(DeliveryError::Rejected {
            status: status.as_u16(),
        })
    }
}

impl std::fmt::Debug for WebPushSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebPushSender")
            .field("vapid", &self.vapid)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl ports::PushSender for WebPushSender {
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
            let request = self.build_request(subscription, payload, options)?;
            match tokio::time::timeout(self.timeout, self.post(request)).await {
                Ok(result) => result,
                Err(_) => Err(DeliveryError::TimedOut(self.timeout)),
            }
        })
    }
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::*;
    use crate::push::delivery::delivery_options;
    use crate::types::subscription::Platform;

    const VAPID_PRIVATE_KEY: &str = "9pKJeIXAyyCj5M0QagsVvDYHlPF-cymJCbB5iHPsdEE";
    const VAPID_PUBLIC_KEY: &str =
        "BCRweRf_U5iQM4pKNucGRzM6OuLp8Hisa8yX0N2ePIf1oxKitvFT6qvuGgYoTxlMatMDaytXbZR3rVClc2w_p6U";
    // Any valid P-256 point works as a browser key for encryption.
    const BROWSER_P256DH: &str = VAPID_PUBLIC_KEY;
    const BROWSER_AUTH: &str = "AAECAwQFBgcICQoLDA0ODw";

    fn sender() -> WebPushSender {
        let vapid = VapidConfig {
            private_key: VAPID_PRIVATE_KEY.to_string(),
            public_key: VAPID_PUBLIC_KEY.to_string(),
            subject: "mailto:alerts@stockhub.example".to_string(),
        };
        WebPushSender::new(vapid, Duration::from_secs(10)).expect("push client")
    }

    fn header<'r>(request: &'r Request<AsyncBody>, name: &str) -> Option<&'r str> {
        request
            .headers()
            .get(name)
            .map(|value| value.to_str().expect("ascii header"))
    }

    #[test]
    fn build_request__should_set_ttl_urgency_and_topic_for_apple_endpoint() {
        // Given
        let subscription =
            Subscription::new("https://web.push.apple.com/xyz", BROWSER_P256DH, BROWSER_AUTH);

        // When
        let request = sender()
            .build_request(
                &subscription,
                br#"{"title":"T"}"#,
                &delivery_options(Platform::Apple),
            )
            .expect("request");

        // Then
        assert_eq!(request.uri(), "https://web.push.apple.com/xyz");
        assert_eq!(header(&request, "ttl"), Some("86400"));
        assert_eq!(header(&request, "urgency"), Some("high"));
        assert_eq!(header(&request, "topic"), Some("stockhub-update"));
        assert!(header(&request, "authorization").is_some());
        assert_eq!(header(&request, "content-encoding"), Some("aes128gcm"));
    }

    #[test]
    fn build_request__should_leave_defaults_for_standard_endpoint() {
        // Given
        let subscription =
            Subscription::new("https://push.example/abc", BROWSER_P256DH, BROWSER_AUTH);

        // When
        let request = sender()
            .build_request(
                &subscription,
                br#"{"title":"T"}"#,
                &delivery_options(Platform::Standard),
            )
            .expect("request");

        // Then
        assert_ne!(header(&request, "ttl"), Some("86400"));
        assert!(header(&request, "ttl").is_some());
        assert_eq!(header(&request, "urgency"), None);
        assert_eq!(header(&request, "topic"), None);
    }

    #[test]
    fn build_request__should_report_unusable_browser_keys_as_encoding_error() {
        let subscription = Subscription::new("https://push.example/abc", "not-a-key", "a1");

        let result = sender().build_request(
            &subscription,
            b"{}",
            &delivery_options(Platform::Standard),
        );

        assert!(matches!(result, Err(DeliveryError::Encoding(_))));
    }
}
