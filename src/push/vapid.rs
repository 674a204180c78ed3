use base64::{URL_SAFE_NO_PAD, encode_config};
use jwt_simple::prelude::ES256KeyPair;
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};

use crate::config;
use crate::error::ConfigurationError;
use crate::types::vapid::VapidConfig;

#[derive(Debug, Clone)]
pub struct VapidCredentials {
    pub private_key: String,
    pub public_key: String,
}

/// Reads the VAPID key pair and subject from `config` and checks that the
/// public key is the one derived from the private key, so the key handed to
/// browsers always matches the key that signs delivery assertions.
pub fn load_vapid_config(config: &config::AppConfig) -> Result<VapidConfig, ConfigurationError> {
    let private_key = non_blank(config.vapid_private_key.as_deref());
    let public_key = non_blank(config.vapid_public_key.as_deref());
    let subject = non_blank(config.vapid_subject.as_deref());
    let has_any = private_key.is_some() || public_key.is_some() || subject.is_some();

    let (private_key, public_key, subject) = match (private_key, public_key, subject) {
        (Some(private_key), Some(public_key), Some(subject)) => (private_key, public_key, subject),
        _ if has_any => return Err(ConfigurationError::IncompleteVapid),
        _ => return Err(ConfigurationError::MissingVapid),
    };

    let derived = derive_public_key(private_key)
        .map_err(|err| ConfigurationError::InvalidVapidKey(err.to_string()))?;
    if derived != public_key.trim_end_matches('=') {
        return Err(ConfigurationError::VapidKeyMismatch);
    }

    Ok(VapidConfig {
        private_key: private_key.to_string(),
        public_key: derived,
        subject: subject.to_string(),
    })
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

pub(crate) fn derive_public_key(private_key: &str) -> Result<String, web_push::WebPushError> {
    let public_key =
        web_push::VapidSignatureBuilder::from_base64_no_sub(private_key, URL_SAFE_NO_PAD)?
            .get_public_key();
    Ok(encode_config(public_key, URL_SAFE_NO_PAD))
}

pub fn generate_vapid_credentials() -> Result<VapidCredentials, web_push::WebPushError> {
    let mut rng = OsRng;
    generate_vapid_credentials_with_rng(&mut rng)
}

pub(crate) fn generate_vapid_credentials_with_rng<R: RngCore + CryptoRng>(
    rng: &mut R,
) -> Result<VapidCredentials, web_push::WebPushError> {
    let key_pair = generate_es256_keypair_with_rng(rng);
    let private_key = encode_config(key_pair.to_bytes(), URL_SAFE_NO_PAD);
    let public_key = derive_public_key(&private_key)?;

    Ok(VapidCredentials {
        private_key,
        public_key,
    })
}

fn generate_es256_keypair_with_rng<R: RngCore + CryptoRng>(rng: &mut R) -> ES256KeyPair {
    let mut key_bytes = [0u8; 32];
    loop {
        rng.fill_bytes(&mut key_bytes);
        if let Ok(key_pair) = ES256KeyPair::from_bytes(&key_bytes) {
            return key_pair;
        }
    }
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const FIXTURE_PRIVATE_KEY: &str = "9pKJeIXAyyCj5M0QagsVvDYHlPF-cymJCbB5iHPsdEE";
    const FIXTURE_PUBLIC_KEY: &str =
        "BCRweRf_U5iQM4pKNucGRzM6OuLp8Hisa8yX0N2ePIf1oxKitvFT6qvuGgYoTxlMatMDaytXbZR3rVClc2w_p6U";

    fn vapid_app_config(
        private_key: Option<&str>,
        public_key: Option<&str>,
        subject: Option<&str>,
    ) -> config::AppConfig {
        config::AppConfig {
            vapid_private_key: private_key.map(str::to_string),
            vapid_public_key: public_key.map(str::to_string),
            vapid_subject: subject.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn generate_vapid_credentials_with_rng__should_return_expected_fixture() {
        // Given
        let mut rng = StdRng::from_seed([7u8; 32]);

        // When
        let credentials =
            generate_vapid_credentials_with_rng(&mut rng).expect("credentials should generate");

        // Then
        assert_eq!(credentials.private_key, FIXTURE_PRIVATE_KEY);
        assert_eq!(credentials.public_key, FIXTURE_PUBLIC_KEY);
    }

    #[test]
    fn load_vapid_config__should_accept_matching_key_pair() {
        // Given
        let config = vapid_app_config(
            Some(FIXTURE_PRIVATE_KEY),
            Some(FIXTURE_PUBLIC_KEY),
            Some("mailto:alerts@stockhub.example"),
        );

        // When
        let vapid = load_vapid_config(&config).expect("vapid config");

        // Then
        assert_eq!(vapid.public_key, FIXTURE_PUBLIC_KEY);
        assert_eq!(vapid.subject, "mailto:alerts@stockhub.example");
    }

    #[test]
    fn load_vapid_config__should_report_missing_and_incomplete() {
        assert_eq!(
            load_vapid_config(&vapid_app_config(None, None, None)).map(|_| ()),
            Err(ConfigurationError::MissingVapid)
        );
        assert_eq!(
            load_vapid_config(&vapid_app_config(Some(FIXTURE_PRIVATE_KEY), None, None))
                .map(|_| ()),
            Err(ConfigurationError::IncompleteVapid)
        );
        assert_eq!(
            load_vapid_config(&vapid_app_config(
                Some(FIXTURE_PRIVATE_KEY),
                Some(FIXTURE_PUBLIC_KEY),
                Some("  ")
            ))
            .map(|_| ()),
            Err(ConfigurationError::IncompleteVapid)
        );
    }

    #[test]
    fn load_vapid_config__should_reject_mismatched_public_key() {
        // Given
        let other = generate_vapid_credentials().expect("credentials");
        let config = vapid_app_config(
            Some(FIXTURE_PRIVATE_KEY),
            Some(&other.public_key),
            Some("mailto:alerts@stockhub.example"),
        );

        // Then
        assert_eq!(
            load_vapid_config(&config).map(|_| ()),
            Err(ConfigurationError::VapidKeyMismatch)
        );
    }

    #[test]
    fn load_vapid_config__should_reject_garbage_private_key() {
        let config = vapid_app_config(
            Some("not-a-key"),
            Some(FIXTURE_PUBLIC_KEY),
            Some("mailto:alerts@stockhub.example"),
        );

        assert!(matches!(
            load_vapid_config(&config),
            Err(ConfigurationError::InvalidVapidKey(_))
        ));
    }
}
