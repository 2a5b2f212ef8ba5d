//! VAPID request signing (RFC 8292).
//!
//! Push services require each delivery to carry a short-lived ES256 JWT
//! whose audience is the origin of the push endpoint, plus the server's
//! public key, in the `Authorization: vapid ...` header.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{Duration, Utc};
use p256::ecdsa::signature::Signer;
use p256::ecdsa::{Signature, SigningKey};
use reqwest::Url;
use serde_json::json;

use crate::PushError;

/// Token lifetime. Push services reject anything above 24 hours.
const TOKEN_LIFETIME_HOURS: i64 = 12;

/// Signs push requests with a VAPID key pair.
pub struct VapidSigner {
    key: SigningKey,
    /// Uncompressed P-256 public key, base64url-encoded.
    public_key: String,
    /// Contact claim, e.g. `mailto:admin@example.com`.
    contact: String,
}

impl VapidSigner {
    /// Create a signer from a base64url-encoded raw P-256 private key
    /// (the format produced by common VAPID keygen tools) and a contact
    /// claim for the `sub` field.
    pub fn new(private_key: &str, contact: impl Into<String>) -> Result<Self, PushError> {
        let bytes = URL_SAFE_NO_PAD
            .decode(private_key.trim())
            .map_err(|e| PushError::Vapid(format!("invalid private key encoding: {}", e)))?;

        let key = SigningKey::from_slice(&bytes)
            .map_err(|e| PushError::Vapid(format!("invalid private key: {}", e)))?;

        let public_key =
            URL_SAFE_NO_PAD.encode(key.verifying_key().to_encoded_point(false).as_bytes());

        Ok(Self {
            key,
            public_key,
            contact: contact.into(),
        })
    }

    /// Build the `Authorization` header value for a delivery to `endpoint`.
    pub fn authorization(&self, endpoint: &str) -> Result<String, PushError> {
        let audience = endpoint_origin(endpoint)?;

        let header = json!({ "typ": "JWT", "alg": "ES256" });
        let claims = json!({
            "aud": audience,
            "exp": (Utc::now() + Duration::hours(TOKEN_LIFETIME_HOURS)).timestamp(),
            "sub": self.contact,
        });

        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(&header)?),
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims)?),
        );

        let signature: Signature = self.key.sign(signing_input.as_bytes());
        let token = format!(
            "{}.{}",
            signing_input,
            URL_SAFE_NO_PAD.encode(signature.to_bytes().as_slice())
        );

        Ok(format!("vapid t={}, k={}", token, self.public_key))
    }
}

/// Extract the origin (`scheme://host[:port]`) of a push endpoint, which
/// is what the push service expects as the JWT audience.
fn endpoint_origin(endpoint: &str) -> Result<String, PushError> {
    let url = Url::parse(endpoint)
        .map_err(|e| PushError::Vapid(format!("invalid endpoint URL {}: {}", endpoint, e)))?;
    Ok(url.origin().ascii_serialization())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A fixed, valid P-256 scalar for tests.
    fn test_private_key() -> String {
        let bytes: Vec<u8> = (1..=32).collect();
        URL_SAFE_NO_PAD.encode(bytes)
    }

    #[test]
    fn test_endpoint_origin_strips_path() {
        let origin = endpoint_origin("https://fcm.googleapis.com/fcm/send/abc123").unwrap();
        assert_eq!(origin, "https://fcm.googleapis.com");
    }

    #[test]
    fn test_endpoint_origin_keeps_explicit_port() {
        let origin = endpoint_origin("https://push.example:8443/sub/1").unwrap();
        assert_eq!(origin, "https://push.example:8443");
    }

    #[test]
    fn test_endpoint_origin_rejects_garbage() {
        assert!(endpoint_origin("not a url").is_err());
    }

    #[test]
    fn test_rejects_malformed_private_key() {
        assert!(VapidSigner::new("***", "mailto:a@b.c").is_err());
        // Wrong length
        assert!(VapidSigner::new(&URL_SAFE_NO_PAD.encode([1u8; 16]), "mailto:a@b.c").is_err());
    }

    #[test]
    fn test_authorization_header_shape() {
        let signer = VapidSigner::new(&test_private_key(), "mailto:admin@example.com").unwrap();
        let header = signer
            .authorization("https://push.example/sub/42")
            .unwrap();

        assert!(header.starts_with("vapid t="));
        let token = header
            .strip_prefix("vapid t=")
            .unwrap()
            .split(", k=")
            .next()
            .unwrap();
        // header.claims.signature
        assert_eq!(token.split('.').count(), 3);

        // Claims decode back to the expected audience and subject
        let claims_b64 = token.split('.').nth(1).unwrap();
        let claims: serde_json::Value =
            serde_json::from_slice(&URL_SAFE_NO_PAD.decode(claims_b64).unwrap()).unwrap();
        assert_eq!(claims["aud"], "https://push.example");
        assert_eq!(claims["sub"], "mailto:admin@example.com");
        assert!(claims["exp"].as_i64().unwrap() > Utc::now().timestamp());
    }
}
