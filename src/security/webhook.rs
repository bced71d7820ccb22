//! Inbound webhook signature verification
//!
//! Signatures are hex-encoded HMACs over the raw request body, optionally
//! prefixed with the algorithm name (`sha256=...`). Comparison goes through
//! [`Mac::verify_slice`], which is constant-time.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::digest::KeyInit;
use hmac::{Hmac, Mac};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Sha256, Sha512};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Headers searched, in order, when a system configures none
pub const DEFAULT_SIGNATURE_HEADERS: [&str; 3] =
    ["X-Hub-Signature-256", "X-Signature", "X-Webhook-Signature"];

/// Raw bytes in a generated webhook secret
pub const WEBHOOK_SECRET_BYTES: usize = 32;

/// HMAC digest used for a webhook signature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignatureAlgorithm {
    #[default]
    Sha256,
    Sha512,
}

impl FromStr for SignatureAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "").as_str() {
            "sha256" => Ok(Self::Sha256),
            "sha512" => Ok(Self::Sha512),
            other => Err(format!("Unsupported webhook signature algorithm: {other}")),
        }
    }
}

impl fmt::Display for SignatureAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sha256 => write!(f, "sha256"),
            Self::Sha512 => write!(f, "sha512"),
        }
    }
}

/// Stateless HMAC signer and verifier
#[derive(Debug, Clone, Copy, Default)]
pub struct WebhookVerifier;

impl WebhookVerifier {
    /// Hex HMAC of `payload`
    pub fn sign(secret: &[u8], payload: &[u8], algorithm: SignatureAlgorithm) -> String {
        match algorithm {
            SignatureAlgorithm::Sha256 => hex::encode(Self::mac::<Hmac<Sha256>>(secret, payload)),
            SignatureAlgorithm::Sha512 => hex::encode(Self::mac::<Hmac<Sha512>>(secret, payload)),
        }
    }

    /// Checks `signature` against the HMAC of `payload`
    ///
    /// Never errors: malformed hex or a wrong digest length is a mismatch.
    pub fn verify(
        secret: &[u8],
        payload: &[u8],
        signature: &str,
        algorithm: SignatureAlgorithm,
    ) -> bool {
        let Ok(expected) = hex::decode(strip_algorithm_prefix(signature.trim())) else {
            return false;
        };

        match algorithm {
            SignatureAlgorithm::Sha256 => {
                Self::verify_mac::<Hmac<Sha256>>(secret, payload, &expected)
            }
            SignatureAlgorithm::Sha512 => {
                Self::verify_mac::<Hmac<Sha512>>(secret, payload, &expected)
            }
        }
    }

    /// Finds the signature header value
    ///
    /// A configured header name is the only one consulted; otherwise the
    /// first of [`DEFAULT_SIGNATURE_HEADERS`] present wins. Names compare
    /// case-insensitively.
    pub fn find_signature<'a>(
        headers: &'a HashMap<String, String>,
        configured_header: Option<&str>,
    ) -> Option<&'a str> {
        let lookup = |name: &str| {
            headers
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.as_str())
        };

        match configured_header {
            Some(name) => lookup(name),
            None => DEFAULT_SIGNATURE_HEADERS.iter().find_map(|name| lookup(name)),
        }
    }

    /// Fresh random 256-bit secret, URL-safe base64 without padding
    pub fn generate_secret() -> String {
        let mut bytes = zeroize::Zeroizing::new([0u8; WEBHOOK_SECRET_BYTES]);
        OsRng.fill_bytes(&mut bytes[..]);
        URL_SAFE_NO_PAD.encode(&bytes[..])
    }

    fn mac<M: Mac + KeyInit>(secret: &[u8], payload: &[u8]) -> Vec<u8> {
        match <M as KeyInit>::new_from_slice(secret) {
            Ok(mut mac) => {
                mac.update(payload);
                mac.finalize().into_bytes().to_vec()
            }
            Err(_) => Vec::new(),
        }
    }

    fn verify_mac<M: Mac + KeyInit>(secret: &[u8], payload: &[u8], expected: &[u8]) -> bool {
        match <M as KeyInit>::new_from_slice(secret) {
            Ok(mut mac) => {
                mac.update(payload);
                mac.verify_slice(expected).is_ok()
            }
            Err(_) => false,
        }
    }
}

fn strip_algorithm_prefix(signature: &str) -> &str {
    match signature.split_once('=') {
        Some((prefix, rest)) if prefix.chars().all(|c| c.is_ascii_alphanumeric()) => rest,
        _ => signature,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_sign_known_vector() {
        // RFC 4231 test case 2
        let sig = WebhookVerifier::sign(
            b"Jefe",
            b"what do ya want for nothing?",
            SignatureAlgorithm::Sha256,
        );
        assert_eq!(
            sig,
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn test_verify_accepts_prefixed_and_plain() {
        let sig = WebhookVerifier::sign(b"abc", b"{}", SignatureAlgorithm::Sha256);
        assert!(WebhookVerifier::verify(b"abc", b"{}", &sig, SignatureAlgorithm::Sha256));
        assert!(WebhookVerifier::verify(
            b"abc",
            b"{}",
            &format!("sha256={sig}"),
            SignatureAlgorithm::Sha256
        ));
    }

    #[test]
    fn test_verify_rejects_mismatch() {
        let sig = WebhookVerifier::sign(b"abc", b"payload", SignatureAlgorithm::Sha256);
        assert!(!WebhookVerifier::verify(b"abc", b"payloaD", &sig, SignatureAlgorithm::Sha256));
        assert!(!WebhookVerifier::verify(b"abd", b"payload", &sig, SignatureAlgorithm::Sha256));
        assert!(!WebhookVerifier::verify(b"abc", b"payload", "zz-not-hex", SignatureAlgorithm::Sha256));
        assert!(!WebhookVerifier::verify(b"abc", b"payload", &sig, SignatureAlgorithm::Sha512));
    }

    #[test]
    fn test_sha512_round() {
        let sig = WebhookVerifier::sign(b"k", b"body", SignatureAlgorithm::Sha512);
        assert_eq!(sig.len(), 128);
        assert!(WebhookVerifier::verify(b"k", b"body", &sig, SignatureAlgorithm::Sha512));
    }

    #[test]
    fn test_algorithm_from_str() {
        assert_eq!("SHA-256".parse::<SignatureAlgorithm>().unwrap(), SignatureAlgorithm::Sha256);
        assert_eq!("sha512".parse::<SignatureAlgorithm>().unwrap(), SignatureAlgorithm::Sha512);
        assert!("md5".parse::<SignatureAlgorithm>().is_err());
    }

    #[test]
    fn test_find_signature_default_order() {
        let h = headers(&[("x-signature", "second"), ("X-Webhook-Signature", "third")]);
        assert_eq!(WebhookVerifier::find_signature(&h, None), Some("second"));

        let h = headers(&[("X-Webhook-Signature", "third"), ("X-HUB-SIGNATURE-256", "first")]);
        assert_eq!(WebhookVerifier::find_signature(&h, None), Some("first"));

        assert_eq!(WebhookVerifier::find_signature(&headers(&[]), None), None);
    }

    #[test]
    fn test_find_signature_configured_header() {
        let h = headers(&[("X-Hub-Signature-256", "default"), ("X-Custom-Sig", "custom")]);
        assert_eq!(
            WebhookVerifier::find_signature(&h, Some("x-custom-sig")),
            Some("custom")
        );
        assert_eq!(WebhookVerifier::find_signature(&h, Some("X-Missing")), None);
    }

    #[test]
    fn test_generate_secret_is_random_256_bit() {
        let a = WebhookVerifier::generate_secret();
        let b = WebhookVerifier::generate_secret();
        assert_ne!(a, b);
        assert_eq!(URL_SAFE_NO_PAD.decode(&a).unwrap().len(), WEBHOOK_SECRET_BYTES);
    }
}
