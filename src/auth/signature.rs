//! HMAC-SHA256 request signatures.
//!
//! # Signing Scheme
//!
//! The signed message is the timestamp followed by every request parameter
//! (except `sig` and `t`), sorted by key and concatenated without
//! separators:
//!
//! ```text
//! message   = "{t}{key1}{value1}{key2}{value2}..."
//! signature = hex(HMAC-SHA256(secret_key, message))
//! ```
//!
//! The client sends the signature and timestamp as the `sig` and `t`
//! parameters. A signature is accepted while `|now - t|` is at most
//! [`MAX_CLOCK_SKEW`], in either direction, so clients whose clocks run a
//! little ahead of the server are not rejected.
//!
//! # Example
//!
//! ```rust
//! use simple_rest::auth::{calculate_signature, SignatureAuth};
//! use simple_rest::Params;
//!
//! let data: Params = [("user", "42"), ("action", "read")].into_iter().collect();
//!
//! let sig = calculate_signature("my-secret", &data, Some(1_700_000_000));
//! assert_eq!(sig.len(), 64);
//!
//! let auth = SignatureAuth::new("my-secret");
//! assert!(auth.verify_at(&data, &sig, 1_700_000_000, 1_700_000_120).is_ok());
//! ```

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::request::Params;

/// HMAC-SHA256 type alias
type HmacSha256 = Hmac<Sha256>;

/// Parameter carrying the hex signature.
pub const SIGNATURE_PARAM: &str = "sig";

/// Parameter carrying the Unix timestamp the signature was computed at.
pub const TIMESTAMP_PARAM: &str = "t";

/// Largest accepted distance between the signature timestamp and the
/// server clock. A distance of exactly this much is still accepted.
pub const MAX_CLOCK_SKEW: Duration = Duration::from_secs(5 * 60);

// =============================================================================
// Errors
// =============================================================================

/// Reasons a signature check fails.
///
/// The gate collapses all of these into a plain rejection; the variants only
/// exist for logging.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    /// No (or an empty) `sig` parameter
    #[error("Missing signature parameter")]
    MissingSignature,

    /// No (or an empty) `t` parameter
    #[error("Missing timestamp parameter")]
    MissingTimestamp,

    /// `t` is not an integer
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// `t` is outside the accepted window
    #[error("Signature timestamp {timestamp} is {skew}s away from current time {current_time}")]
    Expired {
        timestamp: i64,
        current_time: i64,
        skew: u64,
    },

    /// `sig` is not lowercase hex
    #[error("Invalid signature format")]
    InvalidSignatureFormat,

    /// `sig` does not match
    #[error("Invalid signature")]
    InvalidSignature,

    /// No secret key could be resolved for the request
    #[error("No secret key available")]
    MissingKey,
}

// =============================================================================
// Signing
// =============================================================================

/// Current Unix time in seconds.
pub fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

/// Calculate the signature for `data` at `timestamp` (now if `None`).
///
/// `data` must not contain `sig` or `t`; callers strip them first.
pub fn calculate_signature(key: impl AsRef<[u8]>, data: &Params, timestamp: Option<i64>) -> String {
    let timestamp = timestamp.unwrap_or_else(unix_now);
    let message = signature_message(data, timestamp);

    let mut mac =
        HmacSha256::new_from_slice(key.as_ref()).expect("HMAC can take key of any size");
    mac.update(message.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Build the signed message: timestamp, then the key-sorted parameters.
pub fn signature_message(data: &Params, timestamp: i64) -> String {
    let mut pairs: Vec<(&str, &str)> = data.iter().collect();
    pairs.sort_by(|a, b| a.0.cmp(b.0));

    let mut message = timestamp.to_string();
    for (key, value) in pairs {
        message.push_str(key);
        message.push_str(value);
    }
    message
}

/// Signer/verifier bound to one secret key.
#[derive(Clone)]
pub struct SignatureAuth {
    /// Secret key for HMAC computation
    secret_key: Vec<u8>,
}

impl std::fmt::Debug for SignatureAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignatureAuth")
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

impl SignatureAuth {
    pub fn new(secret_key: impl AsRef<[u8]>) -> Self {
        Self {
            secret_key: secret_key.as_ref().to_vec(),
        }
    }

    /// Sign `data` now. Returns `(signature, timestamp)`.
    pub fn sign(&self, data: &Params) -> (String, i64) {
        let timestamp = unix_now();
        (self.sign_at(data, timestamp), timestamp)
    }

    /// Sign `data` at a specific timestamp.
    pub fn sign_at(&self, data: &Params, timestamp: i64) -> String {
        calculate_signature(&self.secret_key, data, Some(timestamp))
    }

    /// `data` with `t` and `sig` appended, ready to send.
    pub fn signed_params(&self, data: &Params, timestamp: i64) -> Params {
        let mut signed = data.clone();
        signed.remove(TIMESTAMP_PARAM);
        signed.remove(SIGNATURE_PARAM);
        let signature = self.sign_at(&signed, timestamp);
        signed.insert(TIMESTAMP_PARAM, timestamp.to_string());
        signed.insert(SIGNATURE_PARAM, signature);
        signed
    }

    /// Verify `signature` over `data` against the current clock.
    pub fn verify(&self, data: &Params, signature: &str, timestamp: i64) -> Result<(), SignatureError> {
        self.verify_at(data, signature, timestamp, unix_now())
    }

    /// Verify `signature` over `data` as if the clock read `now`.
    pub fn verify_at(
        &self,
        data: &Params,
        signature: &str,
        timestamp: i64,
        now: i64,
    ) -> Result<(), SignatureError> {
        let skew = now.abs_diff(timestamp);
        if skew > MAX_CLOCK_SKEW.as_secs() {
            return Err(SignatureError::Expired {
                timestamp,
                current_time: now,
                skew,
            });
        }

        let expected = self.sign_at(data, timestamp);

        // Constant-time comparison of the wire form; only lowercase hex matches
        if signature.as_bytes().ct_eq(expected.as_bytes()).into() {
            Ok(())
        } else if !is_lowercase_hex(signature) {
            Err(SignatureError::InvalidSignatureFormat)
        } else {
            Err(SignatureError::InvalidSignature)
        }
    }
}

fn is_lowercase_hex(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

// =============================================================================
// Tests
// =============================================================================
