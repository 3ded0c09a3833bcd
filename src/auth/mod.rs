//! Request authentication.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          Auth Gate                           │
//! │   AuthPolicy::{Public, Login, Admin, Signature, Cascading}   │
//! │                                                              │
//! │   ┌────────────────────┐        ┌─────────────────────────┐  │
//! │   │   session checks   │        │  signature (HMAC-SHA256) │  │
//! │   │  (CurrentUser)     │        │  sig / t, ±5 min window  │  │
//! │   └────────────────────┘        └─────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod gate;
pub mod signature;

pub use gate::{
    admin_required, auth_required, check_signature, login_required, request_passes_test,
    signature_required, static_key, validate_signature, validate_signature_at, AuthPolicy, Guard,
    KeyResolver, Predicate,
};
pub use signature::{
    calculate_signature, signature_message, unix_now, SignatureAuth, SignatureError,
    MAX_CLOCK_SKEW, SIGNATURE_PARAM, TIMESTAMP_PARAM,
};
