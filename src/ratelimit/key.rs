//! Bucket key derivation.
//!
//! Each (identity, rule period, verb, path) tuple hashes to a stable token,
//! and the token plus a time-slot index names one counting window in the
//! store. Two keys come out of every evaluation: the slot containing "now"
//! and the one before it.

use std::time::SystemTime;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use sha2::{Digest, Sha256};

use crate::error::{FloodgateError, Result};

use super::identity::RequestIdentity;
use super::rules::RateLimitRule;

const KEY_PREFIX: &str = "rate_limit";

/// The pair of bucket keys one evaluation operates on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterKeys {
    /// Key for the slot containing "now".
    pub current: String,
    /// Key for the immediately preceding slot.
    pub previous: String,
}

/// Derive the current and previous bucket keys for an identity under a rule.
///
/// The raw composition joins the fields with a newline so boundaries cannot
/// shift between fields (the values in play never contain newlines). The
/// digest is SHA-256, encoded as URL-safe Base64; collision resistance
/// matters for correctness here, not secrecy.
///
/// Errors with [`FloodgateError::Config`] when `rule.period` is zero, which
/// would make the slot index undefined.
pub fn build_counter_keys(
    identity: &RequestIdentity,
    rule: &RateLimitRule,
    now: SystemTime,
) -> Result<CounterKeys> {
    if rule.period == 0 {
        return Err(FloodgateError::Config(
            "rate limit period must be positive to derive a window slot".to_string(),
        ));
    }

    let raw = format!(
        "{}\n{}\n{}:{}",
        identity.identity, rule.period, identity.http_verb, identity.path
    );
    let token = URL_SAFE_NO_PAD.encode(Sha256::digest(raw.as_bytes()));

    let unix_secs = now
        .duration_since(SystemTime::UNIX_EPOCH)
        .map_err(|_| FloodgateError::Config("clock reads before the unix epoch".to_string()))?
        .as_secs();
    let slot = (unix_secs / u64::from(rule.period)) as i64;

    Ok(CounterKeys {
        current: format!("{KEY_PREFIX}_{token}_{slot}"),
        previous: format!("{KEY_PREFIX}_{token}_{}", slot - 1),
    })
}
