//! Rate limit rules and per-endpoint policy configuration.

use serde::{Deserialize, Serialize};

use crate::error::{FloodgateError, Result};

/// Common rate limit periods, in seconds.
pub mod period {
    pub const HALF_MINUTE: u32 = 30;
    pub const ONE_MINUTE: u32 = 60;

    pub const HALF_HOUR: u32 = 30 * ONE_MINUTE;
    pub const ONE_HOUR: u32 = 60 * ONE_MINUTE;

    pub const ONE_DAY: u32 = 24 * ONE_HOUR;
}

/// How the caller-distinguishing identity is derived from a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentitySource {
    /// The client's remote IP address.
    Ip,
    /// An opaque client identifier supplied by the host.
    ClientId,
    /// One or more named request parameters (query or route values).
    Parameter,
}

/// The quota a single rule enforces: at most `limit` requests per `period`
/// seconds.
///
/// `limit == 0` means no capacity is configured and every request is
/// rejected. `period == 0` is accepted at construction but rejected at
/// evaluation time, where it would make slot arithmetic undefined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitRule {
    /// Maximum number of requests a client can make in `period` seconds.
    pub limit: u32,
    /// Rate limit period in seconds.
    pub period: u32,
}

impl RateLimitRule {
    /// Build a rule from raw (possibly negative) configuration values.
    pub fn new(limit: i64, period: i64) -> Result<Self> {
        if limit < 0 {
            return Err(FloodgateError::Config(format!(
                "limit should not be less than zero, got {limit}"
            )));
        }
        if period < 0 {
            return Err(FloodgateError::Config(format!(
                "period should not be less than zero, got {period}"
            )));
        }

        Ok(Self {
            limit: limit as u32,
            period: period as u32,
        })
    }
}

/// A complete per-endpoint rate limit policy: the quota plus the identity
/// strategy the interception layer should use.
///
/// This is a plain configuration record; hosts attach it to a route or
/// operation and pass it to [`resolve_identity`](super::resolve_identity)
/// and the limiter on each request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateLimitPolicy {
    pub source: IdentitySource,
    pub limit: u32,
    pub period: u32,
    /// Parameter names used when `source` is [`IdentitySource::Parameter`].
    #[serde(default)]
    pub parameter_names: Vec<String>,
}

impl RateLimitPolicy {
    /// Build a policy, validating quota values and parameter metadata.
    ///
    /// `names` is a semicolon-separated list of parameter names; empty
    /// entries are dropped. It is required (and must be non-empty) exactly
    /// when `source` is [`IdentitySource::Parameter`].
    pub fn new(source: IdentitySource, limit: i64, period: i64, names: &str) -> Result<Self> {
        let rule = RateLimitRule::new(limit, period)?;

        let parameter_names: Vec<String> = names
            .split(';')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect();

        if source == IdentitySource::Parameter && parameter_names.is_empty() {
            return Err(FloodgateError::Config(
                "parameter names should not be empty when rate limiting via parameter".to_string(),
            ));
        }

        Ok(Self {
            source,
            limit: rule.limit,
            period: rule.period,
            parameter_names,
        })
    }

    /// Shorthand for an IP-keyed policy.
    pub fn via_ip(limit: i64, period: i64) -> Result<Self> {
        Self::new(IdentitySource::Ip, limit, period, "")
    }

    /// Shorthand for a client-id-keyed policy.
    pub fn via_client_id(limit: i64, period: i64) -> Result<Self> {
        Self::new(IdentitySource::ClientId, limit, period, "")
    }

    /// Shorthand for a parameter-keyed policy.
    pub fn via_parameter(names: &str, limit: i64, period: i64) -> Result<Self> {
        Self::new(IdentitySource::Parameter, limit, period, names)
    }

    /// The quota portion of this policy.
    pub fn rule(&self) -> RateLimitRule {
        RateLimitRule {
            limit: self.limit,
            period: self.period,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_rejects_negative_limit() {
        let err = RateLimitRule::new(-1, 60).unwrap_err();
        assert!(matches!(err, FloodgateError::Config(_)));
    }

    #[test]
    fn rule_rejects_negative_period() {
        let err = RateLimitRule::new(10, -5).unwrap_err();
        assert!(matches!(err, FloodgateError::Config(_)));
    }

    #[test]
    fn rule_accepts_zero_limit() {
        let rule = RateLimitRule::new(0, 60).unwrap();
        assert_eq!(rule.limit, 0);
    }

    #[test]
    fn parameter_policy_requires_names() {
        let err = RateLimitPolicy::via_parameter("", 10, 60).unwrap_err();
        assert!(matches!(err, FloodgateError::Config(_)));

        // Only empty entries is as bad as no entries.
        let err = RateLimitPolicy::via_parameter(";;", 10, 60).unwrap_err();
        assert!(matches!(err, FloodgateError::Config(_)));
    }

    #[test]
    fn parameter_names_are_split_and_cleaned() {
        let policy = RateLimitPolicy::via_parameter("user;; tenant ", 10, 60).unwrap();
        assert_eq!(policy.parameter_names, vec!["user", "tenant"]);
    }

    #[test]
    fn ip_policy_ignores_names() {
        let policy = RateLimitPolicy::via_ip(100, period::ONE_MINUTE as i64).unwrap();
        assert!(policy.parameter_names.is_empty());
        assert_eq!(policy.rule(), RateLimitRule { limit: 100, period: 60 });
    }

    #[test]
    fn policy_deserializes_from_json() {
        let policy: RateLimitPolicy = serde_json::from_str(
            r#"{"source": "parameter", "limit": 5, "period": 60, "parameter_names": ["user"]}"#,
        )
        .unwrap();
        assert_eq!(policy.source, IdentitySource::Parameter);
        assert_eq!(policy.parameter_names, vec!["user"]);

        // parameter_names defaults to empty for the other sources.
        let policy: RateLimitPolicy =
            serde_json::from_str(r#"{"source": "ip", "limit": 5, "period": 60}"#).unwrap();
        assert_eq!(policy.source, IdentitySource::Ip);
        assert!(policy.parameter_names.is_empty());
    }
}
