//! Request identity resolution.
//!
//! The host's interception layer (middleware, filter, tower service) fills a
//! [`RequestContext`] from whatever request type it has, and
//! [`resolve_identity`] turns it into the [`RequestIdentity`] the limiter
//! keys its buckets on.

use std::collections::HashMap;
use std::net::IpAddr;

use tracing::debug;

use crate::error::{FloodgateError, Result};

use super::rules::{IdentitySource, RateLimitPolicy};

/// The client identity, endpoint path, and verb a request is throttled under.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestIdentity {
    /// Caller-distinguishing token (IP, client id, or composite parameter string).
    pub identity: String,
    /// Lowercased endpoint path.
    pub path: String,
    /// Lowercased HTTP method.
    pub http_verb: String,
}

impl RequestIdentity {
    pub fn new(identity: impl Into<String>, path: &str, http_verb: &str) -> Self {
        Self {
            identity: identity.into(),
            path: path.to_lowercase(),
            http_verb: http_verb.to_lowercase(),
        }
    }
}

/// Framework-neutral view of an inbound request, populated by the host.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// The peer address, when the transport knows it.
    pub remote_addr: Option<IpAddr>,
    /// An authenticated or otherwise host-assigned client identifier.
    pub client_id: Option<String>,
    /// HTTP method.
    pub method: String,
    /// Request path.
    pub path: String,
    /// Query string values.
    pub query: HashMap<String, String>,
    /// Route values (path template captures).
    pub route: HashMap<String, String>,
}

impl RequestContext {
    /// Look a parameter up by name, query values first, then route values.
    ///
    /// Route values are lowercased; query values are taken verbatim.
    fn parameter_value(&self, name: &str) -> Option<String> {
        if let Some(value) = self.query.get(name) {
            return Some(value.clone());
        }
        self.route.get(name).map(|value| value.to_lowercase())
    }
}

/// Derive the identity a request should be throttled under, per the policy's
/// [`IdentitySource`].
///
/// An unresolvable identity (no peer address, no client id, or a missing
/// named parameter) is an [`FloodgateError::IdentityResolution`] error; the
/// request must not be evaluated against any quota in that case.
pub fn resolve_identity(policy: &RateLimitPolicy, ctx: &RequestContext) -> Result<RequestIdentity> {
    let identity = match policy.source {
        IdentitySource::Ip => {
            debug!("resolving client ip address as identity");
            ctx.remote_addr
                .map(|addr| addr.to_string())
                .ok_or_else(|| {
                    FloodgateError::IdentityResolution(
                        "request has no remote address to rate limit by".to_string(),
                    )
                })?
        }
        IdentitySource::ClientId => {
            debug!("resolving client id as identity");
            ctx.client_id.clone().ok_or_else(|| {
                FloodgateError::IdentityResolution(
                    "request has no client id to rate limit by".to_string(),
                )
            })?
        }
        IdentitySource::Parameter => {
            debug!(
                names = ?policy.parameter_names,
                "resolving parameter values as identity"
            );
            let mut identity = String::new();
            for name in &policy.parameter_names {
                let value = ctx.parameter_value(name).ok_or_else(|| {
                    FloodgateError::IdentityResolution(format!(
                        "parameter '{name}' should exist in query or route values"
                    ))
                })?;
                identity.push_str(&value);
            }
            identity
        }
    };

    Ok(RequestIdentity::new(identity, &ctx.path, &ctx.method))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> RequestContext {
        RequestContext {
            remote_addr: Some("203.0.113.9".parse().unwrap()),
            client_id: Some("client-42".to_string()),
            method: "GET".to_string(),
            path: "/API/Orders".to_string(),
            query: HashMap::from([("user".to_string(), "Alice".to_string())]),
            route: HashMap::from([("tenant".to_string(), "ACME".to_string())]),
        }
    }

    #[test]
    fn identity_lowercases_path_and_verb() {
        let identity = RequestIdentity::new("x", "/API/Orders", "GET");
        assert_eq!(identity.path, "/api/orders");
        assert_eq!(identity.http_verb, "get");
    }

    #[test]
    fn resolves_ip_identity() {
        let policy = RateLimitPolicy::via_ip(10, 60).unwrap();
        let identity = resolve_identity(&policy, &context()).unwrap();
        assert_eq!(identity.identity, "203.0.113.9");
    }

    #[test]
    fn resolves_client_id_identity() {
        let policy = RateLimitPolicy::via_client_id(10, 60).unwrap();
        let identity = resolve_identity(&policy, &context()).unwrap();
        assert_eq!(identity.identity, "client-42");
    }

    #[test]
    fn missing_remote_addr_is_a_resolution_error() {
        let policy = RateLimitPolicy::via_ip(10, 60).unwrap();
        let mut ctx = context();
        ctx.remote_addr = None;

        let err = resolve_identity(&policy, &ctx).unwrap_err();
        assert!(matches!(err, FloodgateError::IdentityResolution(_)));
    }

    #[test]
    fn parameter_identity_concatenates_in_order() {
        let policy = RateLimitPolicy::via_parameter("user;tenant", 10, 60).unwrap();
        let identity = resolve_identity(&policy, &context()).unwrap();

        // Query value verbatim, route value lowercased.
        assert_eq!(identity.identity, "Aliceacme");
    }

    #[test]
    fn query_value_wins_over_route_value() {
        let policy = RateLimitPolicy::via_parameter("user", 10, 60).unwrap();
        let mut ctx = context();
        ctx.route
            .insert("user".to_string(), "FromRoute".to_string());

        let identity = resolve_identity(&policy, &ctx).unwrap();
        assert_eq!(identity.identity, "Alice");
    }

    #[test]
    fn missing_parameter_is_a_resolution_error() {
        let policy = RateLimitPolicy::via_parameter("user;missing", 10, 60).unwrap();
        let err = resolve_identity(&policy, &context()).unwrap_err();

        match err {
            FloodgateError::IdentityResolution(message) => {
                assert!(message.contains("missing"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
