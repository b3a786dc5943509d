//! Floodgate - Sliding-Window Rate Limiting
//!
//! This crate throttles inbound requests per client identity using two
//! adjacent fixed counting windows blended into a sliding-window estimate.
//! Counters live in a pluggable [`store::CounterStore`], so the same core
//! works against a process-local cache or a networked one.
//!
//! The typical flow: a host resolves a [`ratelimit::RequestIdentity`] from
//! an inbound request (see [`ratelimit::resolve_identity`]), then asks
//! [`ratelimit::RateLimiter::process_request`] whether the request may
//! proceed under a [`ratelimit::RateLimitRule`].

pub mod clock;
pub mod error;
pub mod ratelimit;
pub mod store;
