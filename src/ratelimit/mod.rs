//! Rate limiting core: counters, bucket keys, window blending, and the limiter.

mod counter;
mod identity;
mod key;
mod limiter;
mod rules;
mod window;

pub use counter::RateLimitCounter;
pub use identity::{resolve_identity, RequestContext, RequestIdentity};
pub use key::{build_counter_keys, CounterKeys};
pub use limiter::RateLimiter;
pub use rules::{period, IdentitySource, RateLimitPolicy, RateLimitRule};
pub use window::merge_windows;
