//! Token-bucket rate limiting.
//!
//! One bucket per (client key, scope name) pair, refilled all-or-nothing on
//! fixed window boundaries rather than leaking continuously. The whole
//! admit decision (lookup, refill check, rejection check, decrement) runs
//! under a single mutex so concurrent requests for the same key can never
//! both consume the last token. The critical section does no I/O.
//!
//! Buckets are created lazily and never removed on the request path; a
//! periodic [`RateLimiter::sweep`] drops buckets whose window expired long
//! ago so an open set of client keys cannot grow memory without bound.

mod limiter;

pub use limiter::{RateLimitExceeded, RateLimiter, RateScope};
