//! PostgREST HTTP adapter for the record store port.

pub mod client;
pub mod encode;
pub mod error;
pub mod rate_limiter;
pub mod retry;

pub use client::PostgrestClient;
pub use rate_limiter::RequestRateLimiter;
pub use retry::RetryPolicy;
