//! # feedstats
//!
//! Pulls numbers and social-graph data from a remote source and serves
//! derived statistics:
//!
//! - running averages over deduplicated, fixed-capacity windows
//!   ([`numbers`])
//! - top-K rankings built by a rate-limited concurrent fan-out
//!   ([`social`])
//!
//! All outbound calls go through [`remote::RemoteFetcher`], which holds a
//! permit from [`rate_limiter::RateLimiter`] for every request.


pub mod api;
pub mod config;
pub mod error;
pub mod numbers;
pub mod rate_limiter;
pub mod remote;
pub mod social;

pub use config::ServiceConfig;
pub use error::{FetchError, ServiceError};
pub use rate_limiter::RateLimiter;
pub use remote::{RemoteFetcher, RemoteSource};
