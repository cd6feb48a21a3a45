//! Remote source access
//!
//! [`RemoteFetcher`] issues one rate-limited, bounded-timeout GET per call
//! and decodes the JSON envelope. Failures are classified into
//! [`FetchError`] variants and never panic.
//!
//! The aggregation paths depend on the [`RemoteSource`] trait rather than
//! the concrete fetcher, so they can run against an in-memory source.
//!
//! ## Resources
//!
//! - `users` → directory of id → name
//! - `users/{id}/posts` → posts of one user
//! - `posts/{id}/comments` → comments of one post
//! - `primes` | `fibo` | `even` | `rand` → a batch of numbers

pub mod types;

pub use types::{Comment, Post, User};

use crate::error::FetchError;
use crate::numbers::Category;
use crate::rate_limiter::RateLimiter;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use types::{CommentsEnvelope, NumbersEnvelope, PostsEnvelope, UsersEnvelope};

/// Resources consumed by the aggregation paths
#[async_trait]
pub trait RemoteSource {
    /// Full user directory
    async fn fetch_users(&self) -> Result<Vec<User>, FetchError>;

    async fn fetch_user_posts(&self, user_id: &str) -> Result<Vec<Post>, FetchError>;

    async fn fetch_post_comments(&self, post_id: u64) -> Result<Vec<Comment>, FetchError>;

    /// Latest batch of numbers for a category
    async fn fetch_numbers(&self, category: Category) -> Result<Vec<i64>, FetchError>;
}

pub struct RemoteFetcher {
    client: reqwest::Client,
    base_url: String,
    bearer_token: Option<String>,
    limiter: Arc<RateLimiter>,
    /// Timeout for social-graph calls
    timeout: Duration,
    /// Timeout for number batches (the averaging path's budget)
    numbers_timeout: Duration,
    request_count: AtomicU64,
}

impl RemoteFetcher {
    /// `base_url` must end with `/`; sub-paths are appended verbatim.
    pub fn new(
        base_url: impl Into<String>,
        bearer_token: Option<String>,
        limiter: Arc<RateLimiter>,
        timeout: Duration,
        numbers_timeout: Duration,
    ) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| FetchError::Transport(format!("failed to build client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            bearer_token,
            limiter,
            timeout,
            numbers_timeout,
            request_count: AtomicU64::new(0),
        })
    }

    /// Number of requests issued so far
    pub fn request_count(&self) -> u64 {
        self.request_count.load(Ordering::Relaxed)
    }

    /// Fetch `path` under the base URL and decode it as `T`
    ///
    /// Waits for a rate-limit permit first. The timeout covers the whole
    /// exchange including the body.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        timeout: Duration,
    ) -> Result<T, FetchError> {
        self.limiter
            .acquire()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let count = self.request_count.fetch_add(1, Ordering::Relaxed) + 1;
        let url = format!("{}{}", self.base_url, path);
        log::debug!("Making request #{}: GET {}", count, url);

        let mut request = self.client.get(&url).timeout(timeout);
        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(classify_transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.bytes().await.map_err(classify_transport)?;
        serde_json::from_slice(&body).map_err(|e| FetchError::Decode(e.to_string()))
    }
}

fn classify_transport(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Transport(format!("request timed out: {}", err))
    } else if err.is_decode() {
        FetchError::Decode(err.to_string())
    } else {
        FetchError::Transport(err.to_string())
    }
}

#[async_trait]
impl RemoteSource for RemoteFetcher {
    async fn fetch_users(&self) -> Result<Vec<User>, FetchError> {
        let envelope: UsersEnvelope = self.get_json("users", self.timeout).await?;
        Ok(envelope.into_users())
    }

    async fn fetch_user_posts(&self, user_id: &str) -> Result<Vec<Post>, FetchError> {
        let path = format!("users/{}/posts", user_id);
        let envelope: PostsEnvelope = self.get_json(&path, self.timeout).await?;
        Ok(envelope.posts)
    }

    async fn fetch_post_comments(&self, post_id: u64) -> Result<Vec<Comment>, FetchError> {
        let path = format!("posts/{}/comments", post_id);
        let envelope: CommentsEnvelope = self.get_json(&path, self.timeout).await?;
        Ok(envelope.comments)
    }

    async fn fetch_numbers(&self, category: Category) -> Result<Vec<i64>, FetchError> {
        let envelope: NumbersEnvelope = self
            .get_json(category.resource_path(), self.numbers_timeout)
            .await?;
        Ok(envelope.numbers)
    }
}
