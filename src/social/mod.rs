//! Fan-out aggregation over the social graph
//!
//! Each request rebuilds its ranking from scratch:
//!
//! 1. Fetch the user directory. Failure aborts the request
//!    ([`ServiceError::TotalFailure`]).
//! 2. Spawn one unit per entity to fetch its children. A failed unit is
//!    logged and its entity dropped; siblings keep running.
//! 3. Join every unit before moving on.
//! 4. Merge counts, sort, truncate to `k`.
//!
//! Units run on a `JoinSet`. A unit is spawned only once it holds a slot
//! from a per-request semaphore, so at most `max_in_flight` units exist at
//! a time, on top of the rate limit enforced by the fetcher.

pub mod ranking;

pub use ranking::{PostCommentCount, PostOrder, UserPostCount};

use crate::error::{FetchError, ServiceError};
use crate::remote::{Post, RemoteSource, User};
use std::collections::HashMap;
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

pub struct FanOutAggregator {
    source: Arc<dyn RemoteSource + Send + Sync>,
    max_in_flight: usize,
}

impl FanOutAggregator {
    pub fn new(source: Arc<dyn RemoteSource + Send + Sync>, max_in_flight: usize) -> Self {
        Self {
            source,
            max_in_flight: max_in_flight.max(1),
        }
    }

    /// Top `k` users by number of posts
    pub async fn top_users_by_post_count(&self, k: usize) -> Result<Vec<UserPostCount>, ServiceError> {
        let users = self.directory().await?;
        let total = users.len();

        let ids: Vec<String> = users.iter().map(|u| u.id.clone()).collect();
        let post_counts = self
            .fan_out("posts", ids, |source, user_id: String| async move {
                source.fetch_user_posts(&user_id).await.map(|posts| posts.len())
            })
            .await;

        let names: HashMap<String, String> = users.into_iter().map(|u| (u.id, u.name)).collect();
        let ranked: Vec<UserPostCount> = post_counts
            .into_iter()
            .map(|(id, post_count)| UserPostCount {
                name: names.get(&id).cloned().unwrap_or_default(),
                id,
                post_count,
            })
            .collect();

        log::info!("📊 Ranked {}/{} users by post count", ranked.len(), total);
        Ok(ranking::rank_users(ranked, k))
    }

    /// Top `k` posts, either newest or most commented
    pub async fn top_posts_by_comment_count(
        &self,
        k: usize,
        order: PostOrder,
    ) -> Result<Vec<PostCommentCount>, ServiceError> {
        let users = self.directory().await?;

        let ids: Vec<String> = users.iter().map(|u| u.id.clone()).collect();
        let user_posts = self
            .fan_out("posts", ids, |source, user_id: String| async move {
                source.fetch_user_posts(&user_id).await
            })
            .await;

        // Posts are kept as reported; ids are not assumed unique across users
        let posts: Vec<Post> = user_posts.into_iter().flat_map(|(_, posts)| posts).collect();
        let total = posts.len();

        let mut post_ids: Vec<u64> = posts.iter().map(|post| post.id).collect();
        post_ids.sort_unstable();
        post_ids.dedup();
        let comment_counts: HashMap<u64, usize> = self
            .fan_out("comments", post_ids, |source, post_id: u64| async move {
                source
                    .fetch_post_comments(post_id)
                    .await
                    .map(|comments| comments.len())
            })
            .await
            .into_iter()
            .collect();

        let names: HashMap<String, String> = users.into_iter().map(|u| (u.id, u.name)).collect();
        let ranked: Vec<PostCommentCount> = posts
            .into_iter()
            .filter_map(|post| {
                let comment_count = *comment_counts.get(&post.id)?;
                let user_id = post.user_id.to_string();
                Some(PostCommentCount {
                    id: post.id.to_string(),
                    user_name: names.get(&user_id).cloned().unwrap_or_default(),
                    user_id,
                    content: post.content,
                    comment_count,
                })
            })
            .collect();

        log::info!(
            "📊 Ranked {}/{} posts ({})",
            ranked.len(),
            total,
            order.as_str()
        );
        Ok(ranking::rank_posts(ranked, k, order))
    }

    async fn directory(&self) -> Result<Vec<User>, ServiceError> {
        self.source.fetch_users().await.map_err(|e| {
            log::error!("❌ Failed to fetch user directory: {}", e);
            ServiceError::TotalFailure(e)
        })
    }

    /// Run `work` once per key and collect the successes
    ///
    /// Returns only after every unit has finished. Failures are logged
    /// with the key and dropped.
    async fn fan_out<K, T, F, Fut>(&self, stage: &'static str, keys: Vec<K>, work: F) -> Vec<(K, T)>
    where
        K: Clone + Display + Send + 'static,
        T: Send + 'static,
        F: Fn(Arc<dyn RemoteSource + Send + Sync>, K) -> Fut,
        Fut: Future<Output = Result<T, FetchError>> + Send + 'static,
    {
        let slots = Arc::new(Semaphore::new(self.max_in_flight));
        let mut units = JoinSet::new();

        for key in keys {
            // Wait for a free slot before spawning so at most `max_in_flight`
            // units exist at once. The semaphore is never closed.
            let slot = slots.clone().acquire_owned().await.ok();
            let unit = work(self.source.clone(), key.clone());
            units.spawn(async move {
                let _slot = slot;
                (key, unit.await)
            });
        }

        let mut collected = Vec::with_capacity(units.len());
        while let Some(joined) = units.join_next().await {
            match joined {
                Ok((key, Ok(value))) => collected.push((key, value)),
                Ok((key, Err(e))) => {
                    log::warn!("⚠️  Error fetching {} for {}: {}", stage, key, e);
                }
                Err(e) => {
                    log::warn!("⚠️  Fan-out unit for {} did not complete: {}", stage, e);
                }
            }
        }

        collected
    }
}
