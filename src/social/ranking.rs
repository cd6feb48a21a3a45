//! Ranked projections over aggregated entities
//!
//! Lists are rebuilt in full on every request: sort by the requested
//! comparator, then truncate to the first `k`. Ties in count fall back to
//! ascending entity id so the order does not depend on directory
//! enumeration order.

use serde::Serialize;
use std::cmp::Ordering;

/// User with the number of posts they authored
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserPostCount {
    pub id: String,
    pub name: String,
    #[serde(rename = "postCount")]
    pub post_count: usize,
}

/// Post with the number of comments it received
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostCommentCount {
    pub id: String,
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "userName")]
    pub user_name: String,
    pub content: String,
    #[serde(rename = "commentCount")]
    pub comment_count: usize,
}

/// Ordering for the post ranking
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostOrder {
    /// Highest post id first
    Latest,
    /// Most comments first
    Popular,
}

impl PostOrder {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "latest" => Some(PostOrder::Latest),
            "popular" => Some(PostOrder::Popular),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PostOrder::Latest => "latest",
            PostOrder::Popular => "popular",
        }
    }
}

/// Compare ids numerically when both parse, lexicographically otherwise
pub fn compare_ids(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

/// Sort with `compare` and keep the first `k`
pub fn top_k<T, F>(mut items: Vec<T>, k: usize, compare: F) -> Vec<T>
where
    F: FnMut(&T, &T) -> Ordering,
{
    items.sort_by(compare);
    items.truncate(k);
    items
}

pub fn rank_users(users: Vec<UserPostCount>, k: usize) -> Vec<UserPostCount> {
    top_k(users, k, |a, b| {
        b.post_count
            .cmp(&a.post_count)
            .then_with(|| compare_ids(&a.id, &b.id))
    })
}

pub fn rank_posts(posts: Vec<PostCommentCount>, k: usize, order: PostOrder) -> Vec<PostCommentCount> {
    match order {
        PostOrder::Popular => top_k(posts, k, |a, b| {
            b.comment_count
                .cmp(&a.comment_count)
                .then_with(|| compare_ids(&a.id, &b.id))
                .then_with(|| compare_ids(&a.user_id, &b.user_id))
        }),
        PostOrder::Latest => top_k(posts, k, |a, b| {
            compare_ids(&b.id, &a.id).then_with(|| compare_ids(&a.user_id, &b.user_id))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str, post_count: usize) -> UserPostCount {
        UserPostCount {
            id: id.to_string(),
            name: format!("user {}", id),
            post_count,
        }
    }

    fn post(id: u64, comment_count: usize) -> PostCommentCount {
        PostCommentCount {
            id: id.to_string(),
            user_id: "1".to_string(),
            user_name: "user 1".to_string(),
            content: format!("post {}", id),
            comment_count,
        }
    }

    #[test]
    fn test_top_five_of_seven_users() {
        let users = vec![
            user("1", 3),
            user("2", 9),
            user("3", 1),
            user("4", 7),
            user("5", 0),
            user("6", 5),
            user("7", 8),
        ];

        let ranked = rank_users(users, 5);
        let ids: Vec<&str> = ranked.iter().map(|u| u.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "7", "4", "6", "1"]);
    }

    #[test]
    fn test_count_ties_break_by_ascending_id() {
        let ranked = rank_users(vec![user("10", 4), user("9", 4), user("2", 4)], 5);
        let ids: Vec<&str> = ranked.iter().map(|u| u.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "9", "10"]);
    }

    #[test]
    fn test_latest_sorts_by_numeric_post_id() {
        let ranked = rank_posts(vec![post(9, 0), post(150, 2), post(12, 7)], 5, PostOrder::Latest);
        let ids: Vec<&str> = ranked.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["150", "12", "9"]);
    }

    #[test]
    fn test_popular_sorts_by_comment_count() {
        let ranked = rank_posts(
            vec![post(1, 2), post(2, 5), post(3, 0), post(4, 5)],
            2,
            PostOrder::Popular,
        );
        let ids: Vec<&str> = ranked.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "4"]);
    }

    #[test]
    fn test_post_order_parsing() {
        assert_eq!(PostOrder::from_str("latest"), Some(PostOrder::Latest));
        assert_eq!(PostOrder::from_str("popular"), Some(PostOrder::Popular));
        assert_eq!(PostOrder::from_str("Popular"), None);
        assert_eq!(PostOrder::from_str(""), None);
    }

    #[test]
    fn test_top_k_with_fewer_items() {
        assert_eq!(top_k(vec![3, 1, 2], 5, |a, b| b.cmp(a)), vec![3, 2, 1]);
        assert!(top_k(Vec::<u8>::new(), 5, |a, b| a.cmp(b)).is_empty());
    }
}
