//! Remote source payload types
//!
//! Each resource answers with a JSON envelope holding a single named field.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Directory entry from `users`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: u64,
    #[serde(rename = "userId")]
    pub user_id: u64,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: u64,
    #[serde(rename = "postId")]
    pub post_id: u64,
    pub content: String,
}

/// `{"users": {"<id>": "<name>", ...}}`
#[derive(Debug, Deserialize)]
pub struct UsersEnvelope {
    pub users: HashMap<String, String>,
}

impl UsersEnvelope {
    /// Flatten the id→name map into directory entries
    pub fn into_users(self) -> Vec<User> {
        self.users
            .into_iter()
            .map(|(id, name)| User { id, name })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
pub struct PostsEnvelope {
    pub posts: Vec<Post>,
}

#[derive(Debug, Deserialize)]
pub struct CommentsEnvelope {
    pub comments: Vec<Comment>,
}

#[derive(Debug, Deserialize)]
pub struct NumbersEnvelope {
    pub numbers: Vec<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_users_envelope_flattens_map() {
        let envelope: UsersEnvelope =
            serde_json::from_str(r#"{"users": {"1": "John Doe", "2": "Jane Doe"}}"#).unwrap();
        let mut users = envelope.into_users();
        users.sort_by(|a, b| a.id.cmp(&b.id));

        assert_eq!(
            users,
            vec![
                User { id: "1".to_string(), name: "John Doe".to_string() },
                User { id: "2".to_string(), name: "Jane Doe".to_string() },
            ]
        );
    }

    #[test]
    fn test_posts_envelope_uses_camel_case() {
        let envelope: PostsEnvelope =
            serde_json::from_str(r#"{"posts": [{"id": 246, "userId": 1, "content": "Post about ant"}]}"#)
                .unwrap();
        assert_eq!(envelope.posts[0].user_id, 1);
        assert_eq!(envelope.posts[0].id, 246);
    }

    #[test]
    fn test_numbers_envelope_rejects_wrong_field() {
        let result: Result<NumbersEnvelope, _> = serde_json::from_str(r#"{"values": [1, 2]}"#);
        assert!(result.is_err());
    }
}
