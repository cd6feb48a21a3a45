//! HTTP surface
//!
//! Thin axum adapter: validates path/query parameters, calls into the
//! aggregation core, and shapes JSON envelopes. All failures render as a
//! plain-text body with the status from [`ServiceError::status_code`].
//!
//! Routes:
//! - `GET /numbers/{id}` → `{windowPrevState, windowCurrState, numbers, avg}`
//! - `GET /users` → `{users: [{id, name, postCount}]}`
//! - `GET /posts?type=latest|popular` → `{posts: [{id, userId, userName, content, commentCount}]}`

use crate::error::ServiceError;
use crate::numbers::{AverageService, Category, MergeOutcome};
use crate::social::{FanOutAggregator, PostCommentCount, PostOrder, UserPostCount};
use axum::{
    extract::{Path, Query, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

#[derive(Clone)]
pub struct AppState {
    pub averages: Arc<AverageService>,
    pub aggregator: Arc<FanOutAggregator>,
    /// Length of the ranked lists
    pub top_k: usize,
}

#[derive(Debug, Serialize)]
pub struct UsersResponse {
    pub users: Vec<UserPostCount>,
}

#[derive(Debug, Serialize)]
pub struct PostsResponse {
    pub posts: Vec<PostCommentCount>,
}

#[derive(Debug, Deserialize)]
pub struct PostsQuery {
    #[serde(rename = "type")]
    pub post_type: Option<String>,
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, self.to_string()).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/numbers/", get(missing_number_id_handler))
        .route("/numbers/{*id}", get(numbers_handler))
        .route("/users", get(top_users_handler))
        .route("/posts", get(top_posts_handler))
        .layer(middleware::from_fn(log_requests))
        .with_state(state)
}

fn invalid_number_id() -> ServiceError {
    ServiceError::Validation("Invalid number ID".to_string())
}

/// Any path under `/numbers/`; only a single known id is accepted
async fn numbers_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MergeOutcome>, ServiceError> {
    let category = Category::from_id(&id).ok_or_else(invalid_number_id)?;

    let outcome = state.averages.average(category).await?;
    Ok(Json(outcome))
}

async fn missing_number_id_handler() -> ServiceError {
    invalid_number_id()
}

async fn top_users_handler(State(state): State<AppState>) -> Result<Json<UsersResponse>, ServiceError> {
    let users = state.aggregator.top_users_by_post_count(state.top_k).await?;
    Ok(Json(UsersResponse { users }))
}

async fn top_posts_handler(
    State(state): State<AppState>,
    Query(query): Query<PostsQuery>,
) -> Result<Json<PostsResponse>, ServiceError> {
    let order = query
        .post_type
        .as_deref()
        .and_then(PostOrder::from_str)
        .ok_or_else(|| {
            ServiceError::Validation("Invalid post type. Use 'latest' or 'popular'".to_string())
        })?;

    let posts = state
        .aggregator
        .top_posts_by_comment_count(state.top_k, order)
        .await?;
    Ok(Json(PostsResponse { posts }))
}

async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(request).await;

    let status = response.status();
    if status.is_server_error() {
        log::error!(
            "{} {} -> {} in {}ms",
            method,
            path,
            status.as_u16(),
            started.elapsed().as_millis()
        );
    } else {
        log::info!(
            "{} {} -> {} in {}ms",
            method,
            path,
            status.as_u16(),
            started.elapsed().as_millis()
        );
    }
    response
}
