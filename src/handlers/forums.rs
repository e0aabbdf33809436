//! `/api/forums` handlers

use axum::extract::State;
use axum::Json;
use serde_json::json;
use uuid::Uuid;

use crate::handlers::extract::{ApiJson, ApiPath, ApiQuery};
use crate::middleware::AuthUser;
use crate::models::forum::{
    CreatePostRequest, ForumAnalytics, ForumPostData, PostRangeQuery, TrendingForum, VoteDirection, VoteResult,
};
use crate::state::AppState;
use crate::utils::errors::Result;

pub async fn create_post(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(event_id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<CreatePostRequest>,
) -> Result<Json<ForumPostData>> {
    let post = state
        .services
        .forum_service
        .create_post(auth.id(), event_id, &request)
        .await?;
    Ok(Json(post))
}

pub async fn list_posts(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(event_id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<PostRangeQuery>,
) -> Result<Json<Vec<ForumPostData>>> {
    let posts = state
        .services
        .forum_service
        .list_posts(auth.id(), event_id, &query)
        .await?;
    Ok(Json(posts))
}

pub async fn leave_forum(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(event_id): ApiPath<Uuid>,
) -> Result<Json<serde_json::Value>> {
    state.services.forum_service.leave(auth.id(), event_id).await?;
    Ok(Json(json!({ "message": "Left the forum" })))
}

pub async fn forum_analytics(
    State(state): State<AppState>,
    ApiPath(event_id): ApiPath<Uuid>,
) -> Result<Json<ForumAnalytics>> {
    Ok(Json(state.services.forum_service.analytics(event_id).await?))
}

pub async fn upvote_post(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(post_id): ApiPath<Uuid>,
) -> Result<Json<VoteResult>> {
    let result = state
        .services
        .forum_service
        .vote(auth.id(), post_id, VoteDirection::Up)
        .await?;
    Ok(Json(result))
}

pub async fn downvote_post(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(post_id): ApiPath<Uuid>,
) -> Result<Json<VoteResult>> {
    let result = state
        .services
        .forum_service
        .vote(auth.id(), post_id, VoteDirection::Down)
        .await?;
    Ok(Json(result))
}

pub async fn trending_forums(State(state): State<AppState>) -> Result<Json<Vec<TrendingForum>>> {
    Ok(Json(state.services.forum_service.trending().await?))
}
