use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use revline_db::models::UserSummaryRow;
use revline_types::api::{
    Claims, FollowListResponse, FollowRequest, FollowStatusResponse, MessageResponse, UserSummary,
};

use crate::auth::AppState;
use crate::error::{ApiError, join_error};
use crate::extract::ApiJson;

pub async fn follow(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(req): ApiJson<FollowRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    tokio::task::spawn_blocking(move || db.db.follow(claims.sub, req.followed_id))
        .await
        .map_err(join_error)??;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse { success: true, message: "now following".into() }),
    ))
}

pub async fn unfollow(
    State(state): State<AppState>,
    Path(followed_id): Path<i64>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    tokio::task::spawn_blocking(move || db.db.unfollow(claims.sub, followed_id))
        .await
        .map_err(join_error)??;

    Ok(Json(MessageResponse { success: true, message: "unfollowed".into() }))
}

pub async fn follow_status(
    State(state): State<AppState>,
    Path(target_id): Path<i64>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let following = tokio::task::spawn_blocking(move || db.db.is_following(claims.sub, target_id))
        .await
        .map_err(join_error)??;

    Ok(Json(FollowStatusResponse { success: true, following }))
}

pub async fn list_followers(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let users = tokio::task::spawn_blocking(move || db.db.list_followers(user_id))
        .await
        .map_err(join_error)??;

    Ok(Json(FollowListResponse {
        success: true,
        users: users.into_iter().map(user_summary).collect(),
    }))
}

pub async fn list_following(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let users = tokio::task::spawn_blocking(move || db.db.list_following(user_id))
        .await
        .map_err(join_error)??;

    Ok(Json(FollowListResponse {
        success: true,
        users: users.into_iter().map(user_summary).collect(),
    }))
}

pub(crate) fn user_summary(row: UserSummaryRow) -> UserSummary {
    UserSummary {
        id: row.id,
        username: row.username,
        display_name: row.display_name,
        avatar_url: row.avatar_url,
    }
}
