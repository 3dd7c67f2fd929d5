use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use serde::Deserialize;

use revline_db::models::ProfileUpdate;
use revline_types::api::{AuthResponse, Claims, ProfileUpdateRequest, SearchResponse};

use crate::auth::{AppState, public_user};
use crate::builds::build_summary_dto;
use crate::error::{ApiError, join_error};
use crate::extract::{ApiJson, ApiQuery};
use crate::follows::user_summary;
use crate::uploads::{remove_image, save_image};

/// Self-only partial update. An inline avatar image is persisted first; the
/// previously stored avatar file is removed once the row points elsewhere.
pub async fn update_profile(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Extension(claims): Extension<Claims>,
    ApiJson(req): ApiJson<ProfileUpdateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if claims.sub != user_id {
        return Err(ApiError::Forbidden("you may only update your own profile"));
    }

    let new_avatar_url = match req.avatar.as_deref() {
        Some(payload) => Some(save_image(&state.upload_dir, payload).await?),
        None => None,
    };

    let db = state.clone();
    let previous_avatar = tokio::task::spawn_blocking(move || db.db.get_user_by_id(user_id))
        .await
        .map_err(join_error)??
        .ok_or(ApiError::NotFound("user not found"))?
        .avatar_url;

    let db = state.clone();
    let display_name = req.display_name;
    let bio = req.bio;
    let avatar_url = new_avatar_url.clone();
    let user = tokio::task::spawn_blocking(move || {
        db.db.update_profile(
            user_id,
            &ProfileUpdate {
                display_name: display_name.as_deref(),
                bio: bio.as_deref(),
                avatar_url: avatar_url.as_deref(),
            },
        )
    })
    .await
    .map_err(join_error)??;

    if new_avatar_url.is_some() {
        if let Some(old) = previous_avatar {
            remove_image(&state.upload_dir, &old).await;
        }
    }

    Ok(Json(AuthResponse { success: true, user: public_user(user) }))
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// Substring search over users and builds. Empty or whitespace-only queries
/// short-circuit to empty result sets without touching the store.
pub async fn search(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<SearchQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let Some(q) = normalized_query(&query.q) else {
        return Ok(Json(SearchResponse { success: true, users: vec![], builds: vec![] }));
    };

    let db = state.clone();
    let (users, builds) = tokio::task::spawn_blocking(move || {
        let users = db.db.search_users(&q)?;
        let builds = db.db.search_builds(&q)?;
        Ok::<_, revline_db::StoreError>((users, builds))
    })
    .await
    .map_err(join_error)??;

    Ok(Json(SearchResponse {
        success: true,
        users: users.into_iter().map(user_summary).collect(),
        builds: builds.into_iter().map(build_summary_dto).collect(),
    }))
}

pub(crate) fn normalized_query(q: &str) -> Option<String> {
    let trimmed = q.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_whitespace_queries_short_circuit() {
        assert!(normalized_query("").is_none());
        assert!(normalized_query("   ").is_none());
        assert!(normalized_query("\t\n").is_none());
    }

    #[test]
    fn real_queries_are_trimmed() {
        assert_eq!(normalized_query("  s13  ").as_deref(), Some("s13"));
    }
}
