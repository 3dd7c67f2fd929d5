use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use revline_db::models::{BusinessRow, ReviewRow};
use revline_types::api::{
    BusinessDto, BusinessResponse, BusinessesResponse, Claims, MessageResponse, ReviewDto,
    ReviewRequest, ReviewsResponse,
};

use crate::auth::AppState;
use crate::error::{ApiError, join_error};
use crate::extract::ApiJson;

pub async fn list_businesses(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let businesses = tokio::task::spawn_blocking(move || db.db.list_businesses())
        .await
        .map_err(join_error)??;

    Ok(Json(BusinessesResponse {
        success: true,
        businesses: businesses.into_iter().map(business_dto).collect(),
    }))
}

pub async fn get_business(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let business = tokio::task::spawn_blocking(move || db.db.get_business_by_name(&name))
        .await
        .map_err(join_error)??
        .ok_or(ApiError::NotFound("business not found"))?;

    Ok(Json(BusinessResponse { success: true, business: business_dto(business) }))
}

pub async fn list_reviews(
    State(state): State<AppState>,
    Path(business_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let reviews = tokio::task::spawn_blocking(move || db.db.list_reviews(business_id))
        .await
        .map_err(join_error)??;

    Ok(Json(ReviewsResponse {
        success: true,
        reviews: reviews.into_iter().map(review_dto).collect(),
    }))
}

pub async fn create_review(
    State(state): State<AppState>,
    Path(business_id): Path<i64>,
    Extension(claims): Extension<Claims>,
    ApiJson(req): ApiJson<ReviewRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_rating(req.rating)?;

    let db = state.clone();
    tokio::task::spawn_blocking(move || {
        db.db.create_review(business_id, claims.sub, req.rating, req.comment.as_deref())
    })
    .await
    .map_err(join_error)??;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse { success: true, message: "review submitted".into() }),
    ))
}

pub async fn update_review(
    State(state): State<AppState>,
    Path(review_id): Path<i64>,
    Extension(claims): Extension<Claims>,
    ApiJson(req): ApiJson<ReviewRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_rating(req.rating)?;

    let db = state.clone();
    tokio::task::spawn_blocking(move || {
        db.db.update_review(review_id, claims.sub, req.rating, req.comment.as_deref())
    })
    .await
    .map_err(join_error)??;

    Ok(Json(MessageResponse { success: true, message: "review updated".into() }))
}

/// Ratings are whole stars in [1,5]; non-integer payloads already fail JSON
/// deserialization.
fn validate_rating(rating: i64) -> Result<(), ApiError> {
    if !(1..=5).contains(&rating) {
        return Err(ApiError::Validation("rating must be an integer between 1 and 5".into()));
    }
    Ok(())
}

fn business_dto(row: BusinessRow) -> BusinessDto {
    BusinessDto {
        id: row.id,
        name: row.name,
        category: row.category,
        address: row.address,
        phone: row.phone,
        website: row.website,
        description: row.description,
    }
}

fn review_dto(row: ReviewRow) -> ReviewDto {
    ReviewDto {
        id: row.id,
        business_id: row.business_id,
        user_id: row.user_id,
        username: row.username,
        avatar_url: row.avatar_url,
        rating: row.rating,
        comment: row.comment,
        created_at: row.created_at,
    }
}
