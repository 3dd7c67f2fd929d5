use serde::{Deserialize, Serialize};

// -- Session claims --

/// Signed session claims shared between revline-api (token issue on login)
/// and the auth middleware. Canonical definition lives here in revline-types
/// to eliminate duplication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub username: String,
    pub display_name: String,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub display_name: String,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub user: PublicUser,
}

/// Generic `{ success, message }` body shared by several endpoints.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

// -- Events & registrations --

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDto {
    pub id: i64,
    pub name: String,
    pub location: String,
    pub event_date: String,
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EventsResponse {
    pub success: bool,
    pub events: Vec<EventDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckRegistrationRequest {
    pub event_id: i64,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct CheckRegistrationResponse {
    pub registered: bool,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct CarInput {
    pub make: String,
    pub model: String,
    pub year: i64,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub mileage: Option<i64>,
    #[serde(default)]
    pub modifications: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterEventRequest {
    pub event_id: i64,
    pub user_id: i64,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub cars: Vec<CarInput>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRegistrationRequest {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub cars: Vec<CarInput>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CarDto {
    pub id: i64,
    pub make: String,
    pub model: String,
    pub year: i64,
    pub color: Option<String>,
    pub mileage: Option<i64>,
    pub modifications: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationDto {
    pub id: i64,
    pub event_id: i64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub cars: Vec<CarDto>,
}

#[derive(Debug, Serialize)]
pub struct RegistrationResponse {
    pub success: bool,
    pub registration: RegistrationDto,
}

// -- Businesses & reviews --

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessDto {
    pub id: i64,
    pub name: String,
    pub category: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BusinessesResponse {
    pub success: bool,
    pub businesses: Vec<BusinessDto>,
}

#[derive(Debug, Serialize)]
pub struct BusinessResponse {
    pub success: bool,
    pub business: BusinessDto,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewDto {
    pub id: i64,
    pub business_id: i64,
    pub user_id: i64,
    pub username: String,
    pub avatar_url: Option<String>,
    pub rating: i64,
    pub comment: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Serialize)]
pub struct ReviewsResponse {
    pub success: bool,
    pub reviews: Vec<ReviewDto>,
}

#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    pub rating: i64,
    #[serde(default)]
    pub comment: Option<String>,
}

// -- Profile & search --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdateRequest {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    /// Inline base64-encoded image (optionally a data URL); persisted to the
    /// upload directory and referenced by URL.
    #[serde(default)]
    pub avatar: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: i64,
    pub username: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub success: bool,
    pub users: Vec<UserSummary>,
    pub builds: Vec<BuildSummaryDto>,
}

// -- Builds --

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildSummaryDto {
    pub id: i64,
    pub user_id: i64,
    pub username: String,
    pub name: String,
    pub make: String,
    pub model: String,
    pub year: i64,
    pub ownership_status: String,
    pub cover_image_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BuildsResponse {
    pub success: bool,
    pub builds: Vec<BuildSummaryDto>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModDto {
    pub id: i64,
    pub category: String,
    pub sub_category: Option<String>,
    pub name: String,
    pub image_url: Option<String>,
    pub note: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildDto {
    pub id: i64,
    pub user_id: i64,
    pub username: String,
    pub name: String,
    pub make: String,
    pub model: String,
    pub year: i64,
    pub trim: Option<String>,
    pub ownership_status: String,
    pub horsepower: Option<i64>,
    pub torque: Option<i64>,
    pub description: Option<String>,
    pub cover_image_url: Option<String>,
    pub cover_image_url_2: Option<String>,
    pub gallery: Vec<String>,
    pub mods: Vec<ModDto>,
    pub is_owner: bool,
    pub created_at: String,
}

#[derive(Debug, Serialize)]
pub struct BuildResponse {
    pub success: bool,
    pub build: BuildDto,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewModInput {
    pub category: String,
    #[serde(default)]
    pub sub_category: Option<String>,
    pub name: String,
    #[serde(default)]
    pub note: Option<String>,
    /// Inline base64-encoded image for this mod.
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBuildRequest {
    pub name: String,
    pub make: String,
    pub model: String,
    pub year: i64,
    #[serde(default)]
    pub trim: Option<String>,
    pub ownership_status: String,
    #[serde(default)]
    pub horsepower: Option<i64>,
    #[serde(default)]
    pub torque: Option<i64>,
    #[serde(default)]
    pub description: Option<String>,
    /// Inline base64-encoded cover images; only the first two are kept.
    #[serde(default)]
    pub cover_images: Vec<String>,
    #[serde(default)]
    pub gallery_images: Vec<String>,
    #[serde(default)]
    pub mods: Vec<NewModInput>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileModInput {
    pub category: String,
    #[serde(default)]
    pub sub_category: Option<String>,
    pub name: String,
    #[serde(default)]
    pub note: Option<String>,
    /// When set, this entry consumes the next unconsumed entry of
    /// `new_mod_images`, paired positionally in transmission order.
    #[serde(default)]
    pub has_new_image: bool,
    /// Previously stored image URL to reuse when no new upload is expected.
    #[serde(default)]
    pub existing_image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBuildRequest {
    pub name: String,
    pub make: String,
    pub model: String,
    pub year: i64,
    #[serde(default)]
    pub trim: Option<String>,
    pub ownership_status: String,
    #[serde(default)]
    pub horsepower: Option<i64>,
    #[serde(default)]
    pub torque: Option<i64>,
    #[serde(default)]
    pub description: Option<String>,
    /// Cover URLs the caller kept, in order. New uploads are appended after
    /// these; anything beyond the two cover slots is dropped.
    #[serde(default)]
    pub kept_cover_urls: Vec<String>,
    #[serde(default)]
    pub new_cover_images: Vec<String>,
    /// Gallery URLs to retain; existing rows outside this set are deleted.
    #[serde(default)]
    pub kept_gallery_urls: Vec<String>,
    #[serde(default)]
    pub new_gallery_images: Vec<String>,
    /// New mod images in transmission order, consumed positionally by mods
    /// flagged `has_new_image`.
    #[serde(default)]
    pub new_mod_images: Vec<String>,
    #[serde(default)]
    pub mods: Vec<ReconcileModInput>,
}

// -- Follows --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowRequest {
    pub followed_id: i64,
}

#[derive(Debug, Serialize)]
pub struct FollowStatusResponse {
    pub success: bool,
    pub following: bool,
}

#[derive(Debug, Serialize)]
pub struct FollowListResponse {
    pub success: bool,
    pub users: Vec<UserSummary>,
}
