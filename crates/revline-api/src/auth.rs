use std::path::PathBuf;
use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use jsonwebtoken::{EncodingKey, Header, encode};
use tracing::error;

use revline_db::Database;
use revline_db::models::{NewUser, UserRow};
use revline_types::api::{
    AuthResponse, Claims, LoginRequest, MessageResponse, PublicUser, SignupRequest,
};

use crate::error::{ApiError, join_error};
use crate::extract::ApiJson;

pub const SESSION_COOKIE: &str = "token";
/// Session lifetime; the cookie max-age matches the token expiry.
pub const SESSION_TTL_SECS: i64 = 3600;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
    pub upload_dir: PathBuf,
    pub secure_cookies: bool,
}

pub async fn signup(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<SignupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let username = req.username.trim().to_owned();
    let email = req.email.trim().to_owned();

    if username.is_empty() || username.len() > 32 {
        return Err(ApiError::Validation("username must be 1-32 characters".into()));
    }
    if !email.contains('@') {
        return Err(ApiError::Validation("a valid email is required".into()));
    }
    if req.password.is_empty() {
        return Err(ApiError::Validation("password is required".into()));
    }
    let display_name = req
        .display_name
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| username.clone());

    let password_hash = hash_password(&req.password)?;

    let db = state.clone();
    let user = tokio::task::spawn_blocking(move || {
        let id = db.db.create_user(&NewUser {
            username: &username,
            email: &email,
            password_hash: &password_hash,
            display_name: &display_name,
        })?;
        db.db.get_user_by_id(id)
    })
    .await
    .map_err(join_error)??
    .ok_or(ApiError::Internal)?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse { success: true, user: public_user(user) }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let username = req.username.clone();
    let user = tokio::task::spawn_blocking(move || db.db.get_user_by_username(&username))
        .await
        .map_err(join_error)??
        .ok_or(ApiError::InvalidCredentials)?;

    if !verify_password(&req.password, &user.password)? {
        return Err(ApiError::InvalidCredentials);
    }

    let token = issue_token(&state.jwt_secret, &user, chrono::Duration::seconds(SESSION_TTL_SECS))?;
    let jar = jar.add(session_cookie(token, state.secure_cookies));

    Ok((jar, Json(AuthResponse { success: true, user: public_user(user) })))
}

/// Tokens are stateless and self-contained, so logout is client-side cookie
/// clearing only; an already-issued token stays valid until natural expiry.
pub async fn logout(jar: CookieJar) -> impl IntoResponse {
    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    (jar, Json(MessageResponse { success: true, message: "logged out".into() }))
}

pub fn hash_password(plaintext: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plaintext.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!("password hashing failed: {e}");
            ApiError::Internal
        })
}

pub fn verify_password(plaintext: &str, hash: &str) -> Result<bool, ApiError> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!("stored password hash unreadable: {e}");
        ApiError::Internal
    })?;
    Ok(Argon2::default()
        .verify_password(plaintext.as_bytes(), &parsed)
        .is_ok())
}

pub fn issue_token(secret: &str, user: &UserRow, ttl: chrono::Duration) -> Result<String, ApiError> {
    let claims = Claims {
        sub: user.id,
        username: user.username.clone(),
        display_name: user.display_name.clone(),
        exp: (chrono::Utc::now() + ttl).timestamp() as usize,
    };

    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes())).map_err(|e| {
        error!("token encode failed: {e}");
        ApiError::Internal
    })
}

pub fn public_user(user: UserRow) -> PublicUser {
    PublicUser {
        id: user.id,
        username: user.username,
        email: user.email,
        display_name: user.display_name,
        bio: user.bio,
        avatar_url: user.avatar_url,
    }
}

fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE, token);
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_path("/");
    cookie.set_max_age(time::Duration::seconds(SESSION_TTL_SECS));
    cookie.set_secure(secure);
    cookie
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::decode_token;

    fn sample_user() -> UserRow {
        UserRow {
            id: 7,
            username: "abc".into(),
            email: "a@b.com".into(),
            password: String::new(),
            display_name: "abc".into(),
            bio: None,
            avatar_url: None,
            created_at: "2025-01-01 00:00:00".into(),
        }
    }

    #[test]
    fn password_hash_verifies_and_rejects_wrong_input() {
        let hash = hash_password("pw123").unwrap();
        assert_ne!(hash, "pw123");
        assert!(verify_password("pw123", &hash).unwrap());
        assert!(!verify_password("wrong", &hash).unwrap());
    }

    #[test]
    fn issued_token_decodes_to_the_same_claims() {
        let token = issue_token("secret", &sample_user(), chrono::Duration::hours(1)).unwrap();
        let claims = decode_token("secret", &token).unwrap();
        assert_eq!(claims.sub, 7);
        assert_eq!(claims.username, "abc");
        assert_eq!(claims.display_name, "abc");
    }

    #[test]
    fn expired_and_tampered_tokens_fail_the_same_way() {
        let expired =
            issue_token("secret", &sample_user(), chrono::Duration::seconds(-120)).unwrap();
        assert!(matches!(
            decode_token("secret", &expired),
            Err(ApiError::TokenInvalid)
        ));

        let good = issue_token("secret", &sample_user(), chrono::Duration::hours(1)).unwrap();
        assert!(matches!(
            decode_token("other-secret", &good),
            Err(ApiError::TokenInvalid)
        ));
        assert!(matches!(
            decode_token("secret", "not-a-token"),
            Err(ApiError::TokenInvalid)
        ));
    }

    #[test]
    fn session_cookie_carries_the_contracted_attributes() {
        let cookie = session_cookie("tok".into(), true);
        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert!(cookie.http_only().unwrap_or(false));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.max_age(), Some(time::Duration::seconds(3600)));
        assert!(cookie.secure().unwrap_or(false));
    }
}
