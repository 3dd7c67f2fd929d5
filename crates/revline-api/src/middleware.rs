use axum::{extract::Request, middleware::Next, response::Response};
use axum_extra::extract::cookie::CookieJar;
use jsonwebtoken::{DecodingKey, Validation, decode};

use revline_types::api::Claims;

use crate::auth::SESSION_COOKIE;
use crate::error::ApiError;

/// Caller identity for endpoints that are readable anonymously.
#[derive(Debug, Clone)]
pub struct MaybeClaims(pub Option<Claims>);

fn jwt_secret() -> String {
    std::env::var("REVLINE_JWT_SECRET").unwrap_or_else(|_| "dev-secret-change-me".into())
}

/// Expired and tampered tokens share one rejection class; callers cannot
/// tell them apart.
pub fn decode_token(secret: &str, token: &str) -> Result<Claims, ApiError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| ApiError::TokenInvalid)
}

/// Extract and validate the session token from the request cookie. The
/// decoded principal is attached for this call only.
pub async fn require_auth(mut req: Request, next: Next) -> Result<Response, ApiError> {
    let jar = CookieJar::from_headers(req.headers());
    let token = jar
        .get(SESSION_COOKIE)
        .map(|c| c.value().to_owned())
        .ok_or(ApiError::TokenMissing)?;

    let claims = decode_token(&jwt_secret(), &token)?;
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// Decode the caller when a valid cookie is present, but never reject.
pub async fn optional_auth(mut req: Request, next: Next) -> Response {
    let claims = CookieJar::from_headers(req.headers())
        .get(SESSION_COOKIE)
        .and_then(|c| decode_token(&jwt_secret(), c.value()).ok());
    req.extensions_mut().insert(MaybeClaims(claims));
    next.run(req).await
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request as HttpRequest, StatusCode, header};
    use axum::routing::{get, post};
    use axum::{Router, middleware};
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use crate::auth::{self, AppState, AppStateInner};
    use crate::{builds, events};

    use super::{optional_auth, require_auth};

    fn test_app() -> Router {
        let state: AppState = Arc::new(AppStateInner {
            db: revline_db::Database::open_in_memory().unwrap(),
            jwt_secret: "dev-secret-change-me".into(),
            upload_dir: std::env::temp_dir(),
            secure_cookies: false,
        });

        let public = Router::new()
            .route("/signup", post(auth::signup))
            .route("/login", post(auth::login))
            .route("/logout", post(auth::logout))
            .with_state(state.clone());

        let open = Router::new()
            .route("/builds", get(builds::list_builds))
            .layer(middleware::from_fn(optional_auth))
            .with_state(state.clone());

        let protected = Router::new()
            .route("/events", get(events::list_events))
            .route("/get-registration-details", get(events::get_registration_details))
            .layer(middleware::from_fn(require_auth))
            .with_state(state);

        public.merge(open).merge(protected)
    }

    fn json_post(uri: &str, body: Value) -> HttpRequest<Body> {
        HttpRequest::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(res: axum::response::Response) -> Value {
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn login_cookie(app: &Router) -> String {
        let created = app
            .clone()
            .oneshot(json_post(
                "/signup",
                json!({"username": "alex", "email": "alex@x.com", "password": "pw123"}),
            ))
            .await
            .unwrap();
        assert_eq!(created.status(), StatusCode::CREATED);

        let login = app
            .clone()
            .oneshot(json_post(
                "/login",
                json!({"username": "alex", "password": "pw123"}),
            ))
            .await
            .unwrap();
        assert_eq!(login.status(), StatusCode::OK);

        let set_cookie = login.headers()[header::SET_COOKIE].to_str().unwrap();
        assert!(set_cookie.starts_with("token="));
        // Name-value pair only; the attributes stay behind.
        set_cookie.split(';').next().unwrap().to_owned()
    }

    #[tokio::test]
    async fn session_cookie_round_trip_gates_protected_routes() {
        let app = test_app();
        let cookie = login_cookie(&app).await;

        let ok = app
            .clone()
            .oneshot(
                HttpRequest::get("/events")
                    .header(header::COOKIE, &cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(ok.status(), StatusCode::OK);
        let body = body_json(ok).await;
        assert_eq!(body["success"], true);
        assert!(!body["events"].as_array().unwrap().is_empty());

        let logout = app
            .clone()
            .oneshot(
                HttpRequest::post("/logout")
                    .header(header::COOKIE, &cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(logout.status(), StatusCode::OK);
        let cleared = logout.headers()[header::SET_COOKIE].to_str().unwrap();
        assert!(cleared.starts_with("token="));
        assert!(cleared.contains("Max-Age=0"));

        // Without the cookie the same request never reaches the handler.
        let anon = app
            .oneshot(HttpRequest::get("/events").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(anon.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(anon).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "TOKEN_MISSING");
    }

    #[tokio::test]
    async fn tampered_cookie_is_rejected_as_invalid() {
        let app = test_app();
        let res = app
            .oneshot(
                HttpRequest::get("/events")
                    .header(header::COOKIE, "token=not-a-token")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
        let body = body_json(res).await;
        assert_eq!(body["error"], "TOKEN_INVALID");
    }

    #[tokio::test]
    async fn build_reads_stay_open_to_anonymous_callers() {
        let app = test_app();
        let res = app
            .oneshot(HttpRequest::get("/builds").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body = body_json(res).await;
        assert_eq!(body["success"], true);
    }

    #[tokio::test]
    async fn malformed_query_parameters_use_the_standard_error_body() {
        let app = test_app();
        let cookie = login_cookie(&app).await;

        let res = app
            .oneshot(
                HttpRequest::get("/get-registration-details?eventId=soon")
                    .header(header::COOKIE, &cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body = body_json(res).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "VALIDATION_ERROR");
    }
}
