use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{delete, get, post, put},
};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

use revline_api::auth::{self, AppState, AppStateInner};
use revline_api::middleware::{optional_auth, require_auth};
use revline_api::{builds, businesses, events, follows, users};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "revline=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let jwt_secret =
        std::env::var("REVLINE_JWT_SECRET").unwrap_or_else(|_| "dev-secret-change-me".into());
    let db_path = std::env::var("REVLINE_DB_PATH").unwrap_or_else(|_| "revline.db".into());
    let upload_dir =
        PathBuf::from(std::env::var("REVLINE_UPLOAD_DIR").unwrap_or_else(|_| "uploads".into()));
    let host = std::env::var("REVLINE_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("REVLINE_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;
    // Cookies are secure-flagged everywhere except explicit development
    let secure_cookies = secure_cookies_for(std::env::var("REVLINE_ENV").ok().as_deref());

    // Init database and upload storage
    let db = revline_db::Database::open(&PathBuf::from(&db_path))?;
    tokio::fs::create_dir_all(&upload_dir).await?;

    let state: AppState = Arc::new(AppStateInner {
        db,
        jwt_secret,
        upload_dir: upload_dir.clone(),
        secure_cookies,
    });

    // Routes
    let public_routes = Router::new()
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/check-registration", post(events::check_registration))
        .route("/register-event", post(events::register_event))
        .route("/businesses", get(businesses::list_businesses))
        .route("/businesses/{key}", get(businesses::get_business))
        .route("/businesses/{key}/reviews", get(businesses::list_reviews))
        .route("/search", get(users::search))
        .route("/follows/{user_id}/followers", get(follows::list_followers))
        .route("/follows/{user_id}/following", get(follows::list_following))
        .with_state(state.clone());

    // Build reads are public; a valid session only flips the isOwner flag.
    let optional_auth_routes = Router::new()
        .route("/builds", get(builds::list_builds))
        .route("/builds/{id}", get(builds::get_build))
        .layer(middleware::from_fn(optional_auth))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/events", get(events::list_events))
        .route("/get-registration-details", get(events::get_registration_details))
        .route("/update-event-registration/{id}", put(events::update_event_registration))
        .route("/businesses/{key}/reviews", post(businesses::create_review))
        .route("/reviews/{id}", put(businesses::update_review))
        .route("/profile/{user_id}", put(users::update_profile))
        .route("/builds", post(builds::create_build))
        .route("/builds/{id}", put(builds::update_build).delete(builds::delete_build))
        .route("/follows", post(follows::follow))
        .route("/follows/{user_id}", delete(follows::unfollow))
        .route("/follows/status/{user_id}", get(follows::follow_status))
        .layer(middleware::from_fn(require_auth))
        .with_state(state);

    let app = Router::new()
        .merge(public_routes)
        .merge(optional_auth_routes)
        .merge(protected_routes)
        .nest_service("/uploads", ServeDir::new(upload_dir))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{host}:{port}").parse()?;
    info!("Revline server listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Only an explicit `development` environment opts out of the Secure flag;
/// an unset variable gets the production behavior.
fn secure_cookies_for(env: Option<&str>) -> bool {
    env != Some("development")
}

#[cfg(test)]
mod tests {
    use super::secure_cookies_for;

    #[test]
    fn cookies_are_secure_unless_explicitly_development() {
        assert!(secure_cookies_for(None));
        assert!(secure_cookies_for(Some("production")));
        assert!(secure_cookies_for(Some("staging")));
        assert!(!secure_cookies_for(Some("development")));
    }
}
