pub mod auth;
pub mod channels;
pub mod error;
pub mod middleware;
pub mod tokens;
pub mod urlnorm;

use std::sync::Arc;

use axum::{
    Router,
    routing::{delete, get, post},
};
use chrono::{DateTime, Utc};
use tracing::warn;
use uuid::Uuid;

use feedbox_db::Database;
use feedbox_ingest::FeedClient;

pub use error::ApiError;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Arc<Database>,
    pub feeds: FeedClient,
    pub auth: AuthConfig,
}

/// Process-wide auth configuration, read once at startup and injected —
/// never pulled from ambient environment inside request handling.
pub struct AuthConfig {
    pub jwt_secret: String,
    /// When set, issued tokens expire this long after issuance. Without
    /// it tokens live until explicitly revoked.
    pub token_ttl: Option<chrono::Duration>,
}

/// Full API router: public registration/login plus the authenticated
/// surface behind the token middleware.
pub fn router(state: AppState) -> Router {
    let public = Router::new()
        .route("/users", post(auth::register))
        .route("/users/login", post(auth::login))
        .with_state(state.clone());

    let protected = Router::new()
        .route("/users/me", get(auth::me))
        .route("/users/me/token", delete(auth::logout))
        .route("/users/channels", get(channels::list_channels))
        .route("/channels", post(channels::subscribe))
        .route(
            "/channels/{channel_id}",
            get(channels::get_channel_items)
                .patch(channels::edit_channel)
                .delete(channels::unsubscribe),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ))
        .with_state(state);

    Router::new().merge(public).merge(protected)
}

pub(crate) fn parse_uuid(raw: &str, what: &str) -> Uuid {
    raw.parse().unwrap_or_else(|e| {
        warn!("Corrupt {} '{}': {}", what, raw, e);
        Uuid::default()
    })
}

pub(crate) fn parse_db_time(raw: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            // SQLite defaults store "YYYY-MM-DD HH:MM:SS" without timezone.
            // Parse as naive UTC and convert.
            chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt timestamp '{}': {}", raw, e);
            DateTime::default()
        })
}
