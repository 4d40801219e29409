use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use feedbox_api::{AppStateInner, AuthConfig, router};
use feedbox_ingest::FeedClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "feedbox=debug,tower_http=debug".into()),
        )
        .init();

    // Config — the signing key is read once here and injected; nothing
    // else reads it from the environment.
    let jwt_secret =
        std::env::var("FEEDBOX_JWT_SECRET").unwrap_or_else(|_| "dev-secret-change-me".into());
    let db_path = std::env::var("FEEDBOX_DB_PATH").unwrap_or_else(|_| "feedbox.db".into());
    let host = std::env::var("FEEDBOX_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("FEEDBOX_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;
    let token_ttl = match std::env::var("FEEDBOX_TOKEN_TTL_SECS") {
        Ok(raw) => {
            let secs: i64 = raw.parse().context("FEEDBOX_TOKEN_TTL_SECS must be an integer")?;
            Some(chrono::Duration::seconds(secs))
        }
        Err(_) => None,
    };

    // Init database
    let db = Arc::new(feedbox_db::Database::open(&PathBuf::from(&db_path))?);

    // Shared state
    let state = Arc::new(AppStateInner {
        db,
        feeds: FeedClient::new(),
        auth: AuthConfig {
            jwt_secret,
            token_ttl,
        },
    });

    let app = router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Feedbox server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
