use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::error::ApiError;
use crate::{AppState, tokens};

/// The authenticated identity, injected into request extensions by
/// `require_auth`. Carries the presented token so logout can revoke
/// exactly that session.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: Uuid,
    pub email: String,
    pub token: String,
}

/// Extract the token from the x-auth header and resolve the user. Runs in
/// front of every channel-scoped route; the ownership guard still applies
/// afterwards per channel.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = req
        .headers()
        .get("x-auth")
        .and_then(|v| v.to_str().ok())
        .ok_or(ApiError::AuthFailed)?
        .to_string();

    let claims = tokens::verify(&state.db, &state.auth, &token)?;

    req.extensions_mut().insert(CurrentUser {
        id: claims.sub,
        email: claims.email,
        token,
    });

    Ok(next.run(req).await)
}
