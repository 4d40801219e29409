//! Session-token lifecycle: issued -> valid (any number of verifications)
//! -> revoked (terminal).
//!
//! Verification is stateful: a token must carry a valid signature *and*
//! still be a member of the user's stored token set. That is what makes
//! revoking one session observable while its siblings keep working.

use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

use feedbox_db::Database;
use feedbox_types::api::Claims;

use crate::AuthConfig;
use crate::error::ApiError;

/// Sign a token for the user and record it in their active-token set.
/// The token is only handed out once the record is durably written; a
/// signed-but-unrecorded token never leaves this function.
pub fn issue(db: &Database, cfg: &AuthConfig, user_id: Uuid, email: &str) -> Result<String, ApiError> {
    let now = chrono::Utc::now();
    let claims = Claims {
        sub: user_id,
        email: email.to_string(),
        jti: Uuid::new_v4(),
        iat: now.timestamp() as usize,
        exp: cfg
            .token_ttl
            .map(|ttl| (now + ttl).timestamp() as usize),
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(cfg.jwt_secret.as_bytes()),
    )
    .map_err(|e| ApiError::Internal(e.into()))?;

    db.insert_token(&token, &user_id.to_string())?;

    Ok(token)
}

/// Check signature, expiry (when a TTL is configured), and stored-set
/// membership. Every failure mode collapses to `AuthFailed`.
pub fn verify(db: &Database, cfg: &AuthConfig, token: &str) -> Result<Claims, ApiError> {
    let mut validation = Validation::default();
    validation.validate_exp = cfg.token_ttl.is_some();
    if cfg.token_ttl.is_none() {
        validation.required_spec_claims.clear();
    }

    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(cfg.jwt_secret.as_bytes()),
        &validation,
    )
    .map_err(|_| ApiError::AuthFailed)?;

    if !db.token_exists(&data.claims.sub.to_string(), token)? {
        return Err(ApiError::AuthFailed);
    }

    Ok(data.claims)
}

/// Remove exactly the presented token from the user's set. Sibling
/// sessions stay valid.
pub fn revoke(db: &Database, user_id: Uuid, token: &str) -> Result<(), ApiError> {
    if !db.delete_token(&user_id.to_string(), token)? {
        return Err(ApiError::NotFound);
    }
    Ok(())
}
