use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{
    Extension, Json,
    extract::State,
    http::{HeaderName, StatusCode},
    response::IntoResponse,
};
use uuid::Uuid;

use feedbox_db::StoreError;
use feedbox_db::models::UserRow;
use feedbox_types::api::{LoginRequest, RegisterRequest, UserResponse};

use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::{AppState, parse_db_time, parse_uuid, tokens};

const X_AUTH: HeaderName = HeaderName::from_static("x-auth");

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    // Everything is checked before anything is persisted; a mismatched
    // confirmation must not leave a half-created user behind.
    if !req.email.contains('@') || req.email.len() < 3 {
        return Err(ApiError::Validation("invalid email".into()));
    }
    if req.password.len() < 8 {
        return Err(ApiError::Validation("password too short".into()));
    }
    if req.name.trim().is_empty() || req.surname.trim().is_empty() {
        return Err(ApiError::Validation("name and surname are required".into()));
    }
    if let Some(verify) = &req.verify_password {
        if *verify != req.password {
            return Err(ApiError::Validation("passwords don't match".into()));
        }
    }

    // Hash password with Argon2id
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("password hashing failed: {}", e)))?
        .to_string();

    let user_id = Uuid::new_v4();

    state
        .db
        .create_user(
            &user_id.to_string(),
            &req.email,
            &password_hash,
            &req.name,
            &req.surname,
        )
        .map_err(|e| match e {
            StoreError::Conflict(_) => ApiError::Validation("email already registered".into()),
            other => other.into(),
        })?;

    let token = tokens::issue(&state.db, &state.auth, user_id, &req.email)?;

    let user = state
        .db
        .get_user_by_id(&user_id.to_string())?
        .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("user vanished after insert")))?;

    Ok((
        StatusCode::CREATED,
        [(X_AUTH, token)],
        Json(user_response(user)),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    // Unknown email and wrong password are indistinguishable to the caller.
    let user = state
        .db
        .get_user_by_email(&req.email)?
        .ok_or(ApiError::AuthFailed)?;

    let parsed_hash = PasswordHash::new(&user.password)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("corrupt stored hash: {}", e)))?;

    Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .map_err(|_| ApiError::AuthFailed)?;

    let user_id = parse_uuid(&user.id, "user id");
    let token = tokens::issue(&state.db, &state.auth, user_id, &user.email)?;

    Ok((StatusCode::OK, [(X_AUTH, token)], Json(user_response(user))))
}

pub async fn me(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .db
        .get_user_by_id(&current.id.to_string())?
        .ok_or(ApiError::AuthFailed)?;

    Ok(Json(user_response(user)))
}

/// Revokes exactly the token this request authenticated with; the user's
/// other sessions stay live.
pub async fn logout(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    tokens::revoke(&state.db, current.id, &current.token)?;
    Ok(StatusCode::OK)
}

fn user_response(row: UserRow) -> UserResponse {
    UserResponse {
        id: parse_uuid(&row.id, "user id"),
        email: row.email,
        name: row.name,
        surname: row.surname,
        created_at: parse_db_time(&row.created_at),
    }
}
