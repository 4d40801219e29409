use serde::{Deserialize, Serialize};
use uuid::Uuid;

// -- JWT Claims --

/// JWT claims shared between the token service (issuance) and the auth
/// middleware (verification). Canonical definition lives here in
/// feedbox-types to eliminate duplication.
///
/// `jti` is a fresh random id per issuance, so two logins in the same
/// second still mint distinct tokens that revoke independently. `exp` is
/// only present when the server is configured with a token TTL; without
/// one, tokens live until explicitly revoked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub jti: Uuid,
    pub iat: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<usize>,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    /// Optional confirmation field; when present it must equal `password`
    /// or registration fails before anything is persisted.
    pub verify_password: Option<String>,
    pub name: String,
    pub surname: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub surname: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

// -- Channels --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubscribeRequest {
    pub url: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EditChannelRequest {
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct ChannelResponse {
    pub id: Uuid,
    pub url: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Serialize)]
pub struct SubscriptionResponse {
    pub id: Uuid,
    pub channel_id: Uuid,
    pub url: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Serialize)]
pub struct SubscribeResponse {
    pub subscription: SubscriptionResponse,
    pub channel: ChannelResponse,
    /// True when the caller already held a link to this channel; the call
    /// is then a no-op the client may treat as success.
    pub already_subscribed: bool,
}

/// Outcome of a channel edit attempt. A channel that has ingested content
/// may be shared by other users, so its URL is frozen; the only path to a
/// different source is unsubscribe-and-resubscribe.
#[derive(Debug, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum EditOutcome {
    Edited { channel: ChannelResponse },
    Blocked { reason: String },
}

// -- Content items --

#[derive(Debug, Serialize)]
pub struct ItemResponse {
    pub id: Uuid,
    pub channel_id: Uuid,
    pub title: String,
    pub link: String,
    pub published_at: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}
