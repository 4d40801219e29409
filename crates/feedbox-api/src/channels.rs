use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::{error, warn};
use uuid::Uuid;

use feedbox_db::StoreError;
use feedbox_db::models::{ChannelRow, SubscriptionRow};
use feedbox_types::api::{
    ChannelResponse, EditChannelRequest, EditOutcome, ItemResponse, SubscribeRequest,
    SubscribeResponse, SubscriptionResponse,
};

use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::{AppState, parse_db_time, parse_uuid, urlnorm};

/// How many items one channel read returns, newest first.
const ITEM_PAGE_SIZE: u32 = 20;

/// Subscribe the caller to a feed URL. Channel find-or-create and link
/// insert run as one storage transaction; a repeat subscribe comes back
/// 200 with `already_subscribed` set instead of erroring.
pub async fn subscribe(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(req): Json<SubscribeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let canonical = urlnorm::normalize(&req.url)?;

    // Run the blocking transaction off the async runtime
    let db = state.db.clone();
    let uid = current.id.to_string();
    let result = tokio::task::spawn_blocking(move || {
        db.create_subscription(
            &Uuid::new_v4().to_string(),
            &uid,
            &Uuid::new_v4().to_string(),
            &canonical,
        )
    })
    .await
    .map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        ApiError::Internal(anyhow::anyhow!("subscribe task failed"))
    })??;

    // First subscriber anywhere triggers one synchronous ingest pass.
    // Fetch or parse failures are logged, never surfaced: the subscription
    // itself already succeeded, and the scheduler will retry later.
    if result.channel_created {
        if let Err(e) = state
            .feeds
            .fetch_and_store(state.db.clone(), &result.channel.id, &result.channel.url)
            .await
        {
            warn!("Initial fetch for {} failed: {}", result.channel.url, e);
        }
    }

    let status = if result.already_subscribed {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };

    let channel_url = result.channel.url.clone();
    Ok((
        status,
        Json(SubscribeResponse {
            subscription: subscription_response(result.subscription, channel_url),
            channel: channel_response(result.channel),
            already_subscribed: result.already_subscribed,
        }),
    ))
}

/// Attempt to change a channel's source URL. Allowed only while the
/// channel has no content items; after that other users may share it, so
/// the caller is pointed at unsubscribe-and-resubscribe instead.
pub async fn edit_channel(
    State(state): State<AppState>,
    Path(channel_id): Path<Uuid>,
    Extension(current): Extension<CurrentUser>,
    Json(req): Json<EditChannelRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let link = confirm_ownership(&state, &current, channel_id)?;

    if state.db.channel_has_items(&link.channel_id)? {
        return Ok(Json(EditOutcome::Blocked {
            reason: "has content items".into(),
        }));
    }

    let canonical = urlnorm::normalize(&req.url)?;

    match state.db.update_channel_url(&link.channel_id, &canonical) {
        Ok(()) => {}
        // Another channel already owns the new URL; merging links is not a
        // thing, so the caller must move over by resubscribing.
        Err(StoreError::Conflict(_)) => {
            return Err(ApiError::Validation(
                "url already registered; unsubscribe and resubscribe instead".into(),
            ));
        }
        Err(e) => return Err(e.into()),
    }

    let channel = state
        .db
        .get_channel(&link.channel_id)?
        .ok_or(ApiError::NotFound)?;

    Ok(Json(EditOutcome::Edited {
        channel: channel_response(channel),
    }))
}

/// Remove only the caller's link. The channel and its items survive for
/// any other subscribers (and for none, until a maintenance pass).
pub async fn unsubscribe(
    State(state): State<AppState>,
    Path(channel_id): Path<Uuid>,
    Extension(current): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let link = confirm_ownership(&state, &current, channel_id)?;

    if !state.db.delete_subscription(&link.id)? {
        return Err(ApiError::NotFound);
    }

    let channel_url = state
        .db
        .get_channel(&link.channel_id)?
        .map(|c| c.url)
        .unwrap_or_default();

    Ok(Json(subscription_response(link, channel_url)))
}

pub async fn list_channels(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = state.db.list_subscriptions(&current.id.to_string())?;

    let subscriptions: Vec<SubscriptionResponse> = rows
        .into_iter()
        .map(|row| SubscriptionResponse {
            id: parse_uuid(&row.subscription_id, "subscription id"),
            channel_id: parse_uuid(&row.channel_id, "channel id"),
            url: row.url,
            created_at: parse_db_time(&row.created_at),
        })
        .collect();

    Ok(Json(subscriptions))
}

pub async fn get_channel_items(
    State(state): State<AppState>,
    Path(channel_id): Path<Uuid>,
    Extension(current): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let link = confirm_ownership(&state, &current, channel_id)?;

    let rows = state.db.get_items(&link.channel_id, ITEM_PAGE_SIZE)?;

    let items: Vec<ItemResponse> = rows
        .into_iter()
        .map(|row| ItemResponse {
            id: parse_uuid(&row.id, "item id"),
            channel_id: parse_uuid(&row.channel_id, "channel id"),
            title: row.title,
            link: row.link,
            published_at: row.published_at,
            created_at: parse_db_time(&row.created_at),
        })
        .collect();

    Ok(Json(items))
}

/// The ownership chokepoint for every channel-scoped route. A channel the
/// user is not linked to and a channel that does not exist produce the
/// same `NotFound`.
fn confirm_ownership(
    state: &AppState,
    current: &CurrentUser,
    channel_id: Uuid,
) -> Result<SubscriptionRow, ApiError> {
    state
        .db
        .confirm_ownership(&current.id.to_string(), &channel_id.to_string())?
        .ok_or(ApiError::NotFound)
}

fn channel_response(row: ChannelRow) -> ChannelResponse {
    ChannelResponse {
        id: parse_uuid(&row.id, "channel id"),
        url: row.url,
        created_at: parse_db_time(&row.created_at),
    }
}

fn subscription_response(row: SubscriptionRow, url: String) -> SubscriptionResponse {
    SubscriptionResponse {
        id: parse_uuid(&row.id, "subscription id"),
        channel_id: parse_uuid(&row.channel_id, "channel id"),
        url,
        created_at: parse_db_time(&row.created_at),
    }
}
