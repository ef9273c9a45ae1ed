//! Admin query endpoints over the persisted turn log.

use axum::Json;
use axum::extract::{Path, Query, State};
use serde::Deserialize;
use serde_json::{Value, json};

use tatami_store::ListChatsQuery;
use tatami_types::error::GatewayError;
use tatami_types::event::ChannelKind;

use crate::ApiState;
use crate::error::ApiError;

const MAX_PAGE_SIZE: i64 = 100;

/// Query string for `GET /admin/chats`.
#[derive(Debug, Deserialize)]
pub struct ChatsParams {
    page: Option<i64>,
    limit: Option<i64>,
    search: Option<String>,
    channel: Option<String>,
}

/// `GET /admin/chats`
pub async fn list_chats(
    State(state): State<ApiState>,
    Query(params): Query<ChatsParams>,
) -> Result<Json<Value>, ApiError> {
    let page = params.page.unwrap_or(1);
    let limit = params.limit.unwrap_or(20);

    if page < 1 {
        return Err(GatewayError::InvalidInput("page must be >= 1".into()).into());
    }
    if !(1..=MAX_PAGE_SIZE).contains(&limit) {
        return Err(GatewayError::InvalidInput(format!(
            "limit must be between 1 and {MAX_PAGE_SIZE}"
        ))
        .into());
    }
    let channel = match params.channel.as_deref() {
        None => None,
        Some(tag) => Some(
            tag.parse::<ChannelKind>()
                .map_err(GatewayError::InvalidInput)?,
        ),
    };

    let (items, total) = state
        .store
        .list_chats(&ListChatsQuery {
            page,
            limit,
            search: params.search,
            channel,
        })
        .await?;

    Ok(Json(json!({
        "items": items,
        "page": page,
        "limit": limit,
        "total": total,
    })))
}

/// `GET /admin/chats/{id}`
///
/// `id` is the full session key, e.g. `wa:5215512345678`.
pub async fn get_chat(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let turns = state.store.get_chat(&id).await?;
    // get_chat never returns an empty history.
    let first = &turns[0];

    Ok(Json(json!({
        "session_id": id,
        "channel": first.channel,
        "user_id": first.user_id,
        "total_turns": turns.len(),
        "messages": turns,
    })))
}
