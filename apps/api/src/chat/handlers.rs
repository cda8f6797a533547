//! Axum route handlers for chat sessions.
//!
//! Every route requires an authenticated user id, and a session is only
//! visible to the user that owns it: a foreign session is 403, a missing one 404.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Map, Value};
use tracing::{debug, info};

use crate::auth::AuthUser;
use crate::chat::validation::{validate_create, validate_update};
use crate::clock;
use crate::errors::AppError;
use crate::models::chat::{ChatSession, MessageSummary};
use crate::state::AppState;
use crate::store::{
    collections, sort_newest_first, to_fields, Document, DocumentStore, Filter, StoreError,
};

/// Fetches a session and checks that `user_id` owns it.
async fn load_owned_session(
    store: &dyn DocumentStore,
    id: &str,
    user_id: &str,
) -> Result<Document, AppError> {
    let doc = store
        .get(collections::CHAT_SESSIONS, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Chat session not found".to_string()))?;

    if doc.get_str("userId") != Some(user_id) {
        return Err(AppError::Forbidden);
    }
    Ok(doc)
}

/// GET /api/chats
pub async fn handle_list_sessions(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Value>, AppError> {
    let user_id = auth.require_user_id()?;

    let mut sessions = state
        .store
        .query(
            collections::CHAT_SESSIONS,
            &[Filter::eq("userId", user_id)],
            None,
        )
        .await?;
    sort_newest_first(&mut sessions, &["updatedAt", "createdAt"]);
    debug!("Found {} chat sessions for user {user_id}", sessions.len());

    let data: Vec<Value> = sessions.into_iter().map(Document::into_json).collect();
    Ok(Json(json!({ "success": true, "data": data })))
}

/// GET /api/chats/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let user_id = auth.require_user_id()?;
    let doc = load_owned_session(state.store.as_ref(), &id, user_id).await?;
    Ok(Json(json!({ "success": true, "data": doc.into_json() })))
}

/// POST /api/chats
pub async fn handle_create_session(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let user_id = auth.require_user_id()?;
    let request = validate_create(&body).map_err(AppError::Validation)?;

    let session = ChatSession::new(
        user_id.to_string(),
        request.title,
        request.mode,
        request.messages.unwrap_or_default(),
        clock::now_ist_iso(),
    );
    let data = to_fields(&session)?;
    let id = state
        .store
        .add(collections::CHAT_SESSIONS, data.clone())
        .await?;
    info!(
        "Created chat session {id} for user {user_id} ({} messages)",
        session.message_count
    );

    let doc = Document { id, data };
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "data": doc.into_json() })),
    ))
}

/// PUT /api/chats/:id
///
/// Only fields present in the body change. The message-derived summary
/// (`messageCount`, `preview`, `lastMessage`) is recomputed when `messages`
/// is supplied and left untouched otherwise.
pub async fn handle_update_session(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, AppError> {
    let user_id = auth.require_user_id()?;
    load_owned_session(state.store.as_ref(), &id, user_id).await?;

    let request = validate_update(&body).map_err(AppError::Validation)?;
    if request.preview.is_some() || request.last_message.is_some() {
        debug!("Ignoring client-supplied summary fields for chat session {id}");
    }

    let mut patch = Map::new();
    if let Some(title) = request.title {
        patch.insert("title".to_string(), Value::String(title));
    }
    if let Some(mode) = request.mode {
        patch.insert("mode".to_string(), json!(mode));
    }
    if let Some(messages) = request.messages {
        let summary = MessageSummary::of(&messages);
        patch.insert("messageCount".to_string(), json!(summary.message_count));
        patch.insert("preview".to_string(), Value::String(summary.preview));
        patch.insert("lastMessage".to_string(), Value::String(summary.last_message));
        let messages = serde_json::to_value(messages).map_err(StoreError::from)?;
        patch.insert("messages".to_string(), messages);
    }
    patch.insert("updatedAt".to_string(), Value::String(clock::now_ist_iso()));

    state
        .store
        .update(collections::CHAT_SESSIONS, &id, patch)
        .await?;

    let updated = state
        .store
        .get(collections::CHAT_SESSIONS, &id)
        .await?
        .ok_or_else(|| AppError::NotFound("Chat session not found".to_string()))?;
    Ok(Json(json!({ "success": true, "data": updated.into_json() })))
}

/// DELETE /api/chats/:id
pub async fn handle_delete_session(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let user_id = auth.require_user_id()?;
    load_owned_session(state.store.as_ref(), &id, user_id).await?;

    state.store.delete(collections::CHAT_SESSIONS, &id).await?;
    info!("Deleted chat session {id} for user {user_id}");

    Ok(Json(
        json!({ "success": true, "message": "Chat session deleted" }),
    ))
}
