//! HTTP handlers for direct messaging

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use shared::{ActionResult, ChannelFilter, Conversation, ConversationView, Message, SendMessageInput};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct OpenConversationInput {
    pub user_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct MarkReadResponse {
    pub marked: u64,
}

/// Channel descriptor plus the rendered filter string
#[derive(Debug, Serialize)]
pub struct ChannelResponse {
    #[serde(flatten)]
    pub channel: ChannelFilter,
    pub filter: String,
}

impl From<ChannelFilter> for ChannelResponse {
    fn from(channel: ChannelFilter) -> Self {
        Self {
            filter: channel.filter_expr(),
            channel,
        }
    }
}

pub async fn list_conversations(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<ConversationView>>> {
    let conversations = state.messages().list(current_user.0.user_id).await?;
    Ok(Json(conversations))
}

pub async fn open_conversation(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<OpenConversationInput>,
) -> AppResult<Json<ActionResult<Conversation>>> {
    let result = state
        .messages()
        .open(current_user.0.user_id, input.user_id)
        .await?;
    Ok(Json(result))
}

pub async fn list_messages(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(conversation_id): Path<Uuid>,
) -> AppResult<Json<Vec<Message>>> {
    let messages = state
        .messages()
        .messages(current_user.0.user_id, conversation_id)
        .await?;
    Ok(Json(messages))
}

pub async fn send_message(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(conversation_id): Path<Uuid>,
    Json(input): Json<SendMessageInput>,
) -> AppResult<Json<ActionResult<Message>>> {
    let result = state
        .messages()
        .send(current_user.0.user_id, conversation_id, &input.body)
        .await?;
    Ok(Json(result))
}

pub async fn mark_conversation_read(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(conversation_id): Path<Uuid>,
) -> AppResult<Json<MarkReadResponse>> {
    let marked = state
        .messages()
        .mark_read(current_user.0.user_id, conversation_id)
        .await?;
    Ok(Json(MarkReadResponse { marked }))
}

/// Realtime subscription for new messages in a conversation
pub async fn get_conversation_channel(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(conversation_id): Path<Uuid>,
) -> AppResult<Json<ChannelResponse>> {
    let channel = state
        .messages()
        .channel(current_user.0.user_id, conversation_id)
        .await?;
    Ok(Json(channel.into()))
}
