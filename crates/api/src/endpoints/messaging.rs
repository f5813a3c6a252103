//! Messaging endpoints for direct messages.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use base64::Engine as _;
use chrono::{DateTime, Utc};
use mutuelle_common::{AppError, AppResult};
use mutuelle_core::{AttachmentUpload, CreateMessageInput};
use mutuelle_db::entities::{attachment, message, message::MessageKind};
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Create messaging router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_conversations))
        .route("/unread/count", get(get_unread_count))
        .route("/history/{user_id}", get(get_conversation))
        .route("/history/{user_id}", post(send_message))
        .route("/message/{message_id}/read", post(mark_read))
        .route("/message/{message_id}/unread", post(mark_unread))
        .route("/message/{message_id}/attachments", get(get_attachments))
}

/// Message response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub id: String,
    pub conversation_id: String,
    pub sender_id: String,
    pub recipient_id: String,
    pub title: Option<String>,
    pub text: String,
    pub kind: MessageKind,
    pub is_read: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<message::Model> for MessageResponse {
    fn from(msg: message::Model) -> Self {
        Self {
            id: msg.id,
            conversation_id: msg.conversation_id,
            sender_id: msg.sender_id,
            recipient_id: msg.recipient_id,
            title: msg.title,
            text: msg.text,
            kind: msg.kind,
            is_read: msg.is_read,
            read_at: msg.read_at.map(Into::into),
            created_at: msg.created_at.into(),
        }
    }
}

/// Attachment response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentResponse {
    pub id: String,
    pub file_name: String,
    pub url: String,
    pub category: attachment::FileCategory,
    pub size: i64,
}

impl From<attachment::Model> for AttachmentResponse {
    fn from(a: attachment::Model) -> Self {
        Self {
            id: a.id,
            file_name: a.file_name,
            url: a.url,
            category: a.category,
            size: a.size,
        }
    }
}

/// Conversation summary response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationResponse {
    pub conversation_id: String,
    pub partner_id: String,
    pub unread_count: u64,
    pub message_count: u64,
    pub last_message: Option<MessageResponse>,
    pub last_activity_at: DateTime<Utc>,
}

/// List conversations response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationsListResponse {
    pub conversations: Vec<ConversationResponse>,
}

/// List conversations query.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListConversationsQuery {
    pub limit: Option<u64>,
}

const fn default_limit() -> u64 {
    20
}

/// List conversations for the authenticated user.
async fn list_conversations(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ListConversationsQuery>,
) -> AppResult<ApiResponse<ConversationsListResponse>> {
    let summaries = state
        .messaging_service
        .conversations_for_user(&user.id, query.limit)
        .await?;

    let conversations: Vec<ConversationResponse> = summaries
        .into_iter()
        .map(|s| ConversationResponse {
            conversation_id: s.conversation.id,
            partner_id: s.partner_id,
            unread_count: s.unread_count,
            message_count: s.message_count,
            last_message: s.last_message.map(MessageResponse::from),
            last_activity_at: s.last_activity_at.into(),
        })
        .collect();

    Ok(ApiResponse::ok(ConversationsListResponse { conversations }))
}

/// Get conversation query.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetConversationQuery {
    #[serde(default = "default_limit")]
    pub limit: u64,
    pub until_id: Option<String>,
}

/// Message list response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageListResponse {
    pub messages: Vec<MessageResponse>,
}

/// Get messages exchanged with another user.
async fn get_conversation(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(partner_id): Path<String>,
    Query(query): Query<GetConversationQuery>,
) -> AppResult<ApiResponse<MessageListResponse>> {
    let messages = state
        .messaging_service
        .get_conversation_messages(&user.id, &partner_id, query.limit, query.until_id.as_deref())
        .await?;

    let messages: Vec<MessageResponse> = messages.into_iter().map(MessageResponse::from).collect();

    Ok(ApiResponse::ok(MessageListResponse { messages }))
}

/// Attachment payload (base64-encoded content).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentPayload {
    pub file_name: String,
    pub data: String,
}

/// Send message request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    pub title: Option<String>,
    #[validate(length(min = 1, message = "text is required"))]
    pub text: String,
    pub kind: Option<MessageKind>,
    #[serde(default)]
    pub attachments: Vec<AttachmentPayload>,
}

/// Sent message response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SentMessageResponse {
    #[serde(flatten)]
    pub message: MessageResponse,
    pub attachments: Vec<AttachmentResponse>,
}

/// Send a message to another user.
async fn send_message(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(recipient_id): Path<String>,
    Json(req): Json<SendMessageRequest>,
) -> AppResult<ApiResponse<SentMessageResponse>> {
    req.validate()?;

    info!(
        sender = %user.id,
        recipient = %recipient_id,
        "Sending message"
    );

    let attachments = decode_attachments(req.attachments)?;

    let input = CreateMessageInput {
        title: req.title,
        text: req.text,
        kind: req.kind.unwrap_or_default(),
        attachments,
    };

    let sent = state
        .messaging_service
        .send_message(&user.id, &recipient_id, input)
        .await?;

    Ok(ApiResponse::ok(SentMessageResponse {
        message: MessageResponse::from(sent.message),
        attachments: sent
            .attachments
            .into_iter()
            .map(AttachmentResponse::from)
            .collect(),
    }))
}

pub(crate) fn decode_attachments(
    payloads: Vec<AttachmentPayload>,
) -> AppResult<Vec<AttachmentUpload>> {
    payloads
        .into_iter()
        .map(|p| {
            let data = base64::engine::general_purpose::STANDARD
                .decode(&p.data)
                .map_err(|_| {
                    AppError::Validation(format!("Attachment is not valid base64: {}", p.file_name))
                })?;
            Ok(AttachmentUpload {
                file_name: p.file_name,
                data,
            })
        })
        .collect()
}

/// Mark a message as read.
async fn mark_read(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(message_id): Path<String>,
) -> AppResult<ApiResponse<MessageResponse>> {
    let message = state
        .messaging_service
        .mark_read(&user.id, &message_id)
        .await?;

    Ok(ApiResponse::ok(MessageResponse::from(message)))
}

/// Mark a message as unread.
async fn mark_unread(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(message_id): Path<String>,
) -> AppResult<ApiResponse<MessageResponse>> {
    let message = state
        .messaging_service
        .mark_unread(&user.id, &message_id)
        .await?;

    Ok(ApiResponse::ok(MessageResponse::from(message)))
}

/// Attachment list response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentListResponse {
    pub attachments: Vec<AttachmentResponse>,
}

/// List attachments of a message.
async fn get_attachments(
    AuthUser(_user): AuthUser,
    State(state): State<AppState>,
    Path(message_id): Path<String>,
) -> AppResult<ApiResponse<AttachmentListResponse>> {
    let attachments = state.messaging_service.get_attachments(&message_id).await?;

    Ok(ApiResponse::ok(AttachmentListResponse {
        attachments: attachments
            .into_iter()
            .map(AttachmentResponse::from)
            .collect(),
    }))
}

/// Unread count response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnreadCountResponse {
    pub count: u64,
}

/// Get unread message count.
async fn get_unread_count(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<UnreadCountResponse>> {
    let count = state.messaging_service.unread_count(&user.id).await?;

    Ok(ApiResponse::ok(UnreadCountResponse { count }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_message_response_serialization() {
        let response = MessageResponse {
            id: "123".to_string(),
            conversation_id: "cnv1".to_string(),
            sender_id: "alice".to_string(),
            recipient_id: "bob".to_string(),
            title: None,
            text: "Bonjour!".to_string(),
            kind: MessageKind::Message,
            is_read: false,
            read_at: None,
            created_at: Utc::now(),
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"text\":\"Bonjour!\""));
        assert!(json.contains("\"isRead\":false"));
    }

    #[test]
    fn test_decode_attachments_rejects_bad_base64() {
        let result = decode_attachments(vec![AttachmentPayload {
            file_name: "x.pdf".to_string(),
            data: "not base64 !!".to_string(),
        }]);

        assert!(result.is_err());
    }

    #[test]
    fn test_decode_attachments_roundtrip() {
        let encoded = base64::engine::general_purpose::STANDARD.encode(b"contenu");
        let result = decode_attachments(vec![AttachmentPayload {
            file_name: "x.pdf".to_string(),
            data: encoded,
        }])
        .unwrap();

        assert_eq!(result[0].data, b"contenu");
    }
}
