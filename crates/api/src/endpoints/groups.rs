//! Communication group endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{delete, get, post, put},
};
use chrono::{DateTime, Utc};
use mutuelle_common::AppResult;
use mutuelle_core::{CreateGroupInput, CreateGroupMessageInput};
use mutuelle_db::entities::{
    communication_group::{self, GroupKind},
    group_message,
    message::MessageKind,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use crate::endpoints::messaging::{AttachmentPayload, AttachmentResponse, decode_attachments};
use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Create groups router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_group))
        .route("/joined", get(list_joined))
        .route("/{group_id}", get(get_group))
        .route("/{group_id}/deactivate", post(deactivate_group))
        .route("/{group_id}/members", get(list_members))
        .route("/{group_id}/members/{user_id}", put(add_member))
        .route("/{group_id}/members/{user_id}", delete(remove_member))
        .route("/{group_id}/messages", get(list_messages))
        .route("/{group_id}/messages", post(post_message))
        .route("/messages/{message_id}/important", post(set_important))
}

/// Group response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupResponse {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub kind: GroupKind,
    pub creator_id: String,
    pub is_active: bool,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
}

impl From<communication_group::Model> for GroupResponse {
    fn from(g: communication_group::Model) -> Self {
        Self {
            id: g.id,
            name: g.name,
            description: g.description,
            kind: g.kind,
            creator_id: g.creator_id,
            is_active: g.is_active,
            is_public: g.is_public,
            created_at: g.created_at.into(),
        }
    }
}

/// Group message response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupMessageResponse {
    pub id: String,
    pub group_id: String,
    pub sender_id: String,
    pub title: Option<String>,
    pub text: String,
    pub kind: MessageKind,
    pub is_important: bool,
    pub created_at: DateTime<Utc>,
}

impl From<group_message::Model> for GroupMessageResponse {
    fn from(m: group_message::Model) -> Self {
        Self {
            id: m.id,
            group_id: m.group_id,
            sender_id: m.sender_id,
            title: m.title,
            text: m.text,
            kind: m.kind,
            is_important: m.is_important,
            created_at: m.created_at.into(),
        }
    }
}

/// Create group request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateGroupRequest {
    #[validate(length(min = 1, max = 128, message = "name is required"))]
    pub name: String,
    pub description: Option<String>,
    pub kind: Option<GroupKind>,
    #[serde(default)]
    pub is_public: bool,
    pub access_code: Option<String>,
}

/// Create a group; the caller becomes creator and first member.
async fn create_group(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<CreateGroupRequest>,
) -> AppResult<ApiResponse<GroupResponse>> {
    req.validate()?;

    info!(creator = %user.id, name = %req.name, "Creating group");

    let group = state
        .group_service
        .create_group(
            &user.id,
            CreateGroupInput {
                name: req.name,
                description: req.description,
                kind: req.kind.unwrap_or_default(),
                is_public: req.is_public,
                access_code: req.access_code,
            },
        )
        .await?;

    Ok(ApiResponse::ok(GroupResponse::from(group)))
}

/// Get a group by ID.
async fn get_group(
    AuthUser(_user): AuthUser,
    State(state): State<AppState>,
    Path(group_id): Path<String>,
) -> AppResult<ApiResponse<GroupResponse>> {
    let group = state.group_service.get(&group_id).await?;

    Ok(ApiResponse::ok(GroupResponse::from(group)))
}

/// Joined groups query.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListJoinedQuery {
    #[serde(default = "default_limit")]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
}

const fn default_limit() -> u64 {
    20
}

/// Group list response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupListResponse {
    pub groups: Vec<GroupResponse>,
}

/// List active groups the authenticated user belongs to.
async fn list_joined(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ListJoinedQuery>,
) -> AppResult<ApiResponse<GroupListResponse>> {
    let groups = state
        .group_service
        .joined_groups(&user.id, query.limit, query.offset)
        .await?;

    Ok(ApiResponse::ok(GroupListResponse {
        groups: groups.into_iter().map(GroupResponse::from).collect(),
    }))
}

/// Member response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberResponse {
    pub user_id: String,
    pub joined_at: DateTime<Utc>,
}

/// Member list response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberListResponse {
    pub members: Vec<MemberResponse>,
}

/// List members of a group.
async fn list_members(
    AuthUser(_user): AuthUser,
    State(state): State<AppState>,
    Path(group_id): Path<String>,
) -> AppResult<ApiResponse<MemberListResponse>> {
    let members = state.group_service.list_members(&group_id).await?;

    Ok(ApiResponse::ok(MemberListResponse {
        members: members
            .into_iter()
            .map(|m| MemberResponse {
                user_id: m.user_id,
                joined_at: m.joined_at.into(),
            })
            .collect(),
    }))
}

/// Membership change response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipResponse {
    pub changed: bool,
}

/// Add a member to a group (idempotent).
async fn add_member(
    AuthUser(_user): AuthUser,
    State(state): State<AppState>,
    Path((group_id, user_id)): Path<(String, String)>,
) -> AppResult<ApiResponse<MembershipResponse>> {
    let changed = state.group_service.add_member(&group_id, &user_id).await?;

    Ok(ApiResponse::ok(MembershipResponse { changed }))
}

/// Remove a member from a group (idempotent).
async fn remove_member(
    AuthUser(_user): AuthUser,
    State(state): State<AppState>,
    Path((group_id, user_id)): Path<(String, String)>,
) -> AppResult<ApiResponse<MembershipResponse>> {
    let changed = state
        .group_service
        .remove_member(&group_id, &user_id)
        .await?;

    Ok(ApiResponse::ok(MembershipResponse { changed }))
}

/// Group messages query.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListMessagesQuery {
    #[serde(default = "default_limit")]
    pub limit: u64,
    pub until_id: Option<String>,
}

/// Group message list response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupMessageListResponse {
    pub messages: Vec<GroupMessageResponse>,
}

/// Messages of a group, visible to current members only.
async fn list_messages(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(group_id): Path<String>,
    Query(query): Query<ListMessagesQuery>,
) -> AppResult<ApiResponse<GroupMessageListResponse>> {
    let messages = state
        .group_service
        .messages_for_member(&group_id, &user.id, query.limit, query.until_id.as_deref())
        .await?;

    Ok(ApiResponse::ok(GroupMessageListResponse {
        messages: messages
            .into_iter()
            .map(GroupMessageResponse::from)
            .collect(),
    }))
}

/// Post group message request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PostGroupMessageRequest {
    pub title: Option<String>,
    #[validate(length(min = 1, message = "text is required"))]
    pub text: String,
    pub kind: Option<MessageKind>,
    #[serde(default)]
    pub is_important: bool,
    #[serde(default)]
    pub attachments: Vec<AttachmentPayload>,
}

/// Posted group message response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostedGroupMessageResponse {
    #[serde(flatten)]
    pub message: GroupMessageResponse,
    pub attachments: Vec<AttachmentResponse>,
}

/// Post a message to a group.
async fn post_message(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(group_id): Path<String>,
    Json(req): Json<PostGroupMessageRequest>,
) -> AppResult<ApiResponse<PostedGroupMessageResponse>> {
    req.validate()?;

    info!(group = %group_id, sender = %user.id, "Posting group message");

    let attachments = decode_attachments(req.attachments)?;

    let posted = state
        .group_service
        .post_group_message(
            &group_id,
            &user.id,
            CreateGroupMessageInput {
                title: req.title,
                text: req.text,
                kind: req.kind.unwrap_or_default(),
                is_important: req.is_important,
                attachments,
            },
        )
        .await?;

    Ok(ApiResponse::ok(PostedGroupMessageResponse {
        message: GroupMessageResponse::from(posted.message),
        attachments: posted
            .attachments
            .into_iter()
            .map(AttachmentResponse::from)
            .collect(),
    }))
}

/// Important flag request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetImportantRequest {
    pub is_important: bool,
}

/// Toggle the important flag on a group message.
async fn set_important(
    AuthUser(_user): AuthUser,
    State(state): State<AppState>,
    Path(message_id): Path<String>,
    Json(req): Json<SetImportantRequest>,
) -> AppResult<ApiResponse<GroupMessageResponse>> {
    let message = state
        .group_service
        .set_important(&message_id, req.is_important)
        .await?;

    Ok(ApiResponse::ok(GroupMessageResponse::from(message)))
}

/// Deactivate a group; messages and membership are kept.
async fn deactivate_group(
    AuthUser(_user): AuthUser,
    State(state): State<AppState>,
    Path(group_id): Path<String>,
) -> AppResult<ApiResponse<GroupResponse>> {
    let group = state.group_service.deactivate(&group_id).await?;

    Ok(ApiResponse::ok(GroupResponse::from(group)))
}
