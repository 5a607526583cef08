use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use application::{
    CreatePostRequest, CreateRoomRequest, DeleteChatMessageRequest, EditChatMessageRequest,
    EditDirectMessageRequest, JoinRoomRequest, MemberStatusAction, PostChatMessageRequest,
    SendDirectMessageRequest, TypingRequest, UpdateMemberStatusRequest, UploadRequest,
};
use domain::{
    AttachmentKind, ChatMessage, DirectMessage, MessageKind, OnlineMember, Post, Room, RoomKind,
    RoomMember,
};

use crate::error::ApiError;
use crate::state::AppState;
use crate::websocket::websocket_upgrade;

#[derive(Debug, Deserialize)]
struct CreateRoomPayload {
    name: String,
    kind: RoomKind,
    password: Option<String>,
    #[serde(default)]
    is_commercial: bool,
}

#[derive(Debug, Deserialize)]
struct JoinRoomPayload {
    password: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MemberStatusPayload {
    action: String,
}

#[derive(Debug, Deserialize)]
struct MessagePayload {
    body: Option<String>,
    #[serde(default = "default_message_kind")]
    kind: MessageKind,
    file_url: Option<String>,
}

fn default_message_kind() -> MessageKind {
    MessageKind::Text
}

#[derive(Debug, Deserialize)]
struct EditMessagePayload {
    body: String,
}

#[derive(Debug, Deserialize)]
struct TypingPayload {
    is_typing: bool,
}

#[derive(Debug, Deserialize)]
struct PageQuery {
    page: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct PostsQuery {
    limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct CreatePostPayload {
    body: String,
    #[serde(default)]
    publish_now: bool,
}

#[derive(Debug, Deserialize)]
struct UploadPayload {
    kind: AttachmentKind,
    file_name: String,
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
struct UploadResponse {
    url: String,
    path: String,
    kind: AttachmentKind,
    message_kind: MessageKind,
    size_bytes: u64,
}

#[derive(Debug, Serialize)]
struct ReadReceiptResponse {
    marked_read: usize,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api_routes())
        .with_state(state)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/rooms", post(create_room))
        .route("/rooms/{room_id}", axum::routing::delete(delete_room))
        .route("/rooms/{room_id}/join", post(join_room))
        .route(
            "/rooms/{room_id}/members/{user_id}/status",
            post(update_member_status),
        )
        .route(
            "/chat-rooms/{room_id}/messages",
            post(post_chat_message).get(list_chat_messages),
        )
        .route(
            "/chat-rooms/{room_id}/messages/{message_id}",
            axum::routing::patch(edit_chat_message).delete(delete_chat_message),
        )
        // 同一参数位必须用同一个名字，否则路由器拒绝注册；
        // POST/GET 的 {id} 是对方用户，PATCH/DELETE 的 {id} 是消息。
        .route(
            "/rooms/{room_id}/direct-messages/{id}",
            post(send_direct_message)
                .get(list_conversation)
                .patch(edit_direct_message)
                .delete(delete_direct_message),
        )
        .route(
            "/rooms/{room_id}/direct-messages/{id}/read",
            post(mark_conversation_read),
        )
        .route(
            "/rooms/{room_id}/direct-messages/{id}/typing",
            post(typing_indicator),
        )
        .route(
            "/rooms/{room_id}/online-members",
            post(mark_online)
                .delete(mark_offline)
                .get(list_online_members),
        )
        .route(
            "/rooms/{room_id}/online-members/heartbeat",
            put(heartbeat),
        )
        .route("/posts", post(create_post).get(list_posts))
        .route("/uploads", post(upload_attachment))
        .route("/ws", get(websocket_upgrade))
}

async fn health() -> StatusCode {
    StatusCode::OK
}

// ------------------------------------------------------------------ rooms

async fn create_room(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CreateRoomPayload>,
) -> Result<(StatusCode, Json<Room>), ApiError> {
    let owner_id = state.jwt_service.extract_user_from_headers(&headers)?;
    let room = state
        .room_service
        .create_room(CreateRoomRequest {
            owner_id,
            name: payload.name,
            kind: payload.kind,
            password: payload.password,
            is_commercial: payload.is_commercial,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(room)))
}

async fn delete_room(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(room_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let operator_id = state.jwt_service.extract_user_from_headers(&headers)?;
    state.room_service.delete_room(room_id, operator_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn join_room(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(room_id): Path<Uuid>,
    Json(payload): Json<JoinRoomPayload>,
) -> Result<Json<RoomMember>, ApiError> {
    let user_id = state.jwt_service.extract_user_from_headers(&headers)?;
    let member = state
        .room_service
        .join_room(JoinRoomRequest {
            room_id,
            user_id,
            password: payload.password,
        })
        .await?;
    Ok(Json(member))
}

fn parse_member_action(action: &str) -> Result<MemberStatusAction, ApiError> {
    match action {
        "approve" => Ok(MemberStatusAction::Approve),
        "reject" => Ok(MemberStatusAction::Reject),
        "ban" => Ok(MemberStatusAction::Ban),
        "remove" => Ok(MemberStatusAction::Remove),
        other => Err(ApiError::unprocessable(format!(
            "action: unknown member action {other:?}"
        ))),
    }
}

async fn update_member_status(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((room_id, user_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<MemberStatusPayload>,
) -> Result<Json<RoomMember>, ApiError> {
    let operator_id = state.jwt_service.extract_user_from_headers(&headers)?;
    let action = parse_member_action(&payload.action)?;
    let member = state
        .room_service
        .update_member_status(UpdateMemberStatusRequest {
            room_id,
            operator_id,
            target_user_id: user_id,
            action,
        })
        .await?;
    Ok(Json(member))
}

// ---------------------------------------------------------- chat messages

async fn post_chat_message(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(room_id): Path<Uuid>,
    Json(payload): Json<MessagePayload>,
) -> Result<(StatusCode, Json<ChatMessage>), ApiError> {
    let sender_id = state.jwt_service.extract_user_from_headers(&headers)?;
    let message = state
        .chat_message_service
        .post_message(PostChatMessageRequest {
            room_id,
            sender_id,
            body: payload.body,
            kind: payload.kind,
            file_url: payload.file_url,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(message)))
}

async fn list_chat_messages(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(room_id): Path<Uuid>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Vec<ChatMessage>>, ApiError> {
    let viewer_id = state.jwt_service.extract_user_from_headers(&headers)?;
    let messages = state
        .chat_message_service
        .list_messages(room_id, viewer_id, query.page.unwrap_or(1))
        .await?;
    Ok(Json(messages))
}

async fn edit_chat_message(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((room_id, message_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<EditMessagePayload>,
) -> Result<Json<ChatMessage>, ApiError> {
    let actor_id = state.jwt_service.extract_user_from_headers(&headers)?;
    let message = state
        .chat_message_service
        .edit_message(EditChatMessageRequest {
            room_id,
            message_id,
            actor_id,
            body: payload.body,
        })
        .await?;
    Ok(Json(message))
}

async fn delete_chat_message(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((room_id, message_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
    let actor_id = state.jwt_service.extract_user_from_headers(&headers)?;
    state
        .chat_message_service
        .delete_message(DeleteChatMessageRequest {
            room_id,
            message_id,
            actor_id,
        })
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// --------------------------------------------------------- direct messages

async fn send_direct_message(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((room_id, other_user_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<MessagePayload>,
) -> Result<(StatusCode, Json<DirectMessage>), ApiError> {
    let sender_id = state.jwt_service.extract_user_from_headers(&headers)?;
    let message = state
        .direct_message_service
        .send_message(SendDirectMessageRequest {
            room_id,
            sender_id,
            receiver_id: other_user_id,
            body: payload.body,
            kind: payload.kind,
            file_url: payload.file_url,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(message)))
}

async fn list_conversation(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((room_id, other_user_id)): Path<(Uuid, Uuid)>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Vec<DirectMessage>>, ApiError> {
    let viewer_id = state.jwt_service.extract_user_from_headers(&headers)?;
    let messages = state
        .direct_message_service
        .list_conversation(room_id, viewer_id, other_user_id, query.page.unwrap_or(1))
        .await?;
    Ok(Json(messages))
}

async fn edit_direct_message(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((room_id, message_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<EditMessagePayload>,
) -> Result<Json<DirectMessage>, ApiError> {
    let actor_id = state.jwt_service.extract_user_from_headers(&headers)?;
    let message = state
        .direct_message_service
        .edit_message(EditDirectMessageRequest {
            room_id,
            message_id,
            actor_id,
            body: payload.body,
        })
        .await?;
    Ok(Json(message))
}

async fn delete_direct_message(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((room_id, message_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
    let actor_id = state.jwt_service.extract_user_from_headers(&headers)?;
    state
        .direct_message_service
        .delete_message(room_id, message_id, actor_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn mark_conversation_read(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((room_id, other_user_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ReadReceiptResponse>, ApiError> {
    let viewer_id = state.jwt_service.extract_user_from_headers(&headers)?;
    let marked_read = state
        .direct_message_service
        .mark_read(room_id, viewer_id, other_user_id)
        .await?;
    Ok(Json(ReadReceiptResponse { marked_read }))
}

async fn typing_indicator(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((room_id, other_user_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<TypingPayload>,
) -> Result<StatusCode, ApiError> {
    let sender_id = state.jwt_service.extract_user_from_headers(&headers)?;
    state
        .direct_message_service
        .typing(TypingRequest {
            room_id,
            sender_id,
            receiver_id: other_user_id,
            is_typing: payload.is_typing,
        })
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// --------------------------------------------------------------- presence

async fn mark_online(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(room_id): Path<Uuid>,
) -> Result<Json<Vec<OnlineMember>>, ApiError> {
    let user_id = state.jwt_service.extract_user_from_headers(&headers)?;
    let online = state.presence_service.mark_online(room_id, user_id).await?;
    Ok(Json(online))
}

async fn mark_offline(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(room_id): Path<Uuid>,
) -> Result<Json<Vec<OnlineMember>>, ApiError> {
    let user_id = state.jwt_service.extract_user_from_headers(&headers)?;
    let online = state
        .presence_service
        .mark_offline(room_id, user_id)
        .await?;
    Ok(Json(online))
}

async fn heartbeat(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(room_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let user_id = state.jwt_service.extract_user_from_headers(&headers)?;
    state.presence_service.heartbeat(room_id, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_online_members(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(room_id): Path<Uuid>,
) -> Result<Json<Vec<OnlineMember>>, ApiError> {
    let viewer_id = state.jwt_service.extract_user_from_headers(&headers)?;
    let online = state
        .presence_service
        .list_online(room_id, viewer_id)
        .await?;
    Ok(Json(online))
}

// ------------------------------------------------------------------ posts

async fn create_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CreatePostPayload>,
) -> Result<(StatusCode, Json<Post>), ApiError> {
    let author_id = state.jwt_service.extract_user_from_headers(&headers)?;
    let post = state
        .post_service
        .create_post(CreatePostRequest {
            author_id,
            body: payload.body,
            publish_now: payload.publish_now,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(post)))
}

async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<PostsQuery>,
) -> Result<Json<Vec<Post>>, ApiError> {
    let posts = state
        .post_service
        .list_public_posts(query.limit.unwrap_or(50))
        .await?;
    Ok(Json(posts))
}

// ---------------------------------------------------------------- uploads

async fn upload_attachment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<UploadPayload>,
) -> Result<(StatusCode, Json<UploadResponse>), ApiError> {
    // 上传需要登录，但附件本身不绑定房间
    state.jwt_service.extract_user_from_headers(&headers)?;
    let stored = state
        .upload_service
        .upload(UploadRequest {
            kind: payload.kind,
            file_name: payload.file_name,
            mime_type: payload.mime_type,
            data_base64: payload.data,
        })
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            url: stored.url,
            path: stored.path,
            kind: stored.kind,
            message_kind: stored.message_kind,
            size_bytes: stored.size_bytes,
        }),
    ))
}
