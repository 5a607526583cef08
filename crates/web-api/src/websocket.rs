//! WebSocket 订阅端点
//!
//! `GET /ws?topic=...` 订阅单个主题。鉴权在订阅时执行：
//! 房间主题过成员资格闸，个人主题只有本人可订阅，商品主题公开。
//! 连接后只转发与所订主题完全一致的事件信封。

use axum::{
    extract::{
        ws::{Message as WsMessage, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::HeaderMap,
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::broadcast::{self, error::RecvError};
use uuid::Uuid;

use application::MembershipGate;
use domain::{EventEnvelope, Topic, UserId};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub(crate) struct WsQuery {
    topic: String,
    /// 浏览器 WebSocket 客户端无法设置请求头时的替代通道
    token: Option<String>,
}

pub(crate) async fn websocket_upgrade(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<WsQuery>,
    ws: WebSocketUpgrade,
) -> Result<Response, ApiError> {
    let topic: Topic = query
        .topic
        .parse()
        .map_err(|()| ApiError::unprocessable(format!("topic: unknown topic {:?}", query.topic)))?;

    let user_id = authenticate(&state, &headers, query.token.as_deref());
    authorize_subscription(&state.gate, topic, user_id).await?;

    Ok(ws.on_upgrade(move |socket| forward_events(socket, state, topic)))
}

/// 身份是可选的：公开主题允许匿名订阅
fn authenticate(state: &AppState, headers: &HeaderMap, token: Option<&str>) -> Option<Uuid> {
    if let Some(token) = token {
        return state
            .jwt_service
            .verify_token(token)
            .ok()
            .map(|claims| claims.user_id);
    }
    state.jwt_service.extract_user_from_headers(headers).ok()
}

async fn authorize_subscription(
    gate: &MembershipGate,
    topic: Topic,
    user_id: Option<Uuid>,
) -> Result<(), ApiError> {
    if topic.is_public() {
        return Ok(());
    }

    let user_id = user_id.ok_or_else(|| ApiError::unauthorized("subscription requires a token"))?;

    match topic {
        Topic::Room(room_id) => {
            gate.require_participant(room_id, UserId::from(user_id))
                .await?;
            Ok(())
        }
        Topic::User(owner) => {
            if owner == UserId::from(user_id) {
                Ok(())
            } else {
                Err(ApiError::forbidden(
                    "personal topics can only be subscribed by their owner",
                ))
            }
        }
        Topic::Product(_) | Topic::StoreProducts => Ok(()),
    }
}

/// 慢订阅者滞后只丢事件不断连；通道关闭才结束转发
async fn next_event(
    receiver: &mut broadcast::Receiver<(Topic, EventEnvelope)>,
) -> Option<(Topic, EventEnvelope)> {
    loop {
        match receiver.recv().await {
            Ok(pair) => return Some(pair),
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "订阅者滞后，部分事件被丢弃");
            }
            Err(RecvError::Closed) => return None,
        }
    }
}

async fn forward_events(socket: WebSocket, state: AppState, topic: Topic) {
    let mut receiver = state.fanout.subscribe();
    let (mut sender, mut incoming) = socket.split();

    let send_task = tokio::spawn(async move {
        while let Some((event_topic, envelope)) = next_event(&mut receiver).await {
            if event_topic != topic {
                continue;
            }
            let payload = match serde_json::to_string(&envelope) {
                Ok(json) => json,
                Err(err) => {
                    tracing::warn!(error = %err, "事件信封序列化失败");
                    continue;
                }
            };
            if sender.send(WsMessage::Text(payload.into())).await.is_err() {
                break;
            }
        }
    });

    let recv_task = tokio::spawn(async move {
        while let Some(Ok(message)) = incoming.next().await {
            if matches!(message, WsMessage::Close(_)) {
                break;
            }
        }
    });

    let _ = tokio::join!(send_task, recv_task);
}
