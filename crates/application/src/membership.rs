//! 成员资格闸
//!
//! 所有聊天读写、在线状态、私信操作前的唯一授权入口，
//! 避免每个端点各自实现检查时漏掉某一处。无副作用。

use std::sync::Arc;

use domain::{DomainError, RoomId, UserId};

use crate::error::ApplicationError;
use crate::repository::{RoomMemberRepository, RoomRepository};

pub struct MembershipGate {
    rooms: Arc<dyn RoomRepository>,
    members: Arc<dyn RoomMemberRepository>,
}

impl MembershipGate {
    pub fn new(rooms: Arc<dyn RoomRepository>, members: Arc<dyn RoomMemberRepository>) -> Self {
        Self { rooms, members }
    }

    /// 当且仅当用户是房主，或存在 status = Approved 的成员行时返回 true。
    /// 房间不存在返回 RoomNotFound。
    pub async fn has_participant(
        &self,
        room_id: RoomId,
        user_id: UserId,
    ) -> Result<bool, ApplicationError> {
        let room = self
            .rooms
            .find_by_id(room_id)
            .await?
            .ok_or(DomainError::RoomNotFound)?;

        if room.is_owner(user_id) {
            return Ok(true);
        }

        let approved = self
            .members
            .find(room_id, user_id)
            .await?
            .map(|member| member.is_approved())
            .unwrap_or(false);

        Ok(approved)
    }

    /// 闸未通过必须以授权错误浮出（HTTP 403），调用方不得静默跳过。
    pub async fn require_participant(
        &self,
        room_id: RoomId,
        user_id: UserId,
    ) -> Result<(), ApplicationError> {
        if self.has_participant(room_id, user_id).await? {
            Ok(())
        } else {
            Err(DomainError::NotRoomParticipant.into())
        }
    }
}
