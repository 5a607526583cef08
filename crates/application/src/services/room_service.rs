use std::sync::Arc;

use uuid::Uuid;

use domain::{
    DomainError, MemberRole, MemberStatus, Room, RoomId, RoomKind, RoomMember, RoomUsage, UserId,
};

use crate::clock::Clock;
use crate::error::ApplicationError;
use crate::password::PasswordHasher;
use crate::repository::{RoomMemberRepository, RoomRepository, RoomUsageRepository};

#[derive(Debug, Clone)]
pub struct CreateRoomRequest {
    pub owner_id: Uuid,
    pub name: String,
    pub kind: RoomKind,
    pub password: Option<String>,
    pub is_commercial: bool,
}

#[derive(Debug, Clone)]
pub struct JoinRoomRequest {
    pub room_id: Uuid,
    pub user_id: Uuid,
    pub password: Option<String>,
}

/// 版主/房主对成员状态的操作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberStatusAction {
    Approve,
    Reject,
    Ban,
    Remove,
}

#[derive(Debug, Clone)]
pub struct UpdateMemberStatusRequest {
    pub room_id: Uuid,
    pub operator_id: Uuid,
    pub target_user_id: Uuid,
    pub action: MemberStatusAction,
}

pub struct RoomServiceDependencies {
    pub room_repository: Arc<dyn RoomRepository>,
    pub member_repository: Arc<dyn RoomMemberRepository>,
    pub usage_repository: Arc<dyn RoomUsageRepository>,
    pub password_hasher: Arc<dyn PasswordHasher>,
    pub clock: Arc<dyn Clock>,
    /// 每用户每月建房配额
    pub rooms_per_month: u32,
}

pub struct RoomService {
    deps: RoomServiceDependencies,
}

impl RoomService {
    pub fn new(deps: RoomServiceDependencies) -> Self {
        Self { deps }
    }

    pub async fn create_room(&self, request: CreateRoomRequest) -> Result<Room, ApplicationError> {
        let owner_id = UserId::from(request.owner_id);
        let now = self.deps.clock.now();

        // 月度配额检查
        let (year, month) = RoomUsage::period_of(now);
        let used = self
            .deps
            .usage_repository
            .rooms_created_in(owner_id, year, month)
            .await?;
        if used >= self.deps.rooms_per_month {
            return Err(DomainError::RoomQuotaExceeded.into());
        }

        // 房间名全局唯一
        if self
            .deps
            .room_repository
            .find_by_name(request.name.trim())
            .await?
            .is_some()
        {
            return Err(DomainError::RoomNameTaken.into());
        }

        let password = match (&request.kind, request.password) {
            (RoomKind::Private, Some(raw)) => {
                Some(self.deps.password_hasher.hash(&raw).await?)
            }
            (RoomKind::Private, None) => return Err(DomainError::RoomPasswordRequired.into()),
            (_, _) => None,
        };

        let room = Room::new(
            RoomId::generate(),
            owner_id,
            request.name,
            request.kind,
            password,
            request.is_commercial,
            now,
        )?;

        // 房主获得一条显式的已批准版主成员行，成员列表因此形态统一
        let owner_member = RoomMember::new(
            room.id,
            owner_id,
            MemberRole::Moderator,
            MemberStatus::Approved,
            now,
        );

        let created = self
            .deps
            .room_repository
            .create_with_owner(room, owner_member)
            .await?;

        let total = self
            .deps
            .usage_repository
            .increment(owner_id, year, month)
            .await?;

        tracing::info!(
            room_id = %created.id,
            owner_id = %owner_id,
            rooms_this_month = total,
            "房间已创建"
        );

        Ok(created)
    }

    pub async fn join_room(&self, request: JoinRoomRequest) -> Result<RoomMember, ApplicationError> {
        let room_id = RoomId::from(request.room_id);
        let user_id = UserId::from(request.user_id);

        let room = self
            .deps
            .room_repository
            .find_by_id(room_id)
            .await?
            .ok_or(DomainError::RoomNotFound)?;

        if room.is_owner(user_id) {
            return Err(DomainError::operation_not_allowed(
                "owner is already a participant",
            )
            .into());
        }

        if let Some(existing) = self.deps.member_repository.find(room_id, user_id).await? {
            match existing.status {
                MemberStatus::Approved => {
                    return Err(DomainError::operation_not_allowed("already a member").into())
                }
                MemberStatus::Pending => {
                    return Err(
                        DomainError::operation_not_allowed("membership already pending").into(),
                    )
                }
                MemberStatus::Banned => {
                    return Err(DomainError::operation_not_allowed("banned from this room").into())
                }
                // 被拒绝/移除的用户可以重新申请
                MemberStatus::Rejected | MemberStatus::Removed => {}
            }
        }

        let status = match room.kind {
            RoomKind::Public => MemberStatus::Approved,
            RoomKind::Private => {
                let raw = request
                    .password
                    .ok_or(DomainError::RoomPasswordRequired)?;
                let hash = room
                    .password
                    .as_ref()
                    .ok_or(DomainError::RoomPasswordRequired)?;
                if !self.deps.password_hasher.verify(&raw, hash).await? {
                    return Err(DomainError::RoomPasswordRequired.into());
                }
                MemberStatus::Approved
            }
            // 安全房间需要版主批准
            RoomKind::Secure => MemberStatus::Pending,
        };

        let member = RoomMember::new(
            room_id,
            user_id,
            MemberRole::Member,
            status,
            self.deps.clock.now(),
        );
        self.deps.member_repository.upsert(member.clone()).await?;

        tracing::info!(
            room_id = %room_id,
            user_id = %user_id,
            status = ?member.status,
            "加入房间请求已处理"
        );

        Ok(member)
    }

    /// 成员状态变更：只有房主或已批准的版主可以操作；
    /// 对版主本身的操作只有房主可以执行。
    pub async fn update_member_status(
        &self,
        request: UpdateMemberStatusRequest,
    ) -> Result<RoomMember, ApplicationError> {
        let room_id = RoomId::from(request.room_id);
        let operator_id = UserId::from(request.operator_id);
        let target_user_id = UserId::from(request.target_user_id);

        let room = self
            .deps
            .room_repository
            .find_by_id(room_id)
            .await?
            .ok_or(DomainError::RoomNotFound)?;

        let operator_is_owner = room.is_owner(operator_id);
        if !operator_is_owner {
            let operator = self
                .deps
                .member_repository
                .find(room_id, operator_id)
                .await?
                .ok_or(DomainError::InsufficientPermissions)?;
            if !(operator.is_approved() && operator.is_moderator()) {
                return Err(DomainError::InsufficientPermissions.into());
            }
        }

        if room.is_owner(target_user_id) {
            return Err(DomainError::operation_not_allowed("cannot act on the room owner").into());
        }

        let mut target = self
            .deps
            .member_repository
            .find(room_id, target_user_id)
            .await?
            .ok_or(DomainError::MemberNotFound)?;

        if target.is_moderator() && !operator_is_owner {
            return Err(DomainError::InsufficientPermissions.into());
        }

        let now = self.deps.clock.now();
        match request.action {
            MemberStatusAction::Approve => target.approve(),
            MemberStatusAction::Reject => target.reject(),
            MemberStatusAction::Ban => target.ban(now),
            MemberStatusAction::Remove => target.remove(now),
        }

        self.deps.member_repository.upsert(target.clone()).await?;

        tracing::info!(
            room_id = %room_id,
            target_user_id = %target_user_id,
            status = ?target.status,
            "成员状态已更新"
        );

        Ok(target)
    }

    /// 删除房间（仅房主），级联删除成员、消息与在线状态
    pub async fn delete_room(
        &self,
        room_id: Uuid,
        operator_id: Uuid,
    ) -> Result<(), ApplicationError> {
        let room_id = RoomId::from(room_id);
        let operator_id = UserId::from(operator_id);

        let room = self
            .deps
            .room_repository
            .find_by_id(room_id)
            .await?
            .ok_or(DomainError::RoomNotFound)?;

        if !room.is_owner(operator_id) {
            return Err(DomainError::InsufficientPermissions.into());
        }

        self.deps.room_repository.delete(room_id).await?;
        tracing::info!(room_id = %room_id, "房间已删除");
        Ok(())
    }
}
