//! API 错误映射
//!
//! 授权类 → 403，校验类 → 422，缺失类 → 404，冲突类 → 409，
//! 基础设施类 → 500。响应体固定为 `{code, message}`。

use application::ApplicationError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody {
                code,
                message: message.into(),
            },
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, "FORBIDDEN", message)
    }

    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, "INVALID_ARGUMENT", message)
    }
}

impl From<ApplicationError> for ApiError {
    fn from(error: ApplicationError) -> Self {
        use application::ApplicationError as AppErr;
        use application::RepositoryError;
        use domain::DomainError;

        match error {
            AppErr::Domain(DomainError::InvalidArgument { field, reason }) => ApiError::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                "INVALID_ARGUMENT",
                format!("{field}: {reason}"),
            ),
            AppErr::Domain(DomainError::NotRoomParticipant) => ApiError::new(
                StatusCode::FORBIDDEN,
                "NOT_ROOM_PARTICIPANT",
                "user is not an approved participant of the room",
            ),
            AppErr::Domain(DomainError::NotMessageAuthor) => ApiError::new(
                StatusCode::FORBIDDEN,
                "NOT_MESSAGE_AUTHOR",
                "user is not the author of the message",
            ),
            AppErr::Domain(DomainError::InsufficientPermissions) => ApiError::new(
                StatusCode::FORBIDDEN,
                "INSUFFICIENT_PERMISSIONS",
                "insufficient permissions",
            ),
            AppErr::Domain(DomainError::RoomNotFound) => {
                ApiError::new(StatusCode::NOT_FOUND, "ROOM_NOT_FOUND", "room not found")
            }
            AppErr::Domain(DomainError::MessageNotFound) => ApiError::new(
                StatusCode::NOT_FOUND,
                "MESSAGE_NOT_FOUND",
                "message not found",
            ),
            AppErr::Domain(DomainError::PostNotFound) => {
                ApiError::new(StatusCode::NOT_FOUND, "POST_NOT_FOUND", "post not found")
            }
            AppErr::Domain(DomainError::MemberNotFound) => ApiError::new(
                StatusCode::NOT_FOUND,
                "MEMBER_NOT_FOUND",
                "room member not found",
            ),
            AppErr::Domain(DomainError::RoomNameTaken) => ApiError::new(
                StatusCode::CONFLICT,
                "ROOM_NAME_TAKEN",
                "room name already taken",
            ),
            AppErr::Domain(DomainError::RoomPasswordRequired) => ApiError::new(
                StatusCode::FORBIDDEN,
                "ROOM_PASSWORD_REQUIRED",
                "room requires a valid password",
            ),
            AppErr::Domain(DomainError::RoomQuotaExceeded) => ApiError::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                "ROOM_QUOTA_EXCEEDED",
                "monthly room creation quota exceeded",
            ),
            AppErr::Domain(DomainError::OperationNotAllowed { reason }) => {
                ApiError::new(StatusCode::FORBIDDEN, "OPERATION_NOT_ALLOWED", reason)
            }
            AppErr::Repository(repo_err) => match repo_err {
                RepositoryError::NotFound => ApiError::new(
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    "requested resource not found",
                ),
                RepositoryError::Conflict => {
                    ApiError::new(StatusCode::CONFLICT, "CONFLICT", "resource already exists")
                }
                RepositoryError::Storage { message } => ApiError::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    format!("database error: {message}"),
                ),
            },
            AppErr::Password(err) => ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "PASSWORD_ERROR",
                format!("password error: {err}"),
            ),
            AppErr::Storage(err) => ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "STORAGE_ERROR",
                format!("storage error: {err}"),
            ),
            AppErr::Broadcast(err) => ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "BROADCAST_ERROR",
                format!("broadcast error: {err}"),
            ),
            AppErr::Infrastructure(message) => ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INFRASTRUCTURE_ERROR",
                message,
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
