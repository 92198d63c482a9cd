//! V1 API handlers.

mod boards;
mod cards;
mod columns;
mod comments;
mod files;
mod marks;
mod projects;
mod system;
mod users;
mod validation;

#[cfg(test)]
pub(crate) mod test_support;

#[cfg(test)]
mod cards_test;
#[cfg(test)]
mod columns_test;
#[cfg(test)]
mod marks_test;

pub use boards::*;
pub use cards::*;
pub use columns::*;
pub use comments::*;
pub use files::*;
pub use marks::*;
pub use projects::*;
pub use system::*;
pub use users::*;
pub use validation::FieldErrors;

use std::collections::BTreeMap;

use axum::{
    Json,
    extract::{FromRequest, Request, multipart::MultipartError},
    http::StatusCode,
};
use serde::{Serialize, de::DeserializeOwned};
use tracing::{error, warn};
use utoipa::ToSchema;

use crate::access::{self, Action};
use crate::api::AppState;
use crate::db::{BoardAccess, BoardRepository, Database, DbError, Id, User};

pub const PERMISSION_DENIED: &str = "You do not have permission to perform this action.";

/// Error response DTO
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    #[schema(example = "Board '7' not found")]
    pub error: String,
    /// Per-field validation messages
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<BTreeMap<String, Vec<String>>>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            fields: None,
        }
    }
}

/// Rejection returned by every handler.
pub type HandlerError = (StatusCode, Json<ErrorResponse>);

/// Result type for handlers.
pub type ApiResult<T> = Result<T, HandlerError>;

pub(crate) fn bad_request(message: impl Into<String>) -> HandlerError {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(message)))
}

pub(crate) fn internal(message: impl Into<String>) -> HandlerError {
    let message = message.into();
    error!("{}", message);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new(message)),
    )
}

/// Map a store error onto an HTTP status.
pub(crate) fn db_error(e: DbError) -> HandlerError {
    match e {
        DbError::NotFound { entity_type, id } => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new(format!(
                "{} '{}' not found",
                entity_type, id
            ))),
        ),
        DbError::Validation { message } => bad_request(message),
        DbError::AlreadyExists { .. } | DbError::Constraint { .. } => bad_request(e.to_string()),
        other => internal(other.to_string()),
    }
}

pub(crate) fn forbidden(user: &User, entity: &str, id: Id) -> HandlerError {
    warn!(user_id = user.id, "denied access to {} {}", entity, id);
    (
        StatusCode::FORBIDDEN,
        Json(ErrorResponse::new(PERMISSION_DENIED)),
    )
}

pub(crate) fn multipart_error(e: MultipartError) -> HandlerError {
    (e.status(), Json(ErrorResponse::new(e.body_text())))
}

/// JSON body extractor whose rejections use [`ErrorResponse`].
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = HandlerError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(bad_request(rejection.body_text())),
        }
    }
}

// =============================================================================
// Access guards
// =============================================================================

/// Load the acting user's relationship to a board and require
/// ownership, or membership for reads.
pub(crate) async fn require_board<D: Database>(
    state: &AppState<D>,
    board_id: Id,
    user: &User,
    action: Action,
) -> ApiResult<BoardAccess> {
    let access = state
        .db()
        .boards()
        .access(board_id, user.id)
        .await
        .map_err(db_error)?;

    if access::can_access_board(user.id, &access, action) {
        Ok(access)
    } else {
        Err(forbidden(user, "board", board_id))
    }
}

/// Require the acting user to be a member of the board.
pub(crate) async fn require_member<D: Database>(
    state: &AppState<D>,
    board_id: Id,
    user: &User,
) -> ApiResult<BoardAccess> {
    let access = state
        .db()
        .boards()
        .access(board_id, user.id)
        .await
        .map_err(db_error)?;

    if access::is_board_member(&access) {
        Ok(access)
    } else {
        Err(forbidden(user, "board", board_id))
    }
}
