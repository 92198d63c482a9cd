//! Current-user handler and the user DTOs shared by board responses.

use axum::{Extension, Json};
use serde::Serialize;
use tracing::instrument;
use utoipa::ToSchema;

use crate::api::CurrentUser;
use crate::db::{Id, User};

/// Full user response DTO
#[derive(Serialize, ToSchema)]
pub struct UserResponse {
    #[schema(example = 1)]
    pub id: Id,
    #[schema(example = "n@user.com")]
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[schema(example = "2025-01-01 00:00:00.000")]
    pub date_joined: String,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
            first_name: u.first_name,
            last_name: u.last_name,
            date_joined: u.date_joined,
        }
    }
}

/// Board member as listed in board detail
#[derive(Serialize, ToSchema)]
pub struct MemberResponse {
    #[schema(example = 2)]
    pub id: Id,
    #[schema(example = "member@user.com")]
    pub email: String,
}

impl From<User> for MemberResponse {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
        }
    }
}

/// Get the authenticated user
#[utoipa::path(
    get,
    path = "/users/me/",
    tag = "users",
    responses(
        (status = 200, description = "Authenticated user", body = UserResponse),
        (status = 403, description = "Missing or invalid token", body = super::ErrorResponse)
    )
)]
#[instrument(skip_all, fields(user_id = user.id))]
pub async fn me(Extension(CurrentUser(user)): Extension<CurrentUser>) -> Json<UserResponse> {
    Json(UserResponse::from(user))
}
