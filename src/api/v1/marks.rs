//! Mark (board label) handlers. Open to board members.

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::ToSchema;

use super::{ApiResult, ErrorResponse, FieldErrors, JsonBody, db_error, require_member};
use crate::api::{AppState, CurrentUser};
use crate::db::{Database, Id, Mark, MarkRepository, User};

const TITLE_MAX: usize = 30;
const DEFAULT_COLOR: &str = "#000";

/// Mark response DTO
#[derive(Serialize, ToSchema)]
pub struct MarkResponse {
    #[schema(example = 1)]
    pub id: Id,
    /// Board id
    #[schema(example = 1)]
    pub board: Id,
    #[schema(example = "Bug")]
    pub title: String,
    #[schema(example = "#f00")]
    pub color: String,
}

impl From<Mark> for MarkResponse {
    fn from(m: Mark) -> Self {
        Self {
            id: m.id,
            board: m.board_id,
            title: m.title,
            color: m.color,
        }
    }
}

/// Mark request DTO. `color` defaults to `#000` on create.
#[derive(Debug, Deserialize, ToSchema)]
pub struct MarkRequest {
    #[schema(example = "Bug")]
    pub title: Option<String>,
    #[schema(example = "#f00")]
    pub color: Option<String>,
}

/// Fetch a mark and require membership of its board.
async fn member_mark<D: Database>(state: &AppState<D>, id: Id, user: &User) -> ApiResult<Mark> {
    let mark = state.db().marks().get(id).await.map_err(db_error)?;
    require_member(state, mark.board_id, user).await?;
    Ok(mark)
}

async fn apply_update<D: Database>(
    state: &AppState<D>,
    id: Id,
    user: &User,
    req: MarkRequest,
    partial: bool,
) -> ApiResult<MarkResponse> {
    let mut mark = member_mark(state, id, user).await?;

    let mut errors = FieldErrors::new();
    let title = errors.text("title", req.title, TITLE_MAX, !partial);
    let color = errors.color("color", req.color);
    errors.finish()?;

    if let Some(title) = title {
        mark.title = title;
    }
    if let Some(color) = color {
        mark.color = color;
    }

    let updated = state.db().marks().update(&mark).await.map_err(db_error)?;
    Ok(MarkResponse::from(updated))
}

/// List the marks of a board
#[utoipa::path(
    get,
    path = "/mark/board/{id}/",
    tag = "marks",
    params(("id" = i64, Path, description = "Board ID")),
    responses(
        (status = 200, description = "Marks of the board", body = Vec<MarkResponse>),
        (status = 403, description = "Caller is not a member", body = ErrorResponse),
        (status = 404, description = "Board not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state, user))]
pub async fn list_marks<D: Database>(
    State(state): State<AppState<D>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(board_id): Path<Id>,
) -> ApiResult<Json<Vec<MarkResponse>>> {
    require_member(&state, board_id, &user).await?;
    let marks = state
        .db()
        .marks()
        .list_by_board(board_id)
        .await
        .map_err(db_error)?;

    Ok(Json(marks.into_iter().map(MarkResponse::from).collect()))
}

/// Define a mark on a board
#[utoipa::path(
    post,
    path = "/mark/board/{id}/",
    tag = "marks",
    params(("id" = i64, Path, description = "Board ID")),
    request_body = MarkRequest,
    responses(
        (status = 201, description = "Mark created", body = MarkResponse),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 403, description = "Caller is not a member", body = ErrorResponse),
        (status = 404, description = "Board not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state, user))]
pub async fn create_mark<D: Database>(
    State(state): State<AppState<D>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(board_id): Path<Id>,
    JsonBody(req): JsonBody<MarkRequest>,
) -> ApiResult<(StatusCode, Json<MarkResponse>)> {
    require_member(&state, board_id, &user).await?;

    let mut errors = FieldErrors::new();
    let title = errors.text("title", req.title, TITLE_MAX, true);
    let color = errors.color("color", req.color);
    errors.finish()?;

    let mark = state
        .db()
        .marks()
        .create(&Mark {
            id: 0,
            board_id,
            title: title.unwrap_or_default(),
            color: color.unwrap_or_else(|| DEFAULT_COLOR.to_string()),
        })
        .await
        .map_err(db_error)?;
    info!(mark_id = mark.id, board_id, "created mark");

    Ok((StatusCode::CREATED, Json(MarkResponse::from(mark))))
}

/// Get a mark
#[utoipa::path(
    get,
    path = "/mark/{id}/",
    tag = "marks",
    params(("id" = i64, Path, description = "Mark ID")),
    responses(
        (status = 200, description = "Mark found", body = MarkResponse),
        (status = 403, description = "Caller is not a member", body = ErrorResponse),
        (status = 404, description = "Mark not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state, user))]
pub async fn get_mark<D: Database>(
    State(state): State<AppState<D>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Id>,
) -> ApiResult<Json<MarkResponse>> {
    let mark = member_mark(&state, id, &user).await?;
    Ok(Json(MarkResponse::from(mark)))
}

/// Replace a mark
#[utoipa::path(
    put,
    path = "/mark/{id}/",
    tag = "marks",
    params(("id" = i64, Path, description = "Mark ID")),
    request_body = MarkRequest,
    responses(
        (status = 200, description = "Mark updated", body = MarkResponse),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 403, description = "Caller is not a member", body = ErrorResponse),
        (status = 404, description = "Mark not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state, user))]
pub async fn update_mark<D: Database>(
    State(state): State<AppState<D>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Id>,
    JsonBody(req): JsonBody<MarkRequest>,
) -> ApiResult<Json<MarkResponse>> {
    apply_update(&state, id, &user, req, false).await.map(Json)
}

/// Partially update a mark
#[utoipa::path(
    patch,
    path = "/mark/{id}/",
    tag = "marks",
    params(("id" = i64, Path, description = "Mark ID")),
    request_body = MarkRequest,
    responses(
        (status = 200, description = "Mark updated", body = MarkResponse),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 403, description = "Caller is not a member", body = ErrorResponse),
        (status = 404, description = "Mark not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state, user))]
pub async fn patch_mark<D: Database>(
    State(state): State<AppState<D>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Id>,
    JsonBody(req): JsonBody<MarkRequest>,
) -> ApiResult<Json<MarkResponse>> {
    apply_update(&state, id, &user, req, true).await.map(Json)
}

/// Delete a mark, detaching it from all cards
#[utoipa::path(
    delete,
    path = "/mark/{id}/",
    tag = "marks",
    params(("id" = i64, Path, description = "Mark ID")),
    responses(
        (status = 204, description = "Mark deleted"),
        (status = 403, description = "Caller is not a member", body = ErrorResponse),
        (status = 404, description = "Mark not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state, user))]
pub async fn delete_mark<D: Database>(
    State(state): State<AppState<D>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Id>,
) -> ApiResult<StatusCode> {
    member_mark(&state, id, &user).await?;
    state.db().marks().delete(id).await.map_err(db_error)?;
    info!(mark_id = id, "deleted mark");

    Ok(StatusCode::NO_CONTENT)
}
