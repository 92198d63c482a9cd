//! Card comment handlers.
//!
//! Members may read and post comments; only the author may change or
//! delete one.

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::ToSchema;

use super::{ApiResult, ErrorResponse, FieldErrors, JsonBody, db_error, forbidden, require_member};
use crate::access;
use crate::api::{AppState, CurrentUser};
use crate::db::{
    BoardRepository, CardComment, CardRepository, CommentRepository, Database, Id, User,
};

const BODY_MAX: usize = 300;

/// Comment response DTO
#[derive(Serialize, ToSchema)]
pub struct CommentResponse {
    #[schema(example = 1)]
    pub id: Id,
    /// Card id
    #[schema(example = 1)]
    pub card: Id,
    /// Author user id
    #[schema(example = 1)]
    pub user: Id,
    #[schema(example = "Looks good")]
    pub body: String,
    pub created_on: String,
}

impl From<CardComment> for CommentResponse {
    fn from(c: CardComment) -> Self {
        Self {
            id: c.id,
            card: c.card_id,
            user: c.user_id,
            body: c.body,
            created_on: c.created_on,
        }
    }
}

/// Comment request DTO
#[derive(Debug, Deserialize, ToSchema)]
pub struct CommentRequest {
    #[schema(example = "Looks good")]
    pub body: Option<String>,
}

fn validate_body(body: Option<String>) -> ApiResult<String> {
    let mut errors = FieldErrors::new();
    let body = errors.text("body", body, BODY_MAX, true);
    errors.finish()?;
    Ok(body.unwrap_or_default())
}

async fn card_board<D: Database>(state: &AppState<D>, card_id: Id) -> ApiResult<Id> {
    state
        .db()
        .cards()
        .board_id(card_id)
        .await
        .map_err(db_error)
}

/// Fetch a comment and require the acting user to be its author and a
/// member of its board.
async fn authored_comment<D: Database>(
    state: &AppState<D>,
    id: Id,
    user: &User,
) -> ApiResult<CardComment> {
    let comment = state.db().comments().get(id).await.map_err(db_error)?;
    let board_id = card_board(state, comment.card_id).await?;
    let board_access = state
        .db()
        .boards()
        .access(board_id, user.id)
        .await
        .map_err(db_error)?;

    if access::can_edit_comment(user.id, &comment, &board_access) {
        Ok(comment)
    } else {
        Err(forbidden(user, "comment", id))
    }
}

/// List the comments of a card
#[utoipa::path(
    get,
    path = "/comments/card/{id}/",
    tag = "comments",
    params(("id" = i64, Path, description = "Card ID")),
    responses(
        (status = 200, description = "Comments of the card", body = Vec<CommentResponse>),
        (status = 403, description = "Caller is not a member", body = ErrorResponse),
        (status = 404, description = "Card not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state, user))]
pub async fn list_comments<D: Database>(
    State(state): State<AppState<D>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(card_id): Path<Id>,
) -> ApiResult<Json<Vec<CommentResponse>>> {
    let board_id = card_board(&state, card_id).await?;
    require_member(&state, board_id, &user).await?;

    let comments = state
        .db()
        .comments()
        .list_by_card(card_id)
        .await
        .map_err(db_error)?;

    Ok(Json(comments.into_iter().map(CommentResponse::from).collect()))
}

/// Comment on a card as the caller
#[utoipa::path(
    post,
    path = "/comments/card/{id}/",
    tag = "comments",
    params(("id" = i64, Path, description = "Card ID")),
    request_body = CommentRequest,
    responses(
        (status = 201, description = "Comment created", body = CommentResponse),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 403, description = "Caller is not a member", body = ErrorResponse),
        (status = 404, description = "Card not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state, user))]
pub async fn create_comment<D: Database>(
    State(state): State<AppState<D>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(card_id): Path<Id>,
    JsonBody(req): JsonBody<CommentRequest>,
) -> ApiResult<(StatusCode, Json<CommentResponse>)> {
    let board_id = card_board(&state, card_id).await?;
    require_member(&state, board_id, &user).await?;
    let body = validate_body(req.body)?;

    let comment = state
        .db()
        .comments()
        .create(&CardComment {
            id: 0,
            card_id,
            user_id: user.id,
            body,
            created_on: String::new(),
        })
        .await
        .map_err(db_error)?;
    info!(comment_id = comment.id, card_id, "created comment");

    Ok((StatusCode::CREATED, Json(CommentResponse::from(comment))))
}

/// Get a comment
#[utoipa::path(
    get,
    path = "/comments/{id}/",
    tag = "comments",
    params(("id" = i64, Path, description = "Comment ID")),
    responses(
        (status = 200, description = "Comment found", body = CommentResponse),
        (status = 403, description = "Caller is not a member", body = ErrorResponse),
        (status = 404, description = "Comment not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state, user))]
pub async fn get_comment<D: Database>(
    State(state): State<AppState<D>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Id>,
) -> ApiResult<Json<CommentResponse>> {
    let comment = state.db().comments().get(id).await.map_err(db_error)?;
    let board_id = card_board(&state, comment.card_id).await?;
    require_member(&state, board_id, &user).await?;

    Ok(Json(CommentResponse::from(comment)))
}

/// Edit a comment (author only)
#[utoipa::path(
    put,
    path = "/comments/{id}/",
    tag = "comments",
    params(("id" = i64, Path, description = "Comment ID")),
    request_body = CommentRequest,
    responses(
        (status = 200, description = "Comment updated", body = CommentResponse),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 403, description = "Caller is not the author", body = ErrorResponse),
        (status = 404, description = "Comment not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state, user))]
pub async fn update_comment<D: Database>(
    State(state): State<AppState<D>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Id>,
    JsonBody(req): JsonBody<CommentRequest>,
) -> ApiResult<Json<CommentResponse>> {
    let mut comment = authored_comment(&state, id, &user).await?;
    comment.body = validate_body(req.body)?;

    let updated = state
        .db()
        .comments()
        .update(&comment)
        .await
        .map_err(db_error)?;

    Ok(Json(CommentResponse::from(updated)))
}

/// Delete a comment (author only)
#[utoipa::path(
    delete,
    path = "/comments/{id}/",
    tag = "comments",
    params(("id" = i64, Path, description = "Comment ID")),
    responses(
        (status = 204, description = "Comment deleted"),
        (status = 403, description = "Caller is not the author", body = ErrorResponse),
        (status = 404, description = "Comment not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state, user))]
pub async fn delete_comment<D: Database>(
    State(state): State<AppState<D>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Id>,
) -> ApiResult<StatusCode> {
    authored_comment(&state, id, &user).await?;
    state.db().comments().delete(id).await.map_err(db_error)?;
    info!(comment_id = id, "deleted comment");

    Ok(StatusCode::NO_CONTENT)
}
