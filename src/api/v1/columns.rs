//! Column handlers. Open to board members.

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::ToSchema;

use super::cards::CardResponse;
use super::{ApiResult, ErrorResponse, FieldErrors, JsonBody, db_error, require_member};
use crate::api::{AppState, CurrentUser};
use crate::db::{CardFileRepository, Column, ColumnDetail, ColumnRepository, Database, Id};

const TITLE_MAX: usize = 30;

/// Column response DTO with nested cards
#[derive(Serialize, ToSchema)]
pub struct ColumnResponse {
    #[schema(example = 1)]
    pub id: Id,
    /// Board id
    #[schema(example = 1)]
    pub board: Id,
    #[schema(example = "Todo")]
    pub title: String,
    pub cards: Vec<CardResponse>,
}

impl From<ColumnDetail> for ColumnResponse {
    fn from(d: ColumnDetail) -> Self {
        Self {
            id: d.column.id,
            board: d.column.board_id,
            title: d.column.title,
            cards: d.cards.into_iter().map(CardResponse::from).collect(),
        }
    }
}

/// Create or update column request DTO
#[derive(Debug, Deserialize, ToSchema)]
pub struct ColumnRequest {
    #[schema(example = "Todo")]
    pub title: Option<String>,
}

fn validate_title(title: Option<String>) -> ApiResult<String> {
    let mut errors = FieldErrors::new();
    let title = errors.text("title", title, TITLE_MAX, true);
    errors.finish()?;
    Ok(title.unwrap_or_default())
}

/// List the columns of a board
#[utoipa::path(
    get,
    path = "/columns/board/{id}/",
    tag = "columns",
    params(("id" = i64, Path, description = "Board ID")),
    responses(
        (status = 200, description = "Columns with cards", body = Vec<ColumnResponse>),
        (status = 403, description = "Caller is not a member", body = ErrorResponse),
        (status = 404, description = "Board not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state, user))]
pub async fn list_columns<D: Database>(
    State(state): State<AppState<D>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(board_id): Path<Id>,
) -> ApiResult<Json<Vec<ColumnResponse>>> {
    require_member(&state, board_id, &user).await?;
    let columns = state
        .db()
        .columns()
        .list_by_board(board_id)
        .await
        .map_err(db_error)?;

    Ok(Json(columns.into_iter().map(ColumnResponse::from).collect()))
}

/// Add a column to a board
#[utoipa::path(
    post,
    path = "/columns/board/{id}/",
    tag = "columns",
    params(("id" = i64, Path, description = "Board ID")),
    request_body = ColumnRequest,
    responses(
        (status = 201, description = "Column created", body = ColumnResponse),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 403, description = "Caller is not a member", body = ErrorResponse),
        (status = 404, description = "Board not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state, user))]
pub async fn create_column<D: Database>(
    State(state): State<AppState<D>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(board_id): Path<Id>,
    JsonBody(req): JsonBody<ColumnRequest>,
) -> ApiResult<(StatusCode, Json<ColumnResponse>)> {
    require_member(&state, board_id, &user).await?;
    let title = validate_title(req.title)?;

    let column = state
        .db()
        .columns()
        .create(&Column {
            id: 0,
            board_id,
            title,
        })
        .await
        .map_err(db_error)?;
    info!(column_id = column.id, board_id, "created column");

    Ok((
        StatusCode::CREATED,
        Json(ColumnResponse::from(ColumnDetail {
            column,
            cards: Vec::new(),
        })),
    ))
}

/// Get a column with its cards
#[utoipa::path(
    get,
    path = "/columns/{id}/",
    tag = "columns",
    params(("id" = i64, Path, description = "Column ID")),
    responses(
        (status = 200, description = "Column found", body = ColumnResponse),
        (status = 403, description = "Caller is not a member", body = ErrorResponse),
        (status = 404, description = "Column not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state, user))]
pub async fn get_column<D: Database>(
    State(state): State<AppState<D>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Id>,
) -> ApiResult<Json<ColumnResponse>> {
    let column = state.db().columns().get(id).await.map_err(db_error)?;
    require_member(&state, column.board_id, &user).await?;
    let detail = state.db().columns().get_detail(id).await.map_err(db_error)?;

    Ok(Json(ColumnResponse::from(detail)))
}

/// Rename a column
#[utoipa::path(
    put,
    path = "/columns/{id}/",
    tag = "columns",
    params(("id" = i64, Path, description = "Column ID")),
    request_body = ColumnRequest,
    responses(
        (status = 200, description = "Column updated", body = ColumnResponse),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 403, description = "Caller is not a member", body = ErrorResponse),
        (status = 404, description = "Column not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state, user))]
pub async fn update_column<D: Database>(
    State(state): State<AppState<D>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Id>,
    JsonBody(req): JsonBody<ColumnRequest>,
) -> ApiResult<Json<ColumnResponse>> {
    let mut column = state.db().columns().get(id).await.map_err(db_error)?;
    require_member(&state, column.board_id, &user).await?;

    column.title = validate_title(req.title)?;
    state
        .db()
        .columns()
        .update(&column)
        .await
        .map_err(db_error)?;
    let detail = state.db().columns().get_detail(id).await.map_err(db_error)?;

    Ok(Json(ColumnResponse::from(detail)))
}

/// Delete a column and its cards
#[utoipa::path(
    delete,
    path = "/columns/{id}/",
    tag = "columns",
    params(("id" = i64, Path, description = "Column ID")),
    responses(
        (status = 204, description = "Column deleted"),
        (status = 403, description = "Caller is not a member", body = ErrorResponse),
        (status = 404, description = "Column not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state, user))]
pub async fn delete_column<D: Database>(
    State(state): State<AppState<D>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Id>,
) -> ApiResult<StatusCode> {
    let column = state.db().columns().get(id).await.map_err(db_error)?;
    require_member(&state, column.board_id, &user).await?;

    let files = state.db().files().list_by_column(id).await.map_err(db_error)?;
    state.db().columns().delete(id).await.map_err(db_error)?;
    info!(column_id = id, "deleted column");

    state
        .media()
        .remove_all(files.iter().map(|f| f.file.as_str()).collect::<Vec<_>>())
        .await;

    Ok(StatusCode::NO_CONTENT)
}
