//! Card handlers, including mark attachment. Open to board members.

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{info, instrument};
use utoipa::ToSchema;

use super::comments::CommentResponse;
use super::files::FileResponse;
use super::marks::MarkResponse;
use super::validation::field_error;
use super::{ApiResult, ErrorResponse, FieldErrors, JsonBody, db_error, require_member};
use crate::api::{AppState, CurrentUser};
use crate::db::{
    Card, CardDetail, CardFileRepository, CardRepository, ColumnRepository, Database, DbError, Id,
    MarkRepository, User,
};

const TITLE_MAX: usize = 30;
const DESCRIPTION_MAX: usize = 500;

fn default_checklist() -> Value {
    json!({"Make a to-do": false})
}

// =============================================================================
// DTOs
// =============================================================================

/// Card response DTO with marks, files and comments
#[derive(Serialize, ToSchema)]
pub struct CardResponse {
    #[schema(example = 1)]
    pub id: Id,
    /// Column id
    #[schema(example = 1)]
    pub column: Id,
    #[schema(example = "Write docs")]
    pub title: String,
    pub description: String,
    /// Freeform checklist object
    #[schema(value_type = Object, example = json!({"Make a to-do": false}))]
    pub checklist: Value,
    #[schema(example = "2030-01-01T00:00:00Z")]
    pub deadline: String,
    pub marks: Vec<MarkResponse>,
    pub files: Vec<FileResponse>,
    pub comments: Vec<CommentResponse>,
}

impl From<CardDetail> for CardResponse {
    fn from(d: CardDetail) -> Self {
        Self {
            id: d.card.id,
            column: d.card.column_id,
            title: d.card.title,
            description: d.card.description,
            checklist: d.card.checklist,
            deadline: d.card.deadline,
            marks: d.marks.into_iter().map(MarkResponse::from).collect(),
            files: d.files.into_iter().map(FileResponse::from).collect(),
            comments: d.comments.into_iter().map(CommentResponse::from).collect(),
        }
    }
}

/// Card request DTO
///
/// Create and PUT require `title`, `description` and `deadline`; PATCH
/// takes any subset. `column` moves the card within its board.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CardRequest {
    #[schema(example = "Write docs")]
    pub title: Option<String>,
    #[schema(example = "Describe every endpoint")]
    pub description: Option<String>,
    #[schema(example = "2030-01-01T00:00:00Z")]
    pub deadline: Option<String>,
    #[schema(value_type = Object)]
    pub checklist: Option<Value>,
    /// Target column id (update only)
    pub column: Option<Id>,
}

/// Attach mark request DTO
#[derive(Debug, Deserialize, ToSchema)]
pub struct CardMarkRequest {
    #[schema(example = 1)]
    pub mark: Option<Id>,
}

/// Card-mark link DTO
#[derive(Serialize, ToSchema)]
pub struct CardMarkResponse {
    pub card: Id,
    pub mark: Id,
}

// =============================================================================
// Helpers
// =============================================================================

/// Resolve a card's board and require membership of it.
async fn card_board<D: Database>(state: &AppState<D>, card_id: Id, user: &User) -> ApiResult<Id> {
    let board_id = state
        .db()
        .cards()
        .board_id(card_id)
        .await
        .map_err(db_error)?;
    require_member(state, board_id, user).await?;
    Ok(board_id)
}

fn validate_checklist(errors: &mut FieldErrors, checklist: Option<Value>) -> Option<Value> {
    match checklist {
        Some(value) if !value.is_object() => {
            errors.add("checklist", "Checklist must be a JSON object.");
            None
        }
        other => other,
    }
}

async fn apply_update<D: Database>(
    state: &AppState<D>,
    id: Id,
    user: &User,
    req: CardRequest,
    partial: bool,
) -> ApiResult<CardResponse> {
    let board_id = card_board(state, id, user).await?;
    let mut card = state.db().cards().get(id).await.map_err(db_error)?;

    let mut errors = FieldErrors::new();
    let title = errors.text("title", req.title, TITLE_MAX, !partial);
    let description = errors.text("description", req.description, DESCRIPTION_MAX, !partial);
    let deadline = errors.deadline("deadline", req.deadline, !partial);
    let checklist = validate_checklist(&mut errors, req.checklist);
    errors.finish()?;

    if let Some(column_id) = req.column.filter(|c| *c != card.column_id) {
        let target = match state.db().columns().get(column_id).await {
            Ok(column) => column,
            Err(DbError::NotFound { .. }) => {
                return Err(field_error(
                    "column",
                    format!("Invalid pk \"{}\" - object does not exist.", column_id),
                ));
            }
            Err(e) => return Err(db_error(e)),
        };
        if target.board_id != board_id {
            return Err(field_error("column", "Column belongs to a different board."));
        }
        card.column_id = column_id;
    }

    if let Some(title) = title {
        card.title = title;
    }
    if let Some(description) = description {
        card.description = description;
    }
    if let Some(deadline) = deadline {
        card.deadline = deadline;
    }
    if let Some(checklist) = checklist {
        card.checklist = checklist;
    }

    state.db().cards().update(&card).await.map_err(db_error)?;
    let detail = state.db().cards().get_detail(id).await.map_err(db_error)?;

    Ok(CardResponse::from(detail))
}

// =============================================================================
// Handlers
// =============================================================================

/// List the cards of a column
#[utoipa::path(
    get,
    path = "/cards/column/{id}/",
    tag = "cards",
    params(("id" = i64, Path, description = "Column ID")),
    responses(
        (status = 200, description = "Cards of the column", body = Vec<CardResponse>),
        (status = 403, description = "Caller is not a member", body = ErrorResponse),
        (status = 404, description = "Column not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state, user))]
pub async fn list_cards<D: Database>(
    State(state): State<AppState<D>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(column_id): Path<Id>,
) -> ApiResult<Json<Vec<CardResponse>>> {
    let column = state.db().columns().get(column_id).await.map_err(db_error)?;
    require_member(&state, column.board_id, &user).await?;

    let cards = state
        .db()
        .cards()
        .list_by_column(column_id)
        .await
        .map_err(db_error)?;

    Ok(Json(cards.into_iter().map(CardResponse::from).collect()))
}

/// Add a card to a column
#[utoipa::path(
    post,
    path = "/cards/column/{id}/",
    tag = "cards",
    params(("id" = i64, Path, description = "Column ID")),
    request_body = CardRequest,
    responses(
        (status = 201, description = "Card created", body = CardResponse),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 403, description = "Caller is not a member", body = ErrorResponse),
        (status = 404, description = "Column not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state, user))]
pub async fn create_card<D: Database>(
    State(state): State<AppState<D>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(column_id): Path<Id>,
    JsonBody(req): JsonBody<CardRequest>,
) -> ApiResult<(StatusCode, Json<CardResponse>)> {
    let column = state.db().columns().get(column_id).await.map_err(db_error)?;
    require_member(&state, column.board_id, &user).await?;

    let mut errors = FieldErrors::new();
    let title = errors.text("title", req.title, TITLE_MAX, true);
    let description = errors.text("description", req.description, DESCRIPTION_MAX, true);
    let deadline = errors.deadline("deadline", req.deadline, true);
    let checklist = validate_checklist(&mut errors, req.checklist);
    errors.finish()?;

    let card = state
        .db()
        .cards()
        .create(&Card {
            id: 0,
            column_id,
            title: title.unwrap_or_default(),
            description: description.unwrap_or_default(),
            deadline: deadline.unwrap_or_default(),
            checklist: checklist.unwrap_or_else(default_checklist),
        })
        .await
        .map_err(db_error)?;
    info!(card_id = card.id, column_id, "created card");

    Ok((
        StatusCode::CREATED,
        Json(CardResponse::from(CardDetail {
            card,
            marks: Vec::new(),
            files: Vec::new(),
            comments: Vec::new(),
        })),
    ))
}

/// Get a card with marks, files and comments
#[utoipa::path(
    get,
    path = "/cards/{id}/",
    tag = "cards",
    params(("id" = i64, Path, description = "Card ID")),
    responses(
        (status = 200, description = "Card found", body = CardResponse),
        (status = 403, description = "Caller is not a member", body = ErrorResponse),
        (status = 404, description = "Card not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state, user))]
pub async fn get_card<D: Database>(
    State(state): State<AppState<D>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Id>,
) -> ApiResult<Json<CardResponse>> {
    card_board(&state, id, &user).await?;
    let detail = state.db().cards().get_detail(id).await.map_err(db_error)?;

    Ok(Json(CardResponse::from(detail)))
}

/// Replace a card's fields
#[utoipa::path(
    put,
    path = "/cards/{id}/",
    tag = "cards",
    params(("id" = i64, Path, description = "Card ID")),
    request_body = CardRequest,
    responses(
        (status = 200, description = "Card updated", body = CardResponse),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 403, description = "Caller is not a member", body = ErrorResponse),
        (status = 404, description = "Card not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state, user))]
pub async fn update_card<D: Database>(
    State(state): State<AppState<D>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Id>,
    JsonBody(req): JsonBody<CardRequest>,
) -> ApiResult<Json<CardResponse>> {
    apply_update(&state, id, &user, req, false).await.map(Json)
}

/// Partially update a card, possibly moving it to another column
#[utoipa::path(
    patch,
    path = "/cards/{id}/",
    tag = "cards",
    params(("id" = i64, Path, description = "Card ID")),
    request_body = CardRequest,
    responses(
        (status = 200, description = "Card updated", body = CardResponse),
        (status = 400, description = "Validation failed or column on another board", body = ErrorResponse),
        (status = 403, description = "Caller is not a member", body = ErrorResponse),
        (status = 404, description = "Card not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state, user))]
pub async fn patch_card<D: Database>(
    State(state): State<AppState<D>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Id>,
    JsonBody(req): JsonBody<CardRequest>,
) -> ApiResult<Json<CardResponse>> {
    apply_update(&state, id, &user, req, true).await.map(Json)
}

/// Delete a card
#[utoipa::path(
    delete,
    path = "/cards/{id}/",
    tag = "cards",
    params(("id" = i64, Path, description = "Card ID")),
    responses(
        (status = 204, description = "Card deleted"),
        (status = 403, description = "Caller is not a member", body = ErrorResponse),
        (status = 404, description = "Card not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state, user))]
pub async fn delete_card<D: Database>(
    State(state): State<AppState<D>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Id>,
) -> ApiResult<StatusCode> {
    card_board(&state, id, &user).await?;

    let files = state.db().files().list_by_card(id).await.map_err(db_error)?;
    state.db().cards().delete(id).await.map_err(db_error)?;
    info!(card_id = id, "deleted card");

    state
        .media()
        .remove_all(files.iter().map(|f| f.file.as_str()).collect::<Vec<_>>())
        .await;

    Ok(StatusCode::NO_CONTENT)
}

/// Attach a mark of the same board to a card
#[utoipa::path(
    post,
    path = "/cards/{id}/marks/",
    tag = "cards",
    params(("id" = i64, Path, description = "Card ID")),
    request_body = CardMarkRequest,
    responses(
        (status = 201, description = "Mark attached", body = CardMarkResponse),
        (status = 400, description = "Unknown mark or mark of another board", body = ErrorResponse),
        (status = 403, description = "Caller is not a member", body = ErrorResponse),
        (status = 404, description = "Card not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state, user))]
pub async fn attach_mark<D: Database>(
    State(state): State<AppState<D>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Id>,
    JsonBody(req): JsonBody<CardMarkRequest>,
) -> ApiResult<(StatusCode, Json<CardMarkResponse>)> {
    let board_id = card_board(&state, id, &user).await?;

    let mark_id = req
        .mark
        .ok_or_else(|| field_error("mark", super::validation::REQUIRED))?;
    let mark = match state.db().marks().get(mark_id).await {
        Ok(mark) => mark,
        Err(DbError::NotFound { .. }) => {
            return Err(field_error(
                "mark",
                format!("Invalid pk \"{}\" - object does not exist.", mark_id),
            ));
        }
        Err(e) => return Err(db_error(e)),
    };
    if mark.board_id != board_id {
        return Err(field_error("mark", "Mark belongs to a different board."));
    }

    state
        .db()
        .cards()
        .attach_mark(id, mark_id)
        .await
        .map_err(db_error)?;

    Ok((
        StatusCode::CREATED,
        Json(CardMarkResponse {
            card: id,
            mark: mark_id,
        }),
    ))
}

/// Detach a mark from a card
#[utoipa::path(
    delete,
    path = "/cards/{id}/marks/{mark_id}/",
    tag = "cards",
    params(
        ("id" = i64, Path, description = "Card ID"),
        ("mark_id" = i64, Path, description = "Mark ID")
    ),
    responses(
        (status = 204, description = "Mark detached"),
        (status = 403, description = "Caller is not a member", body = ErrorResponse),
        (status = 404, description = "Card or attachment not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state, user))]
pub async fn detach_mark<D: Database>(
    State(state): State<AppState<D>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path((id, mark_id)): Path<(Id, Id)>,
) -> ApiResult<StatusCode> {
    card_board(&state, id, &user).await?;
    state
        .db()
        .cards()
        .detach_mark(id, mark_id)
        .await
        .map_err(db_error)?;

    Ok(StatusCode::NO_CONTENT)
}
