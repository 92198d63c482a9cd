//! Board handlers: detail, membership, favourites, recency and backgrounds.

use axum::{
    Extension, Json,
    extract::{Multipart, Path, Query, State, multipart::MultipartRejection},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::{IntoParams, ToSchema};

use super::columns::ColumnResponse;
use super::users::MemberResponse;
use super::validation::{field_error, parse_bool};
use super::{
    ApiResult, ErrorResponse, FieldErrors, JsonBody, bad_request, db_error, internal,
    multipart_error, require_board, require_member,
};
use crate::access::Action;
use crate::api::{AppState, CurrentUser, MediaKind, media::content_type_for};
use crate::db::{
    Board, BoardDetail, BoardRepository, CardFileRepository, Database, DbError, Id, LastSeen, User,
    UserRepository,
};

const TITLE_MAX: usize = 50;
pub const BACKGROUND_FIELD: &str = "background_img";

// =============================================================================
// DTOs
// =============================================================================

/// Flat board response DTO
#[derive(Serialize, ToSchema)]
pub struct BoardResponse {
    #[schema(example = 1)]
    pub id: Id,
    /// Project id
    #[schema(example = 1)]
    pub project: Id,
    #[schema(example = "Example Board")]
    pub title: String,
    /// Background image path relative to the media root
    #[schema(example = "back_img/5d1c..._sky.png")]
    pub background_img: Option<String>,
    pub is_archived: bool,
    #[schema(example = "2025-01-01 00:00:00.000")]
    pub created_on: String,
    #[schema(example = "2025-01-01 00:00:00.000")]
    pub last_modified: String,
}

impl From<Board> for BoardResponse {
    fn from(b: Board) -> Self {
        Self {
            id: b.id,
            project: b.project_id,
            title: b.title,
            background_img: b.background_img,
            is_archived: b.is_archived,
            created_on: b.created_on,
            last_modified: b.last_modified,
        }
    }
}

/// Board with columns, cards and members
#[derive(Serialize, ToSchema)]
pub struct BoardDetailResponse {
    #[serde(flatten)]
    pub board: BoardResponse,
    pub columns: Vec<ColumnResponse>,
    pub members: Vec<MemberResponse>,
}

impl From<BoardDetail> for BoardDetailResponse {
    fn from(d: BoardDetail) -> Self {
        Self {
            board: BoardResponse::from(d.board),
            columns: d.columns.into_iter().map(ColumnResponse::from).collect(),
            members: d.members.into_iter().map(MemberResponse::from).collect(),
        }
    }
}

/// Last-seen record DTO
#[derive(Serialize, ToSchema)]
pub struct LastSeenResponse {
    #[schema(example = "2025-01-01 00:00:00.000")]
    pub timestamp: String,
    pub board: BoardResponse,
}

impl From<LastSeen> for LastSeenResponse {
    fn from(s: LastSeen) -> Self {
        Self {
            timestamp: s.timestamp,
            board: BoardResponse::from(s.board),
        }
    }
}

/// Favourite marker DTO
#[derive(Serialize, ToSchema)]
pub struct FavouriteResponse {
    pub board: Id,
    pub user: Id,
}

/// Invitation response DTO
#[derive(Serialize, ToSchema)]
pub struct MemberInviteResponse {
    pub board: Id,
    /// Email of the invited user
    #[schema(example = "member@user.com")]
    pub user: String,
}

/// Board update request DTO. PUT requires `title`; PATCH takes any subset.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateBoardRequest {
    #[schema(example = "Renamed Board")]
    pub title: Option<String>,
    pub is_archived: Option<bool>,
}

/// Invite request DTO
#[derive(Debug, Deserialize, ToSchema)]
pub struct InviteRequest {
    /// Email of the user to invite
    #[schema(example = "member@user.com")]
    pub user: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListBoardsQuery {
    /// Archive flag filter: true/t/1 or false/f/0 (default false)
    #[param(example = "false")]
    pub is_archived: Option<String>,
}

// =============================================================================
// Helpers
// =============================================================================

async fn apply_update<D: Database>(
    state: &AppState<D>,
    id: Id,
    user: &User,
    req: UpdateBoardRequest,
    partial: bool,
) -> ApiResult<Board> {
    let mut board = state.db().boards().get(id).await.map_err(db_error)?;

    let mut errors = FieldErrors::new();
    let title = errors.text("title", req.title, TITLE_MAX, !partial);
    errors.finish()?;

    if let Some(title) = title {
        board.title = title;
    }
    if let Some(is_archived) = req.is_archived {
        board.is_archived = is_archived;
    }

    let updated = state.db().boards().update(&board).await.map_err(db_error)?;
    state
        .db()
        .boards()
        .touch_last_seen(id, user.id)
        .await
        .map_err(db_error)?;

    Ok(updated)
}

// =============================================================================
// Handlers
// =============================================================================

/// List boards the caller is a member of
#[utoipa::path(
    get,
    path = "/boards/",
    tag = "boards",
    params(ListBoardsQuery),
    responses(
        (status = 200, description = "Boards of the caller", body = Vec<BoardResponse>),
        (status = 400, description = "Invalid archive flag", body = ErrorResponse)
    )
)]
#[instrument(skip(state, user))]
pub async fn list_boards<D: Database>(
    State(state): State<AppState<D>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Query(query): Query<ListBoardsQuery>,
) -> ApiResult<Json<Vec<BoardResponse>>> {
    let is_archived = match query.is_archived.as_deref() {
        None => false,
        Some(raw) => parse_bool(raw)
            .ok_or_else(|| field_error("is_archived", "Must be a valid boolean."))?,
    };

    let boards = state
        .db()
        .boards()
        .list_for_member(user.id, Some(is_archived))
        .await
        .map_err(db_error)?;

    Ok(Json(boards.into_iter().map(BoardResponse::from).collect()))
}

/// List the caller's favourite boards
#[utoipa::path(
    get,
    path = "/boards/favourite/",
    tag = "boards",
    responses(
        (status = 200, description = "Favourite boards", body = Vec<BoardResponse>)
    )
)]
#[instrument(skip(state, user))]
pub async fn list_favourites<D: Database>(
    State(state): State<AppState<D>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> ApiResult<Json<Vec<BoardResponse>>> {
    let boards = state
        .db()
        .boards()
        .list_favourites(user.id)
        .await
        .map_err(db_error)?;

    Ok(Json(boards.into_iter().map(BoardResponse::from).collect()))
}

/// List recently viewed boards, most recent first
#[utoipa::path(
    get,
    path = "/boards/recent/",
    tag = "boards",
    responses(
        (status = 200, description = "Last-seen records", body = Vec<LastSeenResponse>)
    )
)]
#[instrument(skip(state, user))]
pub async fn list_recent<D: Database>(
    State(state): State<AppState<D>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> ApiResult<Json<Vec<LastSeenResponse>>> {
    let seen = state
        .db()
        .boards()
        .list_last_seen(user.id)
        .await
        .map_err(db_error)?;

    Ok(Json(seen.into_iter().map(LastSeenResponse::from).collect()))
}

/// Get a board with columns, cards and members
///
/// Refreshes the caller's last-seen timestamp for the board.
#[utoipa::path(
    get,
    path = "/boards/{id}/",
    tag = "boards",
    params(("id" = i64, Path, description = "Board ID")),
    responses(
        (status = 200, description = "Board detail", body = BoardDetailResponse),
        (status = 403, description = "Neither owner nor member", body = ErrorResponse),
        (status = 404, description = "Board not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state, user))]
pub async fn get_board<D: Database>(
    State(state): State<AppState<D>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Id>,
) -> ApiResult<Json<BoardDetailResponse>> {
    require_board(&state, id, &user, Action::Read).await?;

    state
        .db()
        .boards()
        .touch_last_seen(id, user.id)
        .await
        .map_err(db_error)?;
    let detail = state.db().boards().get_detail(id).await.map_err(db_error)?;

    Ok(Json(BoardDetailResponse::from(detail)))
}

/// Replace a board's title (and optionally archive flag)
#[utoipa::path(
    put,
    path = "/boards/{id}/",
    tag = "boards",
    params(("id" = i64, Path, description = "Board ID")),
    request_body = UpdateBoardRequest,
    responses(
        (status = 200, description = "Board updated", body = BoardDetailResponse),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 403, description = "Caller is not the owner", body = ErrorResponse),
        (status = 404, description = "Board not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state, user))]
pub async fn update_board<D: Database>(
    State(state): State<AppState<D>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Id>,
    JsonBody(req): JsonBody<UpdateBoardRequest>,
) -> ApiResult<Json<BoardDetailResponse>> {
    require_board(&state, id, &user, Action::Write).await?;
    apply_update(&state, id, &user, req, false).await?;
    let detail = state.db().boards().get_detail(id).await.map_err(db_error)?;

    Ok(Json(BoardDetailResponse::from(detail)))
}

/// Partially update a board (title and/or archive flag)
#[utoipa::path(
    patch,
    path = "/boards/{id}/",
    tag = "boards",
    params(("id" = i64, Path, description = "Board ID")),
    request_body = UpdateBoardRequest,
    responses(
        (status = 200, description = "Board updated", body = BoardResponse),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 403, description = "Caller is not the owner", body = ErrorResponse),
        (status = 404, description = "Board not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state, user))]
pub async fn patch_board<D: Database>(
    State(state): State<AppState<D>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Id>,
    JsonBody(req): JsonBody<UpdateBoardRequest>,
) -> ApiResult<Json<BoardResponse>> {
    require_board(&state, id, &user, Action::Write).await?;
    let board = apply_update(&state, id, &user, req, true).await?;

    Ok(Json(BoardResponse::from(board)))
}

/// Delete a board and everything on it
#[utoipa::path(
    delete,
    path = "/boards/{id}/",
    tag = "boards",
    params(("id" = i64, Path, description = "Board ID")),
    responses(
        (status = 204, description = "Board deleted"),
        (status = 403, description = "Caller is not the owner", body = ErrorResponse),
        (status = 404, description = "Board not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state, user))]
pub async fn delete_board<D: Database>(
    State(state): State<AppState<D>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Id>,
) -> ApiResult<StatusCode> {
    require_board(&state, id, &user, Action::Write).await?;

    let board = state.db().boards().get(id).await.map_err(db_error)?;
    let files = state.db().files().list_by_board(id).await.map_err(db_error)?;
    state.db().boards().delete(id).await.map_err(db_error)?;
    info!(board_id = id, "deleted board");

    let stored = files.into_iter().map(|f| f.file).chain(board.background_img);
    state.media().remove_all(stored).await;

    Ok(StatusCode::NO_CONTENT)
}

/// Invite a user to a board by email
#[utoipa::path(
    post,
    path = "/boards/{id}/invite/",
    tag = "boards",
    params(("id" = i64, Path, description = "Board ID")),
    request_body = InviteRequest,
    responses(
        (status = 201, description = "User added as member", body = MemberInviteResponse),
        (status = 400, description = "Unknown user or already a member", body = ErrorResponse),
        (status = 403, description = "Caller is not the owner", body = ErrorResponse),
        (status = 404, description = "Board not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state, user))]
pub async fn invite_member<D: Database>(
    State(state): State<AppState<D>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Id>,
    JsonBody(req): JsonBody<InviteRequest>,
) -> ApiResult<(StatusCode, Json<MemberInviteResponse>)> {
    require_board(&state, id, &user, Action::Write).await?;

    let mut errors = FieldErrors::new();
    let email = errors.text("user", req.user, 254, true);
    errors.finish()?;
    let email = email.unwrap_or_default();

    let invitee = state
        .db()
        .users()
        .find_by_email(&email)
        .await
        .map_err(db_error)?
        .ok_or_else(|| field_error("user", "User with this email does not exist."))?;

    match state.db().boards().add_member(id, invitee.id).await {
        Ok(()) => {}
        Err(DbError::AlreadyExists { .. }) => {
            return Err(field_error("user", "User is already a member of this board."));
        }
        Err(e) => return Err(db_error(e)),
    }
    info!(board_id = id, member = invitee.id, "invited member");

    Ok((
        StatusCode::CREATED,
        Json(MemberInviteResponse {
            board: id,
            user: invitee.email,
        }),
    ))
}

/// Mark a board as favourite
///
/// Favouriting twice keeps a single marker.
#[utoipa::path(
    post,
    path = "/boards/{id}/favourite/",
    tag = "boards",
    params(("id" = i64, Path, description = "Board ID")),
    responses(
        (status = 201, description = "Board favourited", body = FavouriteResponse),
        (status = 403, description = "Caller is not a member", body = ErrorResponse),
        (status = 404, description = "Board not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state, user))]
pub async fn favourite_board<D: Database>(
    State(state): State<AppState<D>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Id>,
) -> ApiResult<(StatusCode, Json<FavouriteResponse>)> {
    require_member(&state, id, &user).await?;

    let added = state
        .db()
        .boards()
        .add_favourite(id, user.id)
        .await
        .map_err(db_error)?;
    if added {
        info!(board_id = id, user_id = user.id, "favourited board");
    }

    Ok((
        StatusCode::CREATED,
        Json(FavouriteResponse {
            board: id,
            user: user.id,
        }),
    ))
}

/// Remove a board from favourites
#[utoipa::path(
    delete,
    path = "/boards/{id}/favourite/",
    tag = "boards",
    params(("id" = i64, Path, description = "Board ID")),
    responses(
        (status = 204, description = "Favourite removed"),
        (status = 403, description = "Caller is not a member", body = ErrorResponse),
        (status = 404, description = "Board or favourite not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state, user))]
pub async fn unfavourite_board<D: Database>(
    State(state): State<AppState<D>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Id>,
) -> ApiResult<StatusCode> {
    require_member(&state, id, &user).await?;
    state
        .db()
        .boards()
        .remove_favourite(id, user.id)
        .await
        .map_err(db_error)?;

    Ok(StatusCode::NO_CONTENT)
}

/// Upload a board background image
///
/// Expects a multipart form with a `background_img` image field. Replaces
/// any previous background.
#[utoipa::path(
    post,
    path = "/boards/{id}/background/",
    tag = "boards",
    params(("id" = i64, Path, description = "Board ID")),
    request_body(content_type = "multipart/form-data", description = "Form with a `background_img` image field"),
    responses(
        (status = 200, description = "Background stored", body = BoardResponse),
        (status = 400, description = "Missing or non-image upload", body = ErrorResponse),
        (status = 403, description = "Caller is not the owner", body = ErrorResponse),
        (status = 404, description = "Board not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state, user, multipart))]
pub async fn upload_background<D: Database>(
    State(state): State<AppState<D>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Id>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<BoardResponse>> {
    require_board(&state, id, &user, Action::Write).await?;
    let mut multipart = multipart.map_err(|e| bad_request(e.body_text()))?;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(BACKGROUND_FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or("background").to_string();
        let content_type = content_type_for(&file_name, field.content_type());
        if !content_type.starts_with("image/") {
            return Err(field_error(
                BACKGROUND_FIELD,
                "Upload a valid image. The file you uploaded was either not an image or a corrupted image.",
            ));
        }

        let bytes = field.bytes().await.map_err(multipart_error)?;
        if bytes.is_empty() {
            return Err(field_error(BACKGROUND_FIELD, "The submitted file is empty."));
        }

        let mut board = state.db().boards().get(id).await.map_err(db_error)?;
        let stored = state
            .media()
            .save(MediaKind::Background, &file_name, &bytes)
            .await
            .map_err(|e| internal(format!("Failed to store background: {}", e)))?;

        let previous = board.background_img.replace(stored.clone());
        let updated = match state.db().boards().update(&board).await {
            Ok(updated) => updated,
            Err(e) => {
                state.media().remove_all([stored]).await;
                return Err(db_error(e));
            }
        };

        state.media().remove_all(previous).await;
        info!(board_id = id, "uploaded background");

        return Ok(Json(BoardResponse::from(updated)));
    }

    Err(field_error(BACKGROUND_FIELD, "No file was submitted."))
}
