//! Card attachment handlers. Open to board members.

use axum::{
    Extension, Json,
    extract::{Multipart, Path, State, multipart::MultipartRejection},
    http::StatusCode,
};
use serde::Serialize;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;

use super::validation::field_error;
use super::{
    ApiResult, ErrorResponse, bad_request, db_error, internal, multipart_error, require_member,
};
use crate::api::media::{content_type_for, safe_file_name};
use crate::api::{AppState, CurrentUser, MediaKind};
use crate::db::{CardFile, CardFileRepository, CardRepository, Database, Id, User};

pub const FILE_FIELD: &str = "file";

/// Attachment response DTO
#[derive(Serialize, ToSchema)]
pub struct FileResponse {
    #[schema(example = 1)]
    pub id: Id,
    /// Card id
    #[schema(example = 1)]
    pub card: Id,
    /// Path relative to the media root
    #[schema(example = "card_files/5d1c..._notes.txt")]
    pub file: String,
    /// Original file name
    #[schema(example = "notes.txt")]
    pub name: String,
    #[schema(example = "text/plain")]
    pub content_type: String,
    pub size: i64,
    pub created_on: String,
}

impl From<CardFile> for FileResponse {
    fn from(f: CardFile) -> Self {
        Self {
            id: f.id,
            card: f.card_id,
            file: f.file,
            name: f.name,
            content_type: f.content_type,
            size: f.size,
            created_on: f.created_on,
        }
    }
}

async fn require_card_member<D: Database>(
    state: &AppState<D>,
    card_id: Id,
    user: &User,
) -> ApiResult<()> {
    let board_id = state
        .db()
        .cards()
        .board_id(card_id)
        .await
        .map_err(db_error)?;
    require_member(state, board_id, user).await?;
    Ok(())
}

/// List the attachments of a card
#[utoipa::path(
    get,
    path = "/files/card/{id}/",
    tag = "files",
    params(("id" = i64, Path, description = "Card ID")),
    responses(
        (status = 200, description = "Attachments of the card", body = Vec<FileResponse>),
        (status = 403, description = "Caller is not a member", body = ErrorResponse),
        (status = 404, description = "Card not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state, user))]
pub async fn list_files<D: Database>(
    State(state): State<AppState<D>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(card_id): Path<Id>,
) -> ApiResult<Json<Vec<FileResponse>>> {
    require_card_member(&state, card_id, &user).await?;
    let files = state
        .db()
        .files()
        .list_by_card(card_id)
        .await
        .map_err(db_error)?;

    Ok(Json(files.into_iter().map(FileResponse::from).collect()))
}

/// Upload an attachment to a card
///
/// Expects a multipart form with a `file` field.
#[utoipa::path(
    post,
    path = "/files/card/{id}/",
    tag = "files",
    params(("id" = i64, Path, description = "Card ID")),
    request_body(content_type = "multipart/form-data", description = "Form with a `file` field"),
    responses(
        (status = 201, description = "Attachment stored", body = FileResponse),
        (status = 400, description = "No file submitted", body = ErrorResponse),
        (status = 403, description = "Caller is not a member", body = ErrorResponse),
        (status = 404, description = "Card not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state, user, multipart))]
pub async fn upload_file<D: Database>(
    State(state): State<AppState<D>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(card_id): Path<Id>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<(StatusCode, Json<FileResponse>)> {
    require_card_member(&state, card_id, &user).await?;
    let mut multipart = multipart.map_err(|e| bad_request(e.body_text()))?;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let name = safe_file_name(field.file_name().unwrap_or("upload"));
        let content_type = content_type_for(&name, field.content_type());
        let bytes = field.bytes().await.map_err(multipart_error)?;
        if bytes.is_empty() {
            return Err(field_error(FILE_FIELD, "The submitted file is empty."));
        }

        let stored = state
            .media()
            .save(MediaKind::CardFile, &name, &bytes)
            .await
            .map_err(|e| internal(format!("Failed to store upload: {}", e)))?;

        let record = CardFile {
            id: 0,
            card_id,
            file: stored.clone(),
            name,
            content_type,
            size: bytes.len() as i64,
            created_on: String::new(),
        };
        let file = match state.db().files().create(&record).await {
            Ok(file) => file,
            Err(e) => {
                if let Err(remove_err) = state.media().remove(&stored).await {
                    warn!(error = %remove_err, "failed to clean up {}", stored);
                }
                return Err(db_error(e));
            }
        };
        info!(file_id = file.id, card_id, size = file.size, "uploaded attachment");

        return Ok((StatusCode::CREATED, Json(FileResponse::from(file))));
    }

    Err(field_error(FILE_FIELD, "No file was submitted."))
}

/// Get an attachment record
#[utoipa::path(
    get,
    path = "/files/{id}/",
    tag = "files",
    params(("id" = i64, Path, description = "File ID")),
    responses(
        (status = 200, description = "Attachment found", body = FileResponse),
        (status = 403, description = "Caller is not a member", body = ErrorResponse),
        (status = 404, description = "File not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state, user))]
pub async fn get_file<D: Database>(
    State(state): State<AppState<D>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Id>,
) -> ApiResult<Json<FileResponse>> {
    let file = state.db().files().get(id).await.map_err(db_error)?;
    require_card_member(&state, file.card_id, &user).await?;

    Ok(Json(FileResponse::from(file)))
}

/// Delete an attachment and its stored file
#[utoipa::path(
    delete,
    path = "/files/{id}/",
    tag = "files",
    params(("id" = i64, Path, description = "File ID")),
    responses(
        (status = 204, description = "Attachment deleted"),
        (status = 403, description = "Caller is not a member", body = ErrorResponse),
        (status = 404, description = "File not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state, user))]
pub async fn delete_file<D: Database>(
    State(state): State<AppState<D>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Id>,
) -> ApiResult<StatusCode> {
    let file = state.db().files().get(id).await.map_err(db_error)?;
    require_card_member(&state, file.card_id, &user).await?;

    state.db().files().delete(id).await.map_err(db_error)?;
    info!(file_id = id, "deleted attachment");

    if let Err(e) = state.media().remove(&file.file).await {
        warn!(error = %e, "failed to remove stored file {}", file.file);
    }

    Ok(StatusCode::NO_CONTENT)
}
