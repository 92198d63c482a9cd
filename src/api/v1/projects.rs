//! Project handlers. Projects are private to their owner.

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::ToSchema;

use super::boards::BoardResponse;
use super::{ApiResult, ErrorResponse, FieldErrors, JsonBody, db_error, forbidden};
use crate::access;
use crate::api::{AppState, CurrentUser};
use crate::db::{
    Board, BoardRepository, CardFileRepository, Database, Id, Project, ProjectRepository, User,
};

const TITLE_MAX: usize = 50;

// =============================================================================
// DTOs
// =============================================================================

/// Project response DTO
#[derive(Serialize, ToSchema)]
pub struct ProjectResponse {
    #[schema(example = 1)]
    pub id: Id,
    #[schema(example = "My Project")]
    pub title: String,
    /// Owner user id
    #[schema(example = 1)]
    pub owner: Id,
    /// Boards of the project
    pub boards: Vec<BoardResponse>,
}

impl ProjectResponse {
    fn new(project: Project, boards: Vec<Board>) -> Self {
        Self {
            id: project.id,
            title: project.title,
            owner: project.owner_id,
            boards: boards.into_iter().map(BoardResponse::from).collect(),
        }
    }
}

/// Create or update project request DTO
#[derive(Debug, Deserialize, ToSchema)]
pub struct ProjectRequest {
    #[schema(example = "My Project")]
    pub title: Option<String>,
}

/// Create board request DTO
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateBoardRequest {
    #[schema(example = "Example Board")]
    pub title: Option<String>,
}

// =============================================================================
// Helpers
// =============================================================================

/// Fetch a project and require the acting user to own it.
async fn owned_project<D: Database>(state: &AppState<D>, id: Id, user: &User) -> ApiResult<Project> {
    let project = state.db().projects().get(id).await.map_err(db_error)?;
    if access::can_access_project(user.id, &project) {
        Ok(project)
    } else {
        Err(forbidden(user, "project", id))
    }
}

fn validate_title(title: Option<String>) -> ApiResult<String> {
    let mut errors = FieldErrors::new();
    let title = errors.text("title", title, TITLE_MAX, true);
    errors.finish()?;
    Ok(title.unwrap_or_default())
}

// =============================================================================
// Handlers
// =============================================================================

/// List own projects
#[utoipa::path(
    get,
    path = "/projects/",
    tag = "projects",
    responses(
        (status = 200, description = "Projects owned by the caller", body = Vec<ProjectResponse>),
        (status = 403, description = "Not authenticated", body = ErrorResponse)
    )
)]
#[instrument(skip(state, user))]
pub async fn list_projects<D: Database>(
    State(state): State<AppState<D>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> ApiResult<Json<Vec<ProjectResponse>>> {
    let projects = state
        .db()
        .projects()
        .list_by_owner(user.id)
        .await
        .map_err(db_error)?;

    let mut items = Vec::with_capacity(projects.len());
    for project in projects {
        let boards = state
            .db()
            .boards()
            .list_by_project(project.id)
            .await
            .map_err(db_error)?;
        items.push(ProjectResponse::new(project, boards));
    }

    Ok(Json(items))
}

/// Create a project owned by the caller
#[utoipa::path(
    post,
    path = "/projects/",
    tag = "projects",
    request_body = ProjectRequest,
    responses(
        (status = 201, description = "Project created", body = ProjectResponse),
        (status = 400, description = "Validation failed", body = ErrorResponse)
    )
)]
#[instrument(skip(state, user))]
pub async fn create_project<D: Database>(
    State(state): State<AppState<D>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    JsonBody(req): JsonBody<ProjectRequest>,
) -> ApiResult<(StatusCode, Json<ProjectResponse>)> {
    let title = validate_title(req.title)?;

    let project = state
        .db()
        .projects()
        .create(&Project {
            id: 0,
            owner_id: user.id,
            title,
            created_at: String::new(),
            updated_at: String::new(),
        })
        .await
        .map_err(db_error)?;
    info!(project_id = project.id, owner = user.id, "created project");

    Ok((
        StatusCode::CREATED,
        Json(ProjectResponse::new(project, Vec::new())),
    ))
}

/// Get a project
#[utoipa::path(
    get,
    path = "/projects/{id}/",
    tag = "projects",
    params(("id" = i64, Path, description = "Project ID")),
    responses(
        (status = 200, description = "Project found", body = ProjectResponse),
        (status = 403, description = "Caller is not the owner", body = ErrorResponse),
        (status = 404, description = "Project not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state, user))]
pub async fn get_project<D: Database>(
    State(state): State<AppState<D>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Id>,
) -> ApiResult<Json<ProjectResponse>> {
    let project = owned_project(&state, id, &user).await?;
    let boards = state
        .db()
        .boards()
        .list_by_project(id)
        .await
        .map_err(db_error)?;

    Ok(Json(ProjectResponse::new(project, boards)))
}

/// Update a project
#[utoipa::path(
    put,
    path = "/projects/{id}/",
    tag = "projects",
    params(("id" = i64, Path, description = "Project ID")),
    request_body = ProjectRequest,
    responses(
        (status = 200, description = "Project updated", body = ProjectResponse),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 403, description = "Caller is not the owner", body = ErrorResponse),
        (status = 404, description = "Project not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state, user))]
pub async fn update_project<D: Database>(
    State(state): State<AppState<D>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Id>,
    JsonBody(req): JsonBody<ProjectRequest>,
) -> ApiResult<Json<ProjectResponse>> {
    let mut project = owned_project(&state, id, &user).await?;
    project.title = validate_title(req.title)?;

    let updated = state
        .db()
        .projects()
        .update(&project)
        .await
        .map_err(db_error)?;
    let boards = state
        .db()
        .boards()
        .list_by_project(id)
        .await
        .map_err(db_error)?;

    Ok(Json(ProjectResponse::new(updated, boards)))
}

/// Delete a project and all its boards
#[utoipa::path(
    delete,
    path = "/projects/{id}/",
    tag = "projects",
    params(("id" = i64, Path, description = "Project ID")),
    responses(
        (status = 204, description = "Project deleted"),
        (status = 403, description = "Caller is not the owner", body = ErrorResponse),
        (status = 404, description = "Project not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state, user))]
pub async fn delete_project<D: Database>(
    State(state): State<AppState<D>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Id>,
) -> ApiResult<StatusCode> {
    owned_project(&state, id, &user).await?;

    let files = state.db().files().list_by_project(id).await.map_err(db_error)?;
    let boards = state
        .db()
        .boards()
        .list_by_project(id)
        .await
        .map_err(db_error)?;
    state.db().projects().delete(id).await.map_err(db_error)?;
    info!(project_id = id, "deleted project");

    let stored = files
        .into_iter()
        .map(|f| f.file)
        .chain(boards.into_iter().filter_map(|b| b.background_img));
    state.media().remove_all(stored).await;

    Ok(StatusCode::NO_CONTENT)
}

/// List the boards of a project
#[utoipa::path(
    get,
    path = "/projects/{id}/boards/",
    tag = "projects",
    params(("id" = i64, Path, description = "Project ID")),
    responses(
        (status = 200, description = "Boards of the project", body = Vec<BoardResponse>),
        (status = 403, description = "Caller is not the owner", body = ErrorResponse),
        (status = 404, description = "Project not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state, user))]
pub async fn list_project_boards<D: Database>(
    State(state): State<AppState<D>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Id>,
) -> ApiResult<Json<Vec<BoardResponse>>> {
    owned_project(&state, id, &user).await?;
    let boards = state
        .db()
        .boards()
        .list_by_project(id)
        .await
        .map_err(db_error)?;

    Ok(Json(boards.into_iter().map(BoardResponse::from).collect()))
}

/// Create a board in a project
///
/// The creator becomes the board's first member.
#[utoipa::path(
    post,
    path = "/projects/{id}/boards/",
    tag = "projects",
    params(("id" = i64, Path, description = "Project ID")),
    request_body = CreateBoardRequest,
    responses(
        (status = 201, description = "Board created", body = BoardResponse),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 403, description = "Caller is not the owner", body = ErrorResponse),
        (status = 404, description = "Project not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state, user))]
pub async fn create_board<D: Database>(
    State(state): State<AppState<D>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Id>,
    JsonBody(req): JsonBody<CreateBoardRequest>,
) -> ApiResult<(StatusCode, Json<BoardResponse>)> {
    owned_project(&state, id, &user).await?;
    let title = validate_title(req.title)?;

    let board = state
        .db()
        .boards()
        .create(
            &Board {
                id: 0,
                project_id: id,
                title,
                background_img: None,
                is_archived: false,
                created_on: String::new(),
                last_modified: String::new(),
            },
            user.id,
        )
        .await
        .map_err(db_error)?;
    info!(board_id = board.id, project_id = id, "created board");

    Ok((StatusCode::CREATED, Json(BoardResponse::from(board))))
}
