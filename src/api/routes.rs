//! API route configuration.

use axum::Router;
use axum::middleware;
use axum::routing::{delete, get, patch, post, put};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use super::auth::require_token;
use super::state::AppState;
use super::v1::{self, *};
use crate::db::Database;

/// Build routes with generic database type.
///
/// Applies the turbofish for handlers generic over the Database trait.
/// Registering several methods on one path merges them into a single
/// method router.
macro_rules! routes {
    ($D:ty => {
        $($method:ident $path:literal => $($handler:ident)::+),* $(,)?
    }) => {{
        let router = Router::new();
        $(
            let router = router.route($path, $method($($handler)::+::<$D>));
        )*
        router
    }};
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Kanban API",
        version = "0.1.0",
        description = "Project boards with columns, cards, marks, attachments and comments",
        license(name = "GPL-2.0")
    ),
    paths(
        v1::health,
        v1::me,
        v1::list_projects,
        v1::create_project,
        v1::get_project,
        v1::update_project,
        v1::delete_project,
        v1::list_project_boards,
        v1::create_board,
        v1::list_boards,
        v1::list_favourites,
        v1::list_recent,
        v1::get_board,
        v1::update_board,
        v1::patch_board,
        v1::delete_board,
        v1::invite_member,
        v1::favourite_board,
        v1::unfavourite_board,
        v1::upload_background,
        v1::list_columns,
        v1::create_column,
        v1::get_column,
        v1::update_column,
        v1::delete_column,
        v1::list_cards,
        v1::create_card,
        v1::get_card,
        v1::update_card,
        v1::patch_card,
        v1::delete_card,
        v1::attach_mark,
        v1::detach_mark,
        v1::list_marks,
        v1::create_mark,
        v1::get_mark,
        v1::update_mark,
        v1::patch_mark,
        v1::delete_mark,
        v1::list_files,
        v1::upload_file,
        v1::get_file,
        v1::delete_file,
        v1::list_comments,
        v1::create_comment,
        v1::get_comment,
        v1::update_comment,
        v1::delete_comment,
    ),
    components(
        schemas(
            HealthResponse,
            ErrorResponse,
            UserResponse,
            MemberResponse,
            ProjectResponse,
            ProjectRequest,
            CreateBoardRequest,
            BoardResponse,
            BoardDetailResponse,
            LastSeenResponse,
            FavouriteResponse,
            MemberInviteResponse,
            UpdateBoardRequest,
            InviteRequest,
            ColumnResponse,
            ColumnRequest,
            CardResponse,
            CardRequest,
            CardMarkRequest,
            CardMarkResponse,
            MarkResponse,
            MarkRequest,
            FileResponse,
            CommentResponse,
            CommentRequest,
        )
    ),
    tags(
        (name = "system", description = "System health and status endpoints"),
        (name = "users", description = "The authenticated account"),
        (name = "projects", description = "Projects and their boards"),
        (name = "boards", description = "Boards, membership, favourites and recency"),
        (name = "columns", description = "Columns of a board"),
        (name = "cards", description = "Cards and their marks"),
        (name = "marks", description = "Colored labels defined per board"),
        (name = "files", description = "Card attachments"),
        (name = "comments", description = "Card comments")
    )
)]
pub struct ApiDoc;

/// Create the API router with OpenAPI documentation
pub fn create_router<D: Database + 'static>(state: AppState<D>) -> Router {
    let api = ApiDoc::openapi();

    // Unauthenticated
    let system_routes = Router::new().route("/health", get(v1::health));

    let user_routes = Router::new().route("/users/me/", get(v1::me));

    let project_routes = routes!(D => {
        get "/projects/" => v1::list_projects,
        post "/projects/" => v1::create_project,
        get "/projects/{id}/" => v1::get_project,
        put "/projects/{id}/" => v1::update_project,
        delete "/projects/{id}/" => v1::delete_project,
        get "/projects/{id}/boards/" => v1::list_project_boards,
        post "/projects/{id}/boards/" => v1::create_board,
    });

    let board_routes = routes!(D => {
        get "/boards/" => v1::list_boards,
        get "/boards/favourite/" => v1::list_favourites,
        get "/boards/recent/" => v1::list_recent,
        get "/boards/{id}/" => v1::get_board,
        put "/boards/{id}/" => v1::update_board,
        patch "/boards/{id}/" => v1::patch_board,
        delete "/boards/{id}/" => v1::delete_board,
        post "/boards/{id}/invite/" => v1::invite_member,
        post "/boards/{id}/favourite/" => v1::favourite_board,
        delete "/boards/{id}/favourite/" => v1::unfavourite_board,
        post "/boards/{id}/background/" => v1::upload_background,
    });

    let column_routes = routes!(D => {
        get "/columns/board/{id}/" => v1::list_columns,
        post "/columns/board/{id}/" => v1::create_column,
        get "/columns/{id}/" => v1::get_column,
        put "/columns/{id}/" => v1::update_column,
        delete "/columns/{id}/" => v1::delete_column,
    });

    let card_routes = routes!(D => {
        get "/cards/column/{id}/" => v1::list_cards,
        post "/cards/column/{id}/" => v1::create_card,
        get "/cards/{id}/" => v1::get_card,
        put "/cards/{id}/" => v1::update_card,
        patch "/cards/{id}/" => v1::patch_card,
        delete "/cards/{id}/" => v1::delete_card,
        post "/cards/{id}/marks/" => v1::attach_mark,
        delete "/cards/{id}/marks/{mark_id}/" => v1::detach_mark,
    });

    let mark_routes = routes!(D => {
        get "/mark/board/{id}/" => v1::list_marks,
        post "/mark/board/{id}/" => v1::create_mark,
        get "/mark/{id}/" => v1::get_mark,
        put "/mark/{id}/" => v1::update_mark,
        patch "/mark/{id}/" => v1::patch_mark,
        delete "/mark/{id}/" => v1::delete_mark,
    });

    let file_routes = routes!(D => {
        get "/files/card/{id}/" => v1::list_files,
        post "/files/card/{id}/" => v1::upload_file,
        get "/files/{id}/" => v1::get_file,
        delete "/files/{id}/" => v1::delete_file,
    });

    let comment_routes = routes!(D => {
        get "/comments/card/{id}/" => v1::list_comments,
        post "/comments/card/{id}/" => v1::create_comment,
        get "/comments/{id}/" => v1::get_comment,
        put "/comments/{id}/" => v1::update_comment,
        delete "/comments/{id}/" => v1::delete_comment,
    });

    let protected = user_routes
        .merge(project_routes)
        .merge(board_routes)
        .merge(column_routes)
        .merge(card_routes)
        .merge(mark_routes)
        .merge(file_routes)
        .merge(comment_routes)
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_token::<D>,
        ));

    system_routes
        .merge(protected)
        .merge(Scalar::with_url("/docs", api))
        .with_state(state)
}
