//! Token authentication.
//!
//! Requests carry `Authorization: Token <key>` (or `Bearer <key>`). The
//! middleware resolves the key to an active user and stores it in the
//! request extensions as [`CurrentUser`].

use axum::{
    Json,
    extract::{Request, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{error, warn};

use super::state::AppState;
use super::v1::ErrorResponse;
use crate::db::{Database, User, UserRepository};

pub const NOT_PROVIDED: &str = "Authentication credentials were not provided.";
pub const INVALID_TOKEN: &str = "Invalid token.";

/// The authenticated user making the request.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Extract the key from a `Token` or `Bearer` authorization header.
pub fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, key) = value.trim().split_once(' ')?;
    let key = key.trim();

    if (scheme.eq_ignore_ascii_case("token") || scheme.eq_ignore_ascii_case("bearer"))
        && !key.is_empty()
    {
        Some(key.to_string())
    } else {
        None
    }
}

fn rejected(message: &str) -> Response {
    (
        StatusCode::FORBIDDEN,
        Json(ErrorResponse::new(message)),
    )
        .into_response()
}

pub async fn require_token<D: Database>(
    State(state): State<AppState<D>>,
    mut req: Request,
    next: Next,
) -> Response {
    let Some(key) = token_from_headers(req.headers()) else {
        warn!("request to {} without credentials", req.uri());
        return rejected(NOT_PROVIDED);
    };

    match state.db().users().find_by_token(&key).await {
        Ok(Some(user)) if user.is_active => {
            req.extensions_mut().insert(CurrentUser(user));
            next.run(req).await
        }
        Ok(_) => {
            warn!("rejected unknown token or inactive user");
            rejected(INVALID_TOKEN)
        }
        Err(e) => {
            error!(error = %e, "failed to resolve token");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new(e.to_string())),
            )
                .into_response()
        }
    }
}
