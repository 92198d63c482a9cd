//! Shared harness for HTTP tests: in-memory database, temp media root and
//! helpers that drive the router with `oneshot`.

use axum::{
    Router,
    body::Body,
    http::{Method, Request, header},
    response::Response,
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

use crate::api::{AppState, MediaStore, routes};
use crate::db::{Database, Id, NewUser, SqliteDatabase, User, UserRepository};

pub const BOUNDARY: &str = "kanban-test-boundary";

pub struct TestApp {
    pub router: Router,
    pub state: AppState<SqliteDatabase>,
    pub media_dir: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        let db = SqliteDatabase::in_memory().await.unwrap();
        db.migrate().await.unwrap();
        let media_dir = tempfile::tempdir().unwrap();
        let state = AppState::new(db, MediaStore::new(media_dir.path().to_path_buf()));
        let router = routes::create_router(state.clone());

        Self {
            router,
            state,
            media_dir,
        }
    }

    /// Create a user and issue a token for it.
    pub async fn user(&self, email: &str) -> (User, String) {
        let users = self.state.db().users();
        let user = users
            .create(&NewUser {
                email: email.to_string(),
                first_name: "Test".to_string(),
                last_name: "User".to_string(),
            })
            .await
            .unwrap();
        let token = users.issue_token(user.id).await.unwrap();
        (user, token)
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Token {}", token));
        }
        let body = match body {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(serde_json::to_vec(&value).unwrap())
            }
            None => Body::empty(),
        };

        self.router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap()
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> Response {
        self.send(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> Response {
        self.send(Method::POST, uri, Some(token), Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: &str, body: Value) -> Response {
        self.send(Method::PUT, uri, Some(token), Some(body)).await
    }

    pub async fn patch(&self, uri: &str, token: &str, body: Value) -> Response {
        self.send(Method::PATCH, uri, Some(token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> Response {
        self.send(Method::DELETE, uri, Some(token), None).await
    }

    /// POST a single-file multipart form.
    pub async fn upload(
        &self,
        uri: &str,
        token: &str,
        field: &str,
        file_name: &str,
        content_type: &str,
        bytes: &[u8],
    ) -> Response {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Token {}", token))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap();

        self.router.clone().oneshot(request).await.unwrap()
    }

    /// Upload a text attachment and return its path relative to the media root.
    pub async fn attach(&self, token: &str, card_id: Id, file_name: &str) -> String {
        let response = self
            .upload(
                &format!("/files/card/{}/", card_id),
                token,
                "file",
                file_name,
                "text/plain",
                b"attachment",
            )
            .await;
        json_body(response).await["file"]
            .as_str()
            .unwrap()
            .to_string()
    }

    /// Number of files stored under a media subdirectory.
    pub fn stored_count(&self, subdir: &str) -> usize {
        std::fs::read_dir(self.media_dir.path().join(subdir))
            .map(|entries| entries.count())
            .unwrap_or(0)
    }

    pub async fn count(&self, table: &str) -> i64 {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(self.state.db().pool())
            .await
            .unwrap()
    }

    // -------------------------------------------------------------------------
    // Seeding through the API
    // -------------------------------------------------------------------------

    pub async fn create_project(&self, token: &str, title: &str) -> Id {
        let response = self.post("/projects/", token, json!({"title": title})).await;
        json_body(response).await["id"].as_i64().unwrap()
    }

    pub async fn create_board(&self, token: &str, project_id: Id, title: &str) -> Id {
        let response = self
            .post(
                &format!("/projects/{}/boards/", project_id),
                token,
                json!({"title": title}),
            )
            .await;
        json_body(response).await["id"].as_i64().unwrap()
    }

    pub async fn create_column(&self, token: &str, board_id: Id, title: &str) -> Id {
        let response = self
            .post(
                &format!("/columns/board/{}/", board_id),
                token,
                json!({"title": title}),
            )
            .await;
        json_body(response).await["id"].as_i64().unwrap()
    }

    pub async fn create_card(&self, token: &str, column_id: Id, title: &str) -> Id {
        let response = self
            .post(
                &format!("/cards/column/{}/", column_id),
                token,
                json!({
                    "title": title,
                    "description": "Something to do",
                    "deadline": "2030-01-01T00:00:00Z"
                }),
            )
            .await;
        json_body(response).await["id"].as_i64().unwrap()
    }

    pub async fn create_mark(&self, token: &str, board_id: Id, title: &str) -> Id {
        let response = self
            .post(
                &format!("/mark/board/{}/", board_id),
                token,
                json!({"title": title, "color": "#f00"}),
            )
            .await;
        json_body(response).await["id"].as_i64().unwrap()
    }

    pub async fn invite(&self, token: &str, board_id: Id, email: &str) {
        let response = self
            .post(
                &format!("/boards/{}/invite/", board_id),
                token,
                json!({"user": email}),
            )
            .await;
        assert_eq!(response.status(), axum::http::StatusCode::CREATED);
    }

    /// Owner with a project, board, column and card.
    pub async fn seeded(&self) -> Seed {
        let (owner, token) = self.user("owner@user.com").await;
        let project_id = self.create_project(&token, "Project").await;
        let board_id = self.create_board(&token, project_id, "Board").await;
        let column_id = self.create_column(&token, board_id, "Todo").await;
        let card_id = self.create_card(&token, column_id, "Card").await;

        Seed {
            owner,
            token,
            project_id,
            board_id,
            column_id,
            card_id,
        }
    }
}

pub struct Seed {
    pub owner: User,
    pub token: String,
    pub project_id: Id,
    pub board_id: Id,
    pub column_id: Id,
    pub card_id: Id,
}

/// Helper to parse JSON response body
pub async fn json_body(response: Response) -> Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}
