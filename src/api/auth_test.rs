use axum::http::{HeaderMap, HeaderValue, StatusCode, header::AUTHORIZATION};

use super::auth::{INVALID_TOKEN, NOT_PROVIDED, token_from_headers};
use super::v1::test_support::{TestApp, json_body};

fn headers(value: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
    headers
}

#[test]
fn accepts_token_and_bearer_schemes() {
    assert_eq!(token_from_headers(&headers("Token abc")).as_deref(), Some("abc"));
    assert_eq!(token_from_headers(&headers("Bearer abc")).as_deref(), Some("abc"));
    assert_eq!(token_from_headers(&headers("token  abc ")).as_deref(), Some("abc"));
}

#[test]
fn rejects_other_schemes_and_empty_keys() {
    assert_eq!(token_from_headers(&headers("Basic abc")), None);
    assert_eq!(token_from_headers(&headers("Token")), None);
    assert_eq!(token_from_headers(&headers("Token ")), None);
    assert_eq!(token_from_headers(&HeaderMap::new()), None);
}

#[tokio::test(flavor = "multi_thread")]
async fn missing_token_is_forbidden() {
    let app = TestApp::new().await;

    let response = app.get("/projects/", None).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(json_body(response).await["error"], NOT_PROVIDED);
}

#[tokio::test(flavor = "multi_thread")]
async fn unknown_token_is_forbidden() {
    let app = TestApp::new().await;

    let response = app.get("/projects/", Some("deadbeef")).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(json_body(response).await["error"], INVALID_TOKEN);
}

#[tokio::test(flavor = "multi_thread")]
async fn inactive_user_is_forbidden() {
    let app = TestApp::new().await;
    let (user, token) = app.user("n@user.com").await;

    sqlx::query("UPDATE user_account SET is_active = 0 WHERE id = ?")
        .bind(user.id)
        .execute(app.state.db().pool())
        .await
        .unwrap();

    let response = app.get("/users/me/", Some(&token)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test(flavor = "multi_thread")]
async fn health_needs_no_token() {
    let app = TestApp::new().await;
    let response = app.get("/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);
}
