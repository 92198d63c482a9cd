//! Integration tests for Mark API endpoints.

use axum::http::StatusCode;
use serde_json::json;

use super::test_support::{TestApp, json_body};

#[tokio::test(flavor = "multi_thread")]
async fn create_mark_defaults_color() {
    let app = TestApp::new().await;
    let seed = app.seeded().await;

    let response = app
        .post(
            &format!("/mark/board/{}/", seed.board_id),
            &seed.token,
            json!({"title": "Plain"}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = json_body(response).await;
    assert_eq!(body["board"], seed.board_id);
    assert_eq!(body["color"], "#000");
}

#[tokio::test(flavor = "multi_thread")]
async fn create_mark_validates_color() {
    let app = TestApp::new().await;
    let seed = app.seeded().await;

    let response = app
        .post(
            &format!("/mark/board/{}/", seed.board_id),
            &seed.token,
            json!({"title": "Bad", "color": "red"}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(json_body(response).await["fields"]["color"].is_array());
    assert_eq!(app.count("mark").await, 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn list_marks_is_per_board() {
    let app = TestApp::new().await;
    let seed = app.seeded().await;
    let other = app.create_board(&seed.token, seed.project_id, "Other").await;
    app.create_mark(&seed.token, seed.board_id, "Bug").await;
    app.create_mark(&seed.token, seed.board_id, "Feature").await;
    app.create_mark(&seed.token, other, "Elsewhere").await;

    let body = json_body(
        app.get(&format!("/mark/board/{}/", seed.board_id), Some(&seed.token))
            .await,
    )
    .await;
    let titles: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Bug", "Feature"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn put_and_patch_mark() {
    let app = TestApp::new().await;
    let seed = app.seeded().await;
    let id = app.create_mark(&seed.token, seed.board_id, "Bug").await;
    let uri = format!("/mark/{}/", id);

    let response = app.put(&uri, &seed.token, json!({"color": "#0f0"})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app.patch(&uri, &seed.token, json!({"color": "#00ff00"})).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["title"], "Bug");
    assert_eq!(body["color"], "#00ff00");

    let response = app
        .put(&uri, &seed.token, json!({"title": "Defect", "color": "#123"}))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["title"], "Defect");
}

#[tokio::test(flavor = "multi_thread")]
async fn delete_mark_detaches_from_cards() {
    let app = TestApp::new().await;
    let seed = app.seeded().await;
    let id = app.create_mark(&seed.token, seed.board_id, "Bug").await;
    app.post(
        &format!("/cards/{}/marks/", seed.card_id),
        &seed.token,
        json!({"mark": id}),
    )
    .await;

    let response = app.delete(&format!("/mark/{}/", id), &seed.token).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(app.count("card_mark").await, 0);

    let card = json_body(
        app.get(&format!("/cards/{}/", seed.card_id), Some(&seed.token))
            .await,
    )
    .await;
    assert_eq!(card["marks"], json!([]));
}

#[tokio::test(flavor = "multi_thread")]
async fn non_member_is_denied() {
    let app = TestApp::new().await;
    let seed = app.seeded().await;
    let (_, stranger) = app.user("stranger@user.com").await;
    let id = app.create_mark(&seed.token, seed.board_id, "Bug").await;
    let uri = format!("/mark/{}/", id);

    let responses = vec![
        app.get(&format!("/mark/board/{}/", seed.board_id), Some(&stranger))
            .await,
        app.post(
            &format!("/mark/board/{}/", seed.board_id),
            &stranger,
            json!({"title": "Nope"}),
        )
        .await,
        app.get(&uri, Some(&stranger)).await,
        app.patch(&uri, &stranger, json!({"title": "Nope"})).await,
        app.delete(&uri, &stranger).await,
    ];
    for response in responses {
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
    assert_eq!(app.count("mark").await, 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn missing_mark_is_not_found() {
    let app = TestApp::new().await;
    let (_, token) = app.user("owner@user.com").await;

    let response = app.get("/mark/31/", Some(&token)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
