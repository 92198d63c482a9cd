//! Integration tests for Column API endpoints.

use axum::http::StatusCode;
use serde_json::json;

use super::test_support::{TestApp, json_body};

#[tokio::test(flavor = "multi_thread")]
async fn create_and_list_columns_in_order() {
    let app = TestApp::new().await;
    let (_, token) = app.user("owner@user.com").await;
    let project_id = app.create_project(&token, "Project").await;
    let board_id = app.create_board(&token, project_id, "Board").await;

    let response = app
        .post(
            &format!("/columns/board/{}/", board_id),
            &token,
            json!({"title": "Todo"}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;
    assert_eq!(body["board"], board_id);
    assert_eq!(body["cards"], json!([]));

    app.create_column(&token, board_id, "Doing").await;
    app.create_column(&token, board_id, "Done").await;

    let body = json_body(
        app.get(&format!("/columns/board/{}/", board_id), Some(&token))
            .await,
    )
    .await;
    let titles: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Todo", "Doing", "Done"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn column_title_is_limited() {
    let app = TestApp::new().await;
    let seed = app.seeded().await;

    let response = app
        .post(
            &format!("/columns/board/{}/", seed.board_id),
            &seed.token,
            json!({"title": "x".repeat(31)}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(json_body(response).await["fields"]["title"].is_array());

    let response = app
        .put(
            &format!("/columns/{}/", seed.column_id),
            &seed.token,
            json!({"title": ""}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test(flavor = "multi_thread")]
async fn get_column_nests_cards() {
    let app = TestApp::new().await;
    let seed = app.seeded().await;
    let second = app.create_card(&seed.token, seed.column_id, "Second").await;

    let response = app
        .get(&format!("/columns/{}/", seed.column_id), Some(&seed.token))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    let cards = body["cards"].as_array().unwrap();
    assert_eq!(cards.len(), 2);
    assert_eq!(cards[0]["id"], seed.card_id);
    assert_eq!(cards[1]["id"], second);
    assert_eq!(cards[0]["marks"], json!([]));
}

#[tokio::test(flavor = "multi_thread")]
async fn member_can_manage_columns() {
    let app = TestApp::new().await;
    let seed = app.seeded().await;
    let (_, member) = app.user("member@user.com").await;
    app.invite(&seed.token, seed.board_id, "member@user.com").await;

    let id = app.create_column(&member, seed.board_id, "Review").await;
    let response = app
        .put(&format!("/columns/{}/", id), &member, json!({"title": "QA"}))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["title"], "QA");

    let response = app.delete(&format!("/columns/{}/", id), &member).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test(flavor = "multi_thread")]
async fn non_member_is_denied() {
    let app = TestApp::new().await;
    let seed = app.seeded().await;
    let (_, stranger) = app.user("stranger@user.com").await;
    let uri = format!("/columns/{}/", seed.column_id);

    let responses = vec![
        app.get(&format!("/columns/board/{}/", seed.board_id), Some(&stranger))
            .await,
        app.post(
            &format!("/columns/board/{}/", seed.board_id),
            &stranger,
            json!({"title": "Nope"}),
        )
        .await,
        app.get(&uri, Some(&stranger)).await,
        app.put(&uri, &stranger, json!({"title": "Nope"})).await,
        app.delete(&uri, &stranger).await,
    ];
    for response in responses {
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
    assert_eq!(app.count("board_column").await, 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn delete_column_removes_cards() {
    let app = TestApp::new().await;
    let seed = app.seeded().await;

    let response = app
        .delete(&format!("/columns/{}/", seed.column_id), &seed.token)
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(app.count("card").await, 0);

    let response = app
        .get(&format!("/columns/{}/", seed.column_id), Some(&seed.token))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test(flavor = "multi_thread")]
async fn delete_column_removes_stored_attachments() {
    let app = TestApp::new().await;
    let seed = app.seeded().await;
    let done = app.create_column(&seed.token, seed.board_id, "Done").await;
    let kept_card = app.create_card(&seed.token, done, "Kept").await;

    let removed = app.attach(&seed.token, seed.card_id, "notes.txt").await;
    let kept = app.attach(&seed.token, kept_card, "kept.txt").await;

    let response = app
        .delete(&format!("/columns/{}/", seed.column_id), &seed.token)
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    assert!(!app.media_dir.path().join(&removed).exists());
    assert!(app.media_dir.path().join(&kept).exists());
    assert_eq!(app.count("card_file").await, 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn columns_of_missing_board_are_not_found() {
    let app = TestApp::new().await;
    let (_, token) = app.user("owner@user.com").await;

    let response = app.get("/columns/board/77/", Some(&token)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
