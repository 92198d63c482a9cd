//! Integration tests for Card API endpoints.

use axum::http::StatusCode;
use serde_json::json;

use super::test_support::{TestApp, json_body};

#[tokio::test(flavor = "multi_thread")]
async fn create_card_applies_defaults() {
    let app = TestApp::new().await;
    let seed = app.seeded().await;

    let response = app
        .post(
            &format!("/cards/column/{}/", seed.column_id),
            &seed.token,
            json!({
                "title": "Ship",
                "description": "Release it",
                "deadline": "2030-06-01T12:00:00+02:00"
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = json_body(response).await;
    assert_eq!(body["column"], seed.column_id);
    assert_eq!(body["deadline"], "2030-06-01T10:00:00Z");
    assert_eq!(body["checklist"], json!({"Make a to-do": false}));
    assert_eq!(body["marks"], json!([]));
    assert_eq!(body["files"], json!([]));
    assert_eq!(body["comments"], json!([]));
}

#[tokio::test(flavor = "multi_thread")]
async fn create_card_reports_every_invalid_field() {
    let app = TestApp::new().await;
    let seed = app.seeded().await;

    let response = app
        .post(
            &format!("/cards/column/{}/", seed.column_id),
            &seed.token,
            json!({
                "title": "x".repeat(31),
                "description": "d".repeat(501),
                "deadline": "next week",
                "checklist": [1, 2]
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = json_body(response).await;
    assert_eq!(body["error"], "Validation failed");
    for field in ["title", "description", "deadline", "checklist"] {
        assert!(body["fields"][field].is_array(), "{} not reported", field);
    }
    assert_eq!(app.count("card").await, 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn create_card_requires_deadline() {
    let app = TestApp::new().await;
    let seed = app.seeded().await;

    let response = app
        .post(
            &format!("/cards/column/{}/", seed.column_id),
            &seed.token,
            json!({"title": "T", "description": "D"}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await["fields"]["deadline"][0],
        "This field is required."
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn patch_updates_only_given_fields() {
    let app = TestApp::new().await;
    let seed = app.seeded().await;

    let response = app
        .patch(
            &format!("/cards/{}/", seed.card_id),
            &seed.token,
            json!({"checklist": {"Write tests": true}}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["title"], "Card");
    assert_eq!(body["description"], "Something to do");
    assert_eq!(body["checklist"], json!({"Write tests": true}));
}

#[tokio::test(flavor = "multi_thread")]
async fn put_requires_all_fields() {
    let app = TestApp::new().await;
    let seed = app.seeded().await;

    let response = app
        .put(
            &format!("/cards/{}/", seed.card_id),
            &seed.token,
            json!({"title": "Only title"}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["fields"]["description"].is_array());
    assert!(body["fields"]["deadline"].is_array());
}

#[tokio::test(flavor = "multi_thread")]
async fn card_moves_within_board_only() {
    let app = TestApp::new().await;
    let seed = app.seeded().await;
    let done = app.create_column(&seed.token, seed.board_id, "Done").await;
    let other_board = app
        .create_board(&seed.token, seed.project_id, "Other")
        .await;
    let foreign = app.create_column(&seed.token, other_board, "Foreign").await;
    let uri = format!("/cards/{}/", seed.card_id);

    let response = app.patch(&uri, &seed.token, json!({"column": done})).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["column"], done);

    let response = app
        .patch(&uri, &seed.token, json!({"column": foreign}))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await["fields"]["column"][0],
        "Column belongs to a different board."
    );

    let response = app.patch(&uri, &seed.token, json!({"column": 999})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = json_body(app.get(&uri, Some(&seed.token)).await).await;
    assert_eq!(body["column"], done);
}

#[tokio::test(flavor = "multi_thread")]
async fn non_member_is_denied() {
    let app = TestApp::new().await;
    let seed = app.seeded().await;
    let (_, stranger) = app.user("stranger@user.com").await;
    let uri = format!("/cards/{}/", seed.card_id);

    let responses = vec![
        app.get(&format!("/cards/column/{}/", seed.column_id), Some(&stranger))
            .await,
        app.post(
            &format!("/cards/column/{}/", seed.column_id),
            &stranger,
            json!({"title": "T", "description": "D", "deadline": "2030-01-01T00:00:00Z"}),
        )
        .await,
        app.get(&uri, Some(&stranger)).await,
        app.patch(&uri, &stranger, json!({"title": "Mine"})).await,
        app.delete(&uri, &stranger).await,
    ];
    for response in responses {
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
    assert_eq!(app.count("card").await, 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn owner_who_left_membership_is_denied_card_access() {
    let app = TestApp::new().await;
    let seed = app.seeded().await;

    sqlx::query("DELETE FROM board_member WHERE user_id = ?")
        .bind(seed.owner.id)
        .execute(app.state.db().pool())
        .await
        .unwrap();

    let response = app
        .get(&format!("/cards/{}/", seed.card_id), Some(&seed.token))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Board-level access still follows ownership
    let response = app
        .get(&format!("/boards/{}/", seed.board_id), Some(&seed.token))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test(flavor = "multi_thread")]
async fn delete_card_removes_attachments_from_disk() {
    let app = TestApp::new().await;
    let seed = app.seeded().await;

    let uploaded = json_body(
        app.upload(
            &format!("/files/card/{}/", seed.card_id),
            &seed.token,
            "file",
            "notes.txt",
            "text/plain",
            b"hello",
        )
        .await,
    )
    .await;
    let stored = app
        .media_dir
        .path()
        .join(uploaded["file"].as_str().unwrap());
    assert!(stored.exists());

    let response = app
        .delete(&format!("/cards/{}/", seed.card_id), &seed.token)
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(app.count("card_file").await, 0);
    assert!(!stored.exists());
}

// =============================================================================
// Marks on cards
// =============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn attach_and_detach_mark() {
    let app = TestApp::new().await;
    let seed = app.seeded().await;
    let mark = app.create_mark(&seed.token, seed.board_id, "Bug").await;
    let uri = format!("/cards/{}/marks/", seed.card_id);

    let response = app.post(&uri, &seed.token, json!({"mark": mark})).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;
    assert_eq!(body["card"], seed.card_id);
    assert_eq!(body["mark"], mark);

    let response = app.post(&uri, &seed.token, json!({"mark": mark})).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(app.count("card_mark").await, 1);

    let card = json_body(
        app.get(&format!("/cards/{}/", seed.card_id), Some(&seed.token))
            .await,
    )
    .await;
    assert_eq!(card["marks"][0]["id"], mark);
    assert_eq!(card["marks"][0]["color"], "#f00");

    let detach = format!("/cards/{}/marks/{}/", seed.card_id, mark);
    assert_eq!(
        app.delete(&detach, &seed.token).await.status(),
        StatusCode::NO_CONTENT
    );
    assert_eq!(
        app.delete(&detach, &seed.token).await.status(),
        StatusCode::NOT_FOUND
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn attach_rejects_mark_of_other_board() {
    let app = TestApp::new().await;
    let seed = app.seeded().await;
    let other_board = app
        .create_board(&seed.token, seed.project_id, "Other")
        .await;
    let foreign = app.create_mark(&seed.token, other_board, "Elsewhere").await;

    let response = app
        .post(
            &format!("/cards/{}/marks/", seed.card_id),
            &seed.token,
            json!({"mark": foreign}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await["fields"]["mark"][0],
        "Mark belongs to a different board."
    );
    assert_eq!(app.count("card_mark").await, 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn attach_rejects_missing_or_unknown_mark() {
    let app = TestApp::new().await;
    let seed = app.seeded().await;
    let uri = format!("/cards/{}/marks/", seed.card_id);

    let response = app.post(&uri, &seed.token, json!({})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await["fields"]["mark"][0],
        "This field is required."
    );

    let response = app.post(&uri, &seed.token, json!({"mark": 55})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await["fields"]["mark"][0],
        "Invalid pk \"55\" - object does not exist."
    );
}

// =============================================================================
// Nested board representation
// =============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn board_detail_nests_full_card_tree() {
    let app = TestApp::new().await;
    let seed = app.seeded().await;
    let mark = app.create_mark(&seed.token, seed.board_id, "Bug").await;
    app.post(
        &format!("/cards/{}/marks/", seed.card_id),
        &seed.token,
        json!({"mark": mark}),
    )
    .await;
    app.post(
        &format!("/comments/card/{}/", seed.card_id),
        &seed.token,
        json!({"body": "First"}),
    )
    .await;
    app.post(
        &format!("/comments/card/{}/", seed.card_id),
        &seed.token,
        json!({"body": "Second"}),
    )
    .await;
    app.upload(
        &format!("/files/card/{}/", seed.card_id),
        &seed.token,
        "file",
        "plan.md",
        "text/markdown",
        b"# plan",
    )
    .await;

    let body = json_body(
        app.get(&format!("/boards/{}/", seed.board_id), Some(&seed.token))
            .await,
    )
    .await;
    let card = &body["columns"][0]["cards"][0];
    assert_eq!(card["id"], seed.card_id);
    assert_eq!(card["marks"][0]["title"], "Bug");
    assert_eq!(card["files"][0]["name"], "plan.md");
    assert_eq!(card["comments"][0]["body"], "First");
    assert_eq!(card["comments"][1]["body"], "Second");
    assert_eq!(card["comments"][0]["user"], seed.owner.id);
}
