//! Tests for SqliteCardRepository and the nested detail queries.

use serde_json::json;

use crate::db::{
    Board, BoardRepository, Card, CardComment, CardFile, CardFileRepository, CardRepository,
    Column, ColumnRepository, CommentRepository, Database, DbError, Mark, MarkRepository,
    NewUser, Project, ProjectRepository, SqliteDatabase, User, UserRepository,
};

struct Fixture {
    db: SqliteDatabase,
    user: User,
    board: Board,
    column: Column,
}

async fn setup() -> Fixture {
    let db = SqliteDatabase::in_memory()
        .await
        .expect("Failed to create in-memory database");
    db.migrate().await.expect("Migration should succeed");

    let user = db
        .users()
        .create(&NewUser {
            email: "n@user.com".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();
    let project = db
        .projects()
        .create(&Project {
            id: 0,
            owner_id: user.id,
            title: "Project".to_string(),
            created_at: String::new(),
            updated_at: String::new(),
        })
        .await
        .unwrap();
    let board = db
        .boards()
        .create(
            &Board {
                id: 0,
                project_id: project.id,
                title: "Board".to_string(),
                background_img: None,
                is_archived: false,
                created_on: String::new(),
                last_modified: String::new(),
            },
            user.id,
        )
        .await
        .unwrap();
    let column = create_column(&db, board.id, "Todo").await;

    Fixture {
        db,
        user,
        board,
        column,
    }
}

async fn create_column(db: &SqliteDatabase, board_id: i64, title: &str) -> Column {
    db.columns()
        .create(&Column {
            id: 0,
            board_id,
            title: title.to_string(),
        })
        .await
        .unwrap()
}

async fn create_card(db: &SqliteDatabase, column_id: i64, title: &str) -> Card {
    db.cards()
        .create(&Card {
            id: 0,
            column_id,
            title: title.to_string(),
            description: "desc".to_string(),
            deadline: "2030-01-01T00:00:00Z".to_string(),
            checklist: json!({"Make a to-do": false}),
        })
        .await
        .unwrap()
}

async fn create_mark(db: &SqliteDatabase, board_id: i64, title: &str) -> Mark {
    db.marks()
        .create(&Mark {
            id: 0,
            board_id,
            title: title.to_string(),
            color: "#000".to_string(),
        })
        .await
        .unwrap()
}

#[tokio::test(flavor = "multi_thread")]
async fn create_and_get_card_keeps_checklist() {
    let f = setup().await;
    let created = create_card(&f.db, f.column.id, "Card").await;

    let retrieved = f.db.cards().get(created.id).await.unwrap();
    assert_eq!(retrieved, created);
    assert_eq!(retrieved.checklist, json!({"Make a to-do": false}));
}

#[tokio::test(flavor = "multi_thread")]
async fn card_detail_nests_marks_files_and_comments() {
    let f = setup().await;
    let card = create_card(&f.db, f.column.id, "Card").await;
    let mark = create_mark(&f.db, f.board.id, "Bug").await;

    f.db.cards().attach_mark(card.id, mark.id).await.unwrap();
    f.db.files()
        .create(&CardFile {
            id: 0,
            card_id: card.id,
            file: "card_files/abc_notes.txt".to_string(),
            name: "notes.txt".to_string(),
            content_type: "text/plain".to_string(),
            size: 5,
            created_on: String::new(),
        })
        .await
        .unwrap();
    f.db.comments()
        .create(&CardComment {
            id: 0,
            card_id: card.id,
            user_id: f.user.id,
            body: "First".to_string(),
            created_on: String::new(),
        })
        .await
        .unwrap();

    let detail = f.db.cards().get_detail(card.id).await.unwrap();
    assert_eq!(detail.card.id, card.id);
    assert_eq!(detail.marks, vec![mark]);
    assert_eq!(detail.files.len(), 1);
    assert_eq!(detail.files[0].name, "notes.txt");
    assert_eq!(detail.comments.len(), 1);
    assert_eq!(detail.comments[0].body, "First");
}

#[tokio::test(flavor = "multi_thread")]
async fn board_detail_keeps_insertion_order() {
    let f = setup().await;
    let done = create_column(&f.db, f.board.id, "Done").await;

    let a = create_card(&f.db, f.column.id, "A").await;
    let b = create_card(&f.db, done.id, "B").await;
    let c = create_card(&f.db, f.column.id, "C").await;

    let detail = f.db.boards().get_detail(f.board.id).await.unwrap();
    assert_eq!(detail.columns.len(), 2);
    assert_eq!(detail.columns[0].column.id, f.column.id);
    assert_eq!(detail.columns[1].column.id, done.id);

    let first: Vec<i64> = detail.columns[0].cards.iter().map(|d| d.card.id).collect();
    assert_eq!(first, vec![a.id, c.id]);
    let second: Vec<i64> = detail.columns[1].cards.iter().map(|d| d.card.id).collect();
    assert_eq!(second, vec![b.id]);

    assert_eq!(detail.members.len(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn empty_column_detail_has_no_cards() {
    let f = setup().await;
    let detail = f.db.columns().get_detail(f.column.id).await.unwrap();
    assert!(detail.cards.is_empty());

    let missing = f.db.columns().get_detail(9999).await;
    assert!(matches!(missing, Err(DbError::NotFound { .. })));
}

#[tokio::test(flavor = "multi_thread")]
async fn attach_mark_twice_is_noop_and_detach_removes() {
    let f = setup().await;
    let card = create_card(&f.db, f.column.id, "Card").await;
    let mark = create_mark(&f.db, f.board.id, "Bug").await;
    let repo = f.db.cards();

    repo.attach_mark(card.id, mark.id).await.unwrap();
    repo.attach_mark(card.id, mark.id).await.unwrap();
    assert_eq!(repo.get_detail(card.id).await.unwrap().marks.len(), 1);

    repo.detach_mark(card.id, mark.id).await.unwrap();
    assert!(repo.get_detail(card.id).await.unwrap().marks.is_empty());

    let again = repo.detach_mark(card.id, mark.id).await;
    assert!(matches!(again, Err(DbError::NotFound { .. })));
}

#[tokio::test(flavor = "multi_thread")]
async fn deleting_mark_detaches_it_from_cards() {
    let f = setup().await;
    let card = create_card(&f.db, f.column.id, "Card").await;
    let mark = create_mark(&f.db, f.board.id, "Bug").await;

    f.db.cards().attach_mark(card.id, mark.id).await.unwrap();
    f.db.marks().delete(mark.id).await.unwrap();

    assert!(f.db.cards().get_detail(card.id).await.unwrap().marks.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn update_moves_card_between_columns() {
    let f = setup().await;
    let done = create_column(&f.db, f.board.id, "Done").await;
    let mut card = create_card(&f.db, f.column.id, "Card").await;

    card.column_id = done.id;
    card.title = "Moved".to_string();
    f.db.cards().update(&card).await.unwrap();

    let todo_cards = f.db.cards().list_by_column(f.column.id).await.unwrap();
    assert!(todo_cards.is_empty());
    let done_cards = f.db.cards().list_by_column(done.id).await.unwrap();
    assert_eq!(done_cards.len(), 1);
    assert_eq!(done_cards[0].card.title, "Moved");
}

#[tokio::test(flavor = "multi_thread")]
async fn board_id_resolves_through_column() {
    let f = setup().await;
    let card = create_card(&f.db, f.column.id, "Card").await;

    assert_eq!(f.db.cards().board_id(card.id).await.unwrap(), f.board.id);
    assert!(matches!(
        f.db.cards().board_id(9999).await,
        Err(DbError::NotFound { .. })
    ));
}

#[tokio::test(flavor = "multi_thread")]
async fn comment_update_changes_body_only() {
    let f = setup().await;
    let card = create_card(&f.db, f.column.id, "Card").await;
    let mut comment = f
        .db
        .comments()
        .create(&CardComment {
            id: 0,
            card_id: card.id,
            user_id: f.user.id,
            body: "Before".to_string(),
            created_on: String::new(),
        })
        .await
        .unwrap();

    comment.body = "After".to_string();
    f.db.comments().update(&comment).await.unwrap();

    let retrieved = f.db.comments().get(comment.id).await.unwrap();
    assert_eq!(retrieved.body, "After");
    assert_eq!(retrieved.user_id, f.user.id);
    assert_eq!(retrieved.created_on, comment.created_on);
}
