//! SQLite CardRepository implementation.
//!
//! Also hosts the nested card assembly shared by column and board detail
//! queries.

use std::collections::HashMap;

use serde_json::json;
use sqlx::{Row, SqlitePool};

use super::comment::row_to_comment;
use super::file::row_to_file;
use super::helpers::{database_error, expect_affected};
use super::mark::row_to_mark;
use crate::db::{
    Card, CardComment, CardDetail, CardFile, CardRepository, DbError, DbResult, Id, Mark,
};

/// SQLx-backed card repository.
pub struct SqliteCardRepository {
    pub(crate) pool: SqlitePool,
}

/// Which cards to assemble with their marks, files and comments.
#[derive(Debug, Clone, Copy)]
pub(super) enum CardScope {
    Card(Id),
    Column(Id),
    Board(Id),
}

impl CardScope {
    /// WHERE condition over `card c JOIN board_column col`.
    fn condition(self) -> (&'static str, Id) {
        match self {
            CardScope::Card(id) => ("c.id = ?", id),
            CardScope::Column(id) => ("c.column_id = ?", id),
            CardScope::Board(id) => ("col.board_id = ?", id),
        }
    }
}

impl CardRepository for SqliteCardRepository {
    async fn create(&self, card: &Card) -> DbResult<Card> {
        let result = sqlx::query(
            "INSERT INTO card (column_id, title, description, deadline, checklist) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(card.column_id)
        .bind(&card.title)
        .bind(&card.description)
        .bind(&card.deadline)
        .bind(card.checklist.to_string())
        .execute(&self.pool)
        .await
        .map_err(database_error)?;

        Ok(Card {
            id: result.last_insert_rowid(),
            ..card.clone()
        })
    }

    async fn get(&self, id: Id) -> DbResult<Card> {
        let row = sqlx::query(
            "SELECT id, column_id, title, description, deadline, checklist FROM card WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(database_error)?;

        row.as_ref()
            .map(row_to_card)
            .ok_or_else(|| DbError::not_found("Card", id))
    }

    async fn get_detail(&self, id: Id) -> DbResult<CardDetail> {
        fetch_card_details(&self.pool, CardScope::Card(id))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("Card", id))
    }

    async fn list_by_column(&self, column_id: Id) -> DbResult<Vec<CardDetail>> {
        fetch_card_details(&self.pool, CardScope::Column(column_id)).await
    }

    async fn update(&self, card: &Card) -> DbResult<Card> {
        let result = sqlx::query(
            "UPDATE card SET column_id = ?, title = ?, description = ?, deadline = ?, checklist = ? \
             WHERE id = ?",
        )
        .bind(card.column_id)
        .bind(&card.title)
        .bind(&card.description)
        .bind(&card.deadline)
        .bind(card.checklist.to_string())
        .bind(card.id)
        .execute(&self.pool)
        .await
        .map_err(database_error)?;

        expect_affected(result, "Card", card.id)?;

        Ok(card.clone())
    }

    async fn delete(&self, id: Id) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM card WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(database_error)?;

        expect_affected(result, "Card", id)
    }

    async fn board_id(&self, id: Id) -> DbResult<Id> {
        let board_id: Option<Id> = sqlx::query_scalar(
            "SELECT col.board_id FROM card c JOIN board_column col ON col.id = c.column_id \
             WHERE c.id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(database_error)?;

        board_id.ok_or_else(|| DbError::not_found("Card", id))
    }

    async fn attach_mark(&self, card_id: Id, mark_id: Id) -> DbResult<()> {
        sqlx::query("INSERT OR IGNORE INTO card_mark (card_id, mark_id) VALUES (?, ?)")
            .bind(card_id)
            .bind(mark_id)
            .execute(&self.pool)
            .await
            .map_err(database_error)?;

        Ok(())
    }

    async fn detach_mark(&self, card_id: Id, mark_id: Id) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM card_mark WHERE card_id = ? AND mark_id = ?")
            .bind(card_id)
            .bind(mark_id)
            .execute(&self.pool)
            .await
            .map_err(database_error)?;

        expect_affected(result, "CardMark", format!("{}:{}", card_id, mark_id))
    }
}

/// Load cards in insertion order with their marks, files and comments.
///
/// Issues one query per nested collection regardless of how many cards
/// are in scope.
pub(super) async fn fetch_card_details(
    pool: &SqlitePool,
    scope: CardScope,
) -> DbResult<Vec<CardDetail>> {
    let (condition, id) = scope.condition();

    let card_rows = sqlx::query(&format!(
        "SELECT c.id, c.column_id, c.title, c.description, c.deadline, c.checklist \
         FROM card c JOIN board_column col ON col.id = c.column_id \
         WHERE {} ORDER BY c.id",
        condition
    ))
    .bind(id)
    .fetch_all(pool)
    .await
    .map_err(database_error)?;

    if card_rows.is_empty() {
        return Ok(vec![]);
    }

    let mark_rows = sqlx::query(&format!(
        "SELECT cm.card_id AS card_id, m.id, m.board_id, m.title, m.color \
         FROM card_mark cm \
         JOIN mark m ON m.id = cm.mark_id \
         JOIN card c ON c.id = cm.card_id \
         JOIN board_column col ON col.id = c.column_id \
         WHERE {} ORDER BY cm.id",
        condition
    ))
    .bind(id)
    .fetch_all(pool)
    .await
    .map_err(database_error)?;

    let file_rows = sqlx::query(&format!(
        "SELECT f.id, f.card_id, f.file, f.name, f.content_type, f.size, f.created_on \
         FROM card_file f \
         JOIN card c ON c.id = f.card_id \
         JOIN board_column col ON col.id = c.column_id \
         WHERE {} ORDER BY f.id",
        condition
    ))
    .bind(id)
    .fetch_all(pool)
    .await
    .map_err(database_error)?;

    let comment_rows = sqlx::query(&format!(
        "SELECT cc.id, cc.card_id, cc.user_id, cc.body, cc.created_on \
         FROM card_comment cc \
         JOIN card c ON c.id = cc.card_id \
         JOIN board_column col ON col.id = c.column_id \
         WHERE {} ORDER BY cc.id",
        condition
    ))
    .bind(id)
    .fetch_all(pool)
    .await
    .map_err(database_error)?;

    let mut marks: HashMap<Id, Vec<Mark>> = HashMap::new();
    for row in &mark_rows {
        marks
            .entry(row.get("card_id"))
            .or_default()
            .push(row_to_mark(row));
    }

    let mut files: HashMap<Id, Vec<CardFile>> = HashMap::new();
    for file in file_rows.iter().map(row_to_file) {
        files.entry(file.card_id).or_default().push(file);
    }

    let mut comments: HashMap<Id, Vec<CardComment>> = HashMap::new();
    for comment in comment_rows.iter().map(row_to_comment) {
        comments.entry(comment.card_id).or_default().push(comment);
    }

    Ok(card_rows
        .iter()
        .map(row_to_card)
        .map(|card| CardDetail {
            marks: marks.remove(&card.id).unwrap_or_default(),
            files: files.remove(&card.id).unwrap_or_default(),
            comments: comments.remove(&card.id).unwrap_or_default(),
            card,
        })
        .collect())
}

fn row_to_card(row: &sqlx::sqlite::SqliteRow) -> Card {
    let checklist_json: String = row.get("checklist");
    Card {
        id: row.get("id"),
        column_id: row.get("column_id"),
        title: row.get("title"),
        description: row.get("description"),
        deadline: row.get("deadline"),
        checklist: serde_json::from_str(&checklist_json).unwrap_or_else(|_| json!({})),
    }
}
