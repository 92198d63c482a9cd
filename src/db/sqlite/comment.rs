//! SQLite CommentRepository implementation.

use sqlx::{Row, SqlitePool};

use super::helpers::{database_error, expect_affected};
use crate::db::utils::current_timestamp;
use crate::db::{CardComment, CommentRepository, DbError, DbResult, Id};

/// SQLx-backed comment repository.
pub struct SqliteCommentRepository {
    pub(crate) pool: SqlitePool,
}

impl CommentRepository for SqliteCommentRepository {
    async fn create(&self, comment: &CardComment) -> DbResult<CardComment> {
        let created_on = current_timestamp();

        let result = sqlx::query(
            "INSERT INTO card_comment (card_id, user_id, body, created_on) VALUES (?, ?, ?, ?)",
        )
        .bind(comment.card_id)
        .bind(comment.user_id)
        .bind(&comment.body)
        .bind(&created_on)
        .execute(&self.pool)
        .await
        .map_err(database_error)?;

        Ok(CardComment {
            id: result.last_insert_rowid(),
            created_on,
            ..comment.clone()
        })
    }

    async fn get(&self, id: Id) -> DbResult<CardComment> {
        let row = sqlx::query(
            "SELECT id, card_id, user_id, body, created_on FROM card_comment WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(database_error)?;

        row.as_ref()
            .map(row_to_comment)
            .ok_or_else(|| DbError::not_found("CardComment", id))
    }

    async fn list_by_card(&self, card_id: Id) -> DbResult<Vec<CardComment>> {
        let rows = sqlx::query(
            "SELECT id, card_id, user_id, body, created_on FROM card_comment \
             WHERE card_id = ? ORDER BY id",
        )
        .bind(card_id)
        .fetch_all(&self.pool)
        .await
        .map_err(database_error)?;

        Ok(rows.iter().map(row_to_comment).collect())
    }

    async fn update(&self, comment: &CardComment) -> DbResult<CardComment> {
        // Only the body is mutable; author and card are fixed at creation
        let result = sqlx::query("UPDATE card_comment SET body = ? WHERE id = ?")
            .bind(&comment.body)
            .bind(comment.id)
            .execute(&self.pool)
            .await
            .map_err(database_error)?;

        expect_affected(result, "CardComment", comment.id)?;

        Ok(comment.clone())
    }

    async fn delete(&self, id: Id) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM card_comment WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(database_error)?;

        expect_affected(result, "CardComment", id)
    }
}

pub(super) fn row_to_comment(row: &sqlx::sqlite::SqliteRow) -> CardComment {
    CardComment {
        id: row.get("id"),
        card_id: row.get("card_id"),
        user_id: row.get("user_id"),
        body: row.get("body"),
        created_on: row.get("created_on"),
    }
}
