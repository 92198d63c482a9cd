//! SQLite MarkRepository implementation.

use sqlx::{Row, SqlitePool};

use super::helpers::{database_error, expect_affected};
use crate::db::{DbError, DbResult, Id, Mark, MarkRepository};

/// SQLx-backed mark repository.
pub struct SqliteMarkRepository {
    pub(crate) pool: SqlitePool,
}

impl MarkRepository for SqliteMarkRepository {
    async fn create(&self, mark: &Mark) -> DbResult<Mark> {
        let result = sqlx::query("INSERT INTO mark (board_id, title, color) VALUES (?, ?, ?)")
            .bind(mark.board_id)
            .bind(&mark.title)
            .bind(&mark.color)
            .execute(&self.pool)
            .await
            .map_err(database_error)?;

        Ok(Mark {
            id: result.last_insert_rowid(),
            ..mark.clone()
        })
    }

    async fn get(&self, id: Id) -> DbResult<Mark> {
        let row = sqlx::query("SELECT id, board_id, title, color FROM mark WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(database_error)?;

        row.as_ref()
            .map(row_to_mark)
            .ok_or_else(|| DbError::not_found("Mark", id))
    }

    async fn list_by_board(&self, board_id: Id) -> DbResult<Vec<Mark>> {
        let rows =
            sqlx::query("SELECT id, board_id, title, color FROM mark WHERE board_id = ? ORDER BY id")
                .bind(board_id)
                .fetch_all(&self.pool)
                .await
                .map_err(database_error)?;

        Ok(rows.iter().map(row_to_mark).collect())
    }

    async fn update(&self, mark: &Mark) -> DbResult<Mark> {
        let result = sqlx::query("UPDATE mark SET title = ?, color = ? WHERE id = ?")
            .bind(&mark.title)
            .bind(&mark.color)
            .bind(mark.id)
            .execute(&self.pool)
            .await
            .map_err(database_error)?;

        expect_affected(result, "Mark", mark.id)?;

        Ok(mark.clone())
    }

    async fn delete(&self, id: Id) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM mark WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(database_error)?;

        expect_affected(result, "Mark", id)
    }
}

pub(super) fn row_to_mark(row: &sqlx::sqlite::SqliteRow) -> Mark {
    Mark {
        id: row.get("id"),
        board_id: row.get("board_id"),
        title: row.get("title"),
        color: row.get("color"),
    }
}
