//! SQLite ColumnRepository implementation.

use std::collections::HashMap;

use sqlx::{Row, SqlitePool};

use super::card::{CardScope, fetch_card_details};
use super::helpers::{database_error, expect_affected};
use crate::db::{CardDetail, Column, ColumnDetail, ColumnRepository, DbError, DbResult, Id};

/// SQLx-backed column repository.
pub struct SqliteColumnRepository {
    pub(crate) pool: SqlitePool,
}

/// Which columns to assemble with their cards.
#[derive(Debug, Clone, Copy)]
pub(super) enum ColumnScope {
    Column(Id),
    Board(Id),
}

impl ColumnRepository for SqliteColumnRepository {
    async fn create(&self, column: &Column) -> DbResult<Column> {
        let result = sqlx::query("INSERT INTO board_column (board_id, title) VALUES (?, ?)")
            .bind(column.board_id)
            .bind(&column.title)
            .execute(&self.pool)
            .await
            .map_err(database_error)?;

        Ok(Column {
            id: result.last_insert_rowid(),
            board_id: column.board_id,
            title: column.title.clone(),
        })
    }

    async fn get(&self, id: Id) -> DbResult<Column> {
        let row = sqlx::query("SELECT id, board_id, title FROM board_column WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(database_error)?;

        row.as_ref()
            .map(row_to_column)
            .ok_or_else(|| DbError::not_found("Column", id))
    }

    async fn get_detail(&self, id: Id) -> DbResult<ColumnDetail> {
        fetch_column_details(&self.pool, ColumnScope::Column(id))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("Column", id))
    }

    async fn list_by_board(&self, board_id: Id) -> DbResult<Vec<ColumnDetail>> {
        fetch_column_details(&self.pool, ColumnScope::Board(board_id)).await
    }

    async fn update(&self, column: &Column) -> DbResult<Column> {
        let result = sqlx::query("UPDATE board_column SET title = ? WHERE id = ?")
            .bind(&column.title)
            .bind(column.id)
            .execute(&self.pool)
            .await
            .map_err(database_error)?;

        expect_affected(result, "Column", column.id)?;

        Ok(column.clone())
    }

    async fn delete(&self, id: Id) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM board_column WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(database_error)?;

        expect_affected(result, "Column", id)
    }
}

/// Load columns in insertion order, each with its fully nested cards.
pub(super) async fn fetch_column_details(
    pool: &SqlitePool,
    scope: ColumnScope,
) -> DbResult<Vec<ColumnDetail>> {
    let (sql, id, card_scope) = match scope {
        ColumnScope::Column(id) => (
            "SELECT id, board_id, title FROM board_column WHERE id = ?",
            id,
            CardScope::Column(id),
        ),
        ColumnScope::Board(id) => (
            "SELECT id, board_id, title FROM board_column WHERE board_id = ? ORDER BY id",
            id,
            CardScope::Board(id),
        ),
    };

    let rows = sqlx::query(sql)
        .bind(id)
        .fetch_all(pool)
        .await
        .map_err(database_error)?;

    let columns: Vec<Column> = rows.iter().map(row_to_column).collect();
    if columns.is_empty() {
        return Ok(vec![]);
    }

    let mut cards_by_column: HashMap<Id, Vec<CardDetail>> = HashMap::new();
    for detail in fetch_card_details(pool, card_scope).await? {
        cards_by_column
            .entry(detail.card.column_id)
            .or_default()
            .push(detail);
    }

    Ok(columns
        .into_iter()
        .map(|column| ColumnDetail {
            cards: cards_by_column.remove(&column.id).unwrap_or_default(),
            column,
        })
        .collect())
}

fn row_to_column(row: &sqlx::sqlite::SqliteRow) -> Column {
    Column {
        id: row.get("id"),
        board_id: row.get("board_id"),
        title: row.get("title"),
    }
}
