//! SQLite database connection and migration management.

use std::path::Path;
use std::str::FromStr;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};

use super::{
    SqliteBoardRepository, SqliteCardFileRepository, SqliteCardRepository,
    SqliteColumnRepository, SqliteCommentRepository, SqliteMarkRepository,
    SqliteProjectRepository, SqliteUserRepository,
};
use crate::db::{Database, DbError, DbResult};

/// SQLite database implementation.
///
/// Repositories hold a clone of the pool, which is reference counted.
pub struct SqliteDatabase {
    pool: SqlitePool,
}

impl SqliteDatabase {
    /// Open (creating if missing) a database at the given path.
    pub async fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(8)
            .connect_with(options)
            .await
            .map_err(|e| DbError::Connection {
                message: e.to_string(),
            })?;

        Ok(Self { pool })
    }

    /// Create an in-memory database (useful for testing).
    ///
    /// Every SQLite connection to `:memory:` is a separate database, so the
    /// pool is pinned to a single connection that never expires.
    pub async fn in_memory() -> DbResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| DbError::Connection {
                message: e.to_string(),
            })?
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| DbError::Connection {
                message: e.to_string(),
            })?;

        Ok(Self { pool })
    }

    /// Access the underlying pool (tests and ad-hoc queries).
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl Database for SqliteDatabase {
    type Users = SqliteUserRepository;
    type Projects = SqliteProjectRepository;
    type Boards = SqliteBoardRepository;
    type Columns = SqliteColumnRepository;
    type Cards = SqliteCardRepository;
    type Marks = SqliteMarkRepository;
    type Files = SqliteCardFileRepository;
    type Comments = SqliteCommentRepository;

    async fn migrate(&self) -> DbResult<()> {
        sqlx::migrate!("data/sql/sqlite")
            .run(&self.pool)
            .await
            .map_err(|e| DbError::Migration {
                message: e.to_string(),
            })
    }

    fn users(&self) -> Self::Users {
        SqliteUserRepository {
            pool: self.pool.clone(),
        }
    }

    fn projects(&self) -> Self::Projects {
        SqliteProjectRepository {
            pool: self.pool.clone(),
        }
    }

    fn boards(&self) -> Self::Boards {
        SqliteBoardRepository {
            pool: self.pool.clone(),
        }
    }

    fn columns(&self) -> Self::Columns {
        SqliteColumnRepository {
            pool: self.pool.clone(),
        }
    }

    fn cards(&self) -> Self::Cards {
        SqliteCardRepository {
            pool: self.pool.clone(),
        }
    }

    fn marks(&self) -> Self::Marks {
        SqliteMarkRepository {
            pool: self.pool.clone(),
        }
    }

    fn files(&self) -> Self::Files {
        SqliteCardFileRepository {
            pool: self.pool.clone(),
        }
    }

    fn comments(&self) -> Self::Comments {
        SqliteCommentRepository {
            pool: self.pool.clone(),
        }
    }
}
