//! SQLite implementation of the database traits.
//!
//! This module provides a SQLx-backed implementation of the repository
//! traits defined in the parent module.

mod board;
mod card;
mod column;
mod comment;
mod connection;
mod file;
mod helpers;
mod mark;
mod project;
mod user;

#[cfg(test)]
mod card_test;

pub use board::SqliteBoardRepository;
pub use card::SqliteCardRepository;
pub use column::SqliteColumnRepository;
pub use comment::SqliteCommentRepository;
pub use connection::SqliteDatabase;
pub use file::SqliteCardFileRepository;
pub use mark::SqliteMarkRepository;
pub use project::SqliteProjectRepository;
pub use user::SqliteUserRepository;
