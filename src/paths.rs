//! Path resolution for kanban data directories.
//!
//! Provides XDG-compliant defaults for the database file and media store.

use std::env;
use std::path::PathBuf;

/// Get the XDG-compliant data directory: `$XDG_DATA_HOME/kanban`, falling
/// back to `~/.local/share/kanban`.
pub fn get_data_dir() -> PathBuf {
    let data_home = env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".local/share")
        });

    data_home.join("kanban")
}

/// Get database file path (data_dir/kanban.db).
pub fn get_db_path() -> PathBuf {
    get_data_dir().join("kanban.db")
}

/// Get the media directory for uploaded files (data_dir/media).
pub fn get_media_dir() -> PathBuf {
    get_data_dir().join("media")
}
