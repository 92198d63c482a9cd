//! Application state for the API server.

use std::sync::Arc;

use super::media::MediaStore;
use crate::db::Database;

/// Shared application state.
///
/// Generic over `D: Database` so handlers never name the storage backend.
pub struct AppState<D: Database> {
    db: Arc<D>,
    media: MediaStore,
}

// Manual Clone impl - only the Arc needs cloning, not D
impl<D: Database> Clone for AppState<D> {
    fn clone(&self) -> Self {
        Self {
            db: Arc::clone(&self.db),
            media: self.media.clone(),
        }
    }
}

impl<D: Database> AppState<D> {
    /// Create a new AppState with the given database and media store.
    pub fn new(db: D, media: MediaStore) -> Self {
        Self {
            db: Arc::new(db),
            media,
        }
    }

    /// Get a reference to the database.
    pub fn db(&self) -> &D {
        &self.db
    }

    /// Get a reference to the media store.
    pub fn media(&self) -> &MediaStore {
        &self.media
    }
}
