//! Database utility functions.

use sha2::{Digest, Sha256};
use sqlx::types::chrono::Utc;

/// Get current datetime as string in SQLite-sortable format (millisecond precision)
pub fn current_timestamp() -> String {
    Utc::now().format("%Y-%m-%d %H:%M:%S%.3f").to_string()
}

/// Generate a fresh API token key.
///
/// The plain key is only ever handed to the user; the database stores its hash.
pub fn generate_token_key() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// SHA256 hex digest of a token key, as stored in `auth_token.key_hash`.
pub fn hash_token_key(key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    format!("{:x}", hasher.finalize())
}
