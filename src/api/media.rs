//! Local storage for uploaded card attachments and board backgrounds.

use std::io;
use std::path::PathBuf;

use tracing::{debug, warn};

/// Where an upload belongs under the media root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    CardFile,
    Background,
}

impl MediaKind {
    fn subdir(self) -> &'static str {
        match self {
            MediaKind::CardFile => "card_files",
            MediaKind::Background => "back_img",
        }
    }
}

/// Writes uploads below a root directory and hands back paths relative to it.
#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Absolute location of a stored relative path.
    pub fn path_of(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    /// Store `bytes` under a unique name derived from `original_name`.
    ///
    /// Returns the path relative to the media root, e.g.
    /// `card_files/3f2a..._notes.txt`.
    pub async fn save(&self, kind: MediaKind, original_name: &str, bytes: &[u8]) -> io::Result<String> {
        let dir = self.root.join(kind.subdir());
        tokio::fs::create_dir_all(&dir).await?;

        let relative = format!(
            "{}/{}_{}",
            kind.subdir(),
            uuid::Uuid::new_v4().simple(),
            safe_file_name(original_name)
        );
        tokio::fs::write(self.path_of(&relative), bytes).await?;
        debug!("Stored {} bytes at {}", bytes.len(), relative);

        Ok(relative)
    }

    /// Remove a stored file. A file that is already gone is not an error.
    pub async fn remove(&self, relative: &str) -> io::Result<()> {
        match tokio::fs::remove_file(self.path_of(relative)).await {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }

    /// Remove every listed file, logging failures instead of returning them.
    pub async fn remove_all<I, S>(&self, relatives: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for relative in relatives {
            let relative = relative.as_ref();
            if let Err(e) = self.remove(relative).await {
                warn!(error = %e, "failed to remove stored file {}", relative);
            }
        }
    }
}

/// Strip path components and unsafe characters from a client file name.
pub fn safe_file_name(original: &str) -> String {
    let base = original
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(original);
    let cleaned = sanitize_filename::sanitize(base);
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}

/// Content type declared by the client, or guessed from the file name.
pub fn content_type_for(file_name: &str, declared: Option<&str>) -> String {
    match declared {
        Some(ct) if !ct.is_empty() && ct != "application/octet-stream" => ct.to_string(),
        _ => mime_guess::from_path(file_name)
            .first_or_octet_stream()
            .to_string(),
    }
}
