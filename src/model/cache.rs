//! On-disk record of the generated playlist id

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::fs;
use tokio::sync::{Mutex, MutexGuard};

pub const PLAYLIST_ID_FILE: &str = ".cache/playlist_id.txt";

/// Plain-text file holding the remote id of the generated playlist.
///
/// There is exactly one record per install. Clones share the writer lock,
/// so holders of [`PlaylistIdStore::lock`] are the only in-process writers.
#[derive(Clone, Debug)]
pub struct PlaylistIdStore {
    path: PathBuf,
    writer: Arc<Mutex<()>>,
}

impl PlaylistIdStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            writer: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Hold this across a read-validate-write sequence
    pub async fn lock(&self) -> MutexGuard<'_, ()> {
        self.writer.lock().await
    }

    /// The stored id, `None` when the file is missing or blank
    pub async fn load(&self) -> io::Result<Option<String>> {
        match fs::read_to_string(&self.path).await {
            Ok(content) => {
                let id = content.trim();
                if id.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(id.to_string()))
                }
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Replace the record. Written to a sibling file first and renamed over
    /// the record so readers never observe a partial id. The whole sequence
    /// runs as one blocking job: once started it completes even if the
    /// caller is dropped, and it has finished before this returns.
    pub async fn save(&self, playlist_id: &str) -> io::Result<()> {
        let path = self.path.clone();
        let id = playlist_id.to_string();
        tokio::task::spawn_blocking(move || write_replacing(&path, &id))
            .await
            .map_err(io::Error::other)??;
        tracing::debug!(playlist_id, path = %self.path.display(), "Saved playlist id");
        Ok(())
    }
}

fn write_replacing(path: &Path, contents: &str) -> io::Result<()> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            std::fs::create_dir_all(dir)?;
        }
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    std::fs::write(&tmp, contents)?;
    std::fs::rename(&tmp, path)
}

impl Default for PlaylistIdStore {
    fn default() -> Self {
        Self::new(PLAYLIST_ID_FILE)
    }
}
