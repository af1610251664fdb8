use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("Save cancelled")]
    Cancelled,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Host capability that persists a finished payload under a suggested name.
#[async_trait]
pub trait FileSaver: Send + Sync {
    /// Returns the path the payload ended up at.
    async fn save(&self, payload: Bytes, suggested_name: &str) -> Result<PathBuf, SaveError>;
}

/// Saves straight into a directory, never overwriting an existing file.
#[derive(Debug, Clone)]
pub struct DirectorySaver {
    dir: PathBuf,
}

impl DirectorySaver {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The user's Downloads folder, falling back to the home directory.
    pub fn downloads() -> Self {
        let dir = dirs::download_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."));
        Self::new(dir)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl FileSaver for DirectorySaver {
    async fn save(&self, payload: Bytes, suggested_name: &str) -> Result<PathBuf, SaveError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let target = available_path(&self.dir, suggested_name).await?;
        write_guarded(&target, &payload).await?;
        Ok(target)
    }
}

/// Asks the user where to save with a native dialog.
#[derive(Debug, Clone, Default)]
pub struct DialogSaver;

#[async_trait]
impl FileSaver for DialogSaver {
    async fn save(&self, payload: Bytes, suggested_name: &str) -> Result<PathBuf, SaveError> {
        let target = rfd::AsyncFileDialog::new()
            .set_file_name(suggested_name)
            .save_file()
            .await
            .map(|handle| handle.path().to_path_buf())
            .ok_or(SaveError::Cancelled)?;

        write_guarded(&target, &payload).await?;
        Ok(target)
    }
}

/// Where finished downloads go, switchable from the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SaveTarget {
    #[default]
    AskEveryTime,
    DownloadsFolder,
}

impl SaveTarget {
    pub fn toggled(self) -> Self {
        match self {
            SaveTarget::AskEveryTime => SaveTarget::DownloadsFolder,
            SaveTarget::DownloadsFolder => SaveTarget::AskEveryTime,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SaveTarget::AskEveryTime => "Save to: Ask every time",
            SaveTarget::DownloadsFolder => "Save to: Downloads folder",
        }
    }

    pub fn saver(self) -> Arc<dyn FileSaver> {
        match self {
            SaveTarget::AskEveryTime => Arc::new(DialogSaver),
            SaveTarget::DownloadsFolder => Arc::new(DirectorySaver::downloads()),
        }
    }
}

/// Scratch file that is removed on drop unless committed.
struct PartialFile {
    path: PathBuf,
    committed: bool,
}

impl PartialFile {
    fn new(path: PathBuf) -> Self {
        Self {
            path,
            committed: false,
        }
    }

    fn commit(mut self) {
        self.committed = true;
    }
}

impl Drop for PartialFile {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "Removed partial file"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), error = %e, "Failed to remove partial file"),
        }
    }
}

/// Write `payload` next to `target` and move it into place once fully flushed.
async fn write_guarded(target: &Path, payload: &[u8]) -> Result<(), SaveError> {
    let mut scratch_name = target.as_os_str().to_owned();
    scratch_name.push(".part");
    let guard = PartialFile::new(PathBuf::from(scratch_name));

    let mut file = tokio::fs::File::create(&guard.path).await?;
    file.write_all(payload).await?;
    file.sync_all().await?;
    drop(file);

    tokio::fs::rename(&guard.path, target).await?;
    guard.commit();
    Ok(())
}

/// `dir/name`, or `dir/stem (n).ext` for the first free `n` if taken.
async fn available_path(dir: &Path, name: &str) -> Result<PathBuf, SaveError> {
    let candidate = dir.join(name);
    if !tokio::fs::try_exists(&candidate).await? {
        return Ok(candidate);
    }

    let (stem, ext) = match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
        _ => (name, None),
    };

    let mut n = 1u32;
    loop {
        let numbered = match ext {
            Some(ext) => format!("{} ({}).{}", stem, n, ext),
            None => format!("{} ({})", stem, n),
        };
        let candidate = dir.join(numbered);
        if !tokio::fs::try_exists(&candidate).await? {
            return Ok(candidate);
        }
        n += 1;
    }
}
