//! JSON file sink.
//!
//! The list is written to a uniquely named temporary file in the target
//! directory, flushed to disk, and then renamed over the target, so readers
//! never see a half-written document. Overlapping runs each get their own
//! temporary file and the last rename wins.

use crate::error::StoreError;
use crate::models::CanonicalList;
use crate::outputs::PersistenceSink;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::fs;
use tracing::{error, info, instrument};

#[derive(Debug, Clone)]
pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory holding the target, where the temporary file must live so
    /// the rename stays on one file system.
    fn dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    /// Read back the last stored list. A missing file is an empty list.
    #[instrument(level = "info", skip_all, fields(path = %self.path.display()))]
    pub async fn load(&self) -> Result<CanonicalList, StoreError> {
        let text = match fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No stored articles yet");
                return Ok(CanonicalList::default());
            }
            Err(e) => return Err(io_error(&self.path, e)),
        };
        let list: CanonicalList = serde_json::from_str(&text)?;
        info!(count = list.len(), "Loaded stored articles");
        Ok(list)
    }
}

impl PersistenceSink for JsonFileSink {
    #[instrument(level = "info", skip_all, fields(path = %self.path.display()))]
    async fn store(&self, list: &CanonicalList) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(list)?;

        let dir = self.dir().to_path_buf();
        fs::create_dir_all(&dir).await.map_err(|e| io_error(&dir, e))?;

        let target = self.path.clone();
        let written = tokio::task::spawn_blocking(move || replace_file(&dir, &target, &json))
            .await
            .map_err(|e| io_error(&self.path, std::io::Error::other(e)))?;
        if let Err(e) = written {
            error!(error = %e, "Failed to replace stored articles");
            return Err(e);
        }

        info!(count = list.len(), "Stored articles");
        Ok(())
    }
}

/// Write `bytes` to a fresh temporary file in `dir`, sync it, and rename it
/// over `target`. The temporary file is removed if any step fails.
fn replace_file(dir: &Path, target: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let mut tmp = tempfile::Builder::new()
        .prefix(".articles-")
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(|e| io_error(dir, e))?;
    write_synced(&mut tmp, bytes).map_err(|e| io_error(tmp.path(), e))?;
    tmp.persist(target).map_err(|e| io_error(target, e.error))?;
    Ok(())
}

fn write_synced(tmp: &mut NamedTempFile, bytes: &[u8]) -> std::io::Result<()> {
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()
}

fn io_error(path: &Path, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.display().to_string(),
        source,
    }
}
