use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tempfile::NamedTempFile;

use super::{SessionError, SessionId, SessionRecord, SessionStore};

const FILE_PREFIX: &str = "resume-tailor-";

/// One JSON file per session, `resume-tailor-<id>.json` under `dir`.
///
/// Writes land in a temp file in the same directory and are renamed over the
/// target, so a concurrent `load` sees either the old record or the new one.
pub struct FileSessionStore {
    dir: PathBuf,
}

impl FileSessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, id: &SessionId) -> PathBuf {
        self.dir.join(format!("{FILE_PREFIX}{}.json", id.as_str()))
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn save(&self, id: &SessionId, record: SessionRecord) -> Result<(), SessionError> {
        let payload = serde_json::to_vec(&record)?;
        let dir = self.dir.clone();
        let target = self.path_for(id);

        tokio::task::spawn_blocking(move || write_atomically(&dir, &target, &payload))
            .await
            .map_err(|e| SessionError::Task(e.to_string()))?
    }

    async fn load(&self, id: &SessionId) -> Result<Option<SessionRecord>, SessionError> {
        match tokio::fs::read(self.path_for(id)).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn remove(&self, id: &SessionId) -> Result<(), SessionError> {
        match tokio::fs::remove_file(self.path_for(id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn backend(&self) -> &'static str {
        "file"
    }
}

fn write_atomically(dir: &Path, target: &Path, payload: &[u8]) -> Result<(), SessionError> {
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(payload)?;
    tmp.as_file().sync_all()?;
    tmp.persist(target).map_err(|e| SessionError::Io(e.error))?;
    Ok(())
}
