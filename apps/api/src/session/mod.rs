//! Session-scoped storage of the pending (original, tailored) resume pair.
//!
//! One record per session id, single slot: a new generate call overwrites the
//! previous record, a successful accept call removes it. Callers pick a
//! backend at startup; the workflows only see `Arc<dyn SessionStore>`.

pub mod file;
pub mod memory;
pub mod middleware;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub use file::FileSessionStore;
pub use memory::MemorySessionStore;
pub use middleware::{assign_session, SessionContext, SessionCookieSettings};

const MAX_SESSION_ID_LEN: usize = 128;

/// Opaque session token. Only ids that are safe to embed in a file name
/// can be constructed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    pub fn generate() -> Self {
        SessionId(Uuid::new_v4().to_string())
    }

    /// Accepts a client-supplied token, rejecting anything outside
    /// `[A-Za-z0-9_-]{1,128}`.
    pub fn parse(raw: &str) -> Option<Self> {
        let valid = !raw.is_empty()
            && raw.len() <= MAX_SESSION_ID_LEN
            && raw
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
        valid.then(|| SessionId(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The stored pair. Serialized as `{"originalResume": ..., "tailoredResume": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub original_resume: String,
    pub tailored_resume: String,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("session record is not valid JSON: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("session storage task failed: {0}")]
    Task(String),
}

/// Session-keyed store. Implementations must tolerate concurrent calls for
/// the same id; last writer wins.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Stores `record` under `id`, replacing any previous record.
    async fn save(&self, id: &SessionId, record: SessionRecord) -> Result<(), SessionError>;

    /// `Ok(None)` when nothing is stored (or the record expired).
    async fn load(&self, id: &SessionId) -> Result<Option<SessionRecord>, SessionError>;

    /// Removing an id with no record is not an error.
    async fn remove(&self, id: &SessionId) -> Result<(), SessionError>;

    fn backend(&self) -> &'static str;
}
