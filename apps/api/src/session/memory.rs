use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::time::Instant;

use super::{SessionError, SessionId, SessionRecord, SessionStore};

/// Process-local store with a bounded lifetime per record.
///
/// Expired records read as absent. Eviction happens inline on `save`; there
/// is no sweeper task.
pub struct MemorySessionStore {
    ttl: Duration,
    records: RwLock<HashMap<SessionId, StoredRecord>>,
}

struct StoredRecord {
    record: SessionRecord,
    stored_at: Instant,
}

impl MemorySessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            records: RwLock::new(HashMap::new()),
        }
    }

    #[cfg(test)]
    async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    fn is_live(&self, stored: &StoredRecord, now: Instant) -> bool {
        now.duration_since(stored.stored_at) < self.ttl
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn save(&self, id: &SessionId, record: SessionRecord) -> Result<(), SessionError> {
        let now = Instant::now();
        let mut records = self.records.write().await;
        records.retain(|_, stored| now.duration_since(stored.stored_at) < self.ttl);
        records.insert(
            id.clone(),
            StoredRecord {
                record,
                stored_at: now,
            },
        );
        Ok(())
    }

    async fn load(&self, id: &SessionId) -> Result<Option<SessionRecord>, SessionError> {
        let now = Instant::now();
        let records = self.records.read().await;
        Ok(records
            .get(id)
            .filter(|stored| self.is_live(stored, now))
            .map(|stored| stored.record.clone()))
    }

    async fn remove(&self, id: &SessionId) -> Result<(), SessionError> {
        self.records.write().await.remove(id);
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
