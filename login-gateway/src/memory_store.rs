//! An in-memory implementation of `SessionStore`.

use std::{collections::HashMap, fmt, sync::Arc};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tower_sessions::{
    session::{Id, Record},
    session_store, SessionStore,
};

/// An ephemeral store. Sessions live until they are deleted or the process
/// exits: record expiry dates are kept but never enforced.
///
/// Clones share the same underlying map.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<HashMap<Id, Record>>>,
}

impl MemoryStore {
    /// Creates a new, empty memory store.
    ///
    /// ```rust
    /// use login_gateway::MemoryStore;
    ///
    /// let memory_store = MemoryStore::new();
    /// ```
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of live sessions.
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

// Records hold user profiles; keep them out of logs.
impl fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryStore").finish_non_exhaustive()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn create(&self, record: &mut Record) -> session_store::Result<()> {
        let mut inner = self.inner.write().await;

        while inner.contains_key(&record.id) {
            record.id = Id::default();
        }
        inner.insert(record.id, record.clone());

        Ok(())
    }

    async fn save(&self, record: &Record) -> session_store::Result<()> {
        self.inner.write().await.insert(record.id, record.clone());
        Ok(())
    }

    async fn load(&self, session_id: &Id) -> session_store::Result<Option<Record>> {
        Ok(self.inner.read().await.get(session_id).cloned())
    }

    async fn delete(&self, session_id: &Id) -> session_store::Result<()> {
        self.inner.write().await.remove(session_id);
        Ok(())
    }
}
