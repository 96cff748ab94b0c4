//! Session repository over the shared state store.

use std::sync::Arc;

use async_trait::async_trait;

use till_core::error::Result;
use till_core::session::{Session, SessionRepository};

use crate::storage::{StateStore, WriteBatch, keys, read_json, write_json};

/// Persists session history under `sessions` and the active record under
/// `current-session`, exactly the logical layout the wider system reads.
#[derive(Clone)]
pub struct StoreSessionRepository {
    store: Arc<dyn StateStore>,
}

impl StoreSessionRepository {
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        Self { store }
    }

    /// Stages an insert-or-replace of `session` in history onto `batch`
    /// without committing. Used by the checkout transaction.
    pub async fn stage_save(&self, batch: &mut WriteBatch, session: &Session) -> Result<()> {
        let mut history = self.load_history().await?;
        upsert(&mut history, session);
        batch.put_json(keys::SESSIONS, &history)
    }

    /// Stages the active session record onto `batch` without committing.
    pub fn stage_current(batch: &mut WriteBatch, session: &Session) -> Result<()> {
        batch.put_json(keys::CURRENT_SESSION, session)
    }

    async fn load_history(&self) -> Result<Vec<Session>> {
        Ok(read_json(self.store.as_ref(), keys::SESSIONS)
            .await?
            .unwrap_or_default())
    }
}

fn upsert(history: &mut Vec<Session>, session: &Session) {
    if let Some(existing) = history.iter_mut().find(|s| s.id == session.id) {
        *existing = session.clone();
    } else {
        history.push(session.clone());
    }
}

#[async_trait]
impl SessionRepository for StoreSessionRepository {
    async fn find_by_id(&self, session_id: &str) -> Result<Option<Session>> {
        let history = self.load_history().await?;
        Ok(history.into_iter().find(|s| s.id == session_id))
    }

    async fn save(&self, session: &Session) -> Result<()> {
        let mut history = self.load_history().await?;
        upsert(&mut history, session);
        write_json(self.store.as_ref(), keys::SESSIONS, &history).await
    }

    async fn list_all(&self) -> Result<Vec<Session>> {
        self.load_history().await
    }

    async fn current(&self) -> Result<Option<Session>> {
        read_json(self.store.as_ref(), keys::CURRENT_SESSION).await
    }

    async fn set_current(&self, session: &Session) -> Result<()> {
        write_json(self.store.as_ref(), keys::CURRENT_SESSION, session).await
    }

    async fn clear_current(&self) -> Result<()> {
        self.store.remove(keys::CURRENT_SESSION).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use till_core::session::DeviceProfile;

    fn repo() -> StoreSessionRepository {
        StoreSessionRepository::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn test_save_and_find() {
        let repo = repo();
        let session = Session::open("Shift", "c", 0, DeviceProfile::default());

        repo.save(&session).await.unwrap();

        let found = repo.find_by_id(&session.id).await.unwrap().unwrap();
        assert_eq!(found, session);
        assert_eq!(repo.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_save_replaces_by_id() {
        let repo = repo();
        let mut session = Session::open("Shift", "c", 0, DeviceProfile::default());
        repo.save(&session).await.unwrap();

        session.close(1234);
        repo.save(&session).await.unwrap();

        let history = repo.list_all().await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].closing_balance_minor, Some(1234));
    }

    #[tokio::test]
    async fn test_current_slot() {
        let repo = repo();
        assert!(repo.current().await.unwrap().is_none());

        let session = Session::open("Shift", "c", 0, DeviceProfile::default());
        repo.set_current(&session).await.unwrap();
        assert_eq!(repo.current().await.unwrap().unwrap().id, session.id);

        repo.clear_current().await.unwrap();
        assert!(repo.current().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_stage_save_writes_only_on_commit() {
        let store = Arc::new(MemoryStore::new());
        let repo = StoreSessionRepository::new(store.clone());
        let session = Session::open("Shift", "c", 0, DeviceProfile::default());

        let mut batch = WriteBatch::new();
        repo.stage_save(&mut batch, &session).await.unwrap();
        StoreSessionRepository::stage_current(&mut batch, &session).unwrap();

        // Nothing visible before the commit
        assert!(repo.list_all().await.unwrap().is_empty());

        store.commit(batch).await.unwrap();
        assert_eq!(repo.list_all().await.unwrap().len(), 1);
        assert!(repo.current().await.unwrap().is_some());
    }
}
