use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use uuid::Uuid;

use super::Pipeline;
use crate::session::{Session, SessionError};
use crate::types::Reply;

pub type SharedSession = Arc<Mutex<Session>>;

/// Independent sessions for multi-child deployments. Each session sits
/// behind its own lock, so messages for one child never wait on another.
#[derive(Default)]
pub struct SessionManager {
    sessions: Mutex<HashMap<Uuid, SharedSession>>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a fresh session built from the pipeline's settings.
    pub async fn create(&self, pipeline: &Pipeline) -> (Uuid, SharedSession) {
        self.insert(pipeline.new_session()).await
    }

    /// Register an already-built session (e.g. one with a parental forward).
    pub async fn insert(&self, session: Session) -> (Uuid, SharedSession) {
        let id = session.id();
        let shared = Arc::new(Mutex::new(session));
        self.sessions.lock().await.insert(id, Arc::clone(&shared));
        tracing::info!(session = %id, "session registered");
        (id, shared)
    }

    pub async fn get(&self, id: Uuid) -> Result<SharedSession, SessionError> {
        self.sessions
            .lock()
            .await
            .get(&id)
            .cloned()
            .ok_or(SessionError::UnknownSession(id))
    }

    pub async fn remove(&self, id: Uuid) -> Result<(), SessionError> {
        match self.sessions.lock().await.remove(&id) {
            Some(_) => {
                tracing::info!(session = %id, "session removed");
                Ok(())
            }
            None => Err(SessionError::UnknownSession(id)),
        }
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.lock().await.is_empty()
    }

    /// Route one message to session `id`. Messages for the same session are
    /// processed one at a time.
    pub async fn process(&self, pipeline: &Pipeline, id: Uuid, raw: &str) -> Result<Reply, SessionError> {
        let shared = self.get(id).await?;
        let mut session = shared.lock().await;
        Ok(pipeline.process_message(&mut session, raw).await)
    }
}
