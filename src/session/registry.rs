//! Per-connection session lifecycle
//!
//! Information Hiding:
//! - HashMap of live sessions hidden behind open/get/close
//! - Each session sits behind its own async Mutex, so sessions never share
//!   mutable state and a session runs one operation at a time
//! - Teardown cancels an in-flight turn without waiting for the lock

use super::Session;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;

struct SessionEntry {
    session: Arc<Mutex<Session>>,
    cancel: CancellationToken,
}

pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, SessionEntry>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Return the session for `id`, creating it on first contact.
    pub async fn open_with<F>(&self, id: &str, create: F) -> Arc<Mutex<Session>>
    where
        F: FnOnce(&str) -> Session,
    {
        let mut sessions = self.sessions.write().await;
        if let Some(entry) = sessions.get(id) {
            return entry.session.clone();
        }

        let session = create(id);
        let cancel = session.cancellation_token();
        let session = Arc::new(Mutex::new(session));
        sessions.insert(
            id.to_string(),
            SessionEntry {
                session: session.clone(),
                cancel,
            },
        );
        tracing::debug!("[SessionRegistry] Opened session '{}'", id);
        session
    }

    pub async fn get(&self, id: &str) -> Option<Arc<Mutex<Session>>> {
        let sessions = self.sessions.read().await;
        sessions.get(id).map(|entry| entry.session.clone())
    }

    /// End a session. Any running turn is cancelled first so the lock is
    /// released promptly. Returns false if the session did not exist.
    pub async fn close(&self, id: &str) -> bool {
        let entry = {
            let mut sessions = self.sessions.write().await;
            sessions.remove(id)
        };

        let Some(entry) = entry else {
            return false;
        };

        entry.cancel.cancel();
        entry.session.lock().await.close();
        tracing::debug!("[SessionRegistry] Closed session '{}'", id);
        true
    }

    pub async fn list_sessions(&self) -> Vec<String> {
        let sessions = self.sessions.read().await;
        sessions.keys().cloned().collect()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
