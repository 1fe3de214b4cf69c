//! Session registry keyed by opaque caller-supplied identifiers.
//!
//! The registry is constructed once in `main` and injected into the
//! MCP dispatch layer — there is no ambient global session. Each
//! session lives behind its own `Mutex`, so concurrent tool calls
//! against the same session serialize at the adapter boundary instead
//! of interleaving writes on the child's stdin.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::info;

use super::controller::{DebugSession, SessionSettings};

/// Owns every live [`DebugSession`], keyed by caller-chosen id.
pub struct SessionRegistry {
    settings: SessionSettings,
    sessions: Mutex<HashMap<String, Arc<Mutex<DebugSession>>>>,
}

impl SessionRegistry {
    /// Create an empty registry sharing `settings` across sessions.
    #[must_use]
    pub fn new(settings: SessionSettings) -> Self {
        Self {
            settings,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Fetch the session for `id`, creating an idle one on first use.
    pub async fn session(&self, id: &str) -> Arc<Mutex<DebugSession>> {
        let mut guard = self.sessions.lock().await;
        Arc::clone(guard.entry(id.to_owned()).or_insert_with(|| {
            info!(session_id = id, "creating debug session");
            Arc::new(Mutex::new(DebugSession::new(self.settings.clone())))
        }))
    }

    /// Tear down every session. Invoked once at host shutdown
    /// regardless of session state; safe to call repeatedly.
    pub async fn cleanup_all(&self) {
        let drained: Vec<_> = {
            let mut guard = self.sessions.lock().await;
            guard.drain().collect()
        };

        for (id, session) in drained {
            info!(session_id = %id, "cleaning up session at shutdown");
            session.lock().await.cleanup().await;
        }
    }
}
