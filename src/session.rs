//! In-memory conversation sessions.
//!
//! Each session keeps a sliding window of the most recent exchanges, rendered
//! into the system prompt of the next query. Sessions live for the process
//! lifetime only.

use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

/// One completed user/assistant exchange.
#[derive(Debug, Clone)]
pub struct Exchange {
    pub user: String,
    pub assistant: String,
}

/// Session registry with a bounded per-session history window.
pub struct SessionManager {
    sessions: Mutex<HashMap<String, Vec<Exchange>>>,
    max_history: usize,
}

impl SessionManager {
    pub fn new(max_history: usize) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            max_history,
        }
    }

    /// Create a fresh session and return its id.
    pub fn create_session(&self) -> String {
        let id = Uuid::new_v4().to_string();
        self.sessions
            .lock()
            .unwrap()
            .insert(id.clone(), Vec::new());
        id
    }

    /// Append an exchange, trimming the window to the configured size.
    pub fn add_exchange(&self, session_id: &str, user: &str, assistant: &str) {
        let mut sessions = self.sessions.lock().unwrap();
        let history = sessions.entry(session_id.to_string()).or_default();
        history.push(Exchange {
            user: user.to_string(),
            assistant: assistant.to_string(),
        });
        let len = history.len();
        if len > self.max_history {
            history.drain(..len - self.max_history);
        }
    }

    /// Drop a session's history entirely.
    pub fn clear_session(&self, session_id: &str) {
        self.sessions.lock().unwrap().remove(session_id);
    }

    /// Render a session's history as prompt text, or None when the session is
    /// unknown or empty.
    pub fn get_history(&self, session_id: &str) -> Option<String> {
        let sessions = self.sessions.lock().unwrap();
        let history = sessions.get(session_id)?;
        if history.is_empty() {
            return None;
        }
        Some(
            history
                .iter()
                .map(|e| format!("User: {}\nAssistant: {}", e.user, e.assistant))
                .collect::<Vec<_>>()
                .join("\n"),
        )
    }
}
