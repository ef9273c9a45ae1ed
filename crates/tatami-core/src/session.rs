//! Bounded in-memory session context.
//!
//! [`SessionStore`] maps a session key to the most recent N turns of
//! that conversation. Context is process-lifetime only: a restart clears
//! every window. That trade-off is deliberate -- the durable record
//! lives in the turn log, the window only feeds the agent prompt.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;

use tatami_types::turn::Turn;

/// Per-session FIFO windows keyed by session key.
///
/// The outer map lock is held only long enough to fetch or insert the
/// per-key entry; appends and reads then serialize on the entry's own
/// mutex, so two sessions never block each other and two concurrent
/// turns for the same session cannot interleave the window.
pub struct SessionStore {
    /// Maximum turns retained per session.
    window: usize,
    /// Session key -> mutex-guarded turn window.
    sessions: Mutex<HashMap<String, Arc<Mutex<VecDeque<Turn>>>>>,
}

impl SessionStore {
    /// Create a store retaining at most `window` turns per session.
    pub fn new(window: usize) -> Self {
        Self {
            window: window.max(1),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// The configured window size.
    pub fn window(&self) -> usize {
        self.window
    }

    /// Snapshot the context for `key`, oldest turn first.
    ///
    /// Unknown keys yield an empty context without creating an entry.
    pub async fn context(&self, key: &str) -> Vec<Turn> {
        let entry = {
            let sessions = self.sessions.lock().await;
            sessions.get(key).cloned()
        };
        match entry {
            Some(entry) => entry.lock().await.iter().cloned().collect(),
            None => Vec::new(),
        }
    }

    /// Append a completed turn to its session window, evicting the
    /// oldest turn when the window would exceed its bound.
    pub async fn append(&self, turn: Turn) {
        let entry = {
            let mut sessions = self.sessions.lock().await;
            sessions
                .entry(turn.session_key.clone())
                .or_insert_with(|| Arc::new(Mutex::new(VecDeque::new())))
                .clone()
        };

        let mut window = entry.lock().await;
        window.push_back(turn);
        while window.len() > self.window {
            let evicted = window.pop_front();
            if let Some(evicted) = evicted {
                debug!(session_key = %evicted.session_key, "evicted oldest turn from context window");
            }
        }
    }

    /// Number of sessions currently holding a window.
    pub async fn session_count(&self) -> usize {
        self.sessions.lock().await.len()
    }
}
