//! Persistent CLI session state.
//!
//! Stores the most recently started or selected audit id so `ops audit watch`
//! can resume tracking after the process exits. Written only when an audit is
//! started or selected; cleared when the backend reports the id as gone after
//! the not-found budget is exhausted. Load failures degrade to an empty state
//! rather than blocking the CLI.

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct SessionState {
    pub last_audit_uuid: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Store under the platform-local data dir.
    pub fn open_default() -> Option<Self> {
        dirs::data_local_dir().map(|d| Self::new(d.join("tgadmin-ops").join("session.json")))
    }

    pub fn load(&self) -> SessionState {
        if let Ok(data) = fs::read_to_string(&self.path) {
            if let Ok(state) = serde_json::from_str(&data) {
                return state;
            }
        }
        SessionState::default()
    }

    pub fn save(&self, state: &SessionState) {
        if let Some(parent) = self.path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        if let Ok(data) = serde_json::to_string_pretty(state) {
            let _ = fs::write(&self.path, data);
        }
    }

    pub fn last_audit(&self) -> Option<String> {
        self.load().last_audit_uuid
    }

    pub fn remember_audit(&self, audit_uuid: &str) {
        let mut state = self.load();
        state.last_audit_uuid = Some(audit_uuid.to_string());
        self.save(&state);
    }

    pub fn clear_audit(&self) {
        let mut state = self.load();
        state.last_audit_uuid = None;
        self.save(&state);
    }
}
