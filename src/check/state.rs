//! Probe-wide state the host platform owns: the last probe status, the
//! online-since timestamp behind the online-delay hysteresis, and the
//! error counter that knocks an unhealthy probe down. The checks only
//! go through these accessors.

use std::path::PathBuf;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::warn;

pub trait ProbeStateStore: Send + Sync {
    fn online_since(&self) -> i64;
    fn set_online_since(&self, ts: i64);
    fn last_status(&self) -> i32;
    fn set_last_status(&self, status: i32);
    /// Probe knock-down: bump the error counter the platform watches.
    fn errors_inc(&self);
}

/// In-memory store for tests and one-shot invocations without a state
/// directory.
#[derive(Default)]
pub struct MemoryStateStore {
    inner: Mutex<PersistedState>,
}

impl MemoryStateStore {
    pub fn new(online_since: i64, last_status: i32) -> Self {
        Self {
            inner: Mutex::new(PersistedState {
                online_since,
                last_status,
                errors: 0,
            }),
        }
    }

    pub fn errors(&self) -> u64 {
        self.inner.lock().errors
    }
}

impl ProbeStateStore for MemoryStateStore {
    fn online_since(&self) -> i64 {
        self.inner.lock().online_since
    }

    fn set_online_since(&self, ts: i64) {
        self.inner.lock().online_since = ts;
    }

    fn last_status(&self) -> i32 {
        self.inner.lock().last_status
    }

    fn set_last_status(&self, status: i32) {
        self.inner.lock().last_status = status;
    }

    fn errors_inc(&self) {
        self.inner.lock().errors += 1;
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
struct PersistedState {
    online_since: i64,
    last_status: i32,
    errors: u64,
}

/// File-backed store so the state survives between one-shot invocations.
pub struct FileStateStore {
    path: PathBuf,
}

impl FileStateStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn load(&self) -> PersistedState {
        match std::fs::read(&self.path) {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_default(),
            Err(_) => PersistedState::default(),
        }
    }

    fn save(&self, state: PersistedState) {
        match serde_json::to_vec(&state) {
            Ok(bytes) => {
                if let Err(err) = std::fs::write(&self.path, bytes) {
                    warn!(path = %self.path.display(), "cannot persist probe state: {}", err);
                }
            }
            Err(err) => warn!("cannot serialise probe state: {}", err),
        }
    }
}

impl ProbeStateStore for FileStateStore {
    fn online_since(&self) -> i64 {
        self.load().online_since
    }

    fn set_online_since(&self, ts: i64) {
        let mut state = self.load();
        state.online_since = ts;
        self.save(state);
    }

    fn last_status(&self) -> i32 {
        self.load().last_status
    }

    fn set_last_status(&self, status: i32) {
        let mut state = self.load();
        state.last_status = status;
        self.save(state);
    }

    fn errors_inc(&self) {
        let mut state = self.load();
        state.errors += 1;
        self.save(state);
    }
}
