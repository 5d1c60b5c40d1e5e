//! In-flight provisioning guard.
//!
//! The brand tables have no unique constraint on `username`, so two
//! overlapping provisions for the same tenant could both pass the
//! select-before-write check. This in-process set rejects the second request
//! with 409 while the first is still running.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
pub struct InFlight {
    usernames: Arc<Mutex<HashSet<String>>>,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim a username for the duration of one provision run. Returns None
    /// when a run for the same username is already in flight.
    pub fn acquire(&self, username: &str) -> Option<InFlightGuard> {
        let mut set = self.usernames.lock().expect("inflight lock poisoned");
        if !set.insert(username.to_string()) {
            return None;
        }
        Some(InFlightGuard {
            usernames: self.usernames.clone(),
            username: username.to_string(),
        })
    }
}

/// Releases the claim on drop, including on panic/early return.
pub struct InFlightGuard {
    usernames: Arc<Mutex<HashSet<String>>>,
    username: String,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if let Ok(mut set) = self.usernames.lock() {
            set.remove(&self.username);
        }
    }
}
