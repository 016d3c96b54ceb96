//! Registry of values already handed out in a network.
//!
//! Every SID, display name and link password must be unique within one
//! network; this registry is the single place those uniqueness checks happen.

use std::collections::HashSet;

use crate::topology::Sid;

/// Tracks used SIDs, names and passwords for one allocation pass
#[derive(Debug, Default)]
pub struct UsedRegistry {
    sids: HashSet<Sid>,
    names: HashSet<String>,
    passwords: HashSet<String>,
}

impl UsedRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim a SID; returns false if it was already taken
    pub fn claim_sid(&mut self, sid: &Sid) -> bool {
        self.sids.insert(sid.clone())
    }

    pub fn claim_name(&mut self, name: &str) -> bool {
        self.names.insert(name.to_string())
    }

    pub fn claim_password(&mut self, password: &str) -> bool {
        self.passwords.insert(password.to_string())
    }

    pub fn sid_count(&self) -> usize {
        self.sids.len()
    }
}
