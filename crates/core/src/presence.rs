//! Who is currently in the room
//!
//! Presence arrives as a full `presence_state` map on join and as
//! `presence_diff` updates afterwards. Both are keyed by the user id as a
//! string.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::models::{User, UserId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresenceEntry {
    pub user: User,
    /// Per-connection metadata; not interpreted
    #[serde(default)]
    pub metas: Vec<serde_json::Value>,
}

pub type PresenceMap = HashMap<String, PresenceEntry>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PresenceDiff {
    #[serde(default)]
    pub joins: PresenceMap,
    #[serde(default)]
    pub leaves: PresenceMap,
}

#[derive(Debug, Clone, Default)]
pub struct Presence {
    users: BTreeMap<UserId, User>,
}

impl Presence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace everyone with a full presence state
    pub fn apply_state(&mut self, state: &PresenceMap) {
        self.users.clear();
        for (key, entry) in state {
            self.join(key, entry);
        }
        debug!(present = self.users.len(), "Applied presence_state");
    }

    pub fn apply_diff(&mut self, diff: &PresenceDiff) {
        for (key, entry) in &diff.leaves {
            self.users.remove(&entry.user.id);
            debug!(key = %key, user_id = %entry.user.id, "User left");
        }
        for (key, entry) in &diff.joins {
            self.join(key, entry);
        }
    }

    /// Present users in ascending id order
    pub fn users(&self) -> Vec<&User> {
        self.users.values().collect()
    }

    pub fn user_ids(&self) -> Vec<UserId> {
        self.users.keys().copied().collect()
    }

    pub fn is_present(&self, user_id: UserId) -> bool {
        self.users.contains_key(&user_id)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    fn join(&mut self, key: &str, entry: &PresenceEntry) {
        if key != entry.user.id.to_string() {
            warn!(key = %key, user_id = %entry.user.id, "Presence key does not match user id");
        }
        self.users.insert(entry.user.id, entry.user.clone());
    }
}
