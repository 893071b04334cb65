//! Signed-in user session
//!
//! The identity provider does the actual sign-in; what is kept locally is
//! the resulting profile, stored as JSON under a fixed key so a reload
//! starts signed in.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Storage key for the cached profile
pub const SESSION_KEY: &str = "visitwise_user";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub uid: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
}

/// Key-value string storage (browser local storage or a stand-in)
pub trait SessionStorage {
    fn get_item(&self, key: &str) -> Option<String>;
    fn set_item(&mut self, key: &str, value: String);
    fn remove_item(&mut self, key: &str);
}

#[derive(Clone, Debug, Default)]
pub struct MemoryStorage {
    items: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.get(key).cloned()
    }

    fn set_item(&mut self, key: &str, value: String) {
        self.items.insert(key.to_string(), value);
    }

    fn remove_item(&mut self, key: &str) {
        self.items.remove(key);
    }
}

pub fn save_session<S: SessionStorage>(storage: &mut S, profile: &UserProfile) -> crate::Result<()> {
    let json = serde_json::to_string(profile)?;
    storage.set_item(SESSION_KEY, json);
    Ok(())
}

/// Cached profile, if any. A value that no longer parses is discarded and
/// treated as signed out.
pub fn load_session<S: SessionStorage>(storage: &mut S) -> Option<UserProfile> {
    let raw = storage.get_item(SESSION_KEY)?;
    match serde_json::from_str(&raw) {
        Ok(profile) => Some(profile),
        Err(e) => {
            log::warn!("Discarding unreadable session: {}", e);
            storage.remove_item(SESSION_KEY);
            None
        }
    }
}

pub fn clear_session<S: SessionStorage>(storage: &mut S) {
    storage.remove_item(SESSION_KEY);
}
