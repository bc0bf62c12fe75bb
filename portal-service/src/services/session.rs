//! Opaque bearer-token sessions.

use dashmap::DashMap;
use rand::RngCore;
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<DashMap<String, String>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a fresh session token for the user.
    pub fn issue(&self, username: &str) -> String {
        let mut token_bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut token_bytes);
        let token = hex::encode(token_bytes);
        self.sessions.insert(token.clone(), username.to_string());
        token
    }

    pub fn resolve(&self, token: &str) -> Option<String> {
        self.sessions.get(token).map(|entry| entry.clone())
    }

    pub fn revoke(&self, token: &str) {
        self.sessions.remove(token);
    }
}
