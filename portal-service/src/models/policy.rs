use serde::{Deserialize, Serialize};

/// The privacy-policy and terms-of-service versions a user has accepted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserPolicy {
    pub username: String,
    pub privacy_version: String,
    pub tos_version: String,
}

impl UserPolicy {
    /// Whether the accepted versions match the currently required ones.
    pub fn is_current(&self, privacy_version: &str, tos_version: &str) -> bool {
        self.privacy_version == privacy_version && self.tos_version == tos_version
    }
}
