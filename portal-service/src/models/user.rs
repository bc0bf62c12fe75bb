//! User identity record and the derived wire shapes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An identity-store user account. The password hash doubles as the
/// set-password / reset-link token, matching the original account-setup flow.
#[derive(Debug, Clone)]
pub struct User {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
    pub is_superuser: bool,
    pub is_active: bool,
    pub date_joined: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl User {
    /// Create a user with an unusable credential. A usable hash is only set
    /// through the set-password flow.
    pub fn new(email: &str) -> Self {
        Self {
            username: Uuid::new_v4().simple().to_string(),
            email: email.to_string(),
            first_name: String::new(),
            last_name: String::new(),
            password_hash: format!("!{}", Uuid::new_v4().simple()),
            is_superuser: false,
            is_active: true,
            date_joined: Utc::now(),
            last_login: None,
        }
    }

    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    pub fn full_name_or_email(&self) -> String {
        let name = self.display_name();
        if name.is_empty() {
            self.email.clone()
        } else {
            name
        }
    }
}

/// Per-user entry in the collaborator-options map.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserOption {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub display_name: String,
    pub is_analyst: bool,
}

/// A user's project-scoped access summary. Derived on demand from the
/// identity store plus group membership; never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CollaboratorRecord {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub display_name: String,
    pub is_superuser: bool,
    pub is_analyst: bool,
    pub is_data_manager: bool,
    pub is_pm: bool,
    pub is_active: bool,
    pub has_view_permissions: bool,
    pub has_edit_permissions: bool,
}
