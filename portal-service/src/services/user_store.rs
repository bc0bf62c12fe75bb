//! Identity store.
//!
//! The portal delegates identity persistence to an external user store; this
//! trait is the contract it relies on. Group membership lives here too, since
//! project access is group-based.

use async_trait::async_trait;
use dashmap::DashMap;
use portal_core::error::Fault;
use std::collections::HashSet;

use crate::models::{User, UserPolicy};

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, Fault>;

    /// Email match is case-insensitive: the store owns at most one account
    /// per email.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, Fault>;

    async fn insert(&self, user: User) -> Result<(), Fault>;

    async fn update(
        &self,
        username: &str,
        apply: Box<dyn for<'a> FnOnce(&'a mut User) + Send>,
    ) -> Result<User, Fault>;

    async fn all(&self) -> Result<Vec<User>, Fault>;

    async fn add_to_group(&self, group: &str, username: &str) -> Result<(), Fault>;
    async fn remove_from_group(&self, group: &str, username: &str) -> Result<(), Fault>;
    async fn members_of(&self, group: &str) -> Result<Vec<String>, Fault>;
    async fn is_member(&self, group: &str, username: &str) -> Result<bool, Fault>;

    async fn get_policy(&self, username: &str) -> Result<Option<UserPolicy>, Fault>;
    async fn set_policy(&self, policy: UserPolicy) -> Result<(), Fault>;
}

#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    users: DashMap<String, User>,
    groups: DashMap<String, HashSet<String>>,
    policies: DashMap<String, UserPolicy>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, Fault> {
        Ok(self.users.get(username).map(|u| u.clone()))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, Fault> {
        let needle = email.to_lowercase();
        Ok(self
            .users
            .iter()
            .find(|entry| entry.email.to_lowercase() == needle)
            .map(|entry| entry.clone()))
    }

    async fn insert(&self, user: User) -> Result<(), Fault> {
        self.users.insert(user.username.clone(), user);
        Ok(())
    }

    async fn update(
        &self,
        username: &str,
        apply: Box<dyn for<'a> FnOnce(&'a mut User) + Send>,
    ) -> Result<User, Fault> {
        let mut entry = self
            .users
            .get_mut(username)
            .ok_or_else(|| Fault::NotFound("User not found".to_string()))?;
        apply(&mut entry);
        Ok(entry.clone())
    }

    async fn all(&self) -> Result<Vec<User>, Fault> {
        Ok(self.users.iter().map(|entry| entry.clone()).collect())
    }

    async fn add_to_group(&self, group: &str, username: &str) -> Result<(), Fault> {
        self.groups
            .entry(group.to_string())
            .or_default()
            .insert(username.to_string());
        Ok(())
    }

    async fn remove_from_group(&self, group: &str, username: &str) -> Result<(), Fault> {
        if let Some(mut members) = self.groups.get_mut(group) {
            members.remove(username);
        }
        Ok(())
    }

    async fn members_of(&self, group: &str) -> Result<Vec<String>, Fault> {
        let mut members: Vec<String> = self
            .groups
            .get(group)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default();
        members.sort();
        Ok(members)
    }

    async fn is_member(&self, group: &str, username: &str) -> Result<bool, Fault> {
        Ok(self
            .groups
            .get(group)
            .map(|set| set.contains(username))
            .unwrap_or(false))
    }

    async fn get_policy(&self, username: &str) -> Result<Option<UserPolicy>, Fault> {
        Ok(self.policies.get(username).map(|p| p.clone()))
    }

    async fn set_policy(&self, policy: UserPolicy) -> Result<(), Fault> {
        self.policies.insert(policy.username.clone(), policy);
        Ok(())
    }
}
