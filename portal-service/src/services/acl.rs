//! Object-level ACL store.
//!
//! A minimal capability interface over whatever backs permission grants, so
//! the sharing migration and authorization checks stay independent of the
//! store. The in-memory implementation keeps grants as sets, which makes
//! `grant` idempotent by construction.

use async_trait::async_trait;
use dashmap::DashMap;
use portal_core::error::Fault;
use std::collections::HashSet;

use crate::models::{AccessGrant, Permission, Principal, Resource};

#[async_trait]
pub trait AclStore: Send + Sync {
    async fn grant(
        &self,
        principal: Principal,
        permission: Permission,
        resource: Resource,
    ) -> Result<(), Fault>;

    async fn revoke(
        &self,
        principal: &Principal,
        permission: Permission,
        resource: &Resource,
    ) -> Result<(), Fault>;

    async fn principals_with(
        &self,
        permission: Permission,
        resource: &Resource,
    ) -> Result<Vec<Principal>, Fault>;

    /// Groups holding any permission level on the resource.
    async fn groups_with_any_permission(
        &self,
        resource: &Resource,
    ) -> Result<Vec<String>, Fault>;

    async fn has(
        &self,
        principal: &Principal,
        permission: Permission,
        resource: &Resource,
    ) -> Result<bool, Fault>;

    /// Every grant on the resource, for audit and migration verification.
    async fn grants_for(&self, resource: &Resource) -> Result<Vec<AccessGrant>, Fault>;
}

#[derive(Debug, Default)]
pub struct InMemoryAclStore {
    grants: DashMap<Resource, HashSet<(Principal, Permission)>>,
}

impl InMemoryAclStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AclStore for InMemoryAclStore {
    async fn grant(
        &self,
        principal: Principal,
        permission: Permission,
        resource: Resource,
    ) -> Result<(), Fault> {
        self.grants
            .entry(resource)
            .or_default()
            .insert((principal, permission));
        Ok(())
    }

    async fn revoke(
        &self,
        principal: &Principal,
        permission: Permission,
        resource: &Resource,
    ) -> Result<(), Fault> {
        if let Some(mut entry) = self.grants.get_mut(resource) {
            entry.remove(&(principal.clone(), permission));
        }
        Ok(())
    }

    async fn principals_with(
        &self,
        permission: Permission,
        resource: &Resource,
    ) -> Result<Vec<Principal>, Fault> {
        Ok(self
            .grants
            .get(resource)
            .map(|entry| {
                entry
                    .iter()
                    .filter(|(_, perm)| *perm == permission)
                    .map(|(principal, _)| principal.clone())
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn groups_with_any_permission(
        &self,
        resource: &Resource,
    ) -> Result<Vec<String>, Fault> {
        let mut groups: Vec<String> = self
            .grants
            .get(resource)
            .map(|entry| {
                entry
                    .iter()
                    .filter_map(|(principal, _)| principal.group_name().map(str::to_string))
                    .collect::<HashSet<_>>()
                    .into_iter()
                    .collect()
            })
            .unwrap_or_default();
        groups.sort();
        Ok(groups)
    }

    async fn has(
        &self,
        principal: &Principal,
        permission: Permission,
        resource: &Resource,
    ) -> Result<bool, Fault> {
        Ok(self
            .grants
            .get(resource)
            .map(|entry| entry.contains(&(principal.clone(), permission)))
            .unwrap_or(false))
    }

    async fn grants_for(&self, resource: &Resource) -> Result<Vec<AccessGrant>, Fault> {
        Ok(self
            .grants
            .get(resource)
            .map(|entry| {
                entry
                    .iter()
                    .map(|(principal, permission)| AccessGrant {
                        principal: principal.clone(),
                        permission: *permission,
                        resource: resource.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(guid: &str) -> Resource {
        Resource::LocusList(guid.to_string())
    }

    #[tokio::test]
    async fn test_grant_is_idempotent() {
        let acl = InMemoryAclStore::new();
        let principal = Principal::Group("g1".to_string());
        for _ in 0..3 {
            acl.grant(principal.clone(), Permission::CanView, list("LL1"))
                .await
                .unwrap();
        }
        assert_eq!(acl.grants_for(&list("LL1")).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_revoke_and_query() {
        let acl = InMemoryAclStore::new();
        let user = Principal::User("u1".to_string());
        let group = Principal::Group("g1".to_string());

        acl.grant(user.clone(), Permission::IsOwner, list("LL1"))
            .await
            .unwrap();
        acl.grant(group.clone(), Permission::CanView, list("LL1"))
            .await
            .unwrap();

        assert!(acl.has(&user, Permission::IsOwner, &list("LL1")).await.unwrap());
        assert_eq!(
            acl.groups_with_any_permission(&list("LL1")).await.unwrap(),
            vec!["g1".to_string()]
        );

        acl.revoke(&user, Permission::IsOwner, &list("LL1"))
            .await
            .unwrap();
        assert!(!acl.has(&user, Permission::IsOwner, &list("LL1")).await.unwrap());
        // Unrelated grants survive.
        assert_eq!(
            acl.principals_with(Permission::CanView, &list("LL1"))
                .await
                .unwrap(),
            vec![group]
        );
    }
}
