//! Sharing-model migration for gene lists.
//!
//! Moves a list between two sharing models: direct per-list grants (view
//! grants to project groups, owner/edit/view grants to the creator) and
//! project inheritance, where view access follows the list's associated
//! projects and ownership is implied by the creator reference. Both
//! directions are idempotent so a partially applied run can be repeated.

use portal_core::error::Fault;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::models::{LocusList, Permission, Principal, Resource};
use crate::services::{acl::AclStore, catalog::LocusListStore, catalog::ProjectStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Forward,
    Backward,
}

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct MigrationSummary {
    pub migrated: usize,
    pub failed: usize,
}

pub struct SharingMigrator {
    acl: Arc<dyn AclStore>,
    projects: Arc<dyn ProjectStore>,
    locus_lists: Arc<dyn LocusListStore>,
}

impl SharingMigrator {
    pub fn new(
        acl: Arc<dyn AclStore>,
        projects: Arc<dyn ProjectStore>,
        locus_lists: Arc<dyn LocusListStore>,
    ) -> Self {
        Self {
            acl,
            projects,
            locus_lists,
        }
    }

    /// Replace the list's direct grants with project associations. Every
    /// project whose view group holds any grant on the list becomes an
    /// associated project, and the creator's direct grants are revoked.
    pub async fn migrate_forward(&self, list: &LocusList) -> Result<(), Fault> {
        let resource = Resource::LocusList(list.guid.clone());

        let groups = self.acl.groups_with_any_permission(&resource).await?;
        let project_guids = self
            .projects
            .by_view_groups(&groups)
            .await?
            .into_iter()
            .map(|p| p.guid)
            .collect();
        self.locus_lists
            .set_projects(&list.guid, project_guids)
            .await?;

        if let Some(creator) = &list.created_by {
            let principal = Principal::User(creator.clone());
            for permission in [Permission::IsOwner, Permission::CanEdit, Permission::CanView] {
                self.acl.revoke(&principal, permission, &resource).await?;
            }
        }
        Ok(())
    }

    /// Restore direct grants from the list's project associations: each
    /// associated project's view group gets view access, and the creator
    /// gets owner, edit and view.
    pub async fn migrate_backward(&self, list: &LocusList) -> Result<(), Fault> {
        let resource = Resource::LocusList(list.guid.clone());

        for project_guid in &list.projects {
            let project = self.projects.get(project_guid).await?;
            self.acl
                .grant(
                    Principal::Group(project.can_view_group),
                    Permission::CanView,
                    resource.clone(),
                )
                .await?;
        }

        if let Some(creator) = &list.created_by {
            let principal = Principal::User(creator.clone());
            for permission in [Permission::IsOwner, Permission::CanEdit, Permission::CanView] {
                self.acl
                    .grant(principal.clone(), permission, resource.clone())
                    .await?;
            }
        }
        Ok(())
    }

    /// Run one direction over every known list. A single list's failure is
    /// logged and counted; the batch continues.
    pub async fn migrate_all(&self, direction: Direction) -> Result<MigrationSummary, Fault> {
        let lists = self.locus_lists.all().await?;
        tracing::info!("Updating permissions for {} gene lists", lists.len());

        let mut summary = MigrationSummary::default();
        for list in lists {
            let result = match direction {
                Direction::Forward => self.migrate_forward(&list).await,
                Direction::Backward => self.migrate_backward(&list).await,
            };
            match result {
                Ok(()) => summary.migrated += 1,
                Err(error) => {
                    tracing::error!(list = %list.guid, %error, "gene list migration failed");
                    summary.failed += 1;
                }
            }
        }
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Project;
    use crate::services::acl::InMemoryAclStore;
    use crate::services::catalog::{InMemoryLocusListStore, InMemoryProjectStore};

    struct Fixture {
        migrator: SharingMigrator,
        acl: Arc<InMemoryAclStore>,
        locus_lists: Arc<InMemoryLocusListStore>,
    }

    fn fixture() -> Fixture {
        let acl = Arc::new(InMemoryAclStore::new());
        let projects = Arc::new(InMemoryProjectStore::new());
        let locus_lists = Arc::new(InMemoryLocusListStore::new());

        projects.insert(Project::new("R0001_1kg", "1kg Project"));
        projects.insert(Project::new("R0002_empty", "Empty Project"));

        Fixture {
            migrator: SharingMigrator::new(acl.clone(), projects, locus_lists.clone()),
            acl,
            locus_lists,
        }
    }

    fn legacy_list(fx: &Fixture) -> LocusList {
        let list = LocusList {
            guid: "LL00001_panel".to_string(),
            name: "Test Panel".to_string(),
            created_by: Some("creator".to_string()),
            projects: Vec::new(),
        };
        fx.locus_lists.insert(list.clone());
        list
    }

    async fn grant_legacy_perms(fx: &Fixture, list: &LocusList) {
        let resource = Resource::LocusList(list.guid.clone());
        fx.acl
            .grant(
                Principal::Group("R0001_1kg_can_view".to_string()),
                Permission::CanView,
                resource.clone(),
            )
            .await
            .unwrap();
        // A grant from a group that is no project's view group is dropped by
        // the forward migration.
        fx.acl
            .grant(
                Principal::Group("orphan_group".to_string()),
                Permission::CanView,
                resource.clone(),
            )
            .await
            .unwrap();
        for permission in [Permission::IsOwner, Permission::CanEdit, Permission::CanView] {
            fx.acl
                .grant(
                    Principal::User("creator".to_string()),
                    permission,
                    resource.clone(),
                )
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_forward_associates_projects_and_strips_creator_grants() {
        let fx = fixture();
        let list = legacy_list(&fx);
        grant_legacy_perms(&fx, &list).await;

        fx.migrator.migrate_forward(&list).await.unwrap();

        let migrated = fx.locus_lists.get(&list.guid).await.unwrap();
        assert_eq!(migrated.projects, vec!["R0001_1kg".to_string()]);

        let resource = Resource::LocusList(list.guid.clone());
        let creator = Principal::User("creator".to_string());
        for permission in [Permission::IsOwner, Permission::CanEdit, Permission::CanView] {
            assert!(!fx.acl.has(&creator, permission, &resource).await.unwrap());
        }
    }

    #[tokio::test]
    async fn test_round_trip_restores_grants() {
        let fx = fixture();
        let list = legacy_list(&fx);
        grant_legacy_perms(&fx, &list).await;

        fx.migrator.migrate_forward(&list).await.unwrap();
        let migrated = fx.locus_lists.get(&list.guid).await.unwrap();
        fx.migrator.migrate_backward(&migrated).await.unwrap();

        let resource = Resource::LocusList(list.guid.clone());
        let group = Principal::Group("R0001_1kg_can_view".to_string());
        assert!(fx
            .acl
            .has(&group, Permission::CanView, &resource)
            .await
            .unwrap());
        let creator = Principal::User("creator".to_string());
        for permission in [Permission::IsOwner, Permission::CanEdit, Permission::CanView] {
            assert!(fx.acl.has(&creator, permission, &resource).await.unwrap());
        }
    }

    #[tokio::test]
    async fn test_both_directions_are_idempotent() {
        let fx = fixture();
        let list = legacy_list(&fx);
        grant_legacy_perms(&fx, &list).await;

        fx.migrator.migrate_forward(&list).await.unwrap();
        let once = fx.locus_lists.get(&list.guid).await.unwrap();
        fx.migrator.migrate_forward(&once).await.unwrap();
        assert_eq!(fx.locus_lists.get(&list.guid).await.unwrap().projects, once.projects);

        fx.migrator.migrate_backward(&once).await.unwrap();
        let resource = Resource::LocusList(list.guid.clone());
        let grants = fx.acl.grants_for(&resource).await.unwrap().len();
        fx.migrator.migrate_backward(&once).await.unwrap();
        assert_eq!(fx.acl.grants_for(&resource).await.unwrap().len(), grants);
    }

    #[tokio::test]
    async fn test_batch_continues_past_failures() {
        let fx = fixture();
        legacy_list(&fx);
        // A list referencing an unknown project fails backward migration
        // without aborting the batch.
        fx.locus_lists.insert(LocusList {
            guid: "LL00002_broken".to_string(),
            name: "Broken".to_string(),
            created_by: None,
            projects: vec!["R9999_missing".to_string()],
        });

        let summary = fx.migrator.migrate_all(Direction::Backward).await.unwrap();
        assert_eq!(
            summary,
            MigrationSummary {
                migrated: 1,
                failed: 1
            }
        );
    }
}
