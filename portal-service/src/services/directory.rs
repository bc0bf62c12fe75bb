//! Collaborator directory.
//!
//! Builds per-project collaborator views and manages project-scoped user
//! accounts. Identity storage, group membership and notification delivery are
//! delegated through the store and notifier traits; this service owns the
//! policy: who may manage whom, what is required, and which operations are
//! refused on externally managed projects.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Argon2,
};
use chrono::Utc;
use portal_core::error::Fault;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::models::{CollaboratorRecord, Project, User, UserOption, UserPolicy};
use crate::services::{catalog::ProjectStore, email::Notifier, slack::SlackClient, user_store::UserStore};

pub const EXTERNALLY_MANAGED_ERROR: &str =
    "Adding collaborators directly is disabled. Users can be managed from the associated workspace";

#[derive(Debug, Clone)]
pub struct DirectorySettings {
    pub base_url: String,
    pub analyst_group: String,
    pub data_manager_group: String,
    pub pm_group: String,
    pub privacy_version: String,
    pub tos_version: String,
    pub notification_channel: String,
}

pub struct CollaboratorDirectory {
    users: Arc<dyn UserStore>,
    projects: Arc<dyn ProjectStore>,
    notifier: Arc<dyn Notifier>,
    slack: SlackClient,
    settings: DirectorySettings,
}

impl CollaboratorDirectory {
    pub fn new(
        users: Arc<dyn UserStore>,
        projects: Arc<dyn ProjectStore>,
        notifier: Arc<dyn Notifier>,
        slack: SlackClient,
        settings: DirectorySettings,
    ) -> Self {
        Self {
            users,
            projects,
            notifier,
            slack,
            settings,
        }
    }

    /// Projects the caller can see at all.
    async fn visible_projects(&self, caller: &User) -> Result<Vec<Project>, Fault> {
        let all = self.projects.all().await?;
        if caller.is_superuser {
            return Ok(all);
        }
        let mut visible = Vec::new();
        for project in all {
            if self.users.is_member(&project.can_view_group, &caller.username).await?
                || self.users.is_member(&project.can_edit_group, &caller.username).await?
            {
                visible.push(project);
            }
        }
        Ok(visible)
    }

    async fn ensure_manager(&self, caller: &User, project: &Project) -> Result<(), Fault> {
        if caller.is_superuser
            || self
                .users
                .is_member(&project.can_edit_group, &caller.username)
                .await?
        {
            return Ok(());
        }
        Err(Fault::PermissionDenied(
            "Project manager access required".to_string(),
        ))
    }

    async fn user_option(&self, user: &User) -> Result<UserOption, Fault> {
        Ok(UserOption {
            username: user.username.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            display_name: user.display_name(),
            is_analyst: self
                .users
                .is_member(&self.settings.analyst_group, &user.username)
                .await?,
        })
    }

    async fn collaborator_record(
        &self,
        user: &User,
        has_view: bool,
        has_edit: bool,
    ) -> Result<CollaboratorRecord, Fault> {
        Ok(CollaboratorRecord {
            username: user.username.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            display_name: user.display_name(),
            is_superuser: user.is_superuser,
            is_analyst: self
                .users
                .is_member(&self.settings.analyst_group, &user.username)
                .await?,
            is_data_manager: self
                .users
                .is_member(&self.settings.data_manager_group, &user.username)
                .await?,
            is_pm: self
                .users
                .is_member(&self.settings.pm_group, &user.username)
                .await?,
            is_active: user.is_active,
            has_view_permissions: has_view,
            has_edit_permissions: has_edit,
        })
    }

    /// Everyone with any access on the project, view-group and edit-group
    /// members combined, sorted by display name then email.
    pub async fn project_collaborators(
        &self,
        project: &Project,
    ) -> Result<Vec<CollaboratorRecord>, Fault> {
        let view_members = self.users.members_of(&project.can_view_group).await?;
        let edit_members = self.users.members_of(&project.can_edit_group).await?;

        let mut usernames: Vec<String> = view_members.clone();
        for username in &edit_members {
            if !usernames.contains(username) {
                usernames.push(username.clone());
            }
        }

        let mut records = Vec::new();
        for username in usernames {
            let Some(user) = self.users.find_by_username(&username).await? else {
                continue;
            };
            let record = self
                .collaborator_record(
                    &user,
                    view_members.contains(&username),
                    edit_members.contains(&username),
                )
                .await?;
            records.push(record);
        }
        records.sort_by(|a, b| {
            (a.display_name.clone(), a.email.clone()).cmp(&(b.display_name.clone(), b.email.clone()))
        });
        Ok(records)
    }

    async fn collaborators_by_guid(&self, project: &Project) -> Result<Value, Fault> {
        let collaborators = self.project_collaborators(project).await?;
        let mut by_guid = serde_json::Map::new();
        by_guid.insert(project.guid.clone(), json!({"collaborators": collaborators}));
        Ok(json!({"projectsByGuid": by_guid}))
    }

    /// One entry per user with any grant on a project the caller can see,
    /// deduplicated by username. Empty for callers with no project access.
    pub async fn collaborator_options(
        &self,
        caller: &User,
    ) -> Result<BTreeMap<String, UserOption>, Fault> {
        let mut options = BTreeMap::new();
        for project in self.visible_projects(caller).await? {
            for record in self.project_collaborators(&project).await? {
                if options.contains_key(&record.username) {
                    continue;
                }
                let Some(user) = self.users.find_by_username(&record.username).await? else {
                    continue;
                };
                options.insert(record.username.clone(), self.user_option(&user).await?);
            }
        }
        Ok(options)
    }

    /// All members of the analyst group, keyed by username.
    pub async fn analyst_options(&self) -> Result<BTreeMap<String, UserOption>, Fault> {
        let mut options = BTreeMap::new();
        for username in self.users.members_of(&self.settings.analyst_group).await? {
            if let Some(user) = self.users.find_by_username(&username).await? {
                options.insert(username, self.user_option(&user).await?);
            }
        }
        Ok(options)
    }

    /// Find-or-create a collaborator by email and grant view access. The
    /// welcome email goes out only when the account is newly created;
    /// re-invoking with an existing email just updates the name fields.
    pub async fn create_collaborator(
        &self,
        caller: &User,
        project_guid: &str,
        email: Option<String>,
        first_name: Option<String>,
        last_name: Option<String>,
    ) -> Result<Value, Fault> {
        let project = self.projects.get(project_guid).await?;
        self.ensure_manager(caller, &project).await?;

        if project.is_externally_managed() {
            return Err(Fault::PermissionDenied(EXTERNALLY_MANAGED_ERROR.to_string()));
        }

        let email = email
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty())
            .ok_or_else(|| Fault::InvalidRequest("Email is required".to_string()))?;

        let username = match self.users.find_by_email(&email).await? {
            Some(existing) => {
                self.users
                    .update(
                        &existing.username,
                        Box::new(move |u| {
                            if let Some(first) = first_name {
                                u.first_name = first;
                            }
                            if let Some(last) = last_name {
                                u.last_name = last;
                            }
                        }),
                    )
                    .await?;
                existing.username
            }
            None => {
                let mut user = User::new(&email);
                user.first_name = first_name.unwrap_or_default();
                user.last_name = last_name.unwrap_or_default();
                self.users.insert(user.clone()).await?;

                self.notifier
                    .send_welcome_email(&user, caller, &self.settings.base_url)
                    .await?;
                tracing::info!(user = %caller.email, "Created user {} (local)", email);
                self.slack
                    .safe_post(
                        &self.settings.notification_channel,
                        &format!(
                            "{} added {} as a collaborator on {}",
                            caller.full_name_or_email(),
                            email,
                            project.name
                        ),
                    )
                    .await;
                user.username
            }
        };

        // Set semantics in the group store make the repeated grant a no-op.
        self.users
            .add_to_group(&project.can_view_group, &username)
            .await?;

        self.collaborators_by_guid(&project).await
    }

    /// Update name fields and, for locally managed projects, the edit flag.
    pub async fn update_collaborator(
        &self,
        caller: &User,
        project_guid: &str,
        username: &str,
        first_name: Option<String>,
        last_name: Option<String>,
        has_edit_permissions: Option<bool>,
    ) -> Result<Value, Fault> {
        let project = self.projects.get(project_guid).await?;
        self.ensure_manager(caller, &project).await?;

        let is_collaborator = self
            .users
            .is_member(&project.can_view_group, username)
            .await?
            || self.users.is_member(&project.can_edit_group, username).await?;
        if !is_collaborator {
            return Err(Fault::NotFound("User not found".to_string()));
        }

        self.users
            .update(
                username,
                Box::new(move |u| {
                    if let Some(first) = first_name {
                        u.first_name = first;
                    }
                    if let Some(last) = last_name {
                        u.last_name = last;
                    }
                }),
            )
            .await?;

        // Edit access on externally managed projects is controlled in the
        // workspace, not here.
        if !project.is_externally_managed() {
            match has_edit_permissions {
                Some(true) => {
                    self.users
                        .add_to_group(&project.can_edit_group, username)
                        .await?
                }
                Some(false) => {
                    self.users
                        .remove_from_group(&project.can_edit_group, username)
                        .await?
                }
                None => {}
            }
        }

        self.collaborators_by_guid(&project).await
    }

    /// Revoke the project's grants for the user. The identity record is
    /// never deleted here.
    pub async fn delete_collaborator(
        &self,
        caller: &User,
        project_guid: &str,
        username: &str,
    ) -> Result<Value, Fault> {
        let project = self.projects.get(project_guid).await?;
        self.ensure_manager(caller, &project).await?;

        self.users
            .remove_from_group(&project.can_view_group, username)
            .await?;
        self.users
            .remove_from_group(&project.can_edit_group, username)
            .await?;

        self.collaborators_by_guid(&project).await
    }

    /// Set the user's credential and record the login. The caller is signed
    /// in as this user by the handler afterwards.
    pub async fn set_password(
        &self,
        username: &str,
        password: Option<String>,
        first_name: Option<String>,
        last_name: Option<String>,
    ) -> Result<User, Fault> {
        let password = password
            .filter(|p| !p.is_empty())
            .ok_or_else(|| Fault::InvalidRequest("Password is required".to_string()))?;

        self.users
            .find_by_username(username)
            .await?
            .ok_or_else(|| Fault::NotFound("User not found".to_string()))?;

        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| Fault::Internal(anyhow::anyhow!(e.to_string())))?
            .to_string();

        self.users
            .update(
                username,
                Box::new(move |u| {
                    u.password_hash = hash;
                    if let Some(first) = first_name {
                        u.first_name = first;
                    }
                    if let Some(last) = last_name {
                        u.last_name = last;
                    }
                    u.last_login = Some(Utc::now());
                }),
            )
            .await
    }

    /// Dispatch a password-reset email. A delivery failure surfaces to the
    /// caller with the notifier's message, verbatim.
    pub async fn forgot_password(&self, email: Option<String>) -> Result<(), Fault> {
        let email = email
            .filter(|e| !e.is_empty())
            .ok_or_else(|| Fault::InvalidRequest("Email is required".to_string()))?;

        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or_else(|| Fault::InvalidRequest("No account found for this email".to_string()))?;

        self.notifier
            .send_reset_email(&user, &self.settings.base_url)
            .await
            .map_err(|e| Fault::InvalidRequest(e.to_string()))
    }

    /// Record acceptance of the currently required policy versions.
    pub async fn update_policies(&self, caller: &User, accepted: bool) -> Result<Value, Fault> {
        if !accepted {
            return Err(Fault::InvalidRequest(
                "User must accept current policies".to_string(),
            ));
        }
        self.users
            .set_policy(UserPolicy {
                username: caller.username.clone(),
                privacy_version: self.settings.privacy_version.clone(),
                tos_version: self.settings.tos_version.clone(),
            })
            .await?;
        Ok(json!({"currentPolicies": true}))
    }

    pub async fn current_policies(&self, user: &User) -> Result<bool, Fault> {
        Ok(self
            .users
            .get_policy(&user.username)
            .await?
            .map(|policy| {
                policy.is_current(&self.settings.privacy_version, &self.settings.tos_version)
            })
            .unwrap_or(false))
    }
}
