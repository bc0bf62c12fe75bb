//! Access-control vocabulary shared by the ACL store and the sharing
//! migration.

use serde::{Deserialize, Serialize};

/// Object-level permission codes for shareable resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    CanView,
    CanEdit,
    IsOwner,
}

impl Permission {
    pub fn code(&self) -> &'static str {
        match self {
            Permission::CanView => "can_view",
            Permission::CanEdit => "can_edit",
            Permission::IsOwner => "is_owner",
        }
    }
}

/// A grantee: an individual user account or a named group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Principal {
    User(String),
    Group(String),
}

impl Principal {
    pub fn group_name(&self) -> Option<&str> {
        match self {
            Principal::Group(name) => Some(name),
            Principal::User(_) => None,
        }
    }
}

/// A grantable resource, identified by guid.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Resource {
    Project(String),
    LocusList(String),
}

/// One principal-permission-resource relation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccessGrant {
    pub principal: Principal,
    pub permission: Permission,
    pub resource: Resource,
}
