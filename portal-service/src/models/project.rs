use serde::{Deserialize, Serialize};

/// External workspace backing a project, when membership is controlled by a
/// third-party identity system.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Workspace {
    pub namespace: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub guid: String,
    pub name: String,
    /// Group whose members can view the project.
    pub can_view_group: String,
    /// Group whose members can edit the project (managers).
    pub can_edit_group: String,
    /// Set when the project's membership is managed in an external workspace.
    pub workspace: Option<Workspace>,
    pub is_demo: bool,
}

impl Project {
    pub fn new(guid: &str, name: &str) -> Self {
        Self {
            guid: guid.to_string(),
            name: name.to_string(),
            can_view_group: format!("{}_can_view", guid),
            can_edit_group: format!("{}_can_edit", guid),
            workspace: None,
            is_demo: false,
        }
    }

    /// Collaborators cannot be added or removed directly on externally
    /// managed projects.
    pub fn is_externally_managed(&self) -> bool {
        self.workspace.is_some()
    }
}
