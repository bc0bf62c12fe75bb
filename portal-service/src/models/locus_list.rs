use serde::{Deserialize, Serialize};

/// A curated gene/region list that can be shared with projects for view
/// access. Historically carried its own ACL group; view access is now
/// inherited from the associated projects' groups (see `services::sharing`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocusList {
    pub guid: String,
    pub name: String,
    /// Creator username. Ownership is implied by this field after the
    /// sharing-model migration, not by a stored grant.
    pub created_by: Option<String>,
    /// Guids of the associated projects.
    pub projects: Vec<String>,
}

impl LocusList {
    pub fn new(guid: &str, name: &str, created_by: Option<&str>) -> Self {
        Self {
            guid: guid.to_string(),
            name: name.to_string(),
            created_by: created_by.map(str::to_string),
            projects: Vec::new(),
        }
    }
}
