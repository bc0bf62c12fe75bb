//! Project and locus-list lookup, behind traits so the web layer and the
//! sharing migration do not care what backs them.

use async_trait::async_trait;
use dashmap::DashMap;
use portal_core::error::Fault;

use crate::models::{LocusList, Project};

#[async_trait]
pub trait ProjectStore: Send + Sync {
    async fn get(&self, guid: &str) -> Result<Project, Fault>;
    async fn all(&self) -> Result<Vec<Project>, Fault>;

    /// Projects whose view group is in the given set.
    async fn by_view_groups(&self, groups: &[String]) -> Result<Vec<Project>, Fault>;
}

#[async_trait]
pub trait LocusListStore: Send + Sync {
    async fn get(&self, guid: &str) -> Result<LocusList, Fault>;
    async fn all(&self) -> Result<Vec<LocusList>, Fault>;
    async fn set_projects(&self, guid: &str, project_guids: Vec<String>) -> Result<(), Fault>;
}

#[derive(Debug, Default)]
pub struct InMemoryProjectStore {
    projects: DashMap<String, Project>,
}

impl InMemoryProjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, project: Project) {
        self.projects.insert(project.guid.clone(), project);
    }
}

#[async_trait]
impl ProjectStore for InMemoryProjectStore {
    async fn get(&self, guid: &str) -> Result<Project, Fault> {
        self.projects
            .get(guid)
            .map(|p| p.clone())
            .ok_or_else(|| Fault::NotFound("Project not found".to_string()))
    }

    async fn all(&self) -> Result<Vec<Project>, Fault> {
        let mut projects: Vec<Project> = self.projects.iter().map(|p| p.clone()).collect();
        projects.sort_by(|a, b| a.guid.cmp(&b.guid));
        Ok(projects)
    }

    async fn by_view_groups(&self, groups: &[String]) -> Result<Vec<Project>, Fault> {
        let mut projects: Vec<Project> = self
            .projects
            .iter()
            .filter(|p| groups.contains(&p.can_view_group))
            .map(|p| p.clone())
            .collect();
        projects.sort_by(|a, b| a.guid.cmp(&b.guid));
        Ok(projects)
    }
}

#[derive(Debug, Default)]
pub struct InMemoryLocusListStore {
    lists: DashMap<String, LocusList>,
}

impl InMemoryLocusListStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, list: LocusList) {
        self.lists.insert(list.guid.clone(), list);
    }
}

#[async_trait]
impl LocusListStore for InMemoryLocusListStore {
    async fn get(&self, guid: &str) -> Result<LocusList, Fault> {
        self.lists
            .get(guid)
            .map(|l| l.clone())
            .ok_or_else(|| Fault::NotFound("Locus list not found".to_string()))
    }

    async fn all(&self) -> Result<Vec<LocusList>, Fault> {
        let mut lists: Vec<LocusList> = self.lists.iter().map(|l| l.clone()).collect();
        lists.sort_by(|a, b| a.guid.cmp(&b.guid));
        Ok(lists)
    }

    async fn set_projects(&self, guid: &str, mut project_guids: Vec<String>) -> Result<(), Fault> {
        let mut entry = self
            .lists
            .get_mut(guid)
            .ok_or_else(|| Fault::NotFound("Locus list not found".to_string()))?;
        project_guids.sort();
        project_guids.dedup();
        entry.projects = project_guids;
        Ok(())
    }
}
