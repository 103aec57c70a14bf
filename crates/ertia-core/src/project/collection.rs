//! Ordered collection of projects, persisted as a JSON array.

use std::collections::HashSet;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use super::Project;
use crate::error::{CoreError, Result};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Projects(Vec<Project>);

impl Projects {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a pool document. `null` reads as an empty pool.
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        // `null` is what an empty collection looked like on disk before.
        let projects: Option<Vec<Project>> =
            serde_json::from_str(json).context("Failed to parse projects document")?;
        Ok(Self(projects.unwrap_or_default()))
    }

    /// Pretty-printed JSON array in collection order.
    pub fn to_json(&self) -> anyhow::Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize projects")
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Projects in collection order, which is also reservation order.
    pub fn iter(&self) -> std::slice::Iter<'_, Project> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[Project] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<Project> {
        self.0
    }

    /// Project with the given id.
    pub fn get(&self, id: &str) -> Option<&Project> {
        self.0.iter().find(|p| p.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Project> {
        self.0.iter_mut().find(|p| p.id == id)
    }

    /// First project with the given name.
    pub fn find_by_name(&self, name: &str) -> Option<&Project> {
        self.0.iter().find(|p| p.name == name)
    }

    /// Append a project whose id is not yet in the collection.
    pub fn insert(&mut self, project: Project) -> Result<()> {
        if self.get(&project.id).is_some() {
            return Err(CoreError::InvalidDocument(format!(
                "duplicate project id '{}'",
                project.id
            )));
        }
        self.0.push(project);
        Ok(())
    }

    /// Replace the project with the same id, or append it.
    pub fn upsert(&mut self, project: Project) {
        match self.get_mut(&project.id) {
            Some(existing) => *existing = project,
            None => self.0.push(project),
        }
    }

    /// Remove a project by id, keeping the order of the rest.
    pub fn remove(&mut self, id: &str) -> Result<Project> {
        let index = self
            .0
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| CoreError::ProjectNotFound { id: id.to_string() })?;
        Ok(self.0.remove(index))
    }

    /// Projects carrying `tag`.
    pub fn tagged<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Project> + 'a {
        self.0.iter().filter(move |p| p.has_tag(tag))
    }

    /// Unique project ids plus every project's own invariants.
    pub fn validate(&self) -> Result<()> {
        self.validate_ids()?;
        self.iter().try_for_each(Project::validate)
    }

    /// Unique project ids only. Projects are addressed by id, so a collection
    /// with duplicates cannot be updated safely.
    pub fn validate_ids(&self) -> Result<()> {
        let mut ids = HashSet::new();
        for project in &self.0 {
            if !ids.insert(project.id.as_str()) {
                return Err(CoreError::InvalidDocument(format!(
                    "duplicate project id '{}'",
                    project.id
                )));
            }
        }
        Ok(())
    }

    /// Projects that break their own invariants, paired with the reason.
    pub fn invalid(&self) -> Vec<(&Project, CoreError)> {
        self.0
            .iter()
            .filter_map(|p| p.validate().err().map(|e| (p, e)))
            .collect()
    }

    pub(crate) fn projects_mut(&mut self) -> &mut Vec<Project> {
        &mut self.0
    }
}

impl From<Vec<Project>> for Projects {
    fn from(projects: Vec<Project>) -> Self {
        Self(projects)
    }
}

impl FromIterator<Project> for Projects {
    fn from_iter<T: IntoIterator<Item = Project>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Projects {
    type Item = &'a Project;
    type IntoIter = std::slice::Iter<'a, Project>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl IntoIterator for Projects {
    type Item = Project;
    type IntoIter = std::vec::IntoIter<Project>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
