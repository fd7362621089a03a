//! Project directory registry
//!
//! The host application owns the mapping from job identifiers to project
//! root directories. The monitor only reads it.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors reported by a registry implementation
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Project registry unavailable: {0}")]
    Unavailable(String),
}

/// A job and the directory holding its files
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRoot {
    /// External job identifier
    pub job: String,
    /// Root directory of the project
    pub directory: PathBuf,
    /// Due date, used only for ordering project lists
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
}

impl ProjectRoot {
    /// Create a project root without a due date
    #[must_use]
    pub fn new(job: impl Into<String>, directory: impl Into<PathBuf>) -> Self {
        Self {
            job: job.into(),
            directory: directory.into(),
            due_date: None,
        }
    }

    /// Set the due date
    #[must_use]
    pub fn with_due_date(mut self, due_date: NaiveDate) -> Self {
        self.due_date = Some(due_date);
        self
    }
}

/// Source of job to root directory mappings
pub trait ProjectRegistry: Send + Sync {
    /// Every known project
    ///
    /// # Errors
    /// Returns an error if the backing source cannot be read.
    fn projects(&self) -> Result<Vec<ProjectRoot>, RegistryError>;

    /// The project registered for `job`, if any
    ///
    /// # Errors
    /// Returns an error if the backing source cannot be read.
    fn lookup(&self, job: &str) -> Result<Option<ProjectRoot>, RegistryError> {
        Ok(self.projects()?.into_iter().find(|p| p.job == job))
    }
}

/// In-memory registry, typically built from the config file
#[derive(Debug, Clone, Default)]
pub struct StaticRegistry {
    projects: BTreeMap<String, ProjectRoot>,
}

impl StaticRegistry {
    /// Build a registry; a later entry for the same job replaces an earlier one
    #[must_use]
    pub fn new(projects: impl IntoIterator<Item = ProjectRoot>) -> Self {
        Self {
            projects: projects
                .into_iter()
                .map(|p| (p.job.clone(), p))
                .collect(),
        }
    }

    /// Add or replace a project
    #[must_use]
    pub fn with_project(mut self, project: ProjectRoot) -> Self {
        self.projects.insert(project.job.clone(), project);
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.projects.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }
}

impl ProjectRegistry for StaticRegistry {
    fn projects(&self) -> Result<Vec<ProjectRoot>, RegistryError> {
        Ok(self.projects.values().cloned().collect())
    }

    fn lookup(&self, job: &str) -> Result<Option<ProjectRoot>, RegistryError> {
        Ok(self.projects.get(job).cloned())
    }
}
