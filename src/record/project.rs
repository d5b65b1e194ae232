//! Project Record - owner of a fixed dimension set

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{DimensionId, ProjectId};

/// A project: the namespace that owns dimensions, controls, and samples.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProjectRecord {
    id: ProjectId,
    name: String,
    created_at: DateTime<Utc>,
}

impl ProjectRecord {
    /// Create a project record.
    #[must_use]
    pub fn new(id: ProjectId, name: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            name: name.into(),
            created_at,
        }
    }

    /// Get the project ID.
    #[must_use]
    pub const fn id(&self) -> ProjectId {
        self.id
    }

    /// Get the project name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Header for a project that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProject {
    /// Project name
    pub name: String,
}

/// One named coordinate of a project's measurement space.
///
/// Unique per `(project_id, name)` and immutable once the project exists.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Dimension {
    id: DimensionId,
    project_id: ProjectId,
    name: String,
}

impl Dimension {
    /// Create a dimension record.
    #[must_use]
    pub fn new(id: DimensionId, project_id: ProjectId, name: impl Into<String>) -> Self {
        Self {
            id,
            project_id,
            name: name.into(),
        }
    }

    /// Get the dimension ID.
    #[must_use]
    pub const fn id(&self) -> DimensionId {
        self.id
    }

    /// Get the owning project ID.
    #[must_use]
    pub const fn project_id(&self) -> ProjectId {
        self.project_id
    }

    /// Get the dimension name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}
