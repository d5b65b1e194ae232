//! Control Record - baseline measurements for a project

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ControlId, DimensionId, ProjectId};

/// A baseline measurement set. Owns exactly one [`ControlValue`] per
/// project dimension.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ControlRecord {
    id: ControlId,
    project_id: ProjectId,
    name: String,
    created_at: DateTime<Utc>,
}

impl ControlRecord {
    /// Create a control record.
    #[must_use]
    pub fn new(
        id: ControlId,
        project_id: ProjectId,
        name: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            project_id,
            name: name.into(),
            created_at,
        }
    }

    /// Get the control ID.
    #[must_use]
    pub const fn id(&self) -> ControlId {
        self.id
    }

    /// Get the owning project ID.
    #[must_use]
    pub const fn project_id(&self) -> ProjectId {
        self.project_id
    }

    /// Get the control name.
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

/// Header for a control that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewControl {
    /// Owning project
    pub project_id: ProjectId,
    /// Control name
    pub name: String,
}

/// A control's measured value for one dimension, with its competition rank
/// among all of the control's values.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ControlValue {
    dimension_id: DimensionId,
    value: f64,
    rank: usize,
}

impl ControlValue {
    /// Create a control value.
    #[must_use]
    pub const fn new(dimension_id: DimensionId, value: f64, rank: usize) -> Self {
        Self {
            dimension_id,
            value,
            rank,
        }
    }

    /// Get the dimension ID.
    #[must_use]
    pub const fn dimension_id(&self) -> DimensionId {
        self.dimension_id
    }

    /// Get the raw value.
    #[must_use]
    pub const fn value(&self) -> f64 {
        self.value
    }

    /// Get the 1-based competition rank.
    #[must_use]
    pub const fn rank(&self) -> usize {
        self.rank
    }
}
