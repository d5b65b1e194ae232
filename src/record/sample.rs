//! Sample Record - an observation differentiated against a control

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ControlId, DimensionId, ProjectId, SampleId};

/// A sample submitted against a control. Owns exactly one
/// [`DifferentialRow`] per project dimension.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SampleRecord {
    id: SampleId,
    project_id: ProjectId,
    control_id: ControlId,
    name: String,
    created_at: DateTime<Utc>,
}

impl SampleRecord {
    /// Create a sample record.
    #[must_use]
    pub fn new(
        id: SampleId,
        project_id: ProjectId,
        control_id: ControlId,
        name: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            project_id,
            control_id,
            name: name.into(),
            created_at,
        }
    }

    /// Get the sample ID.
    #[must_use]
    pub const fn id(&self) -> SampleId {
        self.id
    }

    /// Get the owning project ID.
    #[must_use]
    pub const fn project_id(&self) -> ProjectId {
        self.project_id
    }

    /// Get the baseline control ID.
    #[must_use]
    pub const fn control_id(&self) -> ControlId {
        self.control_id
    }

    /// Get the sample name.
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

/// Header for a sample that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSample {
    /// Owning project
    pub project_id: ProjectId,
    /// Baseline control
    pub control_id: ControlId,
    /// Sample name
    pub name: String,
}

/// Per-dimension differential between a sample and its control.
///
/// The absolute values are stored alongside the signed diffs so storage can
/// order rows by magnitude without recomputing them.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct DifferentialRow {
    dimension_id: DimensionId,
    rank: usize,
    rank_diff: i64,
    abs_rank_diff: u64,
    value: f64,
    value_diff: f64,
    abs_value_diff: f64,
}

impl DifferentialRow {
    /// Create a row from the sample's rank/value and the signed diffs.
    /// Magnitudes are derived.
    #[must_use]
    pub fn new(
        dimension_id: DimensionId,
        rank: usize,
        rank_diff: i64,
        value: f64,
        value_diff: f64,
    ) -> Self {
        Self {
            dimension_id,
            rank,
            rank_diff,
            abs_rank_diff: rank_diff.unsigned_abs(),
            value,
            value_diff,
            abs_value_diff: value_diff.abs(),
        }
    }

    /// Get the dimension ID.
    #[must_use]
    pub const fn dimension_id(&self) -> DimensionId {
        self.dimension_id
    }

    /// Get the sample's own competition rank for this dimension.
    #[must_use]
    pub const fn rank(&self) -> usize {
        self.rank
    }

    /// `sample_rank - control_rank`
    #[must_use]
    pub const fn rank_diff(&self) -> i64 {
        self.rank_diff
    }

    /// `|rank_diff|`
    #[must_use]
    pub const fn abs_rank_diff(&self) -> u64 {
        self.abs_rank_diff
    }

    /// Get the sample's raw value.
    #[must_use]
    pub const fn value(&self) -> f64 {
        self.value
    }

    /// `sample_value - control_value`
    #[must_use]
    pub const fn value_diff(&self) -> f64 {
        self.value_diff
    }

    /// `|value_diff|`
    #[must_use]
    pub const fn abs_value_diff(&self) -> f64 {
        self.abs_value_diff
    }
}
