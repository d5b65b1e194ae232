//! Persisted record types
//!
//! ## Schema Overview
//!
//! ```text
//! ProjectRecord (1) ──< Dimension (N)
//!        │
//!        ├──< ControlRecord (N) ──< ControlValue (one per Dimension)
//!        │           │
//!        └──< SampleRecord (N) ──< DifferentialRow (one per Dimension)
//! ```
//!
//! Every record is created once through an atomic multi-row write and is
//! read-only afterwards.

mod control;
mod project;
mod sample;

pub use control::{ControlRecord, ControlValue, NewControl};
pub use project::{Dimension, NewProject, ProjectRecord};
pub use sample::{DifferentialRow, NewSample, SampleRecord};

/// Project identifier.
pub type ProjectId = i64;
/// Dimension identifier, unique across projects.
pub type DimensionId = i64;
/// Control identifier.
pub type ControlId = i64;
/// Sample identifier.
pub type SampleId = i64;
