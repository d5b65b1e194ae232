//! Storage collaborator
//!
//! The ranking/diff/search core only talks to storage through [`Store`].
//! Reads are plain fetches; every write persists a header together with all
//! of its rows as one all-or-nothing unit.
//!
//! # Example
//!
//! ```rust,no_run
//! use cwbench::record::NewProject;
//! use cwbench::store::{MemoryStore, Store};
//!
//! # async fn example() -> cwbench::Result<()> {
//! let store = MemoryStore::new();
//!
//! let project_id = store
//!     .persist_project_atomic(NewProject { name: "screen".into() }, vec!["A".into(), "B".into()])
//!     .await?;
//! assert_eq!(store.fetch_dimensions(project_id).await?.len(), 2);
//! # Ok(())
//! # }
//! ```

mod memory;

pub use memory::MemoryStore;

use crate::record::{
    ControlId, ControlRecord, ControlValue, DifferentialRow, Dimension, NewControl, NewProject,
    NewSample, ProjectId, ProjectRecord, SampleId, SampleRecord,
};
use crate::signature::Metric;
use crate::Result;
use std::future::Future;

/// Storage collaborator trait.
///
/// Implementations own ids, timestamps, and transactions. They perform no
/// retries of their own beyond what the backing database does; errors are
/// propagated to the caller unchanged.
pub trait Store: Send + Sync {
    /// Fetch a project header.
    ///
    /// Returns `NotFound` if the project doesn't exist.
    fn fetch_project(&self, project_id: ProjectId)
        -> impl Future<Output = Result<ProjectRecord>> + Send;

    /// Fetch every dimension of a project.
    fn fetch_dimensions(
        &self,
        project_id: ProjectId,
    ) -> impl Future<Output = Result<Vec<Dimension>>> + Send;

    /// Fetch a control header.
    fn fetch_control(&self, control_id: ControlId)
        -> impl Future<Output = Result<ControlRecord>> + Send;

    /// Fetch every control header of a project.
    fn fetch_controls(
        &self,
        project_id: ProjectId,
    ) -> impl Future<Output = Result<Vec<ControlRecord>>> + Send;

    /// Fetch a control's ranked values, one per dimension.
    fn fetch_control_values(
        &self,
        control_id: ControlId,
    ) -> impl Future<Output = Result<Vec<ControlValue>>> + Send;

    /// Fetch a sample header.
    fn fetch_sample(&self, sample_id: SampleId)
        -> impl Future<Output = Result<SampleRecord>> + Send;

    /// Fetch every sample header of a project.
    fn fetch_samples(
        &self,
        project_id: ProjectId,
    ) -> impl Future<Output = Result<Vec<SampleRecord>>> + Send;

    /// Fetch a sample's differential rows ordered by `order_by` magnitude,
    /// largest first, truncated to `limit` rows when given.
    ///
    /// Rows with equal magnitude are ordered by dimension id ascending.
    fn fetch_differential_rows(
        &self,
        sample_id: SampleId,
        order_by: Metric,
        limit: Option<usize>,
    ) -> impl Future<Output = Result<Vec<DifferentialRow>>> + Send;

    /// Persist a project and its dimensions in one transaction.
    fn persist_project_atomic(
        &self,
        header: NewProject,
        dimensions: Vec<String>,
    ) -> impl Future<Output = Result<ProjectId>> + Send;

    /// Persist a control and its ranked values in one transaction.
    fn persist_control_atomic(
        &self,
        header: NewControl,
        values: Vec<ControlValue>,
    ) -> impl Future<Output = Result<ControlId>> + Send;

    /// Persist a sample and its differential rows in one transaction.
    fn persist_sample_atomic(
        &self,
        header: NewSample,
        rows: Vec<DifferentialRow>,
    ) -> impl Future<Output = Result<SampleId>> + Send;
}
