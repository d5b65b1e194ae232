//! In-memory store implementation using `DashMap`.
//!
//! This is the reference collaborator - data is lost on process restart.
//! Each persisted header is stored in the same map entry as its rows, so a
//! write is visible either completely or not at all.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;
use dashmap::DashMap;
use rustc_hash::FxHashSet;

use super::Store;
use crate::record::{
    ControlId, ControlRecord, ControlValue, DifferentialRow, Dimension, NewControl, NewProject,
    NewSample, ProjectId, ProjectRecord, SampleId, SampleRecord,
};
use crate::signature::Metric;
use crate::topk::{top_k_by_key, SortOrder};
use crate::{Error, Result};

#[derive(Debug, Clone)]
struct StoredProject {
    header: ProjectRecord,
    dimensions: Vec<Dimension>,
}

#[derive(Debug, Clone)]
struct StoredControl {
    header: ControlRecord,
    values: Vec<ControlValue>,
}

#[derive(Debug, Clone)]
struct StoredSample {
    header: SampleRecord,
    rows: Vec<DifferentialRow>,
}

/// In-memory store using lock-free concurrent hashmaps.
///
/// Thread-safe and safe to share across search workers behind an `Arc`.
///
/// # Example
///
/// ```rust
/// use cwbench::record::NewProject;
/// use cwbench::store::{MemoryStore, Store};
///
/// # async fn example() -> cwbench::Result<()> {
/// let store = MemoryStore::new();
/// let id = store
///     .persist_project_atomic(NewProject { name: "p".into() }, vec!["A".into()])
///     .await?;
/// assert_eq!(store.fetch_project(id).await?.name(), "p");
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct MemoryStore {
    next_id: AtomicI64,
    projects: DashMap<ProjectId, StoredProject>,
    controls: DashMap<ControlId, StoredControl>,
    samples: DashMap<SampleId, StoredSample>,
}

impl MemoryStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: AtomicI64::new(1),
            projects: DashMap::new(),
            controls: DashMap::new(),
            samples: DashMap::new(),
        }
    }

    /// Number of persisted samples across all projects.
    #[must_use]
    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    /// Number of persisted controls across all projects.
    #[must_use]
    pub fn control_count(&self) -> usize {
        self.controls.len()
    }

    /// Check if the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.projects.is_empty() && self.controls.is_empty() && self.samples.is_empty()
    }

    fn allocate_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    fn project_dimension_ids(&self, project_id: ProjectId) -> Result<FxHashSet<i64>> {
        self.projects
            .get(&project_id)
            .map(|project| project.dimensions.iter().map(Dimension::id).collect())
            .ok_or_else(|| Error::NotFound(format!("project {project_id}")))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Store for MemoryStore {
    async fn fetch_project(&self, project_id: ProjectId) -> Result<ProjectRecord> {
        self.projects
            .get(&project_id)
            .map(|project| project.header.clone())
            .ok_or_else(|| Error::NotFound(format!("project {project_id}")))
    }

    async fn fetch_dimensions(&self, project_id: ProjectId) -> Result<Vec<Dimension>> {
        Ok(self
            .projects
            .get(&project_id)
            .map(|project| project.dimensions.clone())
            .unwrap_or_default())
    }

    async fn fetch_control(&self, control_id: ControlId) -> Result<ControlRecord> {
        self.controls
            .get(&control_id)
            .map(|control| control.header.clone())
            .ok_or_else(|| Error::NotFound(format!("control {control_id}")))
    }

    async fn fetch_controls(&self, project_id: ProjectId) -> Result<Vec<ControlRecord>> {
        let mut controls: Vec<ControlRecord> = self
            .controls
            .iter()
            .filter(|entry| entry.header.project_id() == project_id)
            .map(|entry| entry.header.clone())
            .collect();
        controls.sort_by_key(ControlRecord::id);
        Ok(controls)
    }

    async fn fetch_control_values(&self, control_id: ControlId) -> Result<Vec<ControlValue>> {
        Ok(self
            .controls
            .get(&control_id)
            .map(|control| control.values.clone())
            .unwrap_or_default())
    }

    async fn fetch_sample(&self, sample_id: SampleId) -> Result<SampleRecord> {
        self.samples
            .get(&sample_id)
            .map(|sample| sample.header.clone())
            .ok_or_else(|| Error::NotFound(format!("sample {sample_id}")))
    }

    async fn fetch_samples(&self, project_id: ProjectId) -> Result<Vec<SampleRecord>> {
        let mut samples: Vec<SampleRecord> = self
            .samples
            .iter()
            .filter(|entry| entry.header.project_id() == project_id)
            .map(|entry| entry.header.clone())
            .collect();
        samples.sort_by_key(SampleRecord::id);
        Ok(samples)
    }

    async fn fetch_differential_rows(
        &self,
        sample_id: SampleId,
        order_by: Metric,
        limit: Option<usize>,
    ) -> Result<Vec<DifferentialRow>> {
        let rows = self
            .samples
            .get(&sample_id)
            .map(|sample| sample.rows.clone())
            .unwrap_or_default();

        let k = limit.unwrap_or(rows.len());
        Ok(top_k_by_key(rows, k, SortOrder::Descending, |row| {
            (order_by.magnitude(row), std::cmp::Reverse(row.dimension_id()))
        }))
    }

    async fn persist_project_atomic(
        &self,
        header: NewProject,
        dimensions: Vec<String>,
    ) -> Result<ProjectId> {
        let mut names = FxHashSet::default();
        if let Some(duplicate) = dimensions.iter().find(|name| !names.insert(name.as_str())) {
            return Err(Error::DuplicatedDimension(duplicate.clone()));
        }

        let project_id = self.allocate_id();
        let dimensions = dimensions
            .into_iter()
            .map(|name| Dimension::new(self.allocate_id(), project_id, name))
            .collect();
        self.projects.insert(
            project_id,
            StoredProject {
                header: ProjectRecord::new(project_id, header.name, Utc::now()),
                dimensions,
            },
        );
        Ok(project_id)
    }

    async fn persist_control_atomic(
        &self,
        header: NewControl,
        values: Vec<ControlValue>,
    ) -> Result<ControlId> {
        let known = self.project_dimension_ids(header.project_id)?;
        if let Some(value) = values.iter().find(|v| !known.contains(&v.dimension_id())) {
            return Err(Error::StorageError(format!(
                "foreign key violation: dimension {} not in project {}",
                value.dimension_id(),
                header.project_id
            )));
        }

        let control_id = self.allocate_id();
        self.controls.insert(
            control_id,
            StoredControl {
                header: ControlRecord::new(control_id, header.project_id, header.name, Utc::now()),
                values,
            },
        );
        Ok(control_id)
    }

    async fn persist_sample_atomic(
        &self,
        header: NewSample,
        rows: Vec<DifferentialRow>,
    ) -> Result<SampleId> {
        let known = self.project_dimension_ids(header.project_id)?;
        let control_project = self
            .controls
            .get(&header.control_id)
            .map(|control| control.header.project_id())
            .ok_or_else(|| Error::NotFound(format!("control {}", header.control_id)))?;
        if control_project != header.project_id {
            return Err(Error::StorageError(format!(
                "foreign key violation: control {} not in project {}",
                header.control_id, header.project_id
            )));
        }
        if let Some(row) = rows.iter().find(|row| !known.contains(&row.dimension_id())) {
            return Err(Error::StorageError(format!(
                "foreign key violation: dimension {} not in project {}",
                row.dimension_id(),
                header.project_id
            )));
        }

        let sample_id = self.allocate_id();
        self.samples.insert(
            sample_id,
            StoredSample {
                header: SampleRecord::new(
                    sample_id,
                    header.project_id,
                    header.control_id,
                    header.name,
                    Utc::now(),
                ),
                rows,
            },
        );
        Ok(sample_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn project_with(store: &MemoryStore, names: &[&str]) -> (ProjectId, Vec<Dimension>) {
        let id = store
            .persist_project_atomic(
                NewProject { name: "p".into() },
                names.iter().map(|n| (*n).to_string()).collect(),
            )
            .await
            .unwrap();
        (id, store.fetch_dimensions(id).await.unwrap())
    }

    #[tokio::test]
    async fn test_project_dimensions() {
        let store = MemoryStore::new();
        let (id, dims) = project_with(&store, &["A", "B", "C"]).await;
        assert_eq!(dims.len(), 3);
        assert!(dims.iter().all(|d| d.project_id() == id));
    }

    #[tokio::test]
    async fn test_duplicate_dimension_persists_nothing() {
        let store = MemoryStore::new();
        let err = store
            .persist_project_atomic(NewProject { name: "p".into() }, vec!["A".into(), "A".into()])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::DuplicatedDimension(_)));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_missing_records() {
        let store = MemoryStore::new();
        assert!(matches!(store.fetch_project(1).await, Err(Error::NotFound(_))));
        assert!(matches!(store.fetch_control(1).await, Err(Error::NotFound(_))));
        assert!(matches!(store.fetch_sample(1).await, Err(Error::NotFound(_))));
        assert!(store.fetch_samples(1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_control_foreign_key() {
        let store = MemoryStore::new();
        let (id, dims) = project_with(&store, &["A"]).await;
        let bad = vec![ControlValue::new(dims[0].id() + 100, 1.0, 1)];
        let err = store
            .persist_control_atomic(NewControl { project_id: id, name: "c".into() }, bad)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::StorageError(_)));
        assert_eq!(store.control_count(), 0);
    }

    #[tokio::test]
    async fn test_sample_rows_rejected_atomically() {
        let store = MemoryStore::new();
        let (id, dims) = project_with(&store, &["A", "B"]).await;
        let control_id = store
            .persist_control_atomic(
                NewControl { project_id: id, name: "c".into() },
                vec![
                    ControlValue::new(dims[0].id(), 1.0, 1),
                    ControlValue::new(dims[1].id(), 2.0, 2),
                ],
            )
            .await
            .unwrap();

        let rows = vec![
            DifferentialRow::new(dims[0].id(), 1, 0, 1.0, 0.0),
            DifferentialRow::new(-5, 2, 0, 2.0, 0.0),
        ];
        let header = NewSample { project_id: id, control_id, name: "s".into() };
        assert!(store.persist_sample_atomic(header, rows).await.is_err());
        assert_eq!(store.sample_count(), 0);
        assert!(store.fetch_samples(id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_differential_rows_ordering_and_limit() {
        let store = MemoryStore::new();
        let (id, dims) = project_with(&store, &["A", "B", "C", "D"]).await;
        let control_id = store
            .persist_control_atomic(
                NewControl { project_id: id, name: "c".into() },
                dims.iter().map(|d| ControlValue::new(d.id(), 0.0, 1)).collect(),
            )
            .await
            .unwrap();
        let rows = vec![
            DifferentialRow::new(dims[0].id(), 1, 1, 0.0, -9.0),
            DifferentialRow::new(dims[1].id(), 1, -3, 0.0, 1.0),
            DifferentialRow::new(dims[2].id(), 1, 3, 0.0, 2.0),
            DifferentialRow::new(dims[3].id(), 1, 0, 0.0, 0.5),
        ];
        let sample_id = store
            .persist_sample_atomic(NewSample { project_id: id, control_id, name: "s".into() }, rows)
            .await
            .unwrap();

        let by_rank = store
            .fetch_differential_rows(sample_id, Metric::Rank, Some(2))
            .await
            .unwrap();
        let ids: Vec<_> = by_rank.iter().map(DifferentialRow::dimension_id).collect();
        // |3| ties: lower dimension id first
        assert_eq!(ids, vec![dims[1].id(), dims[2].id()]);

        let by_value = store
            .fetch_differential_rows(sample_id, Metric::Value, None)
            .await
            .unwrap();
        assert_eq!(by_value.len(), 4);
        assert_eq!(by_value[0].dimension_id(), dims[0].id());
        assert_eq!(by_value[3].dimension_id(), dims[3].id());
    }
}
