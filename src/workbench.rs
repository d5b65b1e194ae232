//! Workbench: the write and read paths over one store
//!
//! Write paths (project, control, sample creation) validate and derive
//! everything in memory, then hand one header plus all rows to the store in
//! a single atomic call. Read paths recompute signatures and searches live
//! from persisted differential rows.

use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::config::SearchConfig;
use crate::diff::{compute_differentials, rank_control, ControlLookup};
use crate::lookup::DimLookup;
use crate::record::{
    ControlId, ControlRecord, DimensionId, NewControl, NewProject, NewSample, ProjectId,
    SampleId, SampleRecord,
};
use crate::search::{SearchEngine, SearchParams, SearchResult};
use crate::signature::{extract_signature, Metric, Signature};
use crate::store::Store;
use crate::{Error, Result};

/// Summary of a project's contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectInfo {
    /// Number of dimensions
    pub dimensions: usize,
    /// Samples, ordered by name
    pub samples: Vec<SampleRecord>,
    /// Controls, ordered by name
    pub controls: Vec<ControlRecord>,
}

/// Entry point tying a [`Store`] to the ranking, diff, and search core.
#[derive(Debug)]
pub struct Workbench<S> {
    store: Arc<S>,
    engine: SearchEngine<S>,
    config: SearchConfig,
}

impl<S: Store + 'static> Workbench<S> {
    /// Create a workbench builder
    #[must_use]
    pub fn builder(store: S) -> WorkbenchBuilder<S> {
        WorkbenchBuilder::new(Arc::new(store))
    }

    /// The backing store.
    #[must_use]
    pub const fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Create a project with a fixed, ordered list of dimension names.
    ///
    /// # Errors
    ///
    /// * `InvalidInput` for no dimensions, or a name that is empty or
    ///   contains whitespace
    /// * `DuplicatedDimension` if a name repeats
    /// * storage errors
    #[instrument(skip(self, dimensions))]
    pub async fn create_project<I, D>(&self, name: &str, dimensions: I) -> Result<ProjectId>
    where
        I: IntoIterator<Item = D> + Send,
        D: Into<String>,
    {
        let dimensions: Vec<String> = dimensions.into_iter().map(Into::into).collect();
        crate::lookup::validate_dimension_names(&dimensions)?;
        let count = dimensions.len();
        let project_id = self
            .store
            .persist_project_atomic(NewProject { name: name.to_string() }, dimensions)
            .await?;
        info!(project_id, dimensions = count, "created project");
        Ok(project_id)
    }

    /// Dimension name lookup for a project.
    ///
    /// # Errors
    ///
    /// Storage errors.
    pub async fn dim_lookup(&self, project_id: ProjectId) -> Result<DimLookup> {
        let dimensions = self.store.fetch_dimensions(project_id).await?;
        Ok(DimLookup::new(&dimensions))
    }

    /// Record a control: validate against the project's dimensions, rank,
    /// persist.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown project; validation errors; storage errors.
    #[instrument(skip(self, values))]
    pub async fn create_control<I>(
        &self,
        project_id: ProjectId,
        name: &str,
        values: I,
    ) -> Result<ControlId>
    where
        I: IntoIterator<Item = (DimensionId, f64)> + Send,
    {
        self.store.fetch_project(project_id).await?;
        let dimensions = self.store.fetch_dimensions(project_id).await?;
        let ranked = rank_control(&dimensions, values)?;
        debug!(values = ranked.len(), "ranked control values");

        let control_id = self
            .store
            .persist_control_atomic(
                NewControl {
                    project_id,
                    name: name.to_string(),
                },
                ranked,
            )
            .await?;
        info!(control_id, "created control");
        Ok(control_id)
    }

    /// Record a sample against a control: validate, rank, diff, persist.
    ///
    /// # Errors
    ///
    /// * `NotFound` if the control doesn't exist or belongs to another project
    /// * `DimensionIdMissing` if the control doesn't cover every dimension
    /// * validation and storage errors
    #[instrument(skip(self, values))]
    pub async fn create_sample<I>(
        &self,
        project_id: ProjectId,
        control_id: ControlId,
        name: &str,
        values: I,
    ) -> Result<SampleId>
    where
        I: IntoIterator<Item = (DimensionId, f64)> + Send,
    {
        let control = self.store.fetch_control(control_id).await?;
        if control.project_id() != project_id {
            return Err(Error::NotFound(format!(
                "control {control_id} in project {project_id}"
            )));
        }

        let dimensions = self.store.fetch_dimensions(project_id).await?;
        let lookup = ControlLookup::new(self.store.fetch_control_values(control_id).await?);
        lookup.ensure_covers(control_id, &dimensions)?;

        let rows = compute_differentials(dimensions.len(), values, &lookup)?;
        let sample_id = self
            .store
            .persist_sample_atomic(
                NewSample {
                    project_id,
                    control_id,
                    name: name.to_string(),
                },
                rows,
            )
            .await?;
        info!(sample_id, "created sample");
        Ok(sample_id)
    }

    /// Record a control from a text submission.
    ///
    /// # Errors
    ///
    /// `MalformedData` for unparseable rows, plus everything
    /// [`Self::create_control`] returns.
    pub async fn create_control_from_text(
        &self,
        project_id: ProjectId,
        name: &str,
        text: &str,
    ) -> Result<ControlId> {
        let pairs = crate::lookup::parse_submission(text, &self.dim_lookup(project_id).await?)?;
        self.create_control(project_id, name, pairs).await
    }

    /// Record a sample from a text submission.
    ///
    /// # Errors
    ///
    /// `MalformedData` for unparseable rows, plus everything
    /// [`Self::create_sample`] returns.
    pub async fn create_sample_from_text(
        &self,
        project_id: ProjectId,
        control_id: ControlId,
        name: &str,
        text: &str,
    ) -> Result<SampleId> {
        let pairs = crate::lookup::parse_submission(text, &self.dim_lookup(project_id).await?)?;
        self.create_sample(project_id, control_id, name, pairs).await
    }

    /// Dimension count plus samples and controls ordered by name.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown project; storage errors.
    pub async fn project_info(&self, project_id: ProjectId) -> Result<ProjectInfo> {
        self.store.fetch_project(project_id).await?;
        let dimensions = self.store.fetch_dimensions(project_id).await?.len();

        let mut samples = self.store.fetch_samples(project_id).await?;
        samples.sort_by(|a, b| a.name().cmp(b.name()).then_with(|| a.id().cmp(&b.id())));
        let mut controls = self.store.fetch_controls(project_id).await?;
        controls.sort_by(|a, b| a.name().cmp(b.name()).then_with(|| a.id().cmp(&b.id())));

        Ok(ProjectInfo {
            dimensions,
            samples,
            controls,
        })
    }

    /// Find a control by name within a project.
    ///
    /// # Errors
    ///
    /// `NotFound` if no control has that name.
    pub async fn control_by_name(&self, project_id: ProjectId, name: &str) -> Result<ControlRecord> {
        self.store
            .fetch_controls(project_id)
            .await?
            .into_iter()
            .find(|control| control.name() == name)
            .ok_or_else(|| Error::NotFound(format!("control {name:?} in project {project_id}")))
    }

    /// Top-`k` signature of one sample.
    ///
    /// # Errors
    ///
    /// Storage errors.
    pub async fn signature(&self, sample_id: SampleId, k: usize, metric: Metric) -> Result<Signature> {
        extract_signature(&*self.store, sample_id, k, metric).await
    }

    /// Score every sample of a project against `query`.
    ///
    /// # Errors
    ///
    /// See [`SearchEngine::search`].
    #[instrument(skip(self, query), fields(up = query.up().len(), down = query.down().len()))]
    pub async fn search(
        &self,
        project_id: ProjectId,
        query: &Signature,
        params: SearchParams,
    ) -> Result<Vec<SearchResult>> {
        self.engine.search(project_id, query, params).await
    }

    /// Search with a query given as whitespace separated dimension names.
    ///
    /// # Errors
    ///
    /// * `NotFound` for an unknown project
    /// * query errors from [`crate::lookup::parse_query`]
    /// * see [`SearchEngine::search`]
    pub async fn search_by_names(
        &self,
        project_id: ProjectId,
        up: &str,
        down: &str,
        params: SearchParams,
    ) -> Result<Vec<SearchResult>> {
        self.store.fetch_project(project_id).await?;
        let query = crate::lookup::parse_query(up, down, &self.dim_lookup(project_id).await?)?;
        self.search(project_id, &query, params).await
    }

    /// Search with the configured `k`, metric, and scoring policy.
    ///
    /// # Errors
    ///
    /// See [`SearchEngine::search`].
    pub async fn search_default(
        &self,
        project_id: ProjectId,
        query: &Signature,
    ) -> Result<Vec<SearchResult>> {
        self.search(project_id, query, self.config.params(self.config.k))
            .await
    }

    /// Samples of the same project ranked by similarity to `sample_id`'s own
    /// signature. The sample itself is included and normally ranks first.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown sample; see [`SearchEngine::search`].
    pub async fn similar(
        &self,
        sample_id: SampleId,
        params: SearchParams,
    ) -> Result<Vec<SearchResult>> {
        let sample = self.store.fetch_sample(sample_id).await?;
        let query = self.signature(sample_id, params.k, params.metric).await?;
        self.search(sample.project_id(), &query, params).await
    }
}

/// Workbench builder
#[derive(Debug)]
pub struct WorkbenchBuilder<S> {
    store: Arc<S>,
    config: SearchConfig,
}

impl<S: Store + 'static> WorkbenchBuilder<S> {
    fn new(store: Arc<S>) -> Self {
        Self {
            store,
            config: SearchConfig::default(),
        }
    }

    /// Replace the whole search configuration
    #[must_use]
    pub const fn config(mut self, config: SearchConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the number of search workers
    #[must_use]
    pub const fn parallelism(mut self, parallelism: usize) -> Self {
        self.config.parallelism = parallelism;
        self
    }

    /// Set the default signature width
    #[must_use]
    pub const fn k(mut self, k: usize) -> Self {
        self.config.k = k;
        self
    }

    /// Build the workbench
    ///
    /// # Errors
    ///
    /// Returns error if the configuration is invalid
    pub fn build(self) -> Result<Workbench<S>> {
        self.config.validate()?;
        let engine = SearchEngine::new(Arc::clone(&self.store), self.config.parallelism)?;
        Ok(Workbench {
            store: self.store,
            engine,
            config: self.config,
        })
    }
}
