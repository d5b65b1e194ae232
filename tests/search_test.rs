//! Search engine tests: completeness under concurrency, failure aggregation,
//! and repeatability

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use cwbench::record::{
    ControlId, ControlRecord, ControlValue, DifferentialRow, Dimension, NewControl, NewProject,
    NewSample, ProjectId, ProjectRecord, SampleId, SampleRecord,
};
use cwbench::search::{ScoringPolicy, SearchEngine, SearchParams};
use cwbench::signature::{Metric, Signature};
use cwbench::store::{MemoryStore, Store};
use cwbench::{Error, Result, Workbench};
use rustc_hash::FxHashSet;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Delegates to `MemoryStore` but fails differential reads for chosen samples.
struct FailingStore {
    inner: MemoryStore,
    failing: FxHashSet<SampleId>,
    row_reads: AtomicUsize,
}

impl FailingStore {
    fn new(inner: MemoryStore, failing: impl IntoIterator<Item = SampleId>) -> Self {
        Self {
            inner,
            failing: failing.into_iter().collect(),
            row_reads: AtomicUsize::new(0),
        }
    }
}

impl Store for FailingStore {
    async fn fetch_project(&self, project_id: ProjectId) -> Result<ProjectRecord> {
        self.inner.fetch_project(project_id).await
    }

    async fn fetch_dimensions(&self, project_id: ProjectId) -> Result<Vec<Dimension>> {
        self.inner.fetch_dimensions(project_id).await
    }

    async fn fetch_control(&self, control_id: ControlId) -> Result<ControlRecord> {
        self.inner.fetch_control(control_id).await
    }

    async fn fetch_controls(&self, project_id: ProjectId) -> Result<Vec<ControlRecord>> {
        self.inner.fetch_controls(project_id).await
    }

    async fn fetch_control_values(&self, control_id: ControlId) -> Result<Vec<ControlValue>> {
        self.inner.fetch_control_values(control_id).await
    }

    async fn fetch_sample(&self, sample_id: SampleId) -> Result<SampleRecord> {
        self.inner.fetch_sample(sample_id).await
    }

    async fn fetch_samples(&self, project_id: ProjectId) -> Result<Vec<SampleRecord>> {
        self.inner.fetch_samples(project_id).await
    }

    async fn fetch_differential_rows(
        &self,
        sample_id: SampleId,
        order_by: Metric,
        limit: Option<usize>,
    ) -> Result<Vec<DifferentialRow>> {
        self.row_reads.fetch_add(1, Ordering::SeqCst);
        if self.failing.contains(&sample_id) {
            return Err(Error::StorageError(format!("read failed for sample {sample_id}")));
        }
        self.inner
            .fetch_differential_rows(sample_id, order_by, limit)
            .await
    }

    async fn persist_project_atomic(
        &self,
        header: NewProject,
        dimensions: Vec<String>,
    ) -> Result<ProjectId> {
        self.inner.persist_project_atomic(header, dimensions).await
    }

    async fn persist_control_atomic(
        &self,
        header: NewControl,
        values: Vec<ControlValue>,
    ) -> Result<ControlId> {
        self.inner.persist_control_atomic(header, values).await
    }

    async fn persist_sample_atomic(
        &self,
        header: NewSample,
        rows: Vec<DifferentialRow>,
    ) -> Result<SampleId> {
        self.inner.persist_sample_atomic(header, rows).await
    }
}

fn params(k: usize) -> SearchParams {
    SearchParams {
        k,
        metric: Metric::Rank,
        scoring: ScoringPolicy::Symmetric,
    }
}

#[tokio::test]
async fn test_search_returns_every_sample_once() {
    init_tracing();
    let bench = Workbench::builder(MemoryStore::new()).parallelism(3).build().unwrap();
    let project = bench.create_project("p", ["x", "y", "z"]).await.unwrap();
    let lookup = bench.dim_lookup(project).await.unwrap();
    let (x, y, z) = (lookup.id("x").unwrap(), lookup.id("y").unwrap(), lookup.id("z").unwrap());
    let control = bench.create_control(project, "c", [(x, 1.0), (y, 2.0), (z, 3.0)]).await.unwrap();

    let mut expected = Vec::new();
    for i in 0..25_i32 {
        let v = f64::from(i);
        let id = bench
            .create_sample(project, control, &format!("s{i}"), [(x, v), (y, 10.0 - v), (z, 5.0)])
            .await
            .unwrap();
        expected.push(id);
    }

    let query = Signature::new([x], [z]);
    let results = bench.search(project, &query, params(3)).await.unwrap();
    assert_eq!(results.len(), expected.len());

    let mut seen: Vec<SampleId> = results.iter().map(|r| r.sample.id()).collect();
    seen.sort_unstable();
    assert_eq!(seen, expected);

    for pair in results.windows(2) {
        assert!(pair[0].score >= pair[1].score);
        if pair[0].score == pair[1].score {
            assert!(pair[0].sample.id() < pair[1].sample.id());
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_search_identical_across_pool_sizes() {
    init_tracing();
    let bench = Workbench::builder(MemoryStore::new()).parallelism(1).build().unwrap();
    let project = bench.create_project("p", ["a", "b", "c", "d", "e"]).await.unwrap();
    let ids: Vec<i64> = bench
        .store()
        .fetch_dimensions(project)
        .await
        .unwrap()
        .iter()
        .map(Dimension::id)
        .collect();
    let control = bench
        .create_control(project, "c", ids.iter().zip([1.0, 2.0, 3.0, 4.0, 5.0]).map(|(id, v)| (*id, v)).collect::<Vec<_>>())
        .await
        .unwrap();
    for s in 0..40_u32 {
        let values: Vec<(i64, f64)> = ids
            .iter()
            .enumerate()
            .map(|(i, id)| (*id, f64::from((s + 3 * u32::try_from(i).unwrap()) % 5)))
            .collect();
        bench.create_sample(project, control, &format!("s{s}"), values).await.unwrap();
    }

    let query = Signature::new([ids[0], ids[1]], [ids[4]]);
    let store = Arc::clone(bench.store());
    let baseline = SearchEngine::new(Arc::clone(&store), 1)
        .unwrap()
        .search(project, &query, params(2))
        .await
        .unwrap();
    assert_eq!(baseline.len(), 40);

    for parallelism in [2, 3, 8, 64] {
        let engine = SearchEngine::new(Arc::clone(&store), parallelism).unwrap();
        let results = engine.search(project, &query, params(2)).await.unwrap();
        assert_eq!(results, baseline, "parallelism {parallelism} diverged");
    }

    // Repeatable against unchanged data
    let again = bench.search(project, &query, params(2)).await.unwrap();
    assert_eq!(again, baseline);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_search_fails_after_full_drain() {
    init_tracing();
    let inner = MemoryStore::new();
    let project = inner
        .persist_project_atomic(NewProject { name: "p".into() }, vec!["a".into(), "b".into()])
        .await
        .unwrap();
    let dims = inner.fetch_dimensions(project).await.unwrap();
    let control = inner
        .persist_control_atomic(
            NewControl { project_id: project, name: "c".into() },
            vec![
                ControlValue::new(dims[0].id(), 1.0, 1),
                ControlValue::new(dims[1].id(), 2.0, 2),
            ],
        )
        .await
        .unwrap();
    let mut ids = Vec::new();
    for i in 0..10_i64 {
        let rows = vec![
            DifferentialRow::new(dims[0].id(), 1, i % 2, 0.0, 0.0),
            DifferentialRow::new(dims[1].id(), 2, -(i % 3), 0.0, 0.0),
        ];
        ids.push(
            inner
                .persist_sample_atomic(NewSample { project_id: project, control_id: control, name: format!("s{i}") }, rows)
                .await
                .unwrap(),
        );
    }
    let store = Arc::new(FailingStore::new(inner, [ids[2], ids[7]]));
    let engine = SearchEngine::new(Arc::clone(&store), 3).unwrap();
    let err = engine
        .search(project, &Signature::new([dims[0].id()], []), params(2))
        .await
        .unwrap_err();

    match err {
        Error::SearchFailed { failed, total, first } => {
            assert_eq!(failed, 2);
            assert_eq!(total, 10);
            assert!(matches!(*first, Error::StorageError(_)));
        }
        other => panic!("expected SearchFailed, got {other:?}"),
    }
    // Every candidate was still attempted
    assert_eq!(store.row_reads.load(Ordering::SeqCst), 10);
}

#[tokio::test]
async fn test_search_propagates_sample_listing_error() {
    struct NoSamples(MemoryStore);

    impl Store for NoSamples {
        async fn fetch_project(&self, id: ProjectId) -> Result<ProjectRecord> {
            self.0.fetch_project(id).await
        }
        async fn fetch_dimensions(&self, id: ProjectId) -> Result<Vec<Dimension>> {
            self.0.fetch_dimensions(id).await
        }
        async fn fetch_control(&self, id: ControlId) -> Result<ControlRecord> {
            self.0.fetch_control(id).await
        }
        async fn fetch_controls(&self, id: ProjectId) -> Result<Vec<ControlRecord>> {
            self.0.fetch_controls(id).await
        }
        async fn fetch_control_values(&self, id: ControlId) -> Result<Vec<ControlValue>> {
            self.0.fetch_control_values(id).await
        }
        async fn fetch_sample(&self, id: SampleId) -> Result<SampleRecord> {
            self.0.fetch_sample(id).await
        }
        async fn fetch_samples(&self, _id: ProjectId) -> Result<Vec<SampleRecord>> {
            Err(Error::StorageError("connection refused".into()))
        }
        async fn fetch_differential_rows(
            &self,
            id: SampleId,
            order_by: Metric,
            limit: Option<usize>,
        ) -> Result<Vec<DifferentialRow>> {
            self.0.fetch_differential_rows(id, order_by, limit).await
        }
        async fn persist_project_atomic(&self, h: NewProject, d: Vec<String>) -> Result<ProjectId> {
            self.0.persist_project_atomic(h, d).await
        }
        async fn persist_control_atomic(&self, h: NewControl, v: Vec<ControlValue>) -> Result<ControlId> {
            self.0.persist_control_atomic(h, v).await
        }
        async fn persist_sample_atomic(&self, h: NewSample, r: Vec<DifferentialRow>) -> Result<SampleId> {
            self.0.persist_sample_atomic(h, r).await
        }
    }

    let engine = SearchEngine::new(Arc::new(NoSamples(MemoryStore::new())), 2).unwrap();
    let err = engine.search(1, &Signature::default(), params(5)).await.unwrap_err();
    assert!(matches!(err, Error::StorageError(_)));
}
