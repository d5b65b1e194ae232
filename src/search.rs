//! Signature similarity search
//!
//! Every sample of a project is scored against a query signature by
//! re-deriving the sample's own top-K signature and intersecting it with the
//! query.
//!
//! ## Scheduling
//!
//! ```text
//!                 ┌──────────┐
//!  fetch_samples ─┤  queue   ├──┬─> worker 1 ─┐
//!   (producer)    │ (closed) │  ├─> worker 2 ─┼─> Mutex<Accumulator> ─> sort
//!                 └──────────┘  └─> worker P ─┘
//! ```
//!
//! The queue is filled and closed before any worker starts. Workers drain it
//! independently and the caller joins all of them before sorting, so the
//! result always covers every candidate. The accumulator lock is only taken
//! to append one finished score, never across a storage read.
//!
//! A failed candidate does not stop the other workers; once the queue is
//! drained, any failure fails the whole search and no partial list is
//! returned.

use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, trace, warn};

use crate::record::{ProjectId, SampleRecord};
use crate::signature::{extract_signature, Metric, Signature};
use crate::store::Store;
use crate::{Error, Result};

/// How a candidate signature is scored against the query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScoringPolicy {
    /// +1 per dimension regulated the same way as the query, -1 per
    /// dimension regulated the opposite way.
    #[default]
    Symmetric,
    /// +1 per dimension regulated the same way as the query; mismatches are
    /// ignored. This is the older policy.
    MatchOnly,
}

impl ScoringPolicy {
    /// Score a candidate signature against a query signature.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use cwbench::search::ScoringPolicy;
    /// use cwbench::signature::Signature;
    ///
    /// let query = Signature::new([1, 2], [3]);
    /// let candidate = Signature::new([1, 3], [2]);
    /// assert_eq!(ScoringPolicy::Symmetric.score(&query, &candidate), -1);
    /// assert_eq!(ScoringPolicy::MatchOnly.score(&query, &candidate), 1);
    /// ```
    #[must_use]
    pub fn score(self, query: &Signature, candidate: &Signature) -> i64 {
        let mut score = 0;
        for id in candidate.up() {
            if query.up().contains(id) {
                score += 1;
            }
            if self == Self::Symmetric && query.down().contains(id) {
                score -= 1;
            }
        }
        for id in candidate.down() {
            if query.down().contains(id) {
                score += 1;
            }
            if self == Self::Symmetric && query.up().contains(id) {
                score -= 1;
            }
        }
        score
    }
}

/// A scored sample.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    /// The candidate sample
    pub sample: SampleRecord,
    /// Match score against the query signature
    pub score: i64,
}

/// Parameters of one search invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchParams {
    /// Signature width used for every candidate
    pub k: usize,
    /// Differential metric the candidate signatures are extracted on
    pub metric: Metric,
    /// Scoring policy
    pub scoring: ScoringPolicy,
}

#[derive(Debug, Default)]
struct Accumulator {
    results: Vec<SearchResult>,
    errors: Vec<Error>,
}

/// Concurrent fan-out/fan-in search over a store.
#[derive(Debug)]
pub struct SearchEngine<S> {
    store: Arc<S>,
    parallelism: usize,
}

impl<S> Clone for SearchEngine<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            parallelism: self.parallelism,
        }
    }
}

impl<S: Store + 'static> SearchEngine<S> {
    /// Create an engine with `parallelism` workers per search.
    ///
    /// # Errors
    ///
    /// `InvalidInput` if `parallelism` is zero.
    pub fn new(store: Arc<S>, parallelism: usize) -> Result<Self> {
        if parallelism == 0 {
            return Err(Error::InvalidInput(
                "search parallelism must be at least 1".to_string(),
            ));
        }
        Ok(Self { store, parallelism })
    }

    /// Number of workers used per search.
    #[must_use]
    pub const fn parallelism(&self) -> usize {
        self.parallelism
    }

    /// Score every sample of `project_id` against `query`.
    ///
    /// Results are sorted by score descending, then sample id ascending.
    ///
    /// # Errors
    ///
    /// * storage errors from listing the project's samples
    /// * `SearchFailed` if any candidate could not be scored
    /// * `WorkerPanicked` if a worker task died
    pub async fn search(
        &self,
        project_id: ProjectId,
        query: &Signature,
        params: SearchParams,
    ) -> Result<Vec<SearchResult>> {
        let samples = self.store.fetch_samples(project_id).await?;
        let total = samples.len();

        let (sender, receiver) = mpsc::unbounded_channel();
        for sample in samples {
            sender.send(sample).map_err(|_| Error::QueueClosed)?;
        }
        drop(sender);

        let queue = Arc::new(tokio::sync::Mutex::new(receiver));
        let accumulator = Arc::new(Mutex::new(Accumulator {
            results: Vec::with_capacity(total),
            errors: Vec::new(),
        }));
        let query = Arc::new(query.clone());

        // Never more workers than candidates
        let mut workers = JoinSet::new();
        for worker in 0..self.parallelism.min(total.max(1)) {
            let store = Arc::clone(&self.store);
            let queue = Arc::clone(&queue);
            let accumulator = Arc::clone(&accumulator);
            let query = Arc::clone(&query);
            workers.spawn(async move {
                let mut scored = 0usize;
                loop {
                    let next = queue.lock().await.recv().await;
                    let Some(sample) = next else { break };

                    let outcome = score_candidate(&*store, &sample, &query, params).await;
                    if let Err(err) = &outcome {
                        warn!(sample_id = sample.id(), error = %err, "failed to score candidate");
                    }
                    {
                        let mut acc = accumulator.lock().unwrap_or_else(PoisonError::into_inner);
                        match outcome {
                            Ok(score) => acc.results.push(SearchResult { sample, score }),
                            Err(err) => acc.errors.push(err),
                        }
                    }
                    scored += 1;
                }
                trace!(worker, scored, "search worker drained queue");
            });
        }

        let mut panics = Vec::new();
        while let Some(joined) = workers.join_next().await {
            if let Err(err) = joined {
                panics.push(err.to_string());
            }
        }
        if let Some(first) = panics.into_iter().next() {
            return Err(Error::WorkerPanicked(first));
        }

        let Accumulator {
            mut results,
            errors,
        } = std::mem::take(&mut *accumulator.lock().unwrap_or_else(PoisonError::into_inner));

        let failed = errors.len();
        if let Some(first) = errors.into_iter().next() {
            return Err(Error::SearchFailed {
                failed,
                total,
                first: Box::new(first),
            });
        }

        sort_results(&mut results);
        debug!(project_id, candidates = total, "search complete");
        Ok(results)
    }
}

async fn score_candidate<S: Store>(
    store: &S,
    sample: &SampleRecord,
    query: &Signature,
    params: SearchParams,
) -> Result<i64> {
    let candidate = extract_signature(store, sample.id(), params.k, params.metric).await?;
    Ok(params.scoring.score(query, &candidate))
}

/// Score descending, then sample id ascending.
pub fn sort_results(results: &mut [SearchResult]) {
    results.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| a.sample.id().cmp(&b.sample.id()))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn result(id: i64, score: i64) -> SearchResult {
        SearchResult {
            sample: SampleRecord::new(id, 1, 1, format!("s{id}"), Utc::now()),
            score,
        }
    }

    #[test]
    fn test_symmetric_scoring() {
        let query = Signature::new([1, 2, 3], [4, 5]);
        let candidate = Signature::new([1, 2, 4], [5, 3, 9]);
        // up: 1(+1) 2(+1) 4(-1); down: 5(+1) 3(-1) 9(0)
        assert_eq!(ScoringPolicy::Symmetric.score(&query, &candidate), 1);
    }

    #[test]
    fn test_match_only_scoring() {
        let query = Signature::new([1, 2, 3], [4, 5]);
        let candidate = Signature::new([1, 2, 4], [5, 3, 9]);
        assert_eq!(ScoringPolicy::MatchOnly.score(&query, &candidate), 3);
    }

    #[test]
    fn test_identical_signature_scores_its_size() {
        let sig = Signature::new([1, 2], [3, 4, 5]);
        assert_eq!(ScoringPolicy::Symmetric.score(&sig, &sig), 5);
        assert_eq!(ScoringPolicy::MatchOnly.score(&sig, &sig), 5);
    }

    #[test]
    fn test_empty_query_scores_zero() {
        let candidate = Signature::new([1], [2]);
        assert_eq!(ScoringPolicy::Symmetric.score(&Signature::default(), &candidate), 0);
    }

    #[test]
    fn test_sort_results_tie_break() {
        let mut results = vec![result(5, 1), result(2, 3), result(3, 1), result(1, -2)];
        sort_results(&mut results);
        let order: Vec<_> = results.iter().map(|r| r.sample.id()).collect();
        assert_eq!(order, vec![2, 3, 5, 1]);
    }

    #[test]
    fn test_policy_serde_names() {
        assert_eq!(
            serde_json::to_string(&ScoringPolicy::MatchOnly).unwrap(),
            "\"match-only\""
        );
    }

    #[test]
    fn test_zero_parallelism_rejected() {
        let store = Arc::new(crate::store::MemoryStore::new());
        assert!(matches!(
            SearchEngine::new(store, 0),
            Err(Error::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_search_empty_project() {
        let store = Arc::new(crate::store::MemoryStore::new());
        let engine = SearchEngine::new(store, 4).unwrap();
        let params = SearchParams {
            k: 10,
            metric: Metric::Rank,
            scoring: ScoringPolicy::Symmetric,
        };
        let results = engine.search(42, &Signature::default(), params).await.unwrap();
        assert!(results.is_empty());
    }
}
