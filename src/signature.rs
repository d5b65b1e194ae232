//! Top-K differential signatures
//!
//! A signature reduces a sample's full differential row set to the `K`
//! dimensions that moved the most, split by direction.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::record::{DifferentialRow, DimensionId, SampleId};
use crate::store::Store;
use crate::topk::TotalF64;
use crate::Result;

/// Which differential a signature is extracted on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Metric {
    /// `rank_diff`, ordered by `abs_rank_diff`
    #[default]
    Rank,
    /// `value_diff`, ordered by `abs_value_diff`
    Value,
}

impl Metric {
    /// Sort key for "most changed first" ordering.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn magnitude(self, row: &DifferentialRow) -> TotalF64 {
        match self {
            Self::Rank => TotalF64(row.abs_rank_diff() as f64),
            Self::Value => TotalF64(row.abs_value_diff()),
        }
    }

    /// Direction of change: `Greater` is up, `Less` is down, anything else
    /// (zero or `NaN`) is neither.
    #[must_use]
    pub fn direction(self, row: &DifferentialRow) -> Option<std::cmp::Ordering> {
        match self {
            Self::Rank => Some(row.rank_diff().cmp(&0)),
            Self::Value => row.value_diff().partial_cmp(&0.0),
        }
    }
}

/// Up- and down-regulated dimension sets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    up: FxHashSet<DimensionId>,
    down: FxHashSet<DimensionId>,
}

impl Signature {
    /// Build a query signature from explicit id lists.
    #[must_use]
    pub fn new(
        up: impl IntoIterator<Item = DimensionId>,
        down: impl IntoIterator<Item = DimensionId>,
    ) -> Self {
        Self {
            up: up.into_iter().collect(),
            down: down.into_iter().collect(),
        }
    }

    /// Partition rows that are already ordered and truncated to `K`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use cwbench::record::DifferentialRow;
    /// use cwbench::signature::{Metric, Signature};
    ///
    /// let rows = [
    ///     DifferentialRow::new(1, 1, -4, 0.0, 0.0),
    ///     DifferentialRow::new(2, 9, 4, 0.0, 0.0),
    ///     DifferentialRow::new(3, 5, 0, 0.0, 0.0),
    /// ];
    /// let sig = Signature::from_rows(&rows, Metric::Rank);
    /// assert!(sig.down().contains(&1));
    /// assert!(sig.up().contains(&2));
    /// assert!(!sig.up().contains(&3) && !sig.down().contains(&3));
    /// ```
    #[must_use]
    pub fn from_rows<'a>(rows: impl IntoIterator<Item = &'a DifferentialRow>, metric: Metric) -> Self {
        let mut signature = Self::default();
        for row in rows {
            match metric.direction(row) {
                Some(std::cmp::Ordering::Greater) => {
                    signature.up.insert(row.dimension_id());
                }
                Some(std::cmp::Ordering::Less) => {
                    signature.down.insert(row.dimension_id());
                }
                _ => {}
            }
        }
        signature
    }

    /// Up-regulated dimensions.
    #[must_use]
    pub const fn up(&self) -> &FxHashSet<DimensionId> {
        &self.up
    }

    /// Down-regulated dimensions.
    #[must_use]
    pub const fn down(&self) -> &FxHashSet<DimensionId> {
        &self.down
    }

    /// Whether neither set has any dimension.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.up.is_empty() && self.down.is_empty()
    }

    /// Up-regulated ids, ascending. Useful for display and stable output.
    #[must_use]
    pub fn sorted_up(&self) -> Vec<DimensionId> {
        let mut ids: Vec<_> = self.up.iter().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Down-regulated ids, ascending.
    #[must_use]
    pub fn sorted_down(&self) -> Vec<DimensionId> {
        let mut ids: Vec<_> = self.down.iter().copied().collect();
        ids.sort_unstable();
        ids
    }
}

/// Extract a sample's top-`k` signature from storage.
///
/// Fewer than `k` rows uses every row; `k == 0` yields an empty signature.
///
/// # Errors
///
/// Propagates storage errors unchanged.
pub async fn extract_signature<S: Store>(
    store: &S,
    sample_id: SampleId,
    k: usize,
    metric: Metric,
) -> Result<Signature> {
    if k == 0 {
        return Ok(Signature::default());
    }
    let rows = store
        .fetch_differential_rows(sample_id, metric, Some(k))
        .await?;
    Ok(Signature::from_rows(&rows, metric))
}
