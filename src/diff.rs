//! Submission validation and differential derivation
//!
//! Both controls and samples are submitted as `(dimension_id, value)` pairs
//! that must cover the project's dimension set exactly once. Validation
//! fails fast, before anything reaches storage.

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use crate::rank::{rank, Ranked};
use crate::record::{ControlId, ControlValue, DifferentialRow, Dimension, DimensionId};
use crate::{Error, Result};

/// Validate a submission against the project's dimension set.
///
/// * every id must satisfy `is_known`
/// * no id may appear twice
/// * exactly `count` distinct ids must be present
///
/// # Errors
///
/// `DimensionMismatch` for unknown ids or a wrong count,
/// `DuplicatedDimension` for a repeated id.
pub fn validate_submission(
    count: usize,
    submitted: impl IntoIterator<Item = (DimensionId, f64)>,
    is_known: impl Fn(DimensionId) -> bool,
) -> Result<Vec<(DimensionId, f64)>> {
    let mut seen = FxHashSet::default();
    let mut pairs = Vec::with_capacity(count);

    for (dimension_id, value) in submitted {
        if !is_known(dimension_id) {
            return Err(Error::DimensionMismatch(format!(
                "unknown dimension {dimension_id}"
            )));
        }
        if !seen.insert(dimension_id) {
            return Err(Error::DuplicatedDimension(format!("dimension {dimension_id}")));
        }
        pairs.push((dimension_id, value));
    }

    if pairs.len() != count {
        return Err(Error::DimensionMismatch(format!(
            "submission has {} dimensions, project has {count}",
            pairs.len()
        )));
    }
    Ok(pairs)
}

/// Rank a validated control submission.
///
/// # Errors
///
/// Any validation error from [`validate_submission`].
pub fn rank_control(
    dimensions: &[Dimension],
    submitted: impl IntoIterator<Item = (DimensionId, f64)>,
) -> Result<Vec<ControlValue>> {
    let known: FxHashSet<DimensionId> = dimensions.iter().map(Dimension::id).collect();
    let pairs = validate_submission(dimensions.len(), submitted, |id| known.contains(&id))?;

    Ok(rank(pairs)
        .into_iter()
        .map(|ranked| ControlValue::new(ranked.key, ranked.value, ranked.rank))
        .collect())
}

/// `dimension_id -> (rank, value)` view over one control's values.
#[derive(Debug, Clone, Default)]
pub struct ControlLookup {
    values: FxHashMap<DimensionId, ControlValue>,
}

impl ControlLookup {
    /// Index a control's values by dimension.
    #[must_use]
    pub fn new(values: impl IntoIterator<Item = ControlValue>) -> Self {
        Self {
            values: values
                .into_iter()
                .map(|value| (value.dimension_id(), value))
                .collect(),
        }
    }

    /// Control value for a dimension.
    #[must_use]
    pub fn get(&self, dimension_id: DimensionId) -> Option<&ControlValue> {
        self.values.get(&dimension_id)
    }

    /// Number of dimensions the control covers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the control has no values at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Check that the control covers every project dimension.
    ///
    /// # Errors
    ///
    /// `DimensionIdMissing` naming the first uncovered dimension.
    pub fn ensure_covers(&self, control_id: ControlId, dimensions: &[Dimension]) -> Result<()> {
        match dimensions.iter().find(|dim| !self.values.contains_key(&dim.id())) {
            Some(dim) => Err(Error::DimensionIdMissing(format!(
                "control {control_id} has no value for dimension {} ({:?})",
                dim.id(),
                dim.name()
            ))),
            None => Ok(()),
        }
    }
}

/// Derive one differential row per dimension from a sample submission.
///
/// The submission is validated against the control (which must cover all
/// `count` project dimensions), ranked, and diffed:
/// `rank_diff = sample_rank - control_rank`,
/// `value_diff = sample_value - control_value`.
///
/// # Errors
///
/// * `DimensionIdMissing` if the control covers fewer than `count` dimensions
/// * `DimensionMismatch` / `DuplicatedDimension` from validation
///
/// # Examples
///
/// ```rust
/// use cwbench::diff::{compute_differentials, ControlLookup};
/// use cwbench::record::ControlValue;
///
/// # fn main() -> cwbench::Result<()> {
/// let control = ControlLookup::new([
///     ControlValue::new(1, 1.0, 1),
///     ControlValue::new(2, 2.0, 2),
///     ControlValue::new(3, 3.0, 3),
/// ]);
/// let rows = compute_differentials(3, [(1, 10.0), (2, 20.0), (3, 5.0)], &control)?;
/// let c = rows.iter().find(|row| row.dimension_id() == 3).unwrap();
/// assert_eq!(c.rank(), 1);
/// assert_eq!(c.rank_diff(), -2);
/// # Ok(())
/// # }
/// ```
pub fn compute_differentials(
    count: usize,
    submitted: impl IntoIterator<Item = (DimensionId, f64)>,
    control: &ControlLookup,
) -> Result<Vec<DifferentialRow>> {
    if control.len() < count {
        return Err(Error::DimensionIdMissing(format!(
            "control covers {} of {count} dimensions",
            control.len()
        )));
    }

    let pairs = validate_submission(count, submitted, |id| control.get(id).is_some())?;

    let rows = diff_against(rank(pairs), control)?;

    debug!(rows = rows.len(), "derived differential rows");
    Ok(rows)
}

/// Pair each ranked sample value with its control entry.
#[allow(clippy::cast_possible_wrap)]
fn diff_against(
    ranked: Vec<Ranked<DimensionId>>,
    control: &ControlLookup,
) -> Result<Vec<DifferentialRow>> {
    ranked
        .into_iter()
        .map(|ranked| {
            let base = control.get(ranked.key).ok_or_else(|| {
                Error::DimensionIdMissing(format!(
                    "control has no value for dimension {}",
                    ranked.key
                ))
            })?;
            Ok(DifferentialRow::new(
                ranked.key,
                ranked.rank,
                ranked.rank as i64 - base.rank() as i64,
                ranked.value,
                ranked.value - base.value(),
            ))
        })
        .collect()
}
