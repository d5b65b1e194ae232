//! Dimension name lookup and text submissions
//!
//! Submissions arrive as text, one `name value` pair per line:
//!
//! ```text
//! TP53   1.25
//! BRCA1  -0.5
//!
//! EGFR   NaN
//! ```
//!
//! Queries name the up- and down-regulated dimensions as whitespace
//! separated lists.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::record::{Dimension, DimensionId};
use crate::signature::Signature;
use crate::{Error, Result};

/// Name ↔ id view over one project's dimensions.
#[derive(Debug, Clone, Default)]
pub struct DimLookup {
    name_to_id: FxHashMap<String, DimensionId>,
    id_to_name: FxHashMap<DimensionId, String>,
}

impl DimLookup {
    /// Index a project's dimensions.
    #[must_use]
    pub fn new(dimensions: &[Dimension]) -> Self {
        Self {
            name_to_id: dimensions
                .iter()
                .map(|dim| (dim.name().to_string(), dim.id()))
                .collect(),
            id_to_name: dimensions
                .iter()
                .map(|dim| (dim.id(), dim.name().to_string()))
                .collect(),
        }
    }

    /// # Errors
    ///
    /// `DimensionMismatch` if the project has no dimension with this name.
    pub fn id(&self, name: &str) -> Result<DimensionId> {
        self.name_to_id
            .get(name)
            .copied()
            .ok_or_else(|| Error::DimensionMismatch(format!("unknown dimension {name:?}")))
    }

    /// # Errors
    ///
    /// `DimensionMismatch` if the project has no dimension with this id.
    pub fn name(&self, id: DimensionId) -> Result<&str> {
        self.id_to_name
            .get(&id)
            .map(String::as_str)
            .ok_or_else(|| Error::DimensionMismatch(format!("unknown dimension {id}")))
    }

    /// Number of dimensions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.id_to_name.len()
    }

    /// Whether the project has no dimensions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.id_to_name.is_empty()
    }
}

/// Parse a text submission into `(dimension_id, value)` pairs.
///
/// Blank lines are skipped. Duplicates and completeness are not checked
/// here; that happens in [`crate::diff::validate_submission`].
///
/// # Errors
///
/// * `MalformedData` for a row without exactly two fields or a value that
///   isn't a float
/// * `DimensionMismatch` for an unknown dimension name
pub fn parse_submission(text: &str, lookup: &DimLookup) -> Result<Vec<(DimensionId, f64)>> {
    let mut pairs = Vec::new();
    for row in text.lines() {
        let fields: Vec<&str> = row.split_whitespace().collect();
        match fields.as_slice() {
            [] => {}
            [name, value] => {
                let id = lookup.id(name)?;
                let value: f64 = value
                    .parse()
                    .map_err(|_| Error::MalformedData(row.to_string()))?;
                pairs.push((id, value));
            }
            _ => return Err(Error::MalformedData(row.to_string())),
        }
    }
    Ok(pairs)
}

/// Check a new project's dimension names.
///
/// Names must be usable as a single whitespace-free token in submissions
/// and queries. Duplicates are rejected by the store.
///
/// # Errors
///
/// `InvalidInput` for an empty list, an empty name, or a name containing
/// whitespace.
pub fn validate_dimension_names(names: &[String]) -> Result<()> {
    if names.is_empty() {
        return Err(Error::InvalidInput("no dimensions provided".to_string()));
    }
    if let Some(name) = names
        .iter()
        .find(|name| name.is_empty() || name.chars().any(char::is_whitespace))
    {
        return Err(Error::InvalidInput(format!(
            "dimension name {name:?} must be a non-empty token without whitespace"
        )));
    }
    Ok(())
}

/// Parse up- and down-regulated name lists into a query signature.
///
/// ```rust
/// use cwbench::lookup::{parse_query, DimLookup};
/// use cwbench::record::Dimension;
///
/// let lookup = DimLookup::new(&[Dimension::new(1, 1, "A"), Dimension::new(2, 1, "B")]);
/// let query = parse_query("A", "B", &lookup)?;
/// assert_eq!(query.sorted_up(), vec![1]);
/// assert_eq!(query.sorted_down(), vec![2]);
/// assert!(parse_query("A", "A", &lookup).is_err());
/// # Ok::<(), cwbench::Error>(())
/// ```
///
/// # Errors
///
/// * `InvalidInput` if both lists are empty
/// * `DuplicatedDimension` if a name appears twice, in one list or across both
/// * `DimensionMismatch` for an unknown dimension name
pub fn parse_query<'a>(up: &'a str, down: &'a str, lookup: &DimLookup) -> Result<Signature> {
    let up: Vec<&str> = up.split_whitespace().collect();
    let down: Vec<&str> = down.split_whitespace().collect();
    if up.is_empty() && down.is_empty() {
        return Err(Error::InvalidInput("no dimensions provided".to_string()));
    }

    let mut seen = FxHashSet::default();
    let up = resolve_names(&up, &mut seen, lookup)?;
    let down = resolve_names(&down, &mut seen, lookup)?;
    Ok(Signature::new(up, down))
}

fn resolve_names<'a>(
    names: &[&'a str],
    seen: &mut FxHashSet<&'a str>,
    lookup: &DimLookup,
) -> Result<Vec<DimensionId>> {
    names
        .iter()
        .map(|&name| {
            if !seen.insert(name) {
                return Err(Error::DuplicatedDimension(name.to_string()));
            }
            lookup.id(name)
        })
        .collect()
}
