//! Search configuration
//!
//! Passed explicitly to [`crate::Workbench`]; nothing here is process-global.
//!
//! ```rust
//! use cwbench::config::SearchConfig;
//! use cwbench::search::ScoringPolicy;
//!
//! let config = SearchConfig::from_json(r#"{ "parallelism": 4, "scoring": "match-only" }"#).unwrap();
//! assert_eq!(config.parallelism, 4);
//! assert_eq!(config.k, 25);
//! assert_eq!(config.scoring, ScoringPolicy::MatchOnly);
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::search::{ScoringPolicy, SearchParams};
use crate::signature::Metric;
use crate::{Error, Result};

/// Default signature width.
pub const DEFAULT_K: usize = 25;

/// Default worker count: available processors plus one.
#[must_use]
pub fn default_parallelism() -> usize {
    std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get) + 1
}

/// Search defaults used when a caller doesn't supply its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Workers per search invocation
    pub parallelism: usize,
    /// Signature width
    pub k: usize,
    /// Differential metric signatures are extracted on
    pub metric: Metric,
    /// Scoring policy
    pub scoring: ScoringPolicy,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            parallelism: default_parallelism(),
            k: DEFAULT_K,
            metric: Metric::default(),
            scoring: ScoringPolicy::default(),
        }
    }
}

impl SearchConfig {
    /// Parse and validate a JSON config; missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// `Config` on malformed JSON, `InvalidInput` if validation fails.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse, and validate a JSON config file.
    ///
    /// # Errors
    ///
    /// `Io` if the file can't be read, otherwise as [`Self::from_json`].
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config = Self::from_json(&std::fs::read_to_string(path)?)?;
        debug!(path = %path.display(), ?config, "loaded search config");
        Ok(config)
    }

    /// # Errors
    ///
    /// `InvalidInput` if `parallelism` is zero.
    pub fn validate(&self) -> Result<()> {
        if self.parallelism == 0 {
            return Err(Error::InvalidInput(
                "parallelism must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Search parameters with this config's metric and policy.
    #[must_use]
    pub const fn params(&self, k: usize) -> SearchParams {
        SearchParams {
            k,
            metric: self.metric,
            scoring: self.scoring,
        }
    }
}
