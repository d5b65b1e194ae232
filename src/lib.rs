//! # cwbench: Rank-Differential Signature Search
//!
//! cwbench records baseline ("control") measurements over a project's fixed
//! set of named dimensions, turns every new observation ("sample") into
//! per-dimension rank and value differentials against its control, and
//! searches a project's samples for the ones whose top-K signature best
//! matches a query signature.
//!
//! ## Pipeline
//!
//! ```text
//! submission ─> rank ─> diff ─> Store (atomic)
//!                                  │
//!            query ─> search <─ signature (top-K, recomputed per read)
//! ```
//!
//! ## Design Principles (Toyota Way Aligned)
//!
//! - **Poka-Yoke safety**: Submissions are validated against the dimension set before any write
//! - **Jidoka**: A search that can't score every candidate fails instead of returning partial results
//! - **Heijunka**: A fixed worker pool drains each search's candidate queue
//!
//! ## Example Usage
//!
//! ```rust
//! use cwbench::search::{ScoringPolicy, SearchParams};
//! use cwbench::signature::Metric;
//! use cwbench::store::MemoryStore;
//! use cwbench::Workbench;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> cwbench::Result<()> {
//! let bench = Workbench::builder(MemoryStore::new()).parallelism(4).build()?;
//!
//! let project = bench.create_project("screen", ["A", "B", "C"]).await?;
//! let dims = bench.dim_lookup(project).await?;
//! let (a, b, c) = (dims.id("A")?, dims.id("B")?, dims.id("C")?);
//!
//! let control = bench.create_control(project, "dmso", [(a, 1.0), (b, 2.0), (c, 3.0)]).await?;
//! let sample = bench.create_sample(project, control, "drug-1", [(a, 10.0), (b, 20.0), (c, 5.0)]).await?;
//!
//! let params = SearchParams { k: 2, metric: Metric::Rank, scoring: ScoringPolicy::Symmetric };
//! let results = bench.similar(sample, params).await?;
//! assert_eq!(results[0].sample.id(), sample);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod config;
pub mod diff;
pub mod error;
pub mod lookup;
pub mod rank;
pub mod record;
pub mod search;
pub mod signature;
pub mod store;
pub mod topk;
pub mod workbench;

pub use error::{Error, Result};
pub use workbench::{ProjectInfo, Workbench, WorkbenchBuilder};
