//! zresults - collect and compare `Z.txt` partition-function results
//!
//! Two tools built on one library:
//!
//! - `zresults-combine` walks a result tree laid out as
//!   `resultsGaussian/<problem>/<stddev>/<x>/<y>/<T_frac>/<precision>/<seed>/Z.txt`
//!   and writes every file's four values into a single hierarchical archive
//!   under `<T_frac>/<problem>/<stddev>/<x>/<y>/<precision>/<seed>/Z`.
//! - `zresults-compare` checks that two `Z.txt` files agree within a
//!   relative tolerance, using arbitrary-precision decimals.

pub mod aggregate;
pub mod archive;
pub mod cli;
pub mod compare;
pub mod config;
pub mod errors;
pub mod layout;
pub mod models;
pub mod scanner;

pub use aggregate::{aggregate, AggregateOptions, Aggregator};
pub use archive::{Archive, ArchiveFile, Dataset, Group};
pub use compare::{compare, compare_files, CompareOptions, Comparison, RelativeDifference};
pub use errors::{ArchiveError, CompareError};
pub use models::{AggregateSummary, GroupPath, PathLabels, ResultRecord, SkipReason, SkippedFile};
