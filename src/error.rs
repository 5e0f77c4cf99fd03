//! Error types for cotejo
//!
//! Toyota Way: Clear error messages with actionable guidance (Respect for People)
//!
//! Validation errors carry the offending names and values verbatim. They are
//! raised deep in the comparison pipeline and must reach the user unmodified,
//! so no variant here wraps another in a way that would lose that detail.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Cotejo error types
#[derive(Error, Debug)]
pub enum Error {
    /// A fact was referenced that no result in the database carries
    #[error("facts {missing:?} not in any result in DB. Typo?\nAvailable facts: {available:?}")]
    UnknownFacts {
        /// The referenced fact names that are not extant
        missing: Vec<String>,
        /// Every fact name seen across the whole database
        available: Vec<String>,
    },

    /// No results survived the fact-equality filter
    #[error("no results matched fact predicates")]
    EmptySelection,

    /// An uncontrolled fact varies across the filtered results, so any metric
    /// difference could be caused by it instead of the experiment fact
    #[error("multiple values encountered for fact {fact:?}: {values:?}\nTry constraining with --fact-eq")]
    ConfoundingFact {
        /// The fact that is neither fixed nor the experiment fact
        fact: String,
        /// The distinct values it takes (rendered, "<absent>" included)
        values: Vec<String>,
    },

    /// The requested metric has no samples among the selected results
    #[error("no results for metric {metric:?}.\nAvailable metrics for selected results: {available:?}")]
    NoMatchingMetric {
        /// The requested metric name
        metric: String,
        /// Metric names that do have samples among the selected results
        available: Vec<String>,
    },

    /// The target result directory already exists (at-most-once import)
    #[error("result directory {} already exists", .0.display())]
    ResultExists(PathBuf),

    /// A database entry does not follow the `{test_name}:{result_id}` pattern
    #[error("invalid result directory name {0:?} (expected \"test_name:result_id\")")]
    InvalidResultDir(String),

    /// A result.json sidecar exists but cannot be parsed
    #[error("reading metadata {}: {source}", .path.display())]
    Metadata {
        /// Path of the malformed sidecar
        path: PathBuf,
        /// Underlying JSON error
        source: serde_json::Error,
    },

    /// IO error, tagged with the path being touched
    #[error("{}: {source}", .path.display())]
    Io {
        /// Path of the file or directory the operation failed on
        path: PathBuf,
        /// Underlying IO error
        source: std::io::Error,
    },
}

impl Error {
    /// Attach a path to an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
