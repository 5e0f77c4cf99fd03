//! # Cotejo: content-addressed benchmark result database
//!
//! Cotejo manages a directory of benchmark/test results. Each result is
//! tagged with *facts* (build version, hardware, ...) and carries numeric
//! *metrics*. On top of that it runs confounder-checked A/B comparisons:
//! filter results by fixed facts, verify every remaining fact is constant
//! except the declared experiment fact, then report per-group sample count,
//! mean, and standard deviation for a chosen metric.
//!
//! ## Design Principles (Toyota Way Aligned)
//!
//! - **Poka-Yoke safety**: the consistency check refuses comparisons with
//!   uncontrolled varying facts instead of producing misleading numbers
//! - **Jidoka**: content-addressed import makes duplicate imports fail loudly
//!   rather than silently overwrite
//! - **Genchi Genbutsu**: error messages carry the actual offending fact and
//!   metric names
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::collections::BTreeMap;
//! use cotejo::{compare::compare, db::Db, model::FactValue};
//!
//! let db = Db::read("./results")?;
//! let mut facts_eq = BTreeMap::new();
//! facts_eq.insert("os".to_string(), FactValue::from("linux"));
//!
//! for group in compare(&db, &facts_eq, "variant", "latency")? {
//!     println!("{} n={} mean={}", group.fact_value, group.samples, group.mean);
//! }
//! # Ok::<(), cotejo::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod compare;
pub mod db;
pub mod error;
pub mod import;
pub mod model;
pub mod report;

pub use error::{Error, Result};
