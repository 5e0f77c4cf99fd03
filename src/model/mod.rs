//! Core data model: fact values, metric samples, results
//!
//! A result is one benchmark/test run. It carries *facts* (named attributes
//! describing the conditions it ran under) and *metrics* (named numeric
//! measurements). Not every result carries every fact: absence is a value of
//! its own, modelled by [`FactValue::Absent`] rather than by `Option` so that
//! comparison sites never special-case it.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// The value of a fact.
///
/// Fact values are opaque to the comparison logic: all it ever does is test
/// them for equality and collect sets of distinct values. Equality is
/// structural (`Int(3)` and `Float(3.0)` are different values), and the total
/// order exists so distinct-value sets can live in a `BTreeSet` and render in
/// a stable order.
///
/// Deserializes untagged from JSON: `null` is `Absent`, numbers without a
/// fractional part are `Int`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FactValue {
    /// The fact is not present on a result. One specific value, distinct
    /// from every real value.
    Absent,
    /// Boolean fact, e.g. `debug_build = true`.
    Bool(bool),
    /// Integer fact, e.g. `num_cpus = 8`.
    Int(i64),
    /// Floating-point fact.
    Float(f64),
    /// String fact, e.g. `os = "linux"`.
    Str(String),
}

impl FactValue {
    /// Parse a command-line argument into a fact value.
    ///
    /// Tries `bool`, then `i64`, then `f64`, and falls back to a string, so
    /// `--fact-eq num_cpus 8` compares as `Int(8)` against facts parsed from
    /// JSON the same way.
    #[must_use]
    pub fn parse_cli(raw: &str) -> Self {
        if let Ok(b) = raw.parse::<bool>() {
            return Self::Bool(b);
        }
        if let Ok(i) = raw.parse::<i64>() {
            return Self::Int(i);
        }
        if let Ok(f) = raw.parse::<f64>() {
            return Self::Float(f);
        }
        Self::Str(raw.to_string())
    }

    /// Whether this is the absent sentinel.
    #[must_use]
    pub const fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    const fn rank(&self) -> u8 {
        match self {
            Self::Absent => 0,
            Self::Bool(_) => 1,
            Self::Int(_) => 2,
            Self::Float(_) => 3,
            Self::Str(_) => 4,
        }
    }
}

impl Ord for FactValue {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Absent, Self::Absent) => Ordering::Equal,
            (Self::Bool(a), Self::Bool(b)) => a.cmp(b),
            (Self::Int(a), Self::Int(b)) => a.cmp(b),
            // total_cmp gives NaN a defined position instead of poisoning
            // the ordering.
            (Self::Float(a), Self::Float(b)) => a.total_cmp(b),
            (Self::Str(a), Self::Str(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for FactValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for FactValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for FactValue {}

impl fmt::Display for FactValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absent => write!(f, "<absent>"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Str(s) => write!(f, "{s}"),
        }
    }
}

impl From<&str> for FactValue {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for FactValue {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<i64> for FactValue {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<f64> for FactValue {
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}

impl From<bool> for FactValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

/// One numeric metric sample attached to a result.
///
/// A result may carry several samples of the same metric; the comparison
/// treats each sample as one row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    name: String,
    value: f64,
}

impl Metric {
    /// Create a new metric sample.
    #[must_use]
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    /// Get the metric name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the sample value.
    #[must_use]
    pub const fn value(&self) -> f64 {
        self.value
    }
}

/// One benchmark/test run, immutable once imported.
///
/// `result_id` is the result's directory name, `"{test_name}:{short_hash}"`,
/// where the short hash is derived from the artifact contents. Re-importing
/// the same artifacts therefore collides instead of silently duplicating.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRecord {
    test_name: String,
    result_id: String,
    facts: BTreeMap<String, FactValue>,
    metrics: Vec<Metric>,
}

impl ResultRecord {
    /// Create a result with no facts or metrics.
    #[must_use]
    pub fn new(test_name: impl Into<String>, result_id: impl Into<String>) -> Self {
        Self {
            test_name: test_name.into(),
            result_id: result_id.into(),
            facts: BTreeMap::new(),
            metrics: Vec::new(),
        }
    }

    /// Attach a fact, replacing any previous value under the same name.
    #[must_use]
    pub fn with_fact(mut self, name: impl Into<String>, value: impl Into<FactValue>) -> Self {
        self.facts.insert(name.into(), value.into());
        self
    }

    /// Attach a metric sample.
    #[must_use]
    pub fn with_metric(mut self, name: impl Into<String>, value: f64) -> Self {
        self.metrics.push(Metric::new(name, value));
        self
    }

    /// Get the test name.
    #[must_use]
    pub fn test_name(&self) -> &str {
        &self.test_name
    }

    /// Get the result ID (the on-disk directory name).
    #[must_use]
    pub fn result_id(&self) -> &str {
        &self.result_id
    }

    /// Facts carried by this result.
    #[must_use]
    pub const fn facts(&self) -> &BTreeMap<String, FactValue> {
        &self.facts
    }

    /// Metric samples carried by this result.
    #[must_use]
    pub fn metrics(&self) -> &[Metric] {
        &self.metrics
    }

    /// Look up a fact, yielding the [`FactValue::Absent`] sentinel when the
    /// result does not carry it.
    #[must_use]
    pub fn fact(&self, name: &str) -> &FactValue {
        const ABSENT: FactValue = FactValue::Absent;
        self.facts.get(name).unwrap_or(&ABSENT)
    }

    pub(crate) fn set_data(&mut self, facts: BTreeMap<String, FactValue>, metrics: Vec<Metric>) {
        self.facts = facts;
        self.metrics = metrics;
    }
}

/// Derived (never stored) flattened view of one (result, metric sample) pair.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatRow {
    /// Owning result's ID
    pub result_id: String,
    /// Metric name
    pub metric: String,
    /// Sample value
    pub value: f64,
}
