//! A/B comparison: filter, consistency check, aggregation
//!
//! The pipeline runs in three stages:
//!
//! 1. [`filter_results`] selects the results matching the fixed fact
//!    constraints;
//! 2. [`validate_selection`] guarantees the comparison is statistically
//!    sound: every fact that is neither the experiment fact nor explicitly
//!    fixed must be constant across the selection. Without this check a
//!    metric difference could be attributed to the experiment fact when it
//!    is really caused by an uncontrolled third variable;
//! 3. [`group_by_fact`] groups the selected metric samples by the experiment
//!    fact's value and computes count, mean, and sample standard deviation
//!    per group.
//!
//! [`compare`] chains all three against a database snapshot.

use std::collections::{BTreeMap, BTreeSet};

use crate::db::Db;
use crate::error::{Error, Result};
use crate::model::{FactValue, ResultRecord};

/// Aggregates for one experiment-fact value.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricGroup {
    /// The experiment fact's value for this group. May be
    /// [`FactValue::Absent`] when some selected results lack the fact.
    pub fact_value: FactValue,
    /// Number of metric samples in the group.
    pub samples: usize,
    /// Arithmetic mean of the sample values.
    pub mean: f64,
    /// Sample standard deviation. `NaN` when `samples < 2`, by design:
    /// a single observation has no spread to estimate.
    pub stddev: f64,
}

/// Select the results matching every fixed fact constraint.
///
/// A result is excluded only when it carries a constrained fact with a
/// *different* value. A result that lacks the fact entirely passes the
/// predicate; this permissive-match policy lets a constraint span tests
/// that never record the fact. Input order is preserved, and an empty
/// constraint map selects everything.
pub fn filter_results<'a>(
    results: impl IntoIterator<Item = &'a ResultRecord>,
    facts_eq: &BTreeMap<String, FactValue>,
) -> Vec<&'a ResultRecord> {
    results
        .into_iter()
        .filter(|result| {
            facts_eq
                .iter()
                .all(|(name, required)| match result.facts().get(name) {
                    Some(value) => value == required,
                    None => true,
                })
        })
        .collect()
}

/// Check that a filtered selection supports a sound A/B comparison.
///
/// `all_fact_names` is the set of fact names across the *entire* database,
/// not just the filtered selection: a typo in `--fact-eq` should be reported
/// as unknown even when the filter happens to match nothing.
///
/// # Errors
///
/// - [`Error::UnknownFacts`] if a `facts_eq` key or the experiment fact is
///   not extant anywhere in the database;
/// - [`Error::EmptySelection`] if `filtered` is empty;
/// - [`Error::ConfoundingFact`] if any fact other than the experiment fact
///   and the `facts_eq` keys takes more than one distinct value across the
///   selection. A result lacking the fact contributes the absent sentinel,
///   which counts as one specific value.
pub fn validate_selection(
    all_fact_names: &BTreeSet<String>,
    facts_eq: &BTreeMap<String, FactValue>,
    experiment_fact: &str,
    filtered: &[&ResultRecord],
) -> Result<()> {
    let mut missing: Vec<String> = facts_eq
        .keys()
        .filter(|name| !all_fact_names.contains(*name))
        .cloned()
        .collect();
    if !all_fact_names.contains(experiment_fact) {
        missing.push(experiment_fact.to_string());
    }
    if !missing.is_empty() {
        return Err(Error::UnknownFacts {
            missing,
            available: all_fact_names.iter().cloned().collect(),
        });
    }

    if filtered.is_empty() {
        return Err(Error::EmptySelection);
    }

    for fact in all_fact_names {
        if fact == experiment_fact || facts_eq.contains_key(fact) {
            continue;
        }
        let values: BTreeSet<&FactValue> = filtered.iter().map(|r| r.fact(fact)).collect();
        if values.len() > 1 {
            return Err(Error::ConfoundingFact {
                fact: fact.clone(),
                values: values.iter().map(|v| v.to_string()).collect(),
            });
        }
    }

    Ok(())
}

/// Group the selected metric samples by the experiment fact's value.
///
/// An absent experiment fact is a legal group key at this stage; the
/// consistency check has already run, so whatever grouping falls out is
/// well-controlled. Groups come back ordered by fact value (deterministic,
/// but not a contract).
///
/// # Errors
///
/// [`Error::NoMatchingMetric`] when no selected result carries a sample of
/// `metric`; the error lists the metric names that *are* available among the
/// selection.
pub fn group_by_fact(
    filtered: &[&ResultRecord],
    metric: &str,
    experiment_fact: &str,
) -> Result<Vec<MetricGroup>> {
    let mut grouped: BTreeMap<FactValue, Vec<f64>> = BTreeMap::new();
    for result in filtered {
        for sample in result.metrics() {
            if sample.name() != metric {
                continue;
            }
            grouped
                .entry(result.fact(experiment_fact).clone())
                .or_default()
                .push(sample.value());
        }
    }

    if grouped.is_empty() {
        let available: BTreeSet<String> = filtered
            .iter()
            .flat_map(|r| r.metrics().iter().map(|m| m.name().to_string()))
            .collect();
        return Err(Error::NoMatchingMetric {
            metric: metric.to_string(),
            available: available.into_iter().collect(),
        });
    }

    Ok(grouped
        .into_iter()
        .map(|(fact_value, values)| {
            let mean = mean(&values);
            MetricGroup {
                fact_value,
                samples: values.len(),
                mean,
                stddev: sample_stddev(&values, mean),
            }
        })
        .collect())
}

/// Run the full comparison pipeline against a database snapshot.
///
/// # Errors
///
/// Any failure from [`validate_selection`] or [`group_by_fact`], unmodified.
pub fn compare(
    db: &Db,
    facts_eq: &BTreeMap<String, FactValue>,
    experiment_fact: &str,
    metric: &str,
) -> Result<Vec<MetricGroup>> {
    let filtered = filter_results(db.results(), facts_eq);
    validate_selection(&db.fact_names(), facts_eq, experiment_fact, &filtered)?;
    group_by_fact(&filtered, metric, experiment_fact)
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample (n-1 denominator) standard deviation; `NaN` below two samples.
fn sample_stddev(values: &[f64], mean: f64) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let sum_sq: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    (sum_sq / (values.len() - 1) as f64).sqrt()
}
