//! Plain-text table rendering for the CLI
//!
//! Thin presentation layer: everything here takes already-computed data and
//! produces an aligned, human-readable table. No aggregation logic lives
//! here.

use std::collections::BTreeSet;

use crate::compare::MetricGroup;
use crate::db::Db;

/// Render the comparison output: one row per experiment-fact value.
#[must_use]
pub fn render_groups(experiment_fact: &str, metric: &str, groups: &[MetricGroup]) -> String {
    let header = vec![
        experiment_fact.to_string(),
        "samples".to_string(),
        format!("mean({metric})"),
        "std".to_string(),
    ];
    let rows = groups
        .iter()
        .map(|g| {
            vec![
                g.fact_value.to_string(),
                g.samples.to_string(),
                format_float(g.mean),
                format_float(g.stddev),
            ]
        })
        .collect();
    render_table(&header, rows)
}

/// Render the `ls-results` view: one row per result, one column per extant
/// fact. Cells for absent facts stay blank.
#[must_use]
pub fn render_results(db: &Db) -> String {
    let fact_names: BTreeSet<String> = db.fact_names();

    let mut header = vec!["result_id".to_string()];
    header.extend(fact_names.iter().cloned());

    let rows = db
        .results()
        .map(|result| {
            let mut row = vec![result.result_id().to_string()];
            row.extend(fact_names.iter().map(|name| {
                let value = result.fact(name);
                if value.is_absent() {
                    String::new()
                } else {
                    value.to_string()
                }
            }));
            row
        })
        .collect();
    render_table(&header, rows)
}

/// Render the `ls-metrics` view: the flattened (result, metric, value) rows.
#[must_use]
pub fn render_metrics(db: &Db) -> String {
    let header = vec![
        "result_id".to_string(),
        "metric".to_string(),
        "value".to_string(),
    ];
    let rows = db
        .flat_rows()
        .into_iter()
        .map(|row| vec![row.result_id, row.metric, format_float(row.value)])
        .collect();
    render_table(&header, rows)
}

fn format_float(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else {
        format!("{value:.4}")
    }
}

/// Pad every column to its widest cell.
fn render_table(header: &[String], rows: Vec<Vec<String>>) -> String {
    let mut widths: Vec<usize> = header.iter().map(String::len).collect();
    for row in &rows {
        for (i, cell) in row.iter().enumerate() {
            if cell.len() > widths[i] {
                widths[i] = cell.len();
            }
        }
    }

    let render_row = |cells: &[String]| -> String {
        let padded: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect();
        padded.join("  ").trim_end().to_string()
    };

    let mut out = String::new();
    out.push_str(&render_row(header));
    out.push('\n');
    let separator: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&render_row(&separator));
    out.push('\n');
    for row in &rows {
        out.push_str(&render_row(row));
        out.push('\n');
    }
    out
}
