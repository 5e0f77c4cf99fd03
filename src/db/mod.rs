//! Result database: a directory of content-addressed result directories
//!
//! The database root contains one directory per result, named
//! `"{test_name}:{short_hash}"`. Each result directory holds the imported
//! files under `artifacts/` and an optional `result.json` sidecar carrying
//! the parsed facts and metrics:
//!
//! ```json
//! {
//!   "facts": { "os": "linux", "num_cpus": 8 },
//!   "metrics": [ { "name": "latency", "value": 10.0 } ]
//! }
//! ```
//!
//! ## Snapshot contract
//!
//! [`Db::read`] loads everything once, at process start. The snapshot is
//! read-only for the rest of the invocation: an import performed by this or
//! another process is only visible after re-reading. A long-running service
//! would need explicit reload, which is out of scope here.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::model::{FactValue, FlatRow, Metric, ResultRecord};

/// Name of the per-result metadata sidecar.
pub const SIDECAR_FILE: &str = "result.json";

/// Parsed form of a `result.json` sidecar. Both fields are optional so a
/// facts-only or metrics-only sidecar stays valid.
#[derive(Debug, Default, Deserialize)]
struct Sidecar {
    #[serde(default)]
    facts: BTreeMap<String, FactValue>,
    #[serde(default)]
    metrics: Vec<Metric>,
}

/// In-memory snapshot of a result database.
#[derive(Debug)]
pub struct Db {
    root: PathBuf,
    results: BTreeMap<String, ResultRecord>,
}

impl Db {
    /// Read every result under `root` into memory.
    ///
    /// Non-directories at the root are skipped (stray files are not results).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidResultDir`] for a child directory whose name
    /// does not split into non-empty `test_name:result_id` halves,
    /// [`Error::Metadata`] for a malformed sidecar, and [`Error::Io`] when
    /// the root or a sidecar cannot be read.
    pub fn read(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let entries = fs::read_dir(&root).map_err(|e| Error::io(&root, e))?;

        let mut results = BTreeMap::new();
        for entry in entries {
            let entry = entry.map_err(|e| Error::io(&root, e))?;
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let result = read_result(&path)?;
            results.insert(result.result_id().to_string(), result);
        }

        tracing::debug!(
            root = %root.display(),
            results = results.len(),
            "loaded result database"
        );
        Ok(Self { root, results })
    }

    /// The database root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Number of results in the snapshot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Whether the snapshot holds no results.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Iterate over the results, ordered by result ID.
    pub fn results(&self) -> impl Iterator<Item = &ResultRecord> {
        self.results.values()
    }

    /// Union of fact names across all results.
    ///
    /// A fact is "extant" if any result carries it; it need not be present
    /// on every result.
    #[must_use]
    pub fn fact_names(&self) -> BTreeSet<String> {
        self.results
            .values()
            .flat_map(|r| r.facts().keys().cloned())
            .collect()
    }

    /// Union of metric names across all results.
    #[must_use]
    pub fn metric_names(&self) -> BTreeSet<String> {
        self.results
            .values()
            .flat_map(|r| r.metrics().iter().map(|m| m.name().to_string()))
            .collect()
    }

    /// Flatten every (result, metric sample) pair into one row.
    #[must_use]
    pub fn flat_rows(&self) -> Vec<FlatRow> {
        self.results
            .values()
            .flat_map(|r| {
                r.metrics().iter().map(|m| FlatRow {
                    result_id: r.result_id().to_string(),
                    metric: m.name().to_string(),
                    value: m.value(),
                })
            })
            .collect()
    }
}

/// Load one result from its directory, including the sidecar if present.
fn read_result(result_dir: &Path) -> Result<ResultRecord> {
    let dir_name = result_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let (test_name, short_hash) = dir_name
        .split_once(':')
        .ok_or_else(|| Error::InvalidResultDir(dir_name.clone()))?;
    if test_name.is_empty() || short_hash.is_empty() {
        return Err(Error::InvalidResultDir(dir_name.clone()));
    }

    let mut result = ResultRecord::new(test_name, dir_name.as_str());

    let sidecar_path = result_dir.join(SIDECAR_FILE);
    match fs::read(&sidecar_path) {
        Ok(bytes) => {
            let sidecar: Sidecar =
                serde_json::from_slice(&bytes).map_err(|source| Error::Metadata {
                    path: sidecar_path,
                    source,
                })?;
            result.set_data(sidecar.facts, sidecar.metrics);
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!(
                result = %dir_name,
                "no {SIDECAR_FILE} sidecar, result has no facts or metrics"
            );
        }
        Err(e) => return Err(Error::io(sidecar_path, e)),
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_result(root: &Path, dir_name: &str, sidecar: Option<&str>) {
        let dir = root.join(dir_name);
        fs::create_dir_all(dir.join("artifacts")).unwrap();
        if let Some(json) = sidecar {
            fs::write(dir.join(SIDECAR_FILE), json).unwrap();
        }
    }

    #[test]
    fn test_read_empty_db() {
        let tmp = tempfile::tempdir().unwrap();
        let db = Db::read(tmp.path()).unwrap();
        assert!(db.is_empty());
        assert!(db.fact_names().is_empty());
    }

    #[test]
    fn test_read_result_with_sidecar() {
        let tmp = tempfile::tempdir().unwrap();
        write_result(
            tmp.path(),
            "bench:0123456789ab",
            Some(r#"{"facts": {"os": "linux"}, "metrics": [{"name": "latency", "value": 10}]}"#),
        );

        let db = Db::read(tmp.path()).unwrap();
        assert_eq!(db.len(), 1);
        let result = db.results().next().unwrap();
        assert_eq!(result.test_name(), "bench");
        assert_eq!(result.result_id(), "bench:0123456789ab");
        assert_eq!(result.fact("os"), &FactValue::from("linux"));
        assert_eq!(result.metrics()[0].value(), 10.0);
    }

    #[test]
    fn test_missing_sidecar_is_empty_result() {
        let tmp = tempfile::tempdir().unwrap();
        write_result(tmp.path(), "bench:0123456789ab", None);

        let db = Db::read(tmp.path()).unwrap();
        let result = db.results().next().unwrap();
        assert!(result.facts().is_empty());
        assert!(result.metrics().is_empty());
    }

    #[test]
    fn test_invalid_dir_name_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir(tmp.path().join("no-separator")).unwrap();

        let err = Db::read(tmp.path()).unwrap_err();
        assert!(matches!(err, Error::InvalidResultDir(name) if name == "no-separator"));
    }

    #[test]
    fn test_stray_files_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("README"), "not a result").unwrap();
        write_result(tmp.path(), "bench:0123456789ab", None);

        let db = Db::read(tmp.path()).unwrap();
        assert_eq!(db.len(), 1);
    }

    #[test]
    fn test_malformed_sidecar_names_file() {
        let tmp = tempfile::tempdir().unwrap();
        write_result(tmp.path(), "bench:0123456789ab", Some("{not json"));

        let err = Db::read(tmp.path()).unwrap_err();
        match err {
            Error::Metadata { path, .. } => {
                assert!(path.ends_with(Path::new("bench:0123456789ab").join(SIDECAR_FILE)));
            }
            other => panic!("expected Metadata error, got {other:?}"),
        }
    }

    #[test]
    fn test_fact_names_are_union() {
        let tmp = tempfile::tempdir().unwrap();
        write_result(
            tmp.path(),
            "a:000000000001",
            Some(r#"{"facts": {"os": "linux"}}"#),
        );
        write_result(
            tmp.path(),
            "b:000000000002",
            Some(r#"{"facts": {"variant": "A"}}"#),
        );

        let db = Db::read(tmp.path()).unwrap();
        let names = db.fact_names();
        assert!(names.contains("os"));
        assert!(names.contains("variant"));
        assert_eq!(names.len(), 2);
    }

    #[test]
    fn test_flat_rows_one_per_sample() {
        let tmp = tempfile::tempdir().unwrap();
        write_result(
            tmp.path(),
            "bench:0123456789ab",
            Some(
                r#"{"metrics": [{"name": "latency", "value": 10},
                               {"name": "latency", "value": 12},
                               {"name": "rss", "value": 4096}]}"#,
            ),
        );

        let db = Db::read(tmp.path()).unwrap();
        let rows = db.flat_rows();
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| r.result_id == "bench:0123456789ab"));
    }
}
