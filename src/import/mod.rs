//! Content-addressed result import
//!
//! Importing computes a SHA-256 digest of every input file, hashes the
//! digests together (digest-of-digests), and creates a fresh result
//! directory named `"{test_name}:{first 12 hex chars}"`. Identical artifact
//! sets under the same test name therefore collide on the directory name:
//! the second import fails with [`Error::ResultExists`] instead of silently
//! overwriting anything.
//!
//! Within a walked directory, files are visited in sorted file-name order so
//! the aggregate digest does not depend on filesystem enumeration order. The
//! order *across* separate command-line inputs is argument order and is not
//! canonicalized (known limitation: `import t a b` and `import t b a` hash
//! differently).

use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use walkdir::WalkDir;

use crate::error::{Error, Result};

/// Length of the short hash in the result directory name.
const SHORT_HASH_LEN: usize = 12;

/// One file to import: where it lives now, and where it lands relative to
/// the result's `artifacts/` directory.
#[derive(Debug)]
struct ArtifactEntry {
    source: PathBuf,
    relative: PathBuf,
}

/// Import a result into the database at `db_root`.
///
/// Plain files land at the root of the artifact tree under their base name;
/// directories are copied recursively, preserving their structure. Returns
/// the newly created result directory.
///
/// Duplicate or overlapping inputs overwrite each other silently, last write
/// wins. That mirrors the upstream behavior and is pinned by a test rather
/// than promised as a contract.
///
/// # Errors
///
/// [`Error::ResultExists`] if the target result directory already exists,
/// [`Error::Io`] when an input cannot be read or a copy fails.
pub fn import_result(db_root: &Path, test_name: &str, paths: &[PathBuf]) -> Result<PathBuf> {
    let entries = enumerate_artifacts(paths)?;
    let short_hash = hash_artifacts(&entries)?;

    let result_dir = db_root.join(format!("{test_name}:{short_hash}"));
    // Non-recursive create: an existing directory is the at-most-once-import
    // signal, not something to merge into.
    match fs::create_dir(&result_dir) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
            return Err(Error::ResultExists(result_dir));
        }
        Err(e) => return Err(Error::io(&result_dir, e)),
    }

    let artifacts_dir = result_dir.join("artifacts");
    let mut num_copied = 0usize;
    for entry in &entries {
        let dest = artifacts_dir.join(&entry.relative);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
        fs::copy(&entry.source, &dest).map_err(|e| Error::io(&entry.source, e))?;
        num_copied += 1;
    }

    tracing::info!(
        artifacts = num_copied,
        result_dir = %result_dir.display(),
        "imported result"
    );
    Ok(result_dir)
}

/// Expand the input paths into (source, destination-relative) pairs.
///
/// Directory inputs walk recursively with each file keyed by its path
/// relative to the walked root; file inputs are keyed by their base name.
fn enumerate_artifacts(paths: &[PathBuf]) -> Result<Vec<ArtifactEntry>> {
    let mut entries = Vec::new();
    for input in paths {
        let meta = fs::metadata(input).map_err(|e| Error::io(input, e))?;
        if meta.is_dir() {
            for walked in WalkDir::new(input).sort_by_file_name() {
                let walked = walked.map_err(|e| {
                    let path = e.path().unwrap_or(input).to_path_buf();
                    Error::io(path, e.into())
                })?;
                if !walked.file_type().is_file() {
                    continue;
                }
                let relative = walked
                    .path()
                    .strip_prefix(input)
                    .expect("walked path is under its root")
                    .to_path_buf();
                entries.push(ArtifactEntry {
                    source: walked.path().to_path_buf(),
                    relative,
                });
            }
        } else {
            let base = input
                .file_name()
                .map_or_else(|| input.clone(), PathBuf::from);
            entries.push(ArtifactEntry {
                source: input.clone(),
                relative: base,
            });
        }
    }
    Ok(entries)
}

/// Digest-of-digests over the artifact contents, truncated to the short
/// hash used in the result directory name.
fn hash_artifacts(entries: &[ArtifactEntry]) -> Result<String> {
    let mut aggregate = Sha256::new();
    for entry in entries {
        let bytes = fs::read(&entry.source).map_err(|e| Error::io(&entry.source, e))?;
        aggregate.update(Sha256::digest(&bytes));
    }
    let digest = hex::encode(aggregate.finalize());
    Ok(digest[..SHORT_HASH_LEN].to_string())
}
