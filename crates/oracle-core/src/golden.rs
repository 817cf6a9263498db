//! Golden artifact store
//!
//! Expected output for `dir/name.fs` lives next to it as
//! `dir/name_stdout.txt` and `dir/name_stderr.txt`. A missing file means
//! "expect nothing on that stream".

use crate::corpus::TestCase;
use crate::error::{OracleError, OracleResult};
use oracle_config::settings::{DEFAULT_STDERR_SUFFIX, DEFAULT_STDOUT_SUFFIX};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Expected stdout/stderr for one test case
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GoldenRecord {
    pub stdout: String,
    pub stderr: String,
}

impl GoldenRecord {
    pub fn new(stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }
}

/// Locations of a case's two golden files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoldenPaths {
    pub stdout: PathBuf,
    pub stderr: PathBuf,
}

/// Maps test cases to their golden files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoldenStore {
    stdout_suffix: String,
    stderr_suffix: String,
}

impl Default for GoldenStore {
    fn default() -> Self {
        Self::new(DEFAULT_STDOUT_SUFFIX, DEFAULT_STDERR_SUFFIX)
    }
}

impl GoldenStore {
    pub fn new(stdout_suffix: impl Into<String>, stderr_suffix: impl Into<String>) -> Self {
        Self {
            stdout_suffix: stdout_suffix.into(),
            stderr_suffix: stderr_suffix.into(),
        }
    }

    pub fn paths(&self, case: &TestCase) -> GoldenPaths {
        let source = case.source();
        let dir = source.parent().unwrap_or_else(|| Path::new(""));
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        GoldenPaths {
            stdout: dir.join(format!("{}{}", stem, self.stdout_suffix)),
            stderr: dir.join(format!("{}{}", stem, self.stderr_suffix)),
        }
    }

    /// Read both golden files; a missing file reads as empty
    pub fn load(&self, case: &TestCase) -> OracleResult<GoldenRecord> {
        let paths = self.paths(case);
        Ok(GoldenRecord {
            stdout: read_or_empty(&paths.stdout)?,
            stderr: read_or_empty(&paths.stderr)?,
        })
    }

    /// Overwrite both golden files for `case`
    ///
    /// Both files are staged in the target directory before either is moved
    /// into place. If the second move fails the first file is rolled back, so
    /// a failed write leaves the previous pair untouched.
    pub fn store(&self, case: &TestCase, record: &GoldenRecord) -> OracleResult<GoldenPaths> {
        let paths = self.paths(case);

        let staged_stdout = stage(&paths.stdout, record.stdout.as_bytes())?;
        let staged_stderr = stage(&paths.stderr, record.stderr.as_bytes())?;
        let previous_stdout = read_previous(&paths.stdout)?;

        staged_stdout
            .persist(&paths.stdout)
            .map_err(|e| OracleError::io(&paths.stdout, e.error))?;

        if let Err(e) = staged_stderr.persist(&paths.stderr) {
            restore(&paths.stdout, previous_stdout.as_deref())?;
            return Err(OracleError::io(&paths.stderr, e.error));
        }

        Ok(paths)
    }
}

/// Current contents of a golden file, `None` if it does not exist yet
fn read_previous(path: &Path) -> OracleResult<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(OracleError::io(path, e)),
    }
}

/// Put back what `read_previous` saw
fn restore(path: &Path, previous: Option<&[u8]>) -> OracleResult<()> {
    match previous {
        Some(bytes) => stage(path, bytes)?
            .persist(path)
            .map(|_| ())
            .map_err(|e| OracleError::io(path, e.error)),
        None => fs::remove_file(path).map_err(|e| OracleError::io(path, e)),
    }
}

fn read_or_empty(path: &Path) -> OracleResult<String> {
    match fs::read(path) {
        Ok(bytes) => Ok(String::from_utf8_lossy(&bytes).into_owned()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(String::new()),
        Err(e) => Err(OracleError::io(path, e)),
    }
}

fn stage(target: &Path, contents: &[u8]) -> OracleResult<NamedTempFile> {
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut staged = NamedTempFile::new_in(dir).map_err(|e| OracleError::io(dir, e))?;
    staged
        .write_all(contents)
        .and_then(|_| staged.flush())
        .map_err(|e| OracleError::io(target, e))?;
    Ok(staged)
}
