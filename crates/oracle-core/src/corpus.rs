//! Corpus discovery - find source programs under a root directory

use crate::error::{OracleError, OracleResult};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// One source program; its path is its identity
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TestCase {
    source: PathBuf,
}

impl TestCase {
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    /// File name used in reports (e.g. "add.fs")
    pub fn name(&self) -> String {
        self.source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.source.display().to_string())
    }
}

/// Ordered set of test cases, fixed for the duration of a run
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    root: PathBuf,
    cases: Vec<TestCase>,
}

impl Corpus {
    /// Recursively collect every `*.{extension}` file under `root`, sorted by path
    ///
    /// Finding nothing is not an error here; see [`Corpus::discover`].
    pub fn scan(root: &Path, extension: &str) -> Self {
        let mut cases: Vec<TestCase> = WalkDir::new(root)
            .follow_links(true)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| entry.path().extension() == Some(OsStr::new(extension)))
            .map(|entry| TestCase::new(entry.into_path()))
            .collect();

        cases.sort();

        Self {
            root: root.to_path_buf(),
            cases,
        }
    }

    /// Scan, treating a missing root or an empty result as fatal
    pub fn discover(root: &Path, extension: &str) -> OracleResult<Self> {
        if !root.is_dir() {
            return Err(OracleError::CorpusAbsent {
                root: root.to_path_buf(),
                reason: "directory does not exist".to_string(),
            });
        }

        let corpus = Self::scan(root, extension);
        if corpus.is_empty() {
            return Err(OracleError::CorpusAbsent {
                root: root.to_path_buf(),
                reason: format!("no .{} files found", extension),
            });
        }

        Ok(corpus)
    }

    /// Keep cases whose path below the root contains `pattern`
    pub fn filter(&self, pattern: &str) -> Self {
        Self {
            root: self.root.clone(),
            cases: self
                .cases
                .iter()
                .filter(|case| {
                    let relative = case.source.strip_prefix(&self.root).unwrap_or(&case.source);
                    relative.to_string_lossy().contains(pattern)
                })
                .cloned()
                .collect(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn cases(&self) -> &[TestCase] {
        &self.cases
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TestCase> {
        self.cases.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }
}

impl<'a> IntoIterator for &'a Corpus {
    type Item = &'a TestCase;
    type IntoIter = std::slice::Iter<'a, TestCase>;

    fn into_iter(self) -> Self::IntoIter {
        self.cases.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    fn names(corpus: &Corpus, root: &Path) -> Vec<String> {
        corpus
            .iter()
            .map(|c| {
                c.source()
                    .strip_prefix(root)
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect()
    }

    #[test]
    fn test_scan_recursive_and_sorted() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("loops/nested")).unwrap();
        fs::write(root.join("zeta.fs"), "1 .").unwrap();
        fs::write(root.join("alpha.fs"), "2 .").unwrap();
        fs::write(root.join("loops/do.fs"), "3 .").unwrap();
        fs::write(root.join("loops/nested/deep.fs"), "4 .").unwrap();
        fs::write(root.join("alpha_stdout.txt"), "2 ").unwrap();
        fs::write(root.join("notes.md"), "not a test").unwrap();

        let corpus = Corpus::scan(root, "fs");

        assert_eq!(
            names(&corpus, root),
            vec!["alpha.fs", "loops/do.fs", "loops/nested/deep.fs", "zeta.fs"]
        );
    }

    #[test]
    fn test_scan_is_reproducible() {
        let dir = tempdir().unwrap();
        for name in ["c.fs", "a.fs", "b.fs"] {
            fs::write(dir.path().join(name), "").unwrap();
        }

        let first = Corpus::scan(dir.path(), "fs");
        let second = Corpus::scan(dir.path(), "fs");
        assert_eq!(first.cases(), second.cases());
    }

    #[test]
    fn test_scan_empty_is_not_an_error() {
        let dir = tempdir().unwrap();
        let corpus = Corpus::scan(dir.path(), "fs");
        assert!(corpus.is_empty());
    }

    #[test]
    fn test_discover_empty_directory_is_fatal() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("readme.txt"), "").unwrap();

        let err = Corpus::discover(dir.path(), "fs").unwrap_err();
        assert!(err.is_corpus_absent());
        assert!(err.to_string().contains("no .fs files found"));
    }

    #[test]
    fn test_discover_missing_root_is_fatal() {
        let dir = tempdir().unwrap();
        let err = Corpus::discover(&dir.path().join("test_source"), "fs").unwrap_err();
        assert!(err.is_corpus_absent());
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_filter() {
        let corpus = Corpus {
            root: PathBuf::from("test_source"),
            cases: vec![
                TestCase::new("test_source/arith/add.fs"),
                TestCase::new("test_source/arith/sub.fs"),
                TestCase::new("test_source/loops/do.fs"),
            ],
        };

        let filtered = corpus.filter("arith");
        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered.cases()[0].name(), "add.fs");
        assert!(corpus.filter("nothing").is_empty());
    }
}
