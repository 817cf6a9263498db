//! Oracle error types
//!
//! Only infrastructure failures are errors. A tool that times out or cannot be
//! found degrades into a synthetic [`ExecutionResult`](crate::ExecutionResult),
//! and output mismatches are [`Mismatch`](crate::Mismatch) values on a verdict.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OracleError {
    /// Root directory missing, or no source files under it. Fatal for a run.
    #[error("Corpus absent at {}: {reason}", root.display())]
    CorpusAbsent { root: PathBuf, reason: String },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl OracleError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        OracleError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn is_corpus_absent(&self) -> bool {
        matches!(self, OracleError::CorpusAbsent { .. })
    }
}

pub type OracleResult<T> = Result<T, OracleError>;
