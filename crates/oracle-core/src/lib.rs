//! Differential-testing oracle for the Roth Forth compiler
//!
//! Golden outputs are produced once by a trusted reference implementation and
//! every later build of the implementation under test is checked against them.
//!
//! - [`process`]: run an external tool with a hard wall-clock timeout
//! - [`corpus`]: discover source programs in deterministic order
//! - [`golden`]: the sibling-file store for expected stdout/stderr
//! - [`reference`]: regenerate golden artifacts from the reference tool
//! - [`verify`]: compare the implementation under test against the goldens
//! - [`diff`]: line diffs for reporting mismatches
//!
//! Everything runs sequentially; each invocation is its own process.

pub mod corpus;
pub mod diff;
pub mod error;
pub mod golden;
pub mod process;
pub mod reference;
pub mod verify;

pub use corpus::{Corpus, TestCase};
pub use error::{OracleError, OracleResult};
pub use golden::{GoldenPaths, GoldenRecord, GoldenStore};
pub use process::{
    ExecutionResult, FailureKind, Invocation, ProcessRunner, SystemRunner, ToolCommand,
};
pub use reference::{GeneratedCase, GenerationReport, ReferenceGenerator};
pub use verify::{Comparator, ExitPolarity, Mismatch, Stream, VerificationReport, Verdict};
