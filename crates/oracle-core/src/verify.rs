//! Verdict engine - check the implementation under test against the goldens
//!
//! Each stream is compared after trimming surrounding whitespace. The
//! expected exit code is not recorded anywhere; it is inferred from the golden
//! stderr (see [`ExitPolarity`]).

use crate::corpus::{Corpus, TestCase};
use crate::golden::{GoldenRecord, GoldenStore};
use crate::process::{ExecutionResult, ProcessRunner, ToolCommand};
use std::fmt;
use std::time::Duration;
use tracing::debug;

/// Output stream being compared
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Stdout,
    Stderr,
}

impl fmt::Display for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stream::Stdout => write!(f, "stdout"),
            Stream::Stderr => write!(f, "stderr"),
        }
    }
}

/// Required sign of the exit code
///
/// Inferred heuristically: a golden stderr mentioning "error" (any case)
/// means the program is expected to fail. A harmless message that happens to
/// contain the word is misclassified; the rule is kept as-is for
/// compatibility with the existing goldens and is not authoritative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitPolarity {
    Zero,
    NonZero,
}

impl ExitPolarity {
    pub fn expected_from(golden_stderr: &str) -> Self {
        let stderr = normalize(golden_stderr);
        if !stderr.is_empty() && stderr.to_lowercase().contains("error") {
            ExitPolarity::NonZero
        } else {
            ExitPolarity::Zero
        }
    }

    pub fn admits(self, exit_code: i32) -> bool {
        match self {
            ExitPolarity::Zero => exit_code == 0,
            ExitPolarity::NonZero => exit_code != 0,
        }
    }
}

impl fmt::Display for ExitPolarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitPolarity::Zero => write!(f, "zero"),
            ExitPolarity::NonZero => write!(f, "non-zero"),
        }
    }
}

/// One reason a case failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mismatch {
    /// Normalized output differs from the golden
    Content {
        stream: Stream,
        expected: String,
        actual: String,
    },
    /// Exit code has the wrong sign
    ExitPolarity {
        expected: ExitPolarity,
        actual_code: i32,
    },
    /// Golden file exists but could not be read
    GoldenUnreadable { message: String },
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mismatch::Content { stream, .. } => write!(f, "{} mismatch", stream),
            Mismatch::ExitPolarity {
                expected,
                actual_code,
            } => write!(
                f,
                "expected {} exit code, got {}",
                expected, actual_code
            ),
            Mismatch::GoldenUnreadable { message } => {
                write!(f, "golden output unreadable: {}", message)
            }
        }
    }
}

/// Pass/fail outcome for one case
#[derive(Debug, Clone)]
pub struct Verdict {
    pub case: TestCase,
    /// Empty on pass; otherwise every reason that applies
    pub mismatches: Vec<Mismatch>,
    pub execution: ExecutionResult,
}

impl Verdict {
    pub fn is_pass(&self) -> bool {
        self.mismatches.is_empty()
    }

    pub fn is_fail(&self) -> bool {
        !self.is_pass()
    }

    pub fn timed_out(&self) -> bool {
        self.execution.timed_out()
    }
}

/// Aggregate of a verification pass
#[derive(Debug, Clone, Default)]
pub struct VerificationReport {
    pub verdicts: Vec<Verdict>,
}

impl VerificationReport {
    /// True iff every case passed
    pub fn passed(&self) -> bool {
        self.verdicts.iter().all(Verdict::is_pass)
    }

    pub fn pass_count(&self) -> usize {
        self.verdicts.iter().filter(|v| v.is_pass()).count()
    }

    pub fn fail_count(&self) -> usize {
        self.verdicts.iter().filter(|v| v.is_fail()).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &Verdict> {
        self.verdicts.iter().filter(|v| v.is_fail())
    }

    pub fn len(&self) -> usize {
        self.verdicts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.verdicts.is_empty()
    }

    pub fn total_duration(&self) -> Duration {
        self.verdicts.iter().map(|v| v.execution.duration).sum()
    }
}

/// Whitespace normalization applied to both sides before comparing
pub fn normalize(text: &str) -> &str {
    text.trim()
}

/// Compare one execution against its golden record
pub fn compare(golden: &GoldenRecord, actual: &ExecutionResult) -> Vec<Mismatch> {
    let mut mismatches = Vec::new();

    for (stream, expected, actual) in [
        (Stream::Stdout, &golden.stdout, &actual.stdout),
        (Stream::Stderr, &golden.stderr, &actual.stderr),
    ] {
        let (expected, actual) = (normalize(expected), normalize(actual));
        if expected != actual {
            mismatches.push(Mismatch::Content {
                stream,
                expected: expected.to_string(),
                actual: actual.to_string(),
            });
        }
    }

    let polarity = ExitPolarity::expected_from(&golden.stderr);
    if !polarity.admits(actual.exit_code) {
        mismatches.push(Mismatch::ExitPolarity {
            expected: polarity,
            actual_code: actual.exit_code,
        });
    }

    mismatches
}

/// Runs the implementation under test and judges it against the goldens
///
/// Holds the store read-only: a verification pass never writes goldens.
pub struct Comparator<R> {
    runner: R,
    command: ToolCommand,
    store: GoldenStore,
}

impl<R: ProcessRunner> Comparator<R> {
    pub fn new(runner: R, command: ToolCommand, store: GoldenStore) -> Self {
        Self {
            runner,
            command,
            store,
        }
    }

    pub fn verify(&self, corpus: &Corpus) -> VerificationReport {
        self.verify_with(corpus, |_| {})
    }

    /// Verify in corpus order, calling `on_verdict` as each case completes
    pub fn verify_with<F>(&self, corpus: &Corpus, mut on_verdict: F) -> VerificationReport
    where
        F: FnMut(&Verdict),
    {
        let mut report = VerificationReport::default();
        for case in corpus {
            let verdict = self.verify_one(case);
            on_verdict(&verdict);
            report.verdicts.push(verdict);
        }
        report
    }

    pub fn verify_one(&self, case: &TestCase) -> Verdict {
        let golden = self.store.load(case);
        let execution = self.runner.run(&self.command.invocation_for(case.source()));

        let mismatches = match &golden {
            Ok(record) => compare(record, &execution),
            Err(e) => vec![Mismatch::GoldenUnreadable {
                message: e.to_string(),
            }],
        };

        debug!(
            case = %case.source().display(),
            passed = mismatches.is_empty(),
            "verified"
        );

        Verdict {
            case: case.clone(),
            mismatches,
            execution,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::scripted::ScriptedRunner;
    use crate::process::FailureKind;
    use oracle_config::ToolSettings;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use rstest::rstest;
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    fn roth() -> ToolCommand {
        ToolCommand::under_test(&ToolSettings {
            program: "./target/debug/roth".to_string(),
            args: vec!["{file}".to_string(), "--run".to_string()],
            timeout_secs: 30,
        })
    }

    fn write_case(dir: &Path, name: &str, stdout: Option<&str>, stderr: Option<&str>) {
        fs::write(dir.join(format!("{}.fs", name)), "").unwrap();
        if let Some(out) = stdout {
            fs::write(dir.join(format!("{}_stdout.txt", name)), out).unwrap();
        }
        if let Some(err) = stderr {
            fs::write(dir.join(format!("{}_stderr.txt", name)), err).unwrap();
        }
    }

    #[rstest]
    #[case("", ExitPolarity::Zero)]
    #[case("   \n", ExitPolarity::Zero)]
    #[case("warning: redefined dup", ExitPolarity::Zero)]
    #[case("Error: stack underflow", ExitPolarity::NonZero)]
    #[case(":1: Undefined word ERROR-HANDLER", ExitPolarity::NonZero)]
    #[case("no errors here", ExitPolarity::NonZero)]
    fn test_exit_polarity_heuristic(#[case] stderr: &str, #[case] expected: ExitPolarity) {
        assert_eq!(ExitPolarity::expected_from(stderr), expected);
    }

    #[test]
    fn test_trailing_space_matches_after_trim() {
        let golden = GoldenRecord::new("5 ", "");
        let actual = ExecutionResult::completed("5", "", 0);
        assert!(compare(&golden, &actual).is_empty());
    }

    #[test]
    fn test_reports_every_reason() {
        let golden = GoldenRecord::new("5", "");
        let actual = ExecutionResult::completed("6", "Error: boom", 2);

        let mismatches = compare(&golden, &actual);
        assert_eq!(
            mismatches,
            vec![
                Mismatch::Content {
                    stream: Stream::Stdout,
                    expected: "5".to_string(),
                    actual: "6".to_string(),
                },
                Mismatch::Content {
                    stream: Stream::Stderr,
                    expected: String::new(),
                    actual: "Error: boom".to_string(),
                },
                Mismatch::ExitPolarity {
                    expected: ExitPolarity::Zero,
                    actual_code: 2,
                },
            ]
        );
    }

    #[test]
    fn test_polarity_mismatch_independent_of_content() {
        let golden = GoldenRecord::new("", "Error: stack underflow");
        let actual = ExecutionResult::completed("", "Error: stack underflow", 0);

        assert_eq!(
            compare(&golden, &actual),
            vec![Mismatch::ExitPolarity {
                expected: ExitPolarity::NonZero,
                actual_code: 0,
            }]
        );
    }

    #[test]
    fn test_scenario_add_and_print() {
        let dir = tempdir().unwrap();
        write_case(dir.path(), "add", Some("5 "), None);
        let corpus = Corpus::scan(dir.path(), "fs");

        let runner = ScriptedRunner::new().on("add.fs", ExecutionResult::completed("5", "", 0));
        let report = Comparator::new(&runner, roth(), GoldenStore::default()).verify(&corpus);

        assert!(report.passed());
        let calls = runner.calls.borrow();
        assert_eq!(calls[0].args[1], "--run");
    }

    #[test]
    fn test_unreadable_golden_fails_only_that_case() {
        let dir = tempdir().unwrap();
        write_case(dir.path(), "a", None, None);
        write_case(dir.path(), "b", None, None);
        fs::create_dir(dir.path().join("a_stdout.txt")).unwrap();
        let corpus = Corpus::scan(dir.path(), "fs");

        let runner = ScriptedRunner::new();
        let report = Comparator::new(&runner, roth(), GoldenStore::default()).verify(&corpus);

        assert!(matches!(
            report.verdicts[0].mismatches.as_slice(),
            [Mismatch::GoldenUnreadable { .. }]
        ));
        assert!(report.verdicts[1].is_pass());
    }

    #[test]
    fn test_missing_golden_same_as_empty() {
        let dir = tempdir().unwrap();
        write_case(dir.path(), "missing", None, None);
        write_case(dir.path(), "empty", Some(""), Some(""));
        let corpus = Corpus::scan(dir.path(), "fs");

        for actual in [
            ExecutionResult::completed("", "", 0),
            ExecutionResult::completed("out", "", 0),
            ExecutionResult::completed("", "", 1),
        ] {
            let runner = ScriptedRunner::new()
                .on("missing.fs", actual.clone())
                .on("empty.fs", actual);
            let report = Comparator::new(&runner, roth(), GoldenStore::default()).verify(&corpus);

            assert_eq!(report.len(), 2);
            assert_eq!(report.verdicts[0].mismatches, report.verdicts[1].mismatches);
        }
    }

    #[test]
    fn test_failure_isolated_to_its_case() {
        let dir = tempdir().unwrap();
        for name in ["a", "b", "c"] {
            write_case(dir.path(), name, Some("ok"), None);
        }
        let corpus = Corpus::scan(dir.path(), "fs");

        let good = ExecutionResult::completed("ok", "", 0);
        let runner = ScriptedRunner::new()
            .on("a.fs", good.clone())
            .on("b.fs", ExecutionResult::completed("wrong", "", 0))
            .on("c.fs", good);
        let report = Comparator::new(&runner, roth(), GoldenStore::default()).verify(&corpus);

        let outcomes: Vec<bool> = report.verdicts.iter().map(Verdict::is_pass).collect();
        assert_eq!(outcomes, vec![true, false, true]);
        assert!(!report.passed());
        assert_eq!(report.fail_count(), 1);
    }

    #[test]
    fn test_timeout_verdict() {
        let dir = tempdir().unwrap();
        write_case(dir.path(), "forever", Some(""), None);
        let corpus = Corpus::scan(dir.path(), "fs");

        let runner = ScriptedRunner::new().on(
            "forever.fs",
            ExecutionResult::synthetic(
                FailureKind::TimedOut,
                "Compiler timed out after 30 seconds",
            ),
        );
        let report = Comparator::new(&runner, roth(), GoldenStore::default()).verify(&corpus);

        let verdict = &report.verdicts[0];
        assert!(verdict.timed_out());
        assert_eq!(verdict.execution.exit_code, 1);
        assert!(verdict.mismatches.contains(&Mismatch::Content {
            stream: Stream::Stderr,
            expected: String::new(),
            actual: "Compiler timed out after 30 seconds".to_string(),
        }));
    }

    #[test]
    fn test_verify_never_writes_goldens() {
        let dir = tempdir().unwrap();
        write_case(dir.path(), "a", None, None);
        let corpus = Corpus::scan(dir.path(), "fs");

        let runner = ScriptedRunner::new().on("a.fs", ExecutionResult::completed("x", "y", 0));
        Comparator::new(&runner, roth(), GoldenStore::default()).verify(&corpus);

        assert!(!dir.path().join("a_stdout.txt").exists());
        assert!(!dir.path().join("a_stderr.txt").exists());
    }

    proptest! {
        #[test]
        fn prop_exit_polarity_law(stderr in ".{0,40}", code in -5i32..5) {
            let golden = GoldenRecord::new("", stderr.clone());
            let actual = ExecutionResult::completed("", stderr.clone(), code);
            let expects_failure = stderr.to_lowercase().contains("error");

            let polarity_failed = compare(&golden, &actual)
                .iter()
                .any(|m| matches!(m, Mismatch::ExitPolarity { .. }));
            prop_assert_eq!(polarity_failed, expects_failure == (code == 0));
        }

        #[test]
        fn prop_surrounding_whitespace_ignored(
            body in "[a-z0-9 ]{0,20}",
            lead in "[ \t\n]{0,3}",
            trail in "[ \t\n]{0,3}",
        ) {
            let golden = GoldenRecord::new(format!("{}{}{}", lead, body, trail), "");
            let actual = ExecutionResult::completed(body.trim(), "", 0);
            prop_assert!(compare(&golden, &actual).is_empty());
        }
    }
}
