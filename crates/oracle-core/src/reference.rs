//! Golden generation from the reference implementation

use crate::corpus::{Corpus, TestCase};
use crate::golden::{GoldenPaths, GoldenRecord, GoldenStore};
use crate::process::{FailureKind, ProcessRunner, ToolCommand};
use std::time::Duration;
use tracing::warn;

/// Outcome of regenerating one case
#[derive(Debug, Clone)]
pub struct GeneratedCase {
    pub case: TestCase,
    /// Reference exit code; non-zero is a legitimate golden, not a failure
    pub exit_code: i32,
    pub failure: Option<FailureKind>,
    pub duration: Duration,
    /// Where the pair was written, or why it could not be
    pub written: Result<GoldenPaths, String>,
}

impl GeneratedCase {
    pub fn reference_failed(&self) -> bool {
        self.exit_code != 0
    }

    pub fn write_failed(&self) -> bool {
        self.written.is_err()
    }
}

/// Best-effort summary of a generation pass
#[derive(Debug, Clone, Default)]
pub struct GenerationReport {
    pub cases: Vec<GeneratedCase>,
}

impl GenerationReport {
    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    /// Cases whose reference run exited non-zero
    pub fn nonzero_exits(&self) -> usize {
        self.cases.iter().filter(|c| c.reference_failed()).count()
    }

    pub fn write_failures(&self) -> Vec<&GeneratedCase> {
        self.cases.iter().filter(|c| c.write_failed()).collect()
    }

    /// Every golden pair was written
    pub fn is_complete(&self) -> bool {
        self.cases.iter().all(|c| !c.write_failed())
    }

    pub fn total_duration(&self) -> Duration {
        self.cases.iter().map(|c| c.duration).sum()
    }
}

/// Runs the reference tool over a corpus and records its output as goldens
pub struct ReferenceGenerator<R> {
    runner: R,
    command: ToolCommand,
    store: GoldenStore,
}

impl<R: ProcessRunner> ReferenceGenerator<R> {
    pub fn new(runner: R, command: ToolCommand, store: GoldenStore) -> Self {
        Self {
            runner,
            command,
            store,
        }
    }

    pub fn generate(&self, corpus: &Corpus) -> GenerationReport {
        self.generate_with(corpus, |_| {})
    }

    /// Generate in corpus order, calling `on_case` after each case is written
    pub fn generate_with<F>(&self, corpus: &Corpus, mut on_case: F) -> GenerationReport
    where
        F: FnMut(&GeneratedCase),
    {
        let mut report = GenerationReport::default();
        for case in corpus {
            let generated = self.generate_one(case);
            on_case(&generated);
            report.cases.push(generated);
        }
        report
    }

    pub fn generate_one(&self, case: &TestCase) -> GeneratedCase {
        let invocation = self.command.invocation_for(case.source());
        let result = self.runner.run(&invocation);

        if result.exit_code != 0 {
            warn!(
                case = %case.source().display(),
                exit_code = result.exit_code,
                "reference returned non-zero exit code"
            );
        }

        let record = GoldenRecord::new(result.stdout, result.stderr);
        let written = self.store.store(case, &record).map_err(|e| {
            warn!(case = %case.source().display(), error = %e, "failed to write goldens");
            e.to_string()
        });

        GeneratedCase {
            case: case.clone(),
            exit_code: result.exit_code,
            failure: result.failure,
            duration: result.duration,
            written,
        }
    }
}
