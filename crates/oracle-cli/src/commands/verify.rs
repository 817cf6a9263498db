//! Verify command - check the compiler under test against the goldens

use crate::config::{CorpusOverrides, RunConfig};
use crate::testing::{CaseProgress, VerifyReporter};
use anyhow::{Context, Result};
use colored::*;
use oracle_core::{Comparator, SystemRunner, VerificationReport};
use std::io::{self, Write};

/// Arguments for the verify command
#[derive(Debug, Clone)]
pub struct VerifyArgs {
    pub corpus: CorpusOverrides,
    /// One line per case instead of dots
    pub verbose: bool,
    /// Output in JSON format
    pub json: bool,
    /// Context lines shown around each diff hunk
    pub context: usize,
}

impl Default for VerifyArgs {
    fn default() -> Self {
        Self {
            corpus: CorpusOverrides::default(),
            verbose: false,
            json: false,
            context: 3,
        }
    }
}

/// Run the verify command
pub fn run(args: VerifyArgs) -> Result<bool> {
    let config = RunConfig::load(&args.corpus)?;
    execute(&config, &args)
}

pub fn execute(config: &RunConfig, args: &VerifyArgs) -> Result<bool> {
    let corpus = config.corpus()?;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    if !args.json {
        writeln!(
            out,
            "Verifying {} test file{}",
            corpus.len().to_string().bold(),
            if corpus.len() == 1 { "" } else { "s" }
        )?;
        writeln!(out)?;
    }

    let comparator = Comparator::new(
        SystemRunner::new(),
        config.under_test.clone(),
        config.store.clone(),
    );
    let reporter = VerifyReporter::new(args.verbose).with_context(args.context);
    let progress = CaseProgress::new(corpus.len(), !args.verbose && !args.json);

    let mut live = Ok(());
    let report = comparator.verify_with(&corpus, |verdict| {
        progress.tick(&verdict.case.name());
        if live.is_ok() && !args.json {
            live = reporter.print_verdict(&mut out, verdict);
        }
    });
    progress.finish();
    live.context("Failed to write verification output")?;

    if args.json {
        writeln!(out, "{}", summary_json(&report))?;
    } else {
        reporter.report(&mut out, &report)?;
    }

    Ok(report.passed())
}

fn summary_json(report: &VerificationReport) -> serde_json::Value {
    let results: Vec<_> = report
        .verdicts
        .iter()
        .map(|v| {
            serde_json::json!({
                "file": v.case.source().display().to_string(),
                "passed": v.is_pass(),
                "timed_out": v.timed_out(),
                "exit_code": v.execution.exit_code,
                "reasons": v.mismatches.iter().map(|m| m.to_string()).collect::<Vec<_>>(),
                "duration_ms": v.execution.duration.as_millis(),
            })
        })
        .collect();

    serde_json::json!({
        "tests": report.len(),
        "passed": report.pass_count(),
        "failed": report.fail_count(),
        "results": results,
    })
}
