//! Generate command - record golden outputs from the reference implementation

use crate::config::{CorpusOverrides, RunConfig};
use crate::testing::{CaseProgress, GenerateReporter};
use anyhow::{Context, Result};
use colored::*;
use oracle_core::{GenerationReport, ReferenceGenerator, SystemRunner};
use std::io::{self, Write};

/// Arguments for the generate command
#[derive(Debug, Clone, Default)]
pub struct GenerateArgs {
    pub corpus: CorpusOverrides,
    /// Print each case and its reference exit code
    pub verbose: bool,
    /// Output in JSON format
    pub json: bool,
}

/// Run the generate command
pub fn run(args: GenerateArgs) -> Result<bool> {
    let config = RunConfig::load(&args.corpus)?;
    execute(&config, &args)
}

pub fn execute(config: &RunConfig, args: &GenerateArgs) -> Result<bool> {
    let corpus = config.corpus()?;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    if !args.json {
        writeln!(
            out,
            "Found {} test file{}",
            corpus.len().to_string().bold(),
            if corpus.len() == 1 { "" } else { "s" }
        )?;
    }

    let generator = ReferenceGenerator::new(
        SystemRunner::new(),
        config.reference.clone(),
        config.store.clone(),
    );
    let reporter = GenerateReporter::new(args.verbose);
    let progress = CaseProgress::new(corpus.len(), !args.verbose && !args.json);

    let mut live = Ok(());
    let report = generator.generate_with(&corpus, |generated| {
        progress.tick(&generated.case.name());
        if live.is_ok() && !args.json {
            live = reporter.print_case(&mut out, generated);
        }
    });
    progress.finish();
    live.context("Failed to write generation output")?;

    if args.json {
        writeln!(out, "{}", summary_json(&report))?;
    } else {
        reporter.report(&mut out, &report)?;
    }

    Ok(report.is_complete())
}

fn summary_json(report: &GenerationReport) -> serde_json::Value {
    let cases: Vec<_> = report
        .cases
        .iter()
        .map(|c| {
            serde_json::json!({
                "file": c.case.source().display().to_string(),
                "exit_code": c.exit_code,
                "written": c.written.is_ok(),
                "error": c.written.as_ref().err(),
                "duration_ms": c.duration.as_millis(),
            })
        })
        .collect();

    serde_json::json!({
        "cases": report.len(),
        "written": report.len() - report.write_failures().len(),
        "nonzero_exits": report.nonzero_exits(),
        "results": cases,
    })
}
