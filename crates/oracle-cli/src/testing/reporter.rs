//! Reporters - display generation and verification results

use colored::*;
use oracle_core::diff::{line_diff, DiffTag};
use oracle_core::{GeneratedCase, GenerationReport, Mismatch, Verdict, VerificationReport};
use std::io::{self, Write};

/// Reports a verification pass
pub struct VerifyReporter {
    /// One line per case instead of dots
    verbose: bool,
    /// Context lines around each diff hunk
    context: usize,
}

impl VerifyReporter {
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            context: 3,
        }
    }

    pub fn with_context(mut self, context: usize) -> Self {
        self.context = context;
        self
    }

    /// Live line for a single verdict; only verbose passes print these
    pub fn print_verdict<W: Write>(&self, out: &mut W, verdict: &Verdict) -> io::Result<()> {
        if !self.verbose {
            return Ok(());
        }

        let name = verdict.case.source().display();
        let duration = verdict.execution.duration;
        if verdict.timed_out() {
            writeln!(
                out,
                "{} {} (timeout after {:.2?})",
                "TIMEOUT".yellow().bold(),
                name,
                duration
            )
        } else if verdict.is_pass() {
            writeln!(out, "{} {} ({:.2?})", "PASS".green().bold(), name, duration)
        } else {
            writeln!(out, "{} {} ({:.2?})", "FAIL".red().bold(), name, duration)
        }
    }

    /// Summary block followed by details for every failing case
    pub fn report<W: Write>(&self, out: &mut W, report: &VerificationReport) -> io::Result<()> {
        if !self.verbose && !report.is_empty() {
            for verdict in &report.verdicts {
                let mark = if verdict.timed_out() {
                    "T".yellow().bold()
                } else if verdict.is_pass() {
                    ".".green()
                } else {
                    "F".red().bold()
                };
                write!(out, "{}", mark)?;
            }
            writeln!(out)?;
        }

        writeln!(out)?;
        self.print_summary(out, report)?;
        self.print_failures(out, report)
    }

    fn print_summary<W: Write>(&self, out: &mut W, report: &VerificationReport) -> io::Result<()> {
        let failed = report.fail_count();

        writeln!(out, "{}", "─".repeat(50))?;

        let status = if failed > 0 {
            "FAILED".red().bold()
        } else {
            "PASSED".green().bold()
        };

        writeln!(
            out,
            "Verify result: {} | {} total, {} passed, {} failed",
            status,
            report.len().to_string().bold(),
            report.pass_count().to_string().green().bold(),
            if failed > 0 {
                failed.to_string().red().bold()
            } else {
                failed.to_string().normal()
            }
        )?;
        writeln!(out, "Time: {:.2?}", report.total_duration())
    }

    fn print_failures<W: Write>(&self, out: &mut W, report: &VerificationReport) -> io::Result<()> {
        let mut failures = report.failures().peekable();
        if failures.peek().is_none() {
            return Ok(());
        }

        writeln!(out)?;
        writeln!(out, "{}", "Failures:".red().bold())?;
        writeln!(out)?;

        for verdict in failures {
            writeln!(out, "  {} {}", "●".red(), verdict.case.source().display())?;

            if verdict.timed_out() {
                writeln!(out, "      {}", verdict.execution.stderr.yellow())?;
            }

            for mismatch in &verdict.mismatches {
                writeln!(out, "    {}", mismatch.to_string().bold())?;
                if let Mismatch::Content {
                    expected, actual, ..
                } = mismatch
                {
                    self.print_diff(out, expected, actual)?;
                }
            }
            writeln!(out)?;
        }
        Ok(())
    }

    fn print_diff<W: Write>(&self, out: &mut W, expected: &str, actual: &str) -> io::Result<()> {
        for line in line_diff(expected, actual, self.context) {
            let text = format!("{}{}", line.sign(), line.text);
            let styled = match line.tag {
                DiffTag::Hunk => text.cyan(),
                DiffTag::Removed => text.red(),
                DiffTag::Added => text.green(),
                DiffTag::Context => text.dimmed(),
            };
            writeln!(out, "      {}", styled)?;
        }
        Ok(())
    }
}

/// Reports a golden generation pass
pub struct GenerateReporter {
    verbose: bool,
}

impl GenerateReporter {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// Live lines for one generated case; only verbose passes print these
    pub fn print_case<W: Write>(&self, out: &mut W, generated: &GeneratedCase) -> io::Result<()> {
        if !self.verbose {
            return Ok(());
        }

        writeln!(out, "Processing {}...", generated.case.source().display())?;
        writeln!(out, "  Return code: {}", generated.exit_code)?;
        if generated.reference_failed() {
            writeln!(
                out,
                "  {} reference returned non-zero exit code",
                "Warning:".yellow().bold()
            )?;
        }
        if let Err(error) = &generated.written {
            writeln!(out, "  {} {}", "Write failed:".red().bold(), error)?;
        }
        Ok(())
    }

    pub fn report<W: Write>(&self, out: &mut W, report: &GenerationReport) -> io::Result<()> {
        let failures = report.write_failures();
        let written = report.len() - failures.len();

        writeln!(out)?;
        writeln!(out, "{}", "─".repeat(50))?;
        writeln!(
            out,
            "Generated {} golden pair{} ({} non-zero exit{})",
            written.to_string().bold(),
            if written == 1 { "" } else { "s" },
            report.nonzero_exits(),
            if report.nonzero_exits() == 1 { "" } else { "s" }
        )?;
        writeln!(out, "Time: {:.2?}", report.total_duration())?;

        if failures.is_empty() {
            return Ok(());
        }

        writeln!(out)?;
        writeln!(out, "{}", "Write failures:".red().bold())?;
        for generated in failures {
            if let Err(error) = &generated.written {
                writeln!(out, "  {} {}", "●".red(), generated.case.source().display())?;
                writeln!(out, "      {}", error.dimmed())?;
            }
        }
        Ok(())
    }
}
