use anyhow::Result;
use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::path::PathBuf;

mod commands;
mod config;
mod testing;

use config::CorpusOverrides;

/// Differential-testing oracle for the Roth Forth compiler.
///
/// Records the output of a trusted reference Forth (gforth) for every
/// program in the test corpus, then checks builds of the Roth compiler
/// against those recordings.
///
/// EXAMPLES:
///     oracle generate              Record golden outputs with gforth
///     oracle verify                Check ./target/debug/roth against them
///     oracle verify -v --context 5 Show every case and wider diffs
///     oracle verify --filter loops Only cases whose path contains "loops"
///
/// ENVIRONMENT VARIABLES:
///     NO_COLOR   Set to disable colored output
///     RUST_LOG   Diagnostic log filter (default: warn)
#[derive(Parser)]
#[command(name = "oracle")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Options shared by both passes
#[derive(Args, Debug, Clone)]
struct PassArgs {
    /// Corpus root directory (default: test_source)
    #[arg(long)]
    root: Option<PathBuf>,
    /// Source file extension (default: fs)
    #[arg(long)]
    ext: Option<String>,
    /// Path to oracle.toml (default: searched upward from the working directory)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Only run cases whose path contains this pattern
    #[arg(long)]
    filter: Option<String>,
    /// Verbose output (one line per case)
    #[arg(long, short = 'v')]
    verbose: bool,
    /// Disable colored output
    #[arg(long, env = "NO_COLOR")]
    no_color: bool,
    /// Output a JSON summary
    #[arg(long)]
    json: bool,
}

impl PassArgs {
    fn overrides(&self) -> CorpusOverrides {
        CorpusOverrides {
            config: self.config.clone(),
            root: self.root.clone(),
            extension: self.ext.clone(),
            filter: self.filter.clone(),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Record golden outputs from the reference implementation
    ///
    /// Runs the reference Forth on every corpus program and overwrites the
    /// `<stem>_stdout.txt` / `<stem>_stderr.txt` files next to it. Non-zero
    /// reference exits are recorded, not treated as failures.
    ///
    /// EXAMPLES:
    ///     oracle generate                   Regenerate every golden pair
    ///     oracle generate --root programs   Use a different corpus
    #[command(visible_alias = "g")]
    Generate {
        #[command(flatten)]
        pass: PassArgs,
    },

    /// Check the compiler under test against the golden outputs
    ///
    /// Runs the compiler on every corpus program and compares trimmed stdout
    /// and stderr with the goldens. A golden stderr mentioning "error"
    /// requires a non-zero exit code; otherwise zero is required.
    /// Exits 1 if any case fails.
    ///
    /// EXAMPLES:
    ///     oracle verify                 Verify the whole corpus
    ///     oracle verify --json          Machine-readable summary
    #[command(visible_alias = "v")]
    Verify {
        #[command(flatten)]
        pass: PassArgs,
        /// Context lines around each diff hunk
        #[arg(long, default_value_t = 3)]
        context: usize,
    },

    /// Generate shell completions
    ///
    /// EXAMPLES:
    ///     oracle completions bash > ~/.local/share/bash-completion/completions/oracle
    ///     oracle completions zsh > ~/.zfunc/_oracle
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .try_init();

    let cli = Cli::parse();

    let succeeded = match cli.command {
        Commands::Generate { pass } => {
            apply_color(&pass);
            commands::generate::run(commands::generate::GenerateArgs {
                corpus: pass.overrides(),
                verbose: pass.verbose,
                json: pass.json,
            })?
        }
        Commands::Verify { pass, context } => {
            apply_color(&pass);
            commands::verify::run(commands::verify::VerifyArgs {
                corpus: pass.overrides(),
                verbose: pass.verbose,
                json: pass.json,
                context,
            })?
        }
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(shell, &mut cmd, name, &mut io::stdout());
            true
        }
    };

    if !succeeded {
        std::process::exit(1);
    }
    Ok(())
}

fn apply_color(pass: &PassArgs) {
    if pass.no_color || pass.json {
        colored::control::set_override(false);
    }
}
