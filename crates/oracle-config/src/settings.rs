//! Oracle settings (oracle.toml)
//!
//! Every field is optional. Missing values fall back to the conventions the
//! Roth test corpus has always used: `test_source/**/*.fs`, golden files named
//! `<stem>_stdout.txt` / `<stem>_stderr.txt`, gforth as the reference and
//! `./target/debug/roth <file> --run` as the implementation under test.

use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CORPUS_ROOT: &str = "test_source";
pub const DEFAULT_EXTENSION: &str = "fs";
pub const DEFAULT_STDOUT_SUFFIX: &str = "_stdout.txt";
pub const DEFAULT_STDERR_SUFFIX: &str = "_stderr.txt";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub const DEFAULT_REFERENCE_PROGRAM: &str = "gforth";
pub const DEFAULT_UNDER_TEST_PROGRAM: &str = "./target/debug/roth";

/// Placeholder substituted with the source path in tool arguments
pub const FILE_PLACEHOLDER: &str = "{file}";

/// Top-level `oracle.toml` contents
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct OracleConfig {
    /// Corpus discovery
    #[serde(skip_serializing_if = "Option::is_none")]
    pub corpus: Option<CorpusConfig>,

    /// Golden artifact naming
    #[serde(skip_serializing_if = "Option::is_none")]
    pub golden: Option<GoldenConfig>,

    /// Trusted reference implementation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<ToolConfig>,

    /// Implementation under test
    #[serde(skip_serializing_if = "Option::is_none")]
    pub under_test: Option<ToolConfig>,
}

/// `[corpus]` section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct CorpusConfig {
    /// Root directory scanned for source files (default: "test_source")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,

    /// Source file extension without the dot (default: "fs")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<String>,
}

/// `[golden]` section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct GoldenConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stdout_suffix: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub stderr_suffix: Option<String>,
}

/// `[reference]` / `[under_test]` sections
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct ToolConfig {
    /// Executable name or path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub program: Option<String>,

    /// Arguments; `{file}` is replaced with the source path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub args: Option<Vec<String>>,

    /// Wall-clock limit per invocation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

/// A tool invocation with all defaults applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolSettings {
    pub program: String,
    pub args: Vec<String>,
    pub timeout_secs: u64,
}

impl ToolSettings {
    fn resolve(config: Option<&ToolConfig>, program: &str, args: &[&str]) -> Self {
        let config = config.cloned().unwrap_or_default();
        Self {
            program: config.program.unwrap_or_else(|| program.to_string()),
            args: config
                .args
                .unwrap_or_else(|| args.iter().map(|a| a.to_string()).collect()),
            timeout_secs: config.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl OracleConfig {
    /// Load settings from a file
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::IoError(e)
            }
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::TomlParseError {
            file: path.to_path_buf(),
            error: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make the oracle meaningless
    pub fn validate(&self) -> ConfigResult<()> {
        if self.extension().is_empty() || self.extension().starts_with('.') {
            return Err(invalid(
                "corpus.extension",
                "extension must be non-empty and given without a leading dot",
            ));
        }

        let (stdout_suffix, stderr_suffix) = (self.stdout_suffix(), self.stderr_suffix());
        if stdout_suffix.is_empty() {
            return Err(invalid("golden.stdout_suffix", "suffix cannot be empty"));
        }
        if stderr_suffix.is_empty() {
            return Err(invalid("golden.stderr_suffix", "suffix cannot be empty"));
        }
        if stdout_suffix == stderr_suffix {
            return Err(invalid(
                "golden.stderr_suffix",
                "stdout and stderr suffixes must differ",
            ));
        }

        for (section, tool) in [("reference", self.reference()), ("under_test", self.under_test())] {
            if tool.program.trim().is_empty() {
                return Err(invalid(&format!("{}.program", section), "program cannot be empty"));
            }
            if tool.timeout_secs == 0 {
                return Err(invalid(
                    &format!("{}.timeout_secs", section),
                    "timeout must be at least one second",
                ));
            }
        }

        Ok(())
    }

    /// Corpus root as written in the file (may be relative)
    pub fn corpus_root(&self) -> PathBuf {
        self.corpus
            .as_ref()
            .and_then(|c| c.root.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CORPUS_ROOT))
    }

    pub fn extension(&self) -> &str {
        self.corpus
            .as_ref()
            .and_then(|c| c.extension.as_deref())
            .unwrap_or(DEFAULT_EXTENSION)
    }

    pub fn stdout_suffix(&self) -> &str {
        self.golden
            .as_ref()
            .and_then(|g| g.stdout_suffix.as_deref())
            .unwrap_or(DEFAULT_STDOUT_SUFFIX)
    }

    pub fn stderr_suffix(&self) -> &str {
        self.golden
            .as_ref()
            .and_then(|g| g.stderr_suffix.as_deref())
            .unwrap_or(DEFAULT_STDERR_SUFFIX)
    }

    /// Reference invocation: `gforth -e "include {file} bye"` unless overridden
    pub fn reference(&self) -> ToolSettings {
        ToolSettings::resolve(
            self.reference.as_ref(),
            DEFAULT_REFERENCE_PROGRAM,
            &["-e", "include {file} bye"],
        )
    }

    /// Under-test invocation: `./target/debug/roth {file} --run` unless overridden
    pub fn under_test(&self) -> ToolSettings {
        ToolSettings::resolve(
            self.under_test.as_ref(),
            DEFAULT_UNDER_TEST_PROGRAM,
            &[FILE_PLACEHOLDER, "--run"],
        )
    }
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}
