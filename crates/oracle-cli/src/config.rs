//! Run configuration: oracle.toml merged with command-line overrides

use anyhow::{Context, Result};
use oracle_config::{Config, ConfigLoader};
use oracle_core::{Corpus, GoldenStore, ToolCommand};
use std::path::PathBuf;
use tracing::debug;

/// Corpus-selection flags shared by `generate` and `verify`
#[derive(Debug, Clone, Default)]
pub struct CorpusOverrides {
    /// Explicit oracle.toml (otherwise searched upward from the working directory)
    pub config: Option<PathBuf>,
    pub root: Option<PathBuf>,
    pub extension: Option<String>,
    /// Only run cases whose path contains this substring
    pub filter: Option<String>,
}

/// Everything a pass needs, with all defaults and overrides applied
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub corpus_root: PathBuf,
    pub extension: String,
    pub filter: Option<String>,
    pub store: GoldenStore,
    pub reference: ToolCommand,
    pub under_test: ToolCommand,
}

impl RunConfig {
    pub fn load(overrides: &CorpusOverrides) -> Result<Self> {
        let loader = ConfigLoader::new();
        let config = match &overrides.config {
            Some(path) => loader
                .load_from_file(path)
                .with_context(|| format!("Failed to load {}", path.display()))?,
            None => loader
                .load_from_directory(&std::env::current_dir()?)
                .context("Failed to load oracle.toml")?,
        };
        debug!(
            config_root = ?config.config_root,
            corpus_root = %config.corpus_root().display(),
            "loaded configuration"
        );
        Ok(Self::from_config(&config, overrides))
    }

    pub fn from_config(config: &Config, overrides: &CorpusOverrides) -> Self {
        let extension = overrides
            .extension
            .as_deref()
            .map(|ext| ext.trim_start_matches('.').to_string())
            .unwrap_or_else(|| config.extension().to_string());

        Self {
            corpus_root: overrides
                .root
                .clone()
                .unwrap_or_else(|| config.corpus_root()),
            extension,
            filter: overrides.filter.clone(),
            store: GoldenStore::new(config.stdout_suffix(), config.stderr_suffix()),
            reference: ToolCommand::reference(&config.reference()),
            under_test: ToolCommand::under_test(&config.under_test()),
        }
    }

    /// Discover the corpus; a missing or empty corpus (before or after filtering) is fatal
    pub fn corpus(&self) -> Result<Corpus> {
        let corpus = Corpus::discover(&self.corpus_root, &self.extension)?;

        match &self.filter {
            Some(pattern) => {
                let filtered = corpus.filter(pattern);
                if filtered.is_empty() {
                    anyhow::bail!(
                        "No test cases under {} match '{}'",
                        self.corpus_root.display(),
                        pattern
                    );
                }
                Ok(filtered)
            }
            None => Ok(corpus),
        }
    }
}
