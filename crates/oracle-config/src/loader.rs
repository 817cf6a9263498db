//! Configuration Loader
//!
//! Finds `oracle.toml` and resolves paths in it relative to the directory
//! that holds it.

use crate::settings::{OracleConfig, ToolSettings};
use crate::ConfigResult;
use std::path::{Path, PathBuf};

/// File name searched for when walking up the directory tree
pub const CONFIG_FILE_NAME: &str = "oracle.toml";

/// Configuration loader
pub struct ConfigLoader {
    file_name: String,
}

/// Loaded configuration
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Settings from oracle.toml (defaults if no file was found)
    pub settings: OracleConfig,

    /// Directory containing the oracle.toml that was loaded
    pub config_root: Option<PathBuf>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            file_name: CONFIG_FILE_NAME.to_string(),
        }
    }

    /// Load configuration starting from the given directory
    ///
    /// Walks up the directory tree to find oracle.toml. Having no file at all
    /// is not an error: the built-in conventions apply.
    pub fn load_from_directory(&self, start_dir: &Path) -> ConfigResult<Config> {
        let mut current = start_dir.to_path_buf();

        loop {
            let config_path = current.join(&self.file_name);

            if config_path.is_file() {
                return self.load_from_file(&config_path);
            }

            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => return Ok(Config::default()),
            }
        }
    }

    /// Load configuration from a specific file
    pub fn load_from_file(&self, config_path: &Path) -> ConfigResult<Config> {
        let settings = OracleConfig::load_from_file(config_path)?;
        let config_root = config_path.parent().map(|p| {
            if p.as_os_str().is_empty() {
                PathBuf::from(".")
            } else {
                p.to_path_buf()
            }
        });

        Ok(Config {
            settings,
            config_root,
        })
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    /// Corpus root, resolved against the config file's directory when relative
    pub fn corpus_root(&self) -> PathBuf {
        let root = self.settings.corpus_root();
        match &self.config_root {
            Some(base) if root.is_relative() => base.join(root),
            _ => root,
        }
    }

    pub fn extension(&self) -> &str {
        self.settings.extension()
    }

    pub fn stdout_suffix(&self) -> &str {
        self.settings.stdout_suffix()
    }

    pub fn stderr_suffix(&self) -> &str {
        self.settings.stderr_suffix()
    }

    pub fn reference(&self) -> ToolSettings {
        self.resolve_program(self.settings.reference())
    }

    pub fn under_test(&self) -> ToolSettings {
        self.resolve_program(self.settings.under_test())
    }

    /// Relative program paths such as `./target/debug/roth` resolve against the
    /// config file's directory; bare names are left for a PATH lookup
    fn resolve_program(&self, mut tool: ToolSettings) -> ToolSettings {
        let program = Path::new(&tool.program);
        if let Some(base) = &self.config_root {
            if program.is_relative() && program.components().count() > 1 {
                tool.program = base.join(program).to_string_lossy().into_owned();
            }
        }
        tool
    }

    /// Whether an oracle.toml was found
    pub fn is_project(&self) -> bool {
        self.config_root.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;
    use tempfile::TempDir;

    fn create_config_file(dir: &Path, content: &str) -> PathBuf {
        let config_path = dir.join(CONFIG_FILE_NAME);
        fs::write(&config_path, content).unwrap();
        config_path
    }

    #[test]
    fn test_find_config_in_parent() {
        let temp_dir = TempDir::new().unwrap();
        create_config_file(
            temp_dir.path(),
            r#"
[corpus]
root = "programs"
"#,
        );

        let sub_dir = temp_dir.path().join("nested").join("deeper");
        fs::create_dir_all(&sub_dir).unwrap();

        let config = ConfigLoader::new().load_from_directory(&sub_dir).unwrap();

        assert!(config.is_project());
        assert_eq!(config.config_root.as_deref(), Some(temp_dir.path()));
        assert_eq!(config.corpus_root(), temp_dir.path().join("programs"));
    }

    #[test]
    fn test_absolute_root_is_kept() {
        let temp_dir = TempDir::new().unwrap();
        let corpus = temp_dir.path().join("elsewhere");
        create_config_file(
            temp_dir.path(),
            &format!("[corpus]\nroot = {:?}\n", corpus.display().to_string()),
        );

        let config = ConfigLoader::new()
            .load_from_directory(temp_dir.path())
            .unwrap();
        assert_eq!(config.corpus_root(), corpus);
    }

    #[test]
    fn test_load_from_specific_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = create_config_file(
            temp_dir.path(),
            r#"
[reference]
program = "sh"
args = ["{file}"]
"#,
        );

        let config = ConfigLoader::new().load_from_file(&path).unwrap();
        assert_eq!(config.reference().program, "sh");
        assert_eq!(
            PathBuf::from(config.under_test().program),
            temp_dir.path().join("./target/debug/roth")
        );
    }

    #[test]
    fn test_tool_paths_resolve_against_config_from_nested_dir() {
        let temp_dir = TempDir::new().unwrap();
        create_config_file(
            temp_dir.path(),
            r#"
[reference]
program = "tools/gforth"
"#,
        );
        let sub_dir = temp_dir.path().join("test_source").join("arith");
        fs::create_dir_all(&sub_dir).unwrap();

        let config = ConfigLoader::new().load_from_directory(&sub_dir).unwrap();

        assert_eq!(
            PathBuf::from(config.reference().program),
            temp_dir.path().join("tools/gforth")
        );
        assert_eq!(
            PathBuf::from(config.under_test().program),
            temp_dir.path().join("./target/debug/roth")
        );
        assert_eq!(config.corpus_root(), temp_dir.path().join("test_source"));
    }

    #[test]
    fn test_bare_program_names_are_left_for_path_lookup() {
        let temp_dir = TempDir::new().unwrap();
        create_config_file(temp_dir.path(), "[under_test]\nprogram = \"roth\"\n");

        let config = ConfigLoader::new()
            .load_from_directory(temp_dir.path())
            .unwrap();

        assert_eq!(config.under_test().program, "roth");
        assert_eq!(config.reference().program, "gforth");
    }

    #[test]
    fn test_programs_unchanged_without_config_file() {
        let config = Config::default();
        assert_eq!(config.under_test().program, "./target/debug/roth");
    }

    #[test]
    #[serial]
    fn test_relative_config_path_resolves_against_cwd() {
        let temp_dir = TempDir::new().unwrap();
        create_config_file(temp_dir.path(), "");

        let previous = std::env::current_dir().unwrap();
        std::env::set_current_dir(temp_dir.path()).unwrap();
        let config = ConfigLoader::new()
            .load_from_file(Path::new(CONFIG_FILE_NAME))
            .unwrap();
        std::env::set_current_dir(previous).unwrap();

        assert_eq!(config.corpus_root(), PathBuf::from("./test_source"));
    }
}
