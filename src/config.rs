// Configuration management for symdex

use serde::{Deserialize, Serialize};
use std::path::Path;

/// File name of the optional per-workspace configuration
pub const CONFIG_FILE: &str = ".symdex.toml";

/// Languages with a registered extractor
pub const SUPPORTED_LANGUAGES: [&str; 2] = ["python", "rust"];

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub languages: LanguagesConfig,
    pub indexing: IndexingConfig,
    pub query: QueryConfig,
    pub performance: PerformanceConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LanguagesConfig {
    pub enabled: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexingConfig {
    /// Substrings; a workspace-relative path containing any of them is ignored
    pub exclude: Vec<String>,
    /// Name of the persisted index document, relative to the workspace root
    pub index_file: String,
    pub watch: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    pub default_limit: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceConfig {
    /// Extraction worker threads
    pub threads: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LanguagesConfig {
    fn default() -> Self {
        Self {
            enabled: SUPPORTED_LANGUAGES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            exclude: vec![
                ".git".to_string(),
                "__pycache__".to_string(),
                "node_modules".to_string(),
                ".venv".to_string(),
                "venv".to_string(),
                "dist".to_string(),
                "build".to_string(),
                ".pytest_cache".to_string(),
                ".mypy_cache".to_string(),
                "target".to_string(),
            ],
            index_file: ".symdex.json".to_string(),
            watch: false,
        }
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self { default_limit: 50 }
    }
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self { threads: 4 }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            languages: LanguagesConfig::default(),
            indexing: IndexingConfig::default(),
            query: QueryConfig::default(),
            performance: PerformanceConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the workspace directory.
    /// Looks for .symdex.toml in the workspace root.
    pub fn from_project_dir<P: AsRef<Path>>(project_dir: P) -> Self {
        let config_path = project_dir.as_ref().join(CONFIG_FILE);

        if !config_path.exists() {
            tracing::debug!("No {} in {}, using defaults", CONFIG_FILE, project_dir.as_ref().display());
            return Self::default();
        }

        match Self::from_file(&config_path) {
            Ok(config) => {
                tracing::info!("Loaded configuration from {}", config_path.display());
                config
            }
            Err(e) => {
                tracing::warn!("Could not load config from {}: {}", config_path.display(), e);
                tracing::info!("Using default configuration");
                Self::default()
            }
        }
    }

    /// Check a workspace-relative path against the ignore policy. The index
    /// document itself is always ignored.
    pub fn is_ignored(&self, relative_path: &str) -> bool {
        relative_path.contains(self.indexing.index_file.as_str())
            || self
                .indexing
                .exclude
                .iter()
                .any(|pattern| !pattern.is_empty() && relative_path.contains(pattern.as_str()))
    }

    /// Get enabled languages, filtered by what's actually supported
    pub fn enabled_languages(&self) -> Vec<String> {
        self.languages
            .enabled
            .iter()
            .filter(|lang| SUPPORTED_LANGUAGES.contains(&lang.as_str()))
            .cloned()
            .collect()
    }

    /// Validate configuration values
    pub fn validate(&self) -> anyhow::Result<()> {
        for lang in &self.languages.enabled {
            if !SUPPORTED_LANGUAGES.contains(&lang.as_str()) {
                return Err(anyhow::anyhow!("Unsupported language: {}", lang));
            }
        }

        if self.indexing.index_file.trim().is_empty() {
            return Err(anyhow::anyhow!("Index file name cannot be empty"));
        }

        if self.query.default_limit == 0 {
            return Err(anyhow::anyhow!("Default query limit must be greater than 0"));
        }

        if self.performance.threads == 0 {
            return Err(anyhow::anyhow!("Thread count must be greater than 0"));
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(anyhow::anyhow!("Invalid log level: {}", self.logging.level));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.indexing.index_file, ".symdex.json");
        assert_eq!(config.query.default_limit, 50);
        assert!(config.languages.enabled.contains(&"python".to_string()));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_is_ignored() {
        let config = Config::default();

        assert!(!config.is_ignored("src/main.py"));
        assert!(!config.is_ignored("lib/utils.rs"));

        assert!(config.is_ignored(".git/hooks/pre-commit.py"));
        assert!(config.is_ignored("pkg/__pycache__/mod.py"));
        assert!(config.is_ignored(".venv/lib/site.py"));
        assert!(config.is_ignored("node_modules/x/index.py"));
        assert!(config.is_ignored(".symdex.json"));
        assert!(config.is_ignored(".symdex.json.tmp"));
        // Plain substring matching, as the policy is defined
        assert!(config.is_ignored("scripts/rebuild.py"));
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.languages.enabled = vec!["cobol".to_string()];
        assert!(config.validate().is_err());
        config.languages.enabled = vec!["python".to_string()];

        config.query.default_limit = 0;
        assert!(config.validate().is_err());
        config.query.default_limit = 50;

        config.performance.threads = 0;
        assert!(config.validate().is_err());
        config.performance.threads = 2;

        config.logging.level = "loud".to_string();
        assert!(config.validate().is_err());
        config.logging.level = "info".to_string();

        config.indexing.index_file = " ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            "[languages]\nenabled = [\"python\"]\n\n[performance]\nthreads = 2\n",
        )
        .unwrap();

        let config = Config::from_project_dir(dir.path());
        assert_eq!(config.enabled_languages(), vec!["python".to_string()]);
        assert_eq!(config.performance.threads, 2);
        assert_eq!(config.query.default_limit, 50);
    }

    #[test]
    fn test_invalid_file_falls_back() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "[performance]\nthreads = 0\n").unwrap();

        let config = Config::from_project_dir(dir.path());
        assert_eq!(config.performance.threads, 4);
    }
}
