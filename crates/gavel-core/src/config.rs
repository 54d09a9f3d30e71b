use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("prompt template not found at {0}")]
    PromptNotFound(PathBuf),

    #[error("prompt template at {0} is empty")]
    PromptEmpty(PathBuf),

    #[error("shapes graph not found at {0}")]
    ShapesNotFound(PathBuf),

    #[error("no completion credential configured (set OPENAI_API_KEY)")]
    MissingApiKey,

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

pub const DEFAULT_MODEL: &str = "gpt-4o";
pub const DEFAULT_API_BASE: &str = "https://api.openai.com";

/// Everything the pipeline needs to know, resolved by the caller at startup
/// and handed in as a plain value.
#[derive(Debug, Clone)]
pub struct EtlConfig {
    pub minutes_dir: PathBuf,
    pub prompt_path: PathBuf,
    pub shapes_path: PathBuf,
    pub graphs_dir: PathBuf,
    pub reports_dir: PathBuf,
    pub dataset_path: PathBuf,
    pub start_index: usize,
    pub api_base: String,
    pub model: String,
    pub api_key: Option<String>,
}

impl EtlConfig {
    /// Default layout rooted at `data_root`: minutes under `input/`, derived
    /// artifacts under `output/`, validation reports under `cache/`.
    pub fn new(data_root: impl AsRef<Path>) -> Self {
        let root = data_root.as_ref();
        Self {
            minutes_dir: root.join("input").join("minutes"),
            prompt_path: PathBuf::from("assets/extraction_prompt.txt"),
            shapes_path: PathBuf::from("assets/minutes.shapes.ttl"),
            graphs_dir: root.join("output").join("graphs"),
            reports_dir: root.join("cache").join("validation"),
            dataset_path: root.join("output").join("minutes.trig"),
            start_index: 0,
            api_base: DEFAULT_API_BASE.to_owned(),
            model: DEFAULT_MODEL.to_owned(),
            api_key: None,
        }
    }

    #[must_use]
    pub fn with_start_index(mut self, start_index: usize) -> Self {
        self.start_index = start_index;
        self
    }

    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    #[must_use]
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    #[must_use]
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key;
        self
    }

    /// Reads the prompt template, failing fast when it is missing or empty.
    pub fn load_prompt(&self) -> ConfigResult<String> {
        if !self.prompt_path.is_file() {
            return Err(ConfigError::PromptNotFound(self.prompt_path.clone()));
        }
        let prompt = fs::read_to_string(&self.prompt_path).map_err(|source| ConfigError::Io {
            path: self.prompt_path.clone(),
            source,
        })?;
        if prompt.trim().is_empty() {
            return Err(ConfigError::PromptEmpty(self.prompt_path.clone()));
        }
        Ok(prompt)
    }

    /// The shapes graph must exist before any document is processed.
    pub fn ensure_shapes(&self) -> ConfigResult<()> {
        if self.shapes_path.is_file() {
            Ok(())
        } else {
            Err(ConfigError::ShapesNotFound(self.shapes_path.clone()))
        }
    }

    pub fn require_api_key(&self) -> ConfigResult<&str> {
        self.api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or(ConfigError::MissingApiKey)
    }
}

impl Default for EtlConfig {
    fn default() -> Self {
        Self::new("data")
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn default_layout_splits_input_output_and_cache() {
        let config = EtlConfig::new("data");
        assert_eq!(config.minutes_dir, Path::new("data/input/minutes"));
        assert_eq!(config.graphs_dir, Path::new("data/output/graphs"));
        assert_eq!(config.reports_dir, Path::new("data/cache/validation"));
        assert_eq!(config.dataset_path, Path::new("data/output/minutes.trig"));
        assert_eq!(config.start_index, 0);
    }

    #[test]
    fn missing_api_key_is_an_error() {
        let config = EtlConfig::default();
        assert!(matches!(config.require_api_key(), Err(ConfigError::MissingApiKey)));
        let config = config.with_api_key(Some(String::new()));
        assert!(matches!(config.require_api_key(), Err(ConfigError::MissingApiKey)));
        let config = config.with_api_key(Some("sk-test".to_owned()));
        assert_eq!(config.require_api_key().unwrap(), "sk-test");
    }

    #[test]
    fn prompt_must_exist_and_have_content() {
        let dir = TempDir::new().unwrap();
        let mut config = EtlConfig::new(dir.path());
        config.prompt_path = dir.path().join("prompt.txt");
        assert!(matches!(config.load_prompt(), Err(ConfigError::PromptNotFound(_))));

        fs::write(&config.prompt_path, "  \n").unwrap();
        assert!(matches!(config.load_prompt(), Err(ConfigError::PromptEmpty(_))));

        fs::write(&config.prompt_path, "Extract a graph from:\n\n").unwrap();
        assert_eq!(config.load_prompt().unwrap(), "Extract a graph from:\n\n");
    }

    #[test]
    fn shapes_check_reports_the_configured_path() {
        let dir = TempDir::new().unwrap();
        let mut config = EtlConfig::new(dir.path());
        config.shapes_path = dir.path().join("shapes.ttl");
        assert!(matches!(config.ensure_shapes(), Err(ConfigError::ShapesNotFound(_))));
        fs::write(&config.shapes_path, "").unwrap();
        assert!(config.ensure_shapes().is_ok());
    }
}
