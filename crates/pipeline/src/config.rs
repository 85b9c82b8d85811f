//! Pipeline configuration.

use lantern_llm::CompletionConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Completion provider used by every stage agent.
    #[serde(default)]
    pub completion: CompletionConfig,

    /// Directory downloaded media is stored under.
    #[serde(default = "default_media_dir")]
    pub media_dir: PathBuf,

    /// Cap on results requested per source per search term.
    #[serde(default = "default_max_results")]
    pub max_results_per_source: usize,
}

fn default_media_dir() -> PathBuf {
    PathBuf::from("./data/media")
}

fn default_max_results() -> usize {
    5
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            completion: CompletionConfig::default(),
            media_dir: default_media_dir(),
            max_results_per_source: default_max_results(),
        }
    }
}

impl PipelineConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = PipelineConfig::default();
        assert_eq!(config.media_dir, PathBuf::from("./data/media"));
        assert_eq!(config.max_results_per_source, 5);
        assert_eq!(config.completion.provider, "openai");
    }

    #[test]
    fn deserializes_partial_toml() {
        let toml_str = r#"
media_dir = "/var/lib/lantern/media"

[completion]
provider = "anthropic"
model = "claude-sonnet-4-20250514"
api_key = "sk-ant-test"
"#;
        let config: PipelineConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.media_dir, PathBuf::from("/var/lib/lantern/media"));
        assert_eq!(config.max_results_per_source, 5);
        assert_eq!(config.completion.provider, "anthropic");
    }

    #[test]
    fn from_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lantern.toml");
        std::fs::write(&path, "max_results_per_source = 8\n").unwrap();

        let config = PipelineConfig::from_file(&path).unwrap();
        assert_eq!(config.max_results_per_source, 8);

        assert!(PipelineConfig::from_file(dir.path().join("missing.toml")).is_err());
    }
}
