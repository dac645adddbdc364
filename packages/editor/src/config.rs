use crate::errors::EditorError;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_CONFIG_NAME: &str = "petal.config.json";

/// Editor configuration file format
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorConfig {
    /// Synthesize required children for nodes created by commands
    #[serde(default = "default_fill_on_create")]
    pub fill_on_create: bool,

    /// Longest wrapper chain the insertion planner may synthesize
    #[serde(default = "default_max_wrapper_depth")]
    pub max_wrapper_depth: usize,
}

fn default_fill_on_create() -> bool {
    true
}

fn default_max_wrapper_depth() -> usize {
    3
}

impl EditorConfig {
    /// Load config from a directory
    pub fn load(dir: impl AsRef<Path>) -> Result<Self, EditorError> {
        let config_path = dir.as_ref().join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: EditorConfig = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            // Return default config if none exists
            Ok(EditorConfig::default())
        }
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            fill_on_create: default_fill_on_create(),
            max_wrapper_depth: default_max_wrapper_depth(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let json = r#"{
            "fillOnCreate": false,
            "maxWrapperDepth": 1
        }"#;

        let config: EditorConfig = serde_json::from_str(json).unwrap();
        assert!(!config.fill_on_create);
        assert_eq!(config.max_wrapper_depth, 1);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let config: EditorConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, EditorConfig::default());
        assert!(config.fill_on_create);
        assert_eq!(config.max_wrapper_depth, 3);
    }

    #[test]
    fn test_load_without_file_returns_default() {
        let dir = std::env::temp_dir().join("petal_config_missing");
        std::fs::create_dir_all(&dir).unwrap();
        let _ = std::fs::remove_file(dir.join(DEFAULT_CONFIG_NAME));
        assert_eq!(EditorConfig::load(&dir).unwrap(), EditorConfig::default());
    }

    #[test]
    fn test_load_rejects_invalid_json() {
        let dir = std::env::temp_dir().join("petal_config_invalid");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(DEFAULT_CONFIG_NAME), "{ not json").unwrap();
        assert!(matches!(EditorConfig::load(&dir), Err(EditorError::Config(_))));
    }
}
