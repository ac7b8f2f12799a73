//! Registry configuration, loaded from YAML

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Store type names the registry registers and queries by
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TypeNames {
    pub model_artifact: String,
    pub doc_artifact: String,
    pub model_version: String,
}

impl Default for TypeNames {
    fn default() -> Self {
        Self {
            model_artifact: "kf.ModelArtifact".to_string(),
            doc_artifact: "kf.DocArtifact".to_string(),
            model_version: "kf.ModelVersion".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub type_names: TypeNames,
    /// Page size used while scanning for missing attributions
    pub reconcile_page_size: i32,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            type_names: TypeNames::default(),
            reconcile_page_size: 100,
        }
    }
}

impl RegistryConfig {
    /// Load from a YAML file, falling back to defaults when it does not exist
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        Self::from_yaml(&raw)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, ConfigError> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = RegistryConfig::from_yaml("type_names:\n  doc_artifact: acme.Doc\n").unwrap();
        assert_eq!(config.type_names.doc_artifact, "acme.Doc");
        assert_eq!(config.type_names.model_artifact, "kf.ModelArtifact");
        assert_eq!(config.reconcile_page_size, 100);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = RegistryConfig::load(dir.path().join("absent.yaml")).unwrap();
        assert_eq!(config, RegistryConfig::default());
    }

    #[test]
    fn test_invalid_yaml_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("registry.yaml");
        std::fs::write(&path, "reconcile_page_size: [not, a, number]\n").unwrap();
        assert!(matches!(RegistryConfig::load(&path), Err(ConfigError::Yaml(_))));
    }
}
