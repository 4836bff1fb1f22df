//! Catalog configuration
//!
//! Loaded from YAML or JSON; the format is picked from the file extension.
//! Keys are accepted in snake_case or camelCase.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use stencil_cache::CacheConfig;

use crate::error::{CatalogError, CatalogResult};

/// Supported configuration file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// `.yaml` / `.yml`
    Yaml,
    /// `.json`
    Json,
}

impl ConfigFormat {
    /// Detect format from file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "yaml" | "yml" => Some(ConfigFormat::Yaml),
            "json" => Some(ConfigFormat::Json),
            _ => None,
        }
    }
}

/// Extension points of the catalog
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtensibilityConfig {
    /// Master switch for the settings below
    pub enabled: bool,
    /// Keep unknown project types and add them to the vocabulary
    #[serde(alias = "autoRegisterNewTypes")]
    pub auto_register_new_types: bool,
    /// Identifiers of custom validators to run
    #[serde(alias = "customValidators")]
    pub custom_validators: Vec<String>,
}

/// Catalog configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Root templates directory
    #[serde(alias = "templatesDir")]
    pub templates_dir: PathBuf,
    /// Discover and index the templates directory when the catalog opens
    #[serde(alias = "autoDiscovery")]
    pub auto_discovery: bool,
    /// Glob patterns; only their extension part is used
    #[serde(alias = "discoveryPatterns")]
    pub discovery_patterns: Vec<String>,
    /// Built-in validation rule identifiers; empty means the defaults
    #[serde(alias = "validationRules")]
    pub validation_rules: Vec<String>,
    /// Metadata cache settings
    pub cache: CacheConfig,
    /// Extensibility settings
    pub extensibility: ExtensibilityConfig,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            templates_dir: PathBuf::from("templates"),
            auto_discovery: true,
            discovery_patterns: vec![
                "**/*.json".to_string(),
                "**/*.{yaml,yml}".to_string(),
                "**/*.{hbs,handlebars}".to_string(),
            ],
            validation_rules: Vec::new(),
            cache: CacheConfig::default(),
            extensibility: ExtensibilityConfig::default(),
        }
    }
}

impl CatalogConfig {
    /// Configuration rooted at a templates directory, other settings default
    pub fn new(templates_dir: impl Into<PathBuf>) -> Self {
        Self {
            templates_dir: templates_dir.into(),
            ..Self::default()
        }
    }

    /// Load configuration from a file, detecting the format by extension
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> CatalogResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .ok_or_else(|| CatalogError::config_error(format!("{} has no extension", path.display())))?;
        let format = ConfigFormat::from_extension(extension).ok_or_else(|| {
            CatalogError::config_error(format!("Unsupported configuration format: {}", extension))
        })?;

        let config = Self::load_from_string(&content, format)?;
        tracing::debug!(path = %path.display(), "loaded catalog configuration");
        Ok(config)
    }

    /// Parse configuration text in the given format and validate it
    pub fn load_from_string(content: &str, format: ConfigFormat) -> CatalogResult<Self> {
        let config: Self = match format {
            ConfigFormat::Yaml => serde_yaml::from_str(content)
                .map_err(|e| CatalogError::config_error(format!("Invalid YAML: {}", e)))?,
            ConfigFormat::Json => serde_json::from_str(content)
                .map_err(|e| CatalogError::config_error(format!("Invalid JSON: {}", e)))?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration in the given format
    pub fn serialize(&self, format: ConfigFormat) -> CatalogResult<String> {
        match format {
            ConfigFormat::Yaml => serde_yaml::to_string(self)
                .map_err(|e| CatalogError::config_error(format!("Failed to serialize to YAML: {}", e))),
            ConfigFormat::Json => serde_json::to_string_pretty(self)
                .map_err(|e| CatalogError::config_error(format!("Failed to serialize to JSON: {}", e))),
        }
    }

    /// Check settings that would make the catalog unusable
    pub fn validate(&self) -> CatalogResult<()> {
        if self.templates_dir.as_os_str().is_empty() {
            return Err(CatalogError::config_error("templates_dir cannot be empty"));
        }
        if self.cache.enabled && self.cache.ttl == 0 {
            return Err(CatalogError::config_error("cache ttl must be positive when the cache is enabled"));
        }
        if !self.extensibility.enabled && !self.extensibility.custom_validators.is_empty() {
            return Err(CatalogError::config_error(
                "custom_validators requires extensibility to be enabled",
            ));
        }
        Ok(())
    }

    /// Whether unknown project types should be registered
    pub fn auto_register_types(&self) -> bool {
        self.extensibility.enabled && self.extensibility.auto_register_new_types
    }
}
