//! Core data models for the template catalog

use std::{fmt, path::PathBuf, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Template file formats the catalog understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateFormat {
    /// Structured JSON manifest (.json)
    Json,
    /// Line-oriented key/value metadata (.yaml, .yml)
    Yaml,
    /// Double-brace placeholder template (.hbs, .handlebars)
    Placeholder,
}

impl TemplateFormat {
    /// Every recognized file extension, lower-case and without the dot
    pub const EXTENSIONS: &'static [&'static str] = &["json", "yaml", "yml", "hbs", "handlebars"];

    /// Detect format from file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "json" => Some(TemplateFormat::Json),
            "yaml" | "yml" => Some(TemplateFormat::Yaml),
            "hbs" | "handlebars" => Some(TemplateFormat::Placeholder),
            _ => None,
        }
    }

    /// Short name used in logs and inferred tags
    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateFormat::Json => "json",
            TemplateFormat::Yaml => "yaml",
            TemplateFormat::Placeholder => "placeholder",
        }
    }
}

/// Coarse template category, inferred from the path or set by embedded metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateCategory {
    /// Application or library source files
    Source,
    /// Test files and fixtures
    Testing,
    /// READMEs and other docs
    Documentation,
    /// Configuration files
    Configuration,
    /// Helper scripts
    Scripts,
    /// Build and distribution artifacts
    Build,
    /// Anything else
    General,
}

impl TemplateCategory {
    /// All categories in inference order
    pub const ALL: [TemplateCategory; 7] = [
        TemplateCategory::Source,
        TemplateCategory::Testing,
        TemplateCategory::Documentation,
        TemplateCategory::Configuration,
        TemplateCategory::Scripts,
        TemplateCategory::Build,
        TemplateCategory::General,
    ];

    /// Lower-case label
    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateCategory::Source => "source",
            TemplateCategory::Testing => "testing",
            TemplateCategory::Documentation => "documentation",
            TemplateCategory::Configuration => "configuration",
            TemplateCategory::Scripts => "scripts",
            TemplateCategory::Build => "build",
            TemplateCategory::General => "general",
        }
    }
}

impl fmt::Display for TemplateCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TemplateCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == wanted)
            .ok_or_else(|| format!("Unknown template category: {}", s))
    }
}

/// Quality levels a template is recommended for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityLevel {
    /// Minimal tooling
    Light,
    /// Reasonable defaults
    Medium,
    /// Linting and type checks enforced
    Strict,
    /// Everything on
    High,
}

impl QualityLevel {
    /// All quality levels
    pub const ALL: [QualityLevel; 4] = [
        QualityLevel::Light,
        QualityLevel::Medium,
        QualityLevel::Strict,
        QualityLevel::High,
    ];

    /// Lower-case label
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityLevel::Light => "light",
            QualityLevel::Medium => "medium",
            QualityLevel::Strict => "strict",
            QualityLevel::High => "high",
        }
    }

    /// Parse a label, `None` for anything outside the vocabulary
    pub fn parse(value: &str) -> Option<Self> {
        let wanted = value.trim().to_lowercase();
        Self::ALL.into_iter().find(|level| level.as_str() == wanted)
    }
}

impl fmt::Display for QualityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of the validation pass over a template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// True when no rule reported an error
    pub valid: bool,
    /// One message per failed rule
    pub errors: Vec<String>,
    /// When validation ran
    pub timestamp: DateTime<Utc>,
    /// Name of the validator that produced this result
    pub validator: String,
}

/// Usage counters maintained by consumers of the catalog
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageStats {
    /// Number of times the template was used
    pub usage_count: u64,
    /// Uses that produced a project successfully
    pub success_count: u64,
    /// Uses that failed
    pub failure_count: u64,
    /// Last time the template was used
    pub last_used: Option<DateTime<Utc>>,
}

impl UsageStats {
    /// Record one use of the template
    pub fn record_use(&mut self, success: bool) {
        self.usage_count += 1;
        if success {
            self.success_count += 1;
        } else {
            self.failure_count += 1;
        }
        self.last_used = Some(Utc::now());
    }
}

/// A catalog entry describing one discovered template file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateMetadata {
    /// Slug derived from the root-relative path
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// Template description
    pub description: String,
    /// Template version, when declared
    pub version: Option<String>,
    /// Template author
    pub author: String,
    /// Absolute path; identity for change detection
    pub file_path: PathBuf,
    /// Path relative to the discovery root
    pub relative_path: PathBuf,
    /// File format
    pub format: TemplateFormat,
    /// Template category
    pub category: TemplateCategory,
    /// Tags, in declaration order without duplicates
    pub tags: Vec<String>,
    /// Project types the template applies to
    pub supported_project_types: Vec<String>,
    /// Quality levels the template is recommended for
    pub recommended_quality_levels: Vec<QualityLevel>,
    /// Content length in bytes at discovery time
    pub size: u64,
    /// File modification time at discovery time
    pub last_modified: DateTime<Utc>,
    /// Validation outcome
    pub validation: ValidationResult,
    /// Consumer-maintained usage counters
    pub usage_stats: UsageStats,
}

impl TemplateMetadata {
    /// Check whether the template declares a tag
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Check whether the template supports a project type
    pub fn supports_project_type(&self, project_type: &str) -> bool {
        self.supported_project_types.iter().any(|t| t == project_type)
    }
}

/// Metadata extracted by a format parser, before defaults are applied
///
/// `None` means the field was absent; `Some(vec![])` means it was present but empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialMetadata {
    /// Template name (`name` or `title`)
    pub name: Option<String>,
    /// Template description
    pub description: Option<String>,
    /// Template version
    pub version: Option<String>,
    /// Template author
    pub author: Option<String>,
    /// Raw category label
    pub category: Option<String>,
    /// Tags
    pub tags: Option<Vec<String>>,
    /// Raw project type labels
    pub supported_project_types: Option<Vec<String>>,
    /// Raw quality level labels
    pub recommended_quality_levels: Option<Vec<String>>,
}

impl PartialMetadata {
    /// True when no field was extracted
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
