//! Merge parser output with path-inferred defaults
//!
//! Each field of [`PartialMetadata`] is resolved independently: an embedded
//! value wins when present (even if it is an empty list), otherwise the
//! inferred default applies.

use std::path::Path;

use crate::category::infer_category_for_relative;
use crate::models::{PartialMetadata, QualityLevel, TemplateCategory};
use crate::vocabulary::{filter_quality_levels, ProjectTypeVocabulary};

/// Author recorded when a template does not declare one
pub const UNKNOWN_AUTHOR: &str = "unknown";

/// Project types assumed when a template does not declare any
pub const DEFAULT_PROJECT_TYPES: &[&str] = &["basic"];

/// Quality level assumed when a template does not declare any
pub const DEFAULT_QUALITY_LEVEL: QualityLevel = QualityLevel::Medium;

/// Values derived from a template's location alone
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferredDefaults {
    /// File name without its final extension
    pub name: String,
    /// Category from the path rule chain
    pub category: TemplateCategory,
    /// Parent directory names, lower-cased and deduplicated
    pub directory_tags: Vec<String>,
    /// [`DEFAULT_PROJECT_TYPES`]
    pub supported_project_types: Vec<String>,
    /// [`DEFAULT_QUALITY_LEVEL`]
    pub recommended_quality_levels: Vec<QualityLevel>,
}

impl InferredDefaults {
    /// Infer defaults from a root-relative path
    pub fn from_relative_path(relative: &Path) -> Self {
        let category = infer_category_for_relative(relative);

        let name = relative
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut directory_tags: Vec<String> = Vec::new();
        let parents = relative.parent().into_iter().flat_map(|parent| parent.iter());
        for segment in parents {
            let segment = segment.to_string_lossy().to_lowercase();
            if !segment.is_empty() && segment != "." && !directory_tags.contains(&segment) {
                directory_tags.push(segment);
            }
        }

        Self {
            name,
            category,
            directory_tags,
            supported_project_types: DEFAULT_PROJECT_TYPES.iter().map(|t| t.to_string()).collect(),
            recommended_quality_levels: vec![DEFAULT_QUALITY_LEVEL],
        }
    }

    /// Inferred tags for a template resolved to `category`
    pub fn tags_for(&self, category: TemplateCategory) -> Vec<String> {
        let mut tags = self.directory_tags.clone();
        if !tags.iter().any(|tag| tag == category.as_str()) {
            tags.push(category.as_str().to_string());
        }
        tags
    }
}

/// Fully resolved descriptive fields of a template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFields {
    /// Template name
    pub name: String,
    /// Template description
    pub description: String,
    /// Template version
    pub version: Option<String>,
    /// Template author
    pub author: String,
    /// Template category
    pub category: TemplateCategory,
    /// Tags without duplicates
    pub tags: Vec<String>,
    /// Filtered project types
    pub supported_project_types: Vec<String>,
    /// Filtered quality levels
    pub recommended_quality_levels: Vec<QualityLevel>,
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn dedup(values: &[String]) -> Vec<String> {
    let mut unique: Vec<String> = Vec::with_capacity(values.len());
    for value in values {
        if !unique.contains(value) {
            unique.push(value.clone());
        }
    }
    unique
}

/// Resolve every field, preferring embedded values over inferred ones
///
/// Blank names, authors and versions count as absent; a category label that
/// names no known category falls back to the inferred category.
pub fn merge(
    partial: &PartialMetadata,
    defaults: InferredDefaults,
    vocabulary: &ProjectTypeVocabulary,
) -> ResolvedFields {
    let category = partial
        .category
        .as_deref()
        .and_then(|label| label.parse::<TemplateCategory>().ok())
        .unwrap_or(defaults.category);
    let tags = match partial.tags.as_deref() {
        Some(tags) => dedup(tags),
        None => defaults.tags_for(category),
    };

    ResolvedFields {
        name: non_blank(&partial.name).unwrap_or(defaults.name),
        description: partial.description.clone().unwrap_or_default(),
        version: non_blank(&partial.version),
        author: non_blank(&partial.author).unwrap_or_else(|| UNKNOWN_AUTHOR.to_string()),
        category,
        tags,
        supported_project_types: partial
            .supported_project_types
            .as_deref()
            .map(|types| vocabulary.filter(types))
            .unwrap_or(defaults.supported_project_types),
        recommended_quality_levels: partial
            .recommended_quality_levels
            .as_deref()
            .map(filter_quality_levels)
            .unwrap_or(defaults.recommended_quality_levels),
    }
}
