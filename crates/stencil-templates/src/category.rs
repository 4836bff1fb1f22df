//! Path-based category inference

use std::path::Path;

use crate::models::TemplateCategory;

/// Ordered rules; the first rule with a matching needle wins
const RULES: &[(TemplateCategory, &[&str])] = &[
    (TemplateCategory::Testing, &["/test/", "/tests/", "test."]),
    (TemplateCategory::Documentation, &["/doc/", "docs/", "readme"]),
    (TemplateCategory::Configuration, &["/config/", "config."]),
    (TemplateCategory::Scripts, &["/script/", "scripts/"]),
    (TemplateCategory::Build, &["/build/", "/dist/"]),
];

/// Classify a path into a template category
///
/// Matching is case-insensitive substring matching on the path with `/`
/// separators. Callers pass root-relative paths prefixed with `/` so that
/// top-level directories such as `src/` match `/src/`.
pub fn infer_category(path: &str) -> TemplateCategory {
    let path = path.replace('\\', "/").to_lowercase();

    if path.contains("/src/") || path.ends_with("/src") || path.contains("lib/") {
        return TemplateCategory::Source;
    }

    RULES
        .iter()
        .find(|(_, needles)| needles.iter().any(|needle| path.contains(needle)))
        .map(|(category, _)| *category)
        .unwrap_or(TemplateCategory::General)
}

/// Classify a root-relative path
pub fn infer_category_for_relative(relative: &Path) -> TemplateCategory {
    infer_category(&format!("/{}", relative.to_string_lossy()))
}
