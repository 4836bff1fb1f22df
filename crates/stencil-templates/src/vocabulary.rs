//! Fixed vocabularies for project types and quality levels

use std::collections::BTreeSet;

use parking_lot::RwLock;

use crate::models::QualityLevel;

/// Project types every catalog understands
pub const BUILTIN_PROJECT_TYPES: &[&str] = &[
    "basic",
    "web",
    "cli",
    "library",
    // framework variants
    "react",
    "vue",
    "angular",
    "svelte",
    "nextjs",
    "nuxt",
    "express",
    "fastify",
    "nestjs",
    "electron",
];

/// Set of project types templates may declare
///
/// Unknown labels are dropped when filtering, unless auto-registration is on,
/// in which case they are added to the vocabulary and kept.
#[derive(Debug)]
pub struct ProjectTypeVocabulary {
    known: RwLock<BTreeSet<String>>,
    registered: RwLock<BTreeSet<String>>,
    auto_register: bool,
}

impl ProjectTypeVocabulary {
    /// Create a vocabulary holding the built-in project types
    pub fn new(auto_register: bool) -> Self {
        Self {
            known: RwLock::new(BUILTIN_PROJECT_TYPES.iter().map(|t| t.to_string()).collect()),
            registered: RwLock::new(BTreeSet::new()),
            auto_register,
        }
    }

    /// Check whether a (lower-case, trimmed) project type is known
    pub fn contains(&self, project_type: &str) -> bool {
        self.known.read().contains(project_type)
    }

    /// Add a project type, returning true if it was new
    pub fn register(&self, project_type: &str) -> bool {
        let normalized = project_type.trim().to_lowercase();
        if normalized.is_empty() || !self.known.write().insert(normalized.clone()) {
            return false;
        }
        tracing::info!(project_type = %normalized, "registered new project type");
        self.registered.write().insert(normalized);
        true
    }

    /// Project types added at runtime, sorted
    pub fn registered(&self) -> Vec<String> {
        self.registered.read().iter().cloned().collect()
    }

    /// Keep the labels that belong to the vocabulary, normalized and de-duplicated
    pub fn filter(&self, values: &[String]) -> Vec<String> {
        let mut kept: Vec<String> = Vec::new();
        for value in values {
            let normalized = value.trim().to_lowercase();
            if normalized.is_empty() || kept.contains(&normalized) {
                continue;
            }
            if self.contains(&normalized) || (self.auto_register && self.register(&normalized)) {
                kept.push(normalized);
            } else {
                tracing::trace!(project_type = %normalized, "dropping unknown project type");
            }
        }
        kept
    }
}

impl Default for ProjectTypeVocabulary {
    fn default() -> Self {
        Self::new(false)
    }
}

/// Keep the labels naming a quality level, de-duplicated in declaration order
pub fn filter_quality_levels(values: &[String]) -> Vec<QualityLevel> {
    let mut kept = Vec::new();
    for level in values.iter().filter_map(|v| QualityLevel::parse(v)) {
        if !kept.contains(&level) {
            kept.push(level);
        }
    }
    kept
}
