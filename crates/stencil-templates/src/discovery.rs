//! Template discovery
//!
//! Walks a template directory, parses every recognized file and assembles
//! full [`TemplateMetadata`] records. Discovery is fail-open: a file that
//! cannot be read or parsed is left out (and reported in
//! [`DiscoveryReport::skipped`]) instead of failing the whole walk.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use stencil_cache::TemplateCache;
use walkdir::WalkDir;

use crate::error::{CatalogError, CatalogResult};
use crate::merge::{merge, InferredDefaults};
use crate::models::{TemplateFormat, TemplateMetadata, UsageStats};
use crate::parsers;
use crate::validation::{ValidationContext, ValidationEngine};
use crate::vocabulary::ProjectTypeVocabulary;

static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9_]+").expect("non-word pattern is valid"));

/// Derive a template id from its root-relative path
///
/// Runs of characters outside ASCII `[A-Za-z0-9_]` become a single `-`;
/// the result is lower-cased without leading or trailing hyphens.
pub fn template_id(relative: &Path) -> String {
    let path = relative.to_string_lossy().replace('\\', "/");
    NON_WORD
        .replace_all(&path, "-")
        .to_lowercase()
        .trim_matches('-')
        .to_string()
}

/// Extensions selected by glob-style discovery patterns
///
/// Only the trailing `*.ext` (or `*.{a,b}`) part of a pattern is looked at.
/// Any pattern without such a suffix selects every recognized extension.
pub fn extensions_from_patterns(patterns: &[String]) -> Vec<String> {
    let all = || TemplateFormat::EXTENSIONS.iter().map(|e| e.to_string()).collect::<Vec<_>>();
    if patterns.is_empty() {
        return all();
    }

    let mut selected: Vec<String> = Vec::new();
    for pattern in patterns {
        let file_part = pattern.rsplit('/').next().unwrap_or(pattern.as_str());
        let Some(ext) = file_part.strip_prefix("*.") else {
            return all();
        };

        let candidates: Vec<&str> = match ext.strip_prefix('{').and_then(|e| e.strip_suffix('}')) {
            Some(list) => list.split(',').map(str::trim).collect(),
            None => vec![ext],
        };
        if candidates.iter().any(|c| c.contains(['*', '?', '['])) {
            return all();
        }

        for candidate in candidates {
            let candidate = candidate.to_lowercase();
            if TemplateFormat::from_extension(&candidate).is_some() && !selected.contains(&candidate) {
                selected.push(candidate);
            }
        }
    }

    if selected.is_empty() {
        tracing::warn!(?patterns, "discovery patterns select no supported template extension");
    }
    selected
}

/// A file left out of discovery, with the reason
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedTemplate {
    /// Offending path
    pub path: PathBuf,
    /// Why it was skipped
    pub reason: String,
}

/// Discovery output including the diagnostics channel
#[derive(Debug, Clone, Default)]
pub struct DiscoveryReport {
    /// Successfully discovered templates, in walk order
    pub templates: Vec<TemplateMetadata>,
    /// Files that were recognized but could not be read or parsed
    pub skipped: Vec<SkippedTemplate>,
}

/// Turns template files into catalog entries
#[derive(Debug)]
pub struct TemplateDiscovery {
    extensions: Vec<String>,
    validation: ValidationEngine,
    vocabulary: Arc<ProjectTypeVocabulary>,
    cache: Option<Arc<TemplateCache<TemplateMetadata>>>,
}

impl TemplateDiscovery {
    /// Discovery over every recognized extension with default validation
    pub fn new() -> Self {
        Self {
            extensions: extensions_from_patterns(&[]),
            validation: ValidationEngine::with_defaults(),
            vocabulary: Arc::new(ProjectTypeVocabulary::default()),
            cache: None,
        }
    }

    /// Restrict discovery to the extensions named by glob patterns
    pub fn with_patterns(mut self, patterns: &[String]) -> Self {
        self.extensions = extensions_from_patterns(patterns);
        self
    }

    /// Set the validation engine
    pub fn with_validation(mut self, validation: ValidationEngine) -> Self {
        self.validation = validation;
        self
    }

    /// Set the project-type vocabulary
    pub fn with_vocabulary(mut self, vocabulary: Arc<ProjectTypeVocabulary>) -> Self {
        self.vocabulary = vocabulary;
        self
    }

    /// Reuse cached records for files whose size and mtime are unchanged
    pub fn with_cache(mut self, cache: Arc<TemplateCache<TemplateMetadata>>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Project-type vocabulary used for filtering
    pub fn vocabulary(&self) -> &ProjectTypeVocabulary {
        &self.vocabulary
    }

    /// Extensions this discovery picks up
    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    /// Check whether a path has a selected template extension
    pub fn is_recognized(&self, path: &Path) -> bool {
        is_selected(&self.extensions, path)
    }

    /// Recognized template files below `dir`, sorted by name
    pub(crate) async fn recognized_files(&self, dir: &Path) -> CatalogResult<Vec<PathBuf>> {
        let (files, _) = collect_files(dir.to_path_buf(), self.extensions.clone()).await?;
        Ok(files)
    }

    /// Discover every template below `root`
    pub async fn discover(&self, root: &Path) -> CatalogResult<Vec<TemplateMetadata>> {
        Ok(self.discover_with_report(root).await?.templates)
    }

    /// Discover every template below `root`, reporting skipped files
    pub async fn discover_with_report(&self, root: &Path) -> CatalogResult<DiscoveryReport> {
        let root = resolve_root(root).await?;
        let (files, mut skipped) = collect_files(root.clone(), self.extensions.clone()).await?;

        let mut templates = Vec::with_capacity(files.len());
        for path in files {
            match self.load_template(&root, &path).await {
                Ok(template) => templates.push(template),
                Err(e) => {
                    tracing::debug!(path = %path.display(), error = %e, "skipping template");
                    skipped.push(SkippedTemplate {
                        path,
                        reason: e.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            root = %root.display(),
            templates = templates.len(),
            skipped = skipped.len(),
            "template discovery complete"
        );

        Ok(DiscoveryReport { templates, skipped })
    }

    /// Load a single template file located under `root`
    pub async fn load_template(&self, root: &Path, path: &Path) -> CatalogResult<TemplateMetadata> {
        let relative = path
            .strip_prefix(root)
            .map_err(|_| CatalogError::parse_error(path, format!("not under {}", root.display())))?;

        let file_meta = tokio::fs::metadata(path).await?;
        let last_modified: DateTime<Utc> = file_meta.modified()?.into();

        let cache_key = format!("{}|{}", root.display(), relative.display());
        if let Some(cache) = &self.cache {
            if let Some(cached) = cache.get(&cache_key) {
                if cached.last_modified == last_modified && cached.size == file_meta.len() {
                    return Ok(cached);
                }
            }
        }

        let content = tokio::fs::read_to_string(path).await?;
        let template = self.build_metadata(relative, path.to_path_buf(), &content, last_modified)?;

        if let Some(cache) = &self.cache {
            cache.insert(cache_key, template.clone());
        }
        Ok(template)
    }

    /// Assemble a full record from file content
    pub fn build_metadata(
        &self,
        relative: &Path,
        file_path: PathBuf,
        content: &str,
        last_modified: DateTime<Utc>,
    ) -> CatalogResult<TemplateMetadata> {
        let extension = relative
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();
        let format = TemplateFormat::from_extension(extension)
            .ok_or_else(|| CatalogError::parse_error(&file_path, "unrecognized template extension"))?;

        let partial = parsers::parse(content, extension, &file_path)?
            .ok_or_else(|| CatalogError::parse_error(&file_path, "no parser for extension"))?;

        let resolved = merge(
            &partial,
            InferredDefaults::from_relative_path(relative),
            &self.vocabulary,
        );

        let validation = self.validation.validate(&ValidationContext {
            path: &file_path,
            content,
            format,
            partial: &partial,
            name: &resolved.name,
        });

        Ok(TemplateMetadata {
            id: template_id(relative),
            name: resolved.name,
            description: resolved.description,
            version: resolved.version,
            author: resolved.author,
            relative_path: relative.to_path_buf(),
            file_path,
            format,
            category: resolved.category,
            tags: resolved.tags,
            supported_project_types: resolved.supported_project_types,
            recommended_quality_levels: resolved.recommended_quality_levels,
            size: content.len() as u64,
            last_modified,
            validation,
            usage_stats: UsageStats::default(),
        })
    }
}

impl Default for TemplateDiscovery {
    fn default() -> Self {
        Self::new()
    }
}

fn is_selected(extensions: &[String], path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| extensions.iter().any(|selected| selected.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}

/// Check that `root` is an existing directory and make it absolute
pub(crate) async fn resolve_root(root: &Path) -> CatalogResult<PathBuf> {
    let not_found = || CatalogError::DirectoryNotFound {
        path: root.to_path_buf(),
    };

    match tokio::fs::metadata(root).await {
        Ok(meta) if meta.is_dir() => tokio::fs::canonicalize(root).await.map_err(|_| not_found()),
        _ => Err(not_found()),
    }
}

/// Walk `root` on a blocking thread, returning selected files sorted by name
async fn collect_files(
    root: PathBuf,
    extensions: Vec<String>,
) -> CatalogResult<(Vec<PathBuf>, Vec<SkippedTemplate>)> {
    tokio::task::spawn_blocking(move || {
        let mut files = Vec::new();
        let mut skipped = Vec::new();

        for entry in WalkDir::new(&root).follow_links(true).sort_by_file_name() {
            match entry {
                Ok(entry) if entry.file_type().is_file() => {
                    if is_selected(&extensions, entry.path()) {
                        files.push(entry.into_path());
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| root.clone());
                    tracing::debug!(path = %path.display(), error = %e, "skipping unreadable entry");
                    skipped.push(SkippedTemplate {
                        path,
                        reason: e.to_string(),
                    });
                }
            }
        }

        (files, skipped)
    })
    .await
    .map_err(|e| CatalogError::TaskFailed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TemplateCategory;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_template_id() {
        assert_eq!(template_id(Path::new("src/React Component.tsx.hbs")), "src-react-component-tsx-hbs");
        assert_eq!(template_id(Path::new("--weird//name--.json")), "weird-name-json");
        assert_eq!(template_id(Path::new("snake_case.yaml")), "snake_case-yaml");
        assert_eq!(template_id(Path::new("café/Ünïcode.json")), "caf-n-code-json");
    }

    #[test]
    fn test_extensions_from_patterns() {
        assert_eq!(extensions_from_patterns(&[]).len(), TemplateFormat::EXTENSIONS.len());
        assert_eq!(
            extensions_from_patterns(&["**/*.hbs".to_string(), "*.JSON".to_string()]),
            vec!["hbs".to_string(), "json".to_string()]
        );
        assert_eq!(
            extensions_from_patterns(&["templates/**/*.{yaml,yml,txt}".to_string()]),
            vec!["yaml".to_string(), "yml".to_string()]
        );
        assert_eq!(extensions_from_patterns(&["**/*".to_string()]).len(), TemplateFormat::EXTENSIONS.len());
        assert!(extensions_from_patterns(&["*.txt".to_string()]).is_empty());
    }

    #[test]
    fn test_build_metadata() {
        let discovery = TemplateDiscovery::new();
        let content = "---\nname: Guide\ncategory: documentation\n---\n# {{title}}";
        let template = discovery
            .build_metadata(
                Path::new("src/guide.hbs"),
                PathBuf::from("/templates/src/guide.hbs"),
                content,
                Utc::now(),
            )
            .unwrap();

        assert_eq!(template.id, "src-guide-hbs");
        assert_eq!(template.name, "Guide");
        assert_eq!(template.category, TemplateCategory::Documentation);
        assert_eq!(template.format, TemplateFormat::Placeholder);
        assert_eq!(template.size, content.len() as u64);
        assert!(template.validation.valid, "{:?}", template.validation.errors);
        assert_eq!(template.usage_stats, UsageStats::default());
    }

    #[tokio::test]
    async fn test_discover_missing_directory() {
        let discovery = TemplateDiscovery::new();
        let result = discovery.discover(Path::new("/definitely/not/here")).await;
        assert!(matches!(result, Err(CatalogError::DirectoryNotFound { .. })));
    }

    #[tokio::test]
    async fn test_discover_file_as_root() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("template.json");
        fs::write(&file, "{}").unwrap();

        let result = TemplateDiscovery::new().discover(&file).await;
        assert!(matches!(result, Err(CatalogError::DirectoryNotFound { .. })));
    }

    #[tokio::test]
    async fn test_discover_skips_unrecognized_and_invalid_files() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("notes.txt"), "not a template").unwrap();
        fs::write(temp_dir.path().join("broken.json"), "{ nope").unwrap();
        fs::write(temp_dir.path().join("good.json"), r#"{"name": "Good"}"#).unwrap();

        let report = TemplateDiscovery::new()
            .discover_with_report(temp_dir.path())
            .await
            .unwrap();

        assert_eq!(report.templates.len(), 1);
        assert_eq!(report.templates[0].name, "Good");
        assert_eq!(report.skipped.len(), 1);
        assert!(report.skipped[0].path.ends_with("broken.json"));
    }

    #[tokio::test]
    async fn test_patterns_narrow_discovery() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("a.json"), "{}").unwrap();
        fs::write(temp_dir.path().join("b.hbs"), "{{x}}").unwrap();

        let templates = TemplateDiscovery::new()
            .with_patterns(&["**/*.hbs".to_string()])
            .discover(temp_dir.path())
            .await
            .unwrap();

        assert_eq!(templates.len(), 1);
        assert_eq!(templates[0].format, TemplateFormat::Placeholder);
    }

    #[tokio::test]
    async fn test_cache_reuses_unchanged_files() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("a.yaml"), "name: A").unwrap();

        let cache = Arc::new(TemplateCache::new());
        let discovery = TemplateDiscovery::new().with_cache(Arc::clone(&cache));

        let first = discovery.discover(temp_dir.path()).await.unwrap();
        let second = discovery.discover(temp_dir.path()).await.unwrap();

        assert_eq!(first, second);
        let stats = cache.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 1);
    }
}
