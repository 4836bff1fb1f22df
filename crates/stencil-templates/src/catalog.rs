//! Template catalog
//!
//! [`TemplateCatalog`] ties discovery, the index, the scan snapshot and the
//! metadata cache together behind one explicitly constructed object.
//! Operations that mutate the index take `&mut self`, so one
//! discover/index/scan cycle runs at a time per catalog.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use stencil_cache::{CacheStats, TemplateCache};

use crate::config::CatalogConfig;
use crate::discovery::{DiscoveryReport, TemplateDiscovery};
use crate::error::CatalogResult;
use crate::index::{IndexStats, TemplateIndex};
use crate::models::{TemplateCategory, TemplateMetadata};
use crate::scan::{IndexSnapshot, ScanResult};
use crate::validation::{ContentValidator, ValidationEngine};
use crate::vocabulary::ProjectTypeVocabulary;
use crate::watch::TemplateWatcher;

/// Builder for a [`TemplateCatalog`] with custom validators
pub struct CatalogBuilder {
    config: CatalogConfig,
    validators: Vec<Arc<dyn ContentValidator>>,
}

impl CatalogBuilder {
    /// Start from a configuration
    pub fn new(config: CatalogConfig) -> Self {
        Self {
            config,
            validators: Vec::new(),
        }
    }

    /// Register a custom validator
    ///
    /// It only runs when extensibility is enabled and its id is listed in
    /// `extensibility.custom_validators`.
    pub fn validator(mut self, validator: Arc<dyn ContentValidator>) -> Self {
        self.validators.push(validator);
        self
    }

    fn enabled_validators(&self) -> Vec<Arc<dyn ContentValidator>> {
        let extensibility = &self.config.extensibility;
        if !extensibility.enabled {
            return Vec::new();
        }

        for id in &extensibility.custom_validators {
            if !self.validators.iter().any(|v| v.id() == id) {
                tracing::warn!(validator = %id, "custom validator is configured but not registered");
            }
        }

        self.validators
            .iter()
            .filter(|v| extensibility.custom_validators.iter().any(|id| id == v.id()))
            .cloned()
            .collect()
    }

    /// Build the catalog, running an initial refresh when auto-discovery is on
    pub async fn open(self) -> CatalogResult<TemplateCatalog> {
        self.config.validate()?;

        let vocabulary = Arc::new(ProjectTypeVocabulary::new(self.config.auto_register_types()));
        let cache = Arc::new(TemplateCache::with_config(self.config.cache.clone()));
        let validation = ValidationEngine::new(&self.config.validation_rules, self.enabled_validators());
        tracing::debug!(rules = ?validation.active_rules(), "validation rules enabled");

        let discovery = TemplateDiscovery::new()
            .with_patterns(&self.config.discovery_patterns)
            .with_validation(validation)
            .with_vocabulary(Arc::clone(&vocabulary))
            .with_cache(Arc::clone(&cache));

        let mut catalog = TemplateCatalog {
            config: self.config,
            discovery: Arc::new(discovery),
            cache,
            vocabulary,
            index: TemplateIndex::new(),
            snapshot: IndexSnapshot::new(),
        };

        if catalog.config.auto_discovery {
            let is_dir = tokio::fs::metadata(&catalog.config.templates_dir)
                .await
                .map(|meta| meta.is_dir())
                .unwrap_or(false);
            if is_dir {
                catalog.refresh().await?;
            } else {
                tracing::debug!(
                    dir = %catalog.config.templates_dir.display(),
                    "templates directory missing, skipping auto-discovery"
                );
            }
        }

        Ok(catalog)
    }
}

/// Discovered templates plus their indices
pub struct TemplateCatalog {
    config: CatalogConfig,
    discovery: Arc<TemplateDiscovery>,
    cache: Arc<TemplateCache<TemplateMetadata>>,
    vocabulary: Arc<ProjectTypeVocabulary>,
    index: TemplateIndex,
    snapshot: IndexSnapshot,
}

impl TemplateCatalog {
    /// Open a catalog with the given configuration
    pub async fn open(config: CatalogConfig) -> CatalogResult<Self> {
        CatalogBuilder::new(config).open().await
    }

    /// Builder for registering custom validators before opening
    pub fn builder(config: CatalogConfig) -> CatalogBuilder {
        CatalogBuilder::new(config)
    }

    /// Release the catalog and its cached metadata
    pub fn close(self) {
        self.cache.clear();
        tracing::debug!(templates = self.index.len(), "template catalog closed");
    }

    /// Active configuration
    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    /// Discover templates below `root` without touching the index
    pub async fn discover(&self, root: &Path) -> CatalogResult<Vec<TemplateMetadata>> {
        self.discovery.discover(root).await
    }

    /// Discover templates below `root`, reporting skipped files
    pub async fn discover_with_report(&self, root: &Path) -> CatalogResult<DiscoveryReport> {
        self.discovery.discover_with_report(root).await
    }

    /// Replace the index and snapshot with the given templates
    pub fn index(&mut self, templates: Vec<TemplateMetadata>) {
        self.snapshot = IndexSnapshot::from_templates(&templates);
        self.index.rebuild(templates);
        tracing::info!(templates = self.index.len(), "template index rebuilt");
    }

    /// Discover and index the configured templates directory
    pub async fn refresh(&mut self) -> CatalogResult<usize> {
        let root = self.config.templates_dir.clone();
        let templates = self.discover(&root).await?;
        self.index(templates);
        Ok(self.index.len())
    }

    /// Re-discover `root` and report changes since the last index or scan
    ///
    /// The changes are applied to the index and snapshot before returning.
    pub async fn scan(&mut self, root: &Path) -> CatalogResult<ScanResult> {
        let current = self.discover(root).await?;
        let result = self.snapshot.diff(&current);

        for template in &result.deleted_templates {
            let indexed_here = self
                .index
                .get(&template.id)
                .is_some_and(|indexed| indexed.file_path == template.file_path);
            if indexed_here {
                self.index.remove(&template.id);
            }
        }
        for template in result.new_templates.iter().chain(&result.modified_templates) {
            self.index.insert(template.clone());
        }
        self.snapshot.apply(&result);

        tracing::info!(
            root = %root.display(),
            new = result.new_templates.len(),
            modified = result.modified_templates.len(),
            deleted = result.deleted_templates.len(),
            "template scan complete"
        );
        Ok(result)
    }

    /// Watch `root` for template changes
    ///
    /// Deletions of indexed files carry their last indexed metadata.
    pub async fn watch(&self, root: &Path) -> CatalogResult<TemplateWatcher> {
        TemplateWatcher::start(root, Arc::clone(&self.discovery), self.snapshot.templates_by_path()).await
    }

    /// Template by id
    pub fn get(&self, id: &str) -> Option<TemplateMetadata> {
        self.index.get(id)
    }

    /// Every indexed template, sorted by id
    pub fn templates(&self) -> Vec<TemplateMetadata> {
        self.index.all()
    }

    /// Number of indexed templates
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Whether the index is empty
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Templates in a category
    pub fn by_category(&self, category: TemplateCategory) -> Vec<TemplateMetadata> {
        self.index.by_category(category)
    }

    /// Templates supporting a project type
    pub fn by_project_type(&self, project_type: &str) -> Vec<TemplateMetadata> {
        self.index.by_project_type(project_type)
    }

    /// Templates carrying a tag
    pub fn by_tag(&self, tag: &str) -> Vec<TemplateMetadata> {
        self.index.by_tag(tag)
    }

    /// Templates by an author
    pub fn by_author(&self, author: &str) -> Vec<TemplateMetadata> {
        self.index.by_author(author)
    }

    /// Free-text search
    pub fn search(&self, query: &str) -> Vec<TemplateMetadata> {
        self.index.search(query)
    }

    /// Index statistics
    pub fn stats(&self) -> IndexStats {
        self.index.stats()
    }

    /// Metadata cache statistics
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Shared metadata cache
    pub fn cache(&self) -> &Arc<TemplateCache<TemplateMetadata>> {
        &self.cache
    }

    /// Project types registered at runtime through auto-registration
    pub fn registered_project_types(&self) -> Vec<String> {
        self.vocabulary.registered()
    }
}

impl fmt::Debug for TemplateCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateCatalog")
            .field("templates_dir", &self.config.templates_dir)
            .field("templates", &self.index.len())
            .field("snapshot", &self.snapshot.len())
            .finish()
    }
}
