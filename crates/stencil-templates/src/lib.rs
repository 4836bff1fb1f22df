#![warn(missing_docs)]

//! Template discovery and cataloging for Stencil
//!
//! Walks a template directory, extracts metadata from JSON manifests,
//! front-matter YAML and double-brace placeholder templates, and keeps it in
//! a searchable in-memory index. Changes are picked up incrementally through
//! [`TemplateCatalog::scan`] or live through [`TemplateCatalog::watch`].
//!
//! ```no_run
//! use stencil_templates::{CatalogConfig, TemplateCatalog, TemplateCategory};
//!
//! # async fn example() -> stencil_templates::CatalogResult<()> {
//! let mut catalog = TemplateCatalog::open(CatalogConfig::new("templates")).await?;
//! let docs = catalog.by_category(TemplateCategory::Documentation);
//! let changes = catalog.scan(std::path::Path::new("templates")).await?;
//! println!("{} docs, {} new", docs.len(), changes.new_templates.len());
//! catalog.close();
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod category;
pub mod config;
pub mod discovery;
pub mod error;
pub mod index;
pub mod merge;
pub mod models;
pub mod parsers;
pub mod scan;
pub mod validation;
pub mod vocabulary;
pub mod watch;

// Re-export public API
pub use catalog::{CatalogBuilder, TemplateCatalog};
pub use category::{infer_category, infer_category_for_relative};
pub use config::{CatalogConfig, ConfigFormat, ExtensibilityConfig};
pub use discovery::{template_id, DiscoveryReport, SkippedTemplate, TemplateDiscovery};
pub use error::{CatalogError, CatalogResult};
pub use index::{IndexStats, TemplateIndex};
pub use merge::{merge, InferredDefaults, ResolvedFields};
pub use models::{
    PartialMetadata, QualityLevel, TemplateCategory, TemplateFormat, TemplateMetadata, UsageStats,
    ValidationResult,
};
pub use parsers::{parse, FormatParser};
pub use scan::{IndexSnapshot, ScanResult};
pub use validation::{ContentValidator, ValidationContext, ValidationEngine};
pub use vocabulary::{ProjectTypeVocabulary, BUILTIN_PROJECT_TYPES};
pub use watch::{ChangeKind, TemplateChange, TemplateChangeStream, TemplateWatcher};

pub use stencil_cache::{CacheConfig, CacheStats, TemplateCache};
