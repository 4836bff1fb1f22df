//! Format-specific metadata extraction
//!
//! Each template format has a parser that turns raw file content into a
//! [`PartialMetadata`]. Parsers never apply defaults; discovery merges their
//! output with path-inferred values.

pub mod annotations;
pub mod front_matter;
pub mod json;

use std::path::Path;

use crate::error::CatalogResult;
use crate::models::{PartialMetadata, TemplateFormat};

pub use annotations::AnnotationParser;
pub use front_matter::{FieldValue, FrontMatterParser, KeyValueBlock};
pub use json::JsonParser;

/// Extracts metadata from one template format
pub trait FormatParser: Send + Sync {
    /// Format handled by this parser
    fn format(&self) -> TemplateFormat;

    /// Parse file content; `path` is only used for error context
    fn parse(&self, content: &str, path: &Path) -> CatalogResult<PartialMetadata>;
}

/// Get the parser for a format
pub fn parser_for(format: TemplateFormat) -> &'static dyn FormatParser {
    match format {
        TemplateFormat::Json => &JsonParser,
        TemplateFormat::Yaml => &FrontMatterParser,
        TemplateFormat::Placeholder => &AnnotationParser,
    }
}

/// Parse content by file extension
///
/// Returns `Ok(None)` for extensions no parser recognizes.
pub fn parse(content: &str, extension: &str, path: &Path) -> CatalogResult<Option<PartialMetadata>> {
    match TemplateFormat::from_extension(extension) {
        Some(format) => parser_for(format).parse(content, path).map(Some),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unrecognized_extension_returns_none() {
        let result = parse("anything", "txt", Path::new("notes.txt")).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_dispatch_by_extension() {
        let json = parse(r#"{"name": "App"}"#, "json", Path::new("app.json")).unwrap().unwrap();
        assert_eq!(json.name.as_deref(), Some("App"));

        let yaml = parse("name: Config", "yml", Path::new("config.yml")).unwrap().unwrap();
        assert_eq!(yaml.name.as_deref(), Some("Config"));

        let hbs = parse("{{!-- title: Page --}}", "hbs", Path::new("page.hbs")).unwrap().unwrap();
        assert_eq!(hbs.name.as_deref(), Some("Page"));
    }

    #[test]
    fn test_parser_for_reports_format() {
        for format in [TemplateFormat::Json, TemplateFormat::Yaml, TemplateFormat::Placeholder] {
            assert_eq!(parser_for(format).format(), format);
        }
    }
}
