//! Metadata for double-brace placeholder templates
//!
//! Front matter wins when present. Otherwise metadata comes from inline
//! annotation comments such as `{{!-- title: Button --}}`, located with plain
//! substring search so arbitrarily large templates scan in linear time.

use std::path::Path;

use crate::error::CatalogResult;
use crate::models::{PartialMetadata, TemplateFormat};
use crate::parsers::front_matter::{extract_front_matter, strip_quotes, KeyValueBlock};
use crate::parsers::FormatParser;

const COMMENT_OPEN: &str = "{{!--";
const COMMENT_CLOSE: &str = "--}}";

/// Iterate over `key: value` annotation comments in order of appearance
pub fn annotations(content: &str) -> impl Iterator<Item = (&str, &str)> {
    let mut rest = content;
    std::iter::from_fn(move || loop {
        let start = rest.find(COMMENT_OPEN)?;
        let after_open = &rest[start + COMMENT_OPEN.len()..];
        let end = after_open.find(COMMENT_CLOSE)?;
        let body = after_open[..end].trim();
        rest = &after_open[end + COMMENT_CLOSE.len()..];

        if let Some((key, value)) = body.split_once(':') {
            return Some((key.trim(), value.trim()));
        }
    })
}

/// Parser for `.hbs` / `.handlebars` templates
#[derive(Debug, Clone, Copy, Default)]
pub struct AnnotationParser;

impl AnnotationParser {
    fn parse_annotations(content: &str) -> PartialMetadata {
        let mut partial = PartialMetadata::default();

        // First annotation for a key wins
        for (key, value) in annotations(content) {
            let value = strip_quotes(value).trim();
            match key {
                "title" if partial.name.is_none() => partial.name = Some(value.to_string()),
                "description" if partial.description.is_none() => {
                    partial.description = Some(value.to_string())
                }
                "tags" if partial.tags.is_none() => {
                    partial.tags = Some(
                        value
                            .split(',')
                            .map(|tag| strip_quotes(tag.trim()).trim())
                            .filter(|tag| !tag.is_empty())
                            .map(str::to_string)
                            .collect(),
                    )
                }
                _ => {}
            }
        }

        partial
    }
}

impl FormatParser for AnnotationParser {
    fn format(&self) -> TemplateFormat {
        TemplateFormat::Placeholder
    }

    fn parse(&self, content: &str, _path: &Path) -> CatalogResult<PartialMetadata> {
        if let Some(lines) = extract_front_matter(content) {
            return Ok(KeyValueBlock::parse(lines).to_partial());
        }
        Ok(Self::parse_annotations(content))
    }
}
