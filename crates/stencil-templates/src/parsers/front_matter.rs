//! Line-oriented key/value parser for front matter and YAML templates
//!
//! This is deliberately not a YAML implementation. Each line is split on its
//! first colon; bracketed values become flat lists. Nested structures are
//! not supported and indentation is ignored.

use std::collections::HashMap;
use std::path::Path;

use crate::error::CatalogResult;
use crate::models::{PartialMetadata, TemplateFormat};
use crate::parsers::FormatParser;

const DELIMITER: &str = "---";
const QUOTES: &[char] = &['\'', '"'];

/// A parsed value: plain string or bracketed list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// `key: value`
    Scalar(String),
    /// `key: [a, b, c]`
    List(Vec<String>),
}

impl FieldValue {
    /// View the value as a string; lists are joined with ", "
    pub fn as_scalar(&self) -> String {
        match self {
            FieldValue::Scalar(value) => value.clone(),
            FieldValue::List(items) => items.join(", "),
        }
    }

    /// View the value as a list; a non-empty scalar becomes a one-element list
    pub fn as_list(&self) -> Vec<String> {
        match self {
            FieldValue::Scalar(value) if value.is_empty() => Vec::new(),
            FieldValue::Scalar(value) => vec![value.clone()],
            FieldValue::List(items) => items.clone(),
        }
    }
}

/// Key/value pairs read from a block of lines; later keys override earlier ones
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyValueBlock {
    fields: HashMap<String, FieldValue>,
}

impl KeyValueBlock {
    /// Parse lines into key/value pairs
    pub fn parse<'a>(lines: impl IntoIterator<Item = &'a str>) -> Self {
        let mut fields = HashMap::new();

        for line in lines {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let key = key.trim();
            if key.is_empty() {
                continue;
            }

            fields.insert(key.to_string(), parse_value(value));
        }

        Self { fields }
    }

    /// Get a raw value
    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    /// Number of keys
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if no keys were found
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    fn scalar(&self, key: &str) -> Option<String> {
        self.get(key).map(FieldValue::as_scalar)
    }

    fn list(&self, key: &str) -> Option<Vec<String>> {
        self.get(key).map(FieldValue::as_list)
    }

    /// Map the consumed keys onto partial metadata
    pub fn to_partial(&self) -> PartialMetadata {
        PartialMetadata {
            name: self.scalar("name").or_else(|| self.scalar("title")),
            description: self.scalar("description"),
            version: self.scalar("version"),
            author: self.scalar("author"),
            category: self.scalar("category"),
            tags: self.list("tags"),
            supported_project_types: self.list("supportedProjectTypes"),
            recommended_quality_levels: self.list("recommendedQualityLevels"),
        }
    }
}

/// Remove at most one leading and one trailing quote character
pub(crate) fn strip_quotes(value: &str) -> &str {
    let value = value.strip_prefix(QUOTES).unwrap_or(value);
    value.strip_suffix(QUOTES).unwrap_or(value)
}

fn parse_value(raw: &str) -> FieldValue {
    let value = strip_quotes(raw.trim());

    if value.starts_with('[') && value.ends_with(']') && value.len() >= 2 {
        let items = value[1..value.len() - 1]
            .split(',')
            .map(|item| strip_quotes(item.trim()).trim())
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect();
        return FieldValue::List(items);
    }

    FieldValue::Scalar(value.to_string())
}

/// Find a leading front-matter block and return its inner lines
///
/// The first non-blank line must be `---`, and the block ends at the next
/// line that is exactly `---`. Returns `None` when either delimiter is missing.
pub fn extract_front_matter(content: &str) -> Option<Vec<&str>> {
    let content = content.trim_start_matches('\u{feff}').trim_start();
    let mut lines = content.lines();

    if lines.next()?.trim() != DELIMITER {
        return None;
    }

    let mut block = Vec::new();
    for line in lines {
        if line.trim() == DELIMITER {
            return Some(block);
        }
        block.push(line);
    }

    None
}

/// Parser for `.yaml` / `.yml` templates
#[derive(Debug, Clone, Copy, Default)]
pub struct FrontMatterParser;

impl FrontMatterParser {
    /// Parse the front-matter block if there is one, else the whole content
    pub fn parse_block(content: &str) -> KeyValueBlock {
        match extract_front_matter(content) {
            Some(lines) => KeyValueBlock::parse(lines),
            None => KeyValueBlock::parse(content.lines()),
        }
    }
}

impl FormatParser for FrontMatterParser {
    fn format(&self) -> TemplateFormat {
        TemplateFormat::Yaml
    }

    fn parse(&self, content: &str, _path: &Path) -> CatalogResult<PartialMetadata> {
        Ok(Self::parse_block(content).to_partial())
    }
}
