//! Structured JSON manifest parser

use std::path::Path;

use serde_json::{Map, Value};

use crate::error::{CatalogError, CatalogResult};
use crate::models::{PartialMetadata, TemplateFormat};
use crate::parsers::FormatParser;

/// Parser for `.json` templates
///
/// The whole file must be a JSON object. Fields are read leniently: a key
/// whose value has an unexpected shape is treated as absent rather than
/// failing the file.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonParser;

impl JsonParser {
    fn string(object: &Map<String, Value>, key: &str) -> Option<String> {
        match object.get(key)? {
            Value::String(value) => Some(value.clone()),
            Value::Number(value) => Some(value.to_string()),
            _ => None,
        }
    }

    fn list(object: &Map<String, Value>, key: &str) -> Option<Vec<String>> {
        match object.get(key)? {
            Value::Array(items) => Some(
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(|item| item.trim().to_string())
                    .filter(|item| !item.is_empty())
                    .collect(),
            ),
            Value::String(value) if value.trim().is_empty() => Some(Vec::new()),
            Value::String(value) => Some(vec![value.trim().to_string()]),
            _ => None,
        }
    }

    /// `author` may be a plain string or a package.json-style `{ "name": ... }` object
    fn author(object: &Map<String, Value>) -> Option<String> {
        match object.get("author")? {
            Value::String(author) => Some(author.clone()),
            Value::Object(person) => Self::string(person, "name"),
            _ => None,
        }
    }
}

impl FormatParser for JsonParser {
    fn format(&self) -> TemplateFormat {
        TemplateFormat::Json
    }

    fn parse(&self, content: &str, path: &Path) -> CatalogResult<PartialMetadata> {
        let value: Value = serde_json::from_str(content)
            .map_err(|e| CatalogError::parse_error(path, e.to_string()))?;

        let Value::Object(object) = value else {
            return Err(CatalogError::parse_error(
                path,
                "expected a JSON object at the top level",
            ));
        };

        Ok(PartialMetadata {
            name: Self::string(&object, "name").or_else(|| Self::string(&object, "title")),
            description: Self::string(&object, "description"),
            version: Self::string(&object, "version"),
            author: Self::author(&object),
            category: Self::string(&object, "category"),
            tags: Self::list(&object, "tags"),
            supported_project_types: Self::list(&object, "supportedProjectTypes"),
            recommended_quality_levels: Self::list(&object, "recommendedQualityLevels"),
        })
    }
}
