//! Template validation pass
//!
//! Runs a configurable set of built-in rules plus any custom validators over a
//! template's content and resolved metadata. Validation never rejects a file
//! from the catalog; it only records the outcome on the metadata.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use chrono::Utc;

use crate::models::{PartialMetadata, TemplateCategory, TemplateFormat, ValidationResult};

/// Name recorded in [`ValidationResult::validator`]
pub const VALIDATOR_NAME: &str = "stencil-templates";

/// Rules enabled when the configuration does not list any
pub const DEFAULT_RULES: &[&str] = &["non-empty", "metadata-name", "balanced-placeholders", "known-category"];

/// Everything a rule may look at
#[derive(Debug, Clone, Copy)]
pub struct ValidationContext<'a> {
    /// Absolute template path
    pub path: &'a Path,
    /// Raw file content
    pub content: &'a str,
    /// Template format
    pub format: TemplateFormat,
    /// Metadata as extracted by the parser
    pub partial: &'a PartialMetadata,
    /// Resolved template name
    pub name: &'a str,
}

/// A pluggable validation rule
pub trait ContentValidator: Send + Sync {
    /// Identifier used in `extensibility.custom_validators`
    fn id(&self) -> &str;

    /// Return one message per problem found
    fn validate(&self, ctx: &ValidationContext<'_>) -> Vec<String>;
}

/// Built-in rules, selected by identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinRule {
    /// Content must contain non-whitespace characters
    NonEmpty,
    /// Resolved name must not be blank
    MetadataName,
    /// Every `{{` in a placeholder template must be closed by a later `}}`
    BalancedPlaceholders,
    /// An embedded category must name a known category
    KnownCategory,
}

impl BuiltinRule {
    /// Identifier used in configuration
    pub fn id(&self) -> &'static str {
        match self {
            BuiltinRule::NonEmpty => "non-empty",
            BuiltinRule::MetadataName => "metadata-name",
            BuiltinRule::BalancedPlaceholders => "balanced-placeholders",
            BuiltinRule::KnownCategory => "known-category",
        }
    }

    /// Look up a rule by identifier
    pub fn from_id(id: &str) -> Option<Self> {
        match id.trim() {
            "non-empty" => Some(BuiltinRule::NonEmpty),
            "metadata-name" => Some(BuiltinRule::MetadataName),
            "balanced-placeholders" => Some(BuiltinRule::BalancedPlaceholders),
            "known-category" => Some(BuiltinRule::KnownCategory),
            _ => None,
        }
    }

    fn check(&self, ctx: &ValidationContext<'_>) -> Option<String> {
        match self {
            BuiltinRule::NonEmpty if ctx.content.trim().is_empty() => {
                Some("Template content is empty".to_string())
            }
            BuiltinRule::MetadataName if ctx.name.trim().is_empty() => {
                Some("Template name cannot be empty".to_string())
            }
            BuiltinRule::BalancedPlaceholders if ctx.format == TemplateFormat::Placeholder => {
                unclosed_placeholder(ctx.content)
                    .map(|offset| format!("Unclosed placeholder '{{{{' at byte {}", offset))
            }
            BuiltinRule::KnownCategory => ctx.partial.category.as_deref().and_then(|category| {
                category
                    .parse::<TemplateCategory>()
                    .err()
                    .map(|e| format!("{}; falling back to the inferred category", e))
            }),
            _ => None,
        }
    }
}

/// Byte offset of the first `{{` with no closing `}}` after it
///
/// A stray `}}` outside a placeholder is plain text, as in nested object
/// literals.
fn unclosed_placeholder(content: &str) -> Option<usize> {
    let mut offset = 0;
    loop {
        let start = offset + content[offset..].find("{{")?;
        let body = start + 2;
        match content[body..].find("}}") {
            Some(end) => offset = body + end + 2,
            None => return Some(start),
        }
    }
}

/// Runs enabled rules and custom validators
#[derive(Clone)]
pub struct ValidationEngine {
    rules: Vec<BuiltinRule>,
    custom: Vec<Arc<dyn ContentValidator>>,
}

impl ValidationEngine {
    /// Create an engine from rule identifiers and custom validators
    ///
    /// Unknown identifiers are ignored with a warning. An empty list enables
    /// [`DEFAULT_RULES`].
    pub fn new(rule_ids: &[String], custom: Vec<Arc<dyn ContentValidator>>) -> Self {
        let rules = if rule_ids.is_empty() {
            DEFAULT_RULES.iter().filter_map(|id| BuiltinRule::from_id(id)).collect()
        } else {
            let mut rules = Vec::new();
            for id in rule_ids {
                match BuiltinRule::from_id(id) {
                    Some(rule) if !rules.contains(&rule) => rules.push(rule),
                    Some(_) => {}
                    None => tracing::warn!(rule = %id, "ignoring unknown validation rule"),
                }
            }
            rules
        };

        Self { rules, custom }
    }

    /// Engine with the default rules and no custom validators
    pub fn with_defaults() -> Self {
        Self::new(&[], Vec::new())
    }

    /// Identifiers of the active built-in rules and custom validators
    pub fn active_rules(&self) -> Vec<String> {
        self.rules
            .iter()
            .map(|rule| rule.id().to_string())
            .chain(self.custom.iter().map(|validator| validator.id().to_string()))
            .collect()
    }

    /// Validate one template
    pub fn validate(&self, ctx: &ValidationContext<'_>) -> ValidationResult {
        let mut errors: Vec<String> = self.rules.iter().filter_map(|rule| rule.check(ctx)).collect();

        for validator in &self.custom {
            errors.extend(
                validator
                    .validate(ctx)
                    .into_iter()
                    .map(|message| format!("[{}] {}", validator.id(), message)),
            );
        }

        ValidationResult {
            valid: errors.is_empty(),
            errors,
            timestamp: Utc::now(),
            validator: VALIDATOR_NAME.to_string(),
        }
    }
}

impl Default for ValidationEngine {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl fmt::Debug for ValidationEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationEngine")
            .field("rules", &self.rules)
            .field("custom", &self.custom.iter().map(|v| v.id()).collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoTodo;

    impl ContentValidator for NoTodo {
        fn id(&self) -> &str {
            "no-todo"
        }

        fn validate(&self, ctx: &ValidationContext<'_>) -> Vec<String> {
            if ctx.content.contains("TODO") {
                vec!["template contains TODO markers".to_string()]
            } else {
                Vec::new()
            }
        }
    }

    fn context<'a>(content: &'a str, format: TemplateFormat, partial: &'a PartialMetadata) -> ValidationContext<'a> {
        ValidationContext {
            path: Path::new("/templates/component.hbs"),
            content,
            format,
            partial,
            name: "component",
        }
    }

    #[test]
    fn test_valid_template() {
        let partial = PartialMetadata::default();
        let result = ValidationEngine::with_defaults()
            .validate(&context("<div>{{name}}</div>", TemplateFormat::Placeholder, &partial));

        assert!(result.valid);
        assert!(result.errors.is_empty());
        assert_eq!(result.validator, VALIDATOR_NAME);
    }

    #[test]
    fn test_empty_content() {
        let partial = PartialMetadata::default();
        let result = ValidationEngine::with_defaults().validate(&context("  \n", TemplateFormat::Yaml, &partial));
        assert!(!result.valid);
        assert_eq!(result.errors.len(), 1);
    }

    #[test]
    fn test_unbalanced_placeholders_only_checked_for_placeholder_format() {
        let partial = PartialMetadata::default();
        let engine = ValidationEngine::with_defaults();

        let hbs = engine.validate(&context("<div>{{name</div>", TemplateFormat::Placeholder, &partial));
        assert!(!hbs.valid);

        // Nested JSON objects legitimately end with "}}"
        let json = engine.validate(&context(r#"{"a": {"b": 1}}"#, TemplateFormat::Json, &partial));
        assert!(json.valid);
    }

    #[test]
    fn test_nested_braces_after_placeholder_are_valid() {
        let partial = PartialMetadata::default();
        let engine = ValidationEngine::with_defaults();

        let config = engine.validate(&context(
            "export const config = { server: { port: {{port}} }};",
            TemplateFormat::Placeholder,
            &partial,
        ));
        assert!(config.valid, "{:?}", config.errors);

        let jsx = engine.validate(&context(
            "<Box style={{ margin: 0 }}>{{#if open}}{{label}}{{/if}}</Box>",
            TemplateFormat::Placeholder,
            &partial,
        ));
        assert!(jsx.valid, "{:?}", jsx.errors);
    }

    #[test]
    fn test_unclosed_placeholder_offset() {
        assert_eq!(unclosed_placeholder("{{a}} {{b"), Some(6));
        assert_eq!(unclosed_placeholder("}} {{a}} }}"), None);
        assert_eq!(unclosed_placeholder("no placeholders"), None);
    }

    #[test]
    fn test_unknown_embedded_category() {
        let partial = PartialMetadata {
            category: Some("widgets".to_string()),
            ..Default::default()
        };
        let result = ValidationEngine::with_defaults().validate(&context("x", TemplateFormat::Yaml, &partial));
        assert!(!result.valid);
        assert!(result.errors[0].contains("widgets"));
    }

    #[test]
    fn test_rule_selection() {
        let engine = ValidationEngine::new(&["non-empty".to_string(), "bogus".to_string()], Vec::new());
        assert_eq!(engine.active_rules(), vec!["non-empty".to_string()]);

        let partial = PartialMetadata::default();
        let result = engine.validate(&context("{{", TemplateFormat::Placeholder, &partial));
        assert!(result.valid, "balanced-placeholders is not enabled");
    }

    #[test]
    fn test_custom_validator() {
        let engine = ValidationEngine::new(&[], vec![Arc::new(NoTodo)]);
        assert!(engine.active_rules().contains(&"no-todo".to_string()));

        let partial = PartialMetadata::default();
        let result = engine.validate(&context("// TODO: fill in", TemplateFormat::Placeholder, &partial));
        assert!(!result.valid);
        assert_eq!(result.errors, vec!["[no-todo] template contains TODO markers".to_string()]);
    }
}
