//! In-memory multi-key template index

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::models::{TemplateCategory, TemplateMetadata};

/// Summary of the index contents
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    /// Number of indexed templates
    pub total_templates: usize,
    /// Distinct categories
    pub categories: usize,
    /// Distinct project types
    pub project_types: usize,
    /// Distinct tags
    pub tags: usize,
    /// Distinct authors
    pub authors: usize,
    /// Rough memory footprint of the secondary indices
    pub approximate_size_bytes: usize,
}

/// Split text into lower-cased alphanumeric tokens
pub fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
}

type Postings<K> = BTreeMap<K, BTreeSet<String>>;

fn add<K: Ord>(postings: &mut Postings<K>, key: K, id: &str) {
    postings.entry(key).or_default().insert(id.to_string());
}

fn drop_id<K: Ord>(postings: &mut Postings<K>, key: &K, id: &str) {
    if let Some(ids) = postings.get_mut(key) {
        ids.remove(id);
        if ids.is_empty() {
            postings.remove(key);
        }
    }
}

/// Index over discovered templates
///
/// Every read returns an owned snapshot sorted by template id; lookups on
/// unknown keys return an empty list.
#[derive(Debug, Clone, Default)]
pub struct TemplateIndex {
    templates: HashMap<String, TemplateMetadata>,
    by_category: Postings<TemplateCategory>,
    by_project_type: Postings<String>,
    by_tag: Postings<String>,
    by_author: Postings<String>,
    by_token: Postings<String>,
}

impl TemplateIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index from a list of templates
    pub fn from_templates(templates: impl IntoIterator<Item = TemplateMetadata>) -> Self {
        let mut index = Self::new();
        index.rebuild(templates);
        index
    }

    /// Clear and re-populate every index
    pub fn rebuild(&mut self, templates: impl IntoIterator<Item = TemplateMetadata>) {
        self.clear();
        for template in templates {
            self.insert(template);
        }
    }

    fn tokens(template: &TemplateMetadata) -> BTreeSet<String> {
        tokenize(&template.name)
            .chain(tokenize(&template.description))
            .chain(template.tags.iter().flat_map(|tag| tokenize(tag)))
            .collect()
    }

    /// Add a template, replacing any template with the same id
    pub fn insert(&mut self, template: TemplateMetadata) {
        self.remove(&template.id);

        let id = template.id.as_str();
        add(&mut self.by_category, template.category, id);
        add(&mut self.by_author, template.author.clone(), id);
        for project_type in &template.supported_project_types {
            add(&mut self.by_project_type, project_type.clone(), id);
        }
        for tag in &template.tags {
            add(&mut self.by_tag, tag.clone(), id);
        }
        for token in Self::tokens(&template) {
            add(&mut self.by_token, token, id);
        }

        self.templates.insert(template.id.clone(), template);
    }

    /// Remove a template by id, returning it when it was indexed
    pub fn remove(&mut self, id: &str) -> Option<TemplateMetadata> {
        let template = self.templates.remove(id)?;

        drop_id(&mut self.by_category, &template.category, id);
        drop_id(&mut self.by_author, &template.author, id);
        for project_type in &template.supported_project_types {
            drop_id(&mut self.by_project_type, project_type, id);
        }
        for tag in &template.tags {
            drop_id(&mut self.by_tag, tag, id);
        }
        for token in Self::tokens(&template) {
            drop_id(&mut self.by_token, &token, id);
        }

        Some(template)
    }

    /// Remove every template
    pub fn clear(&mut self) {
        self.templates.clear();
        self.by_category.clear();
        self.by_project_type.clear();
        self.by_tag.clear();
        self.by_author.clear();
        self.by_token.clear();
    }

    fn collect<'a>(&self, ids: impl IntoIterator<Item = &'a String>) -> Vec<TemplateMetadata> {
        ids.into_iter()
            .filter_map(|id| self.templates.get(id))
            .cloned()
            .collect()
    }

    fn lookup<K: Ord>(&self, postings: &Postings<K>, key: &K) -> Vec<TemplateMetadata> {
        postings.get(key).map(|ids| self.collect(ids)).unwrap_or_default()
    }

    /// Templates in a category
    pub fn by_category(&self, category: TemplateCategory) -> Vec<TemplateMetadata> {
        self.lookup(&self.by_category, &category)
    }

    /// Templates supporting a project type
    pub fn by_project_type(&self, project_type: &str) -> Vec<TemplateMetadata> {
        self.lookup(&self.by_project_type, &project_type.to_string())
    }

    /// Templates carrying a tag
    pub fn by_tag(&self, tag: &str) -> Vec<TemplateMetadata> {
        self.lookup(&self.by_tag, &tag.to_string())
    }

    /// Templates by an author
    pub fn by_author(&self, author: &str) -> Vec<TemplateMetadata> {
        self.lookup(&self.by_author, &author.to_string())
    }

    /// Free-text search over names, descriptions and tags
    ///
    /// The query is tokenized like indexed text. A template matches when each
    /// query token is a substring of one of its tokens. A query without any
    /// token matches everything.
    pub fn search(&self, query: &str) -> Vec<TemplateMetadata> {
        let mut matched: Option<BTreeSet<&String>> = None;

        for query_token in tokenize(query) {
            let ids: BTreeSet<&String> = self
                .by_token
                .iter()
                .filter(|(token, _)| token.contains(query_token.as_str()))
                .flat_map(|(_, ids)| ids.iter())
                .collect();

            let narrowed = match matched {
                Some(previous) => previous.intersection(&ids).copied().collect(),
                None => ids,
            };
            if narrowed.is_empty() {
                return Vec::new();
            }
            matched = Some(narrowed);
        }

        match matched {
            Some(ids) => self.collect(ids),
            None => self.all(),
        }
    }

    /// Look up a template by id
    pub fn get(&self, id: &str) -> Option<TemplateMetadata> {
        self.templates.get(id).cloned()
    }

    /// Every indexed template
    pub fn all(&self) -> Vec<TemplateMetadata> {
        let ids: BTreeSet<&String> = self.templates.keys().collect();
        self.collect(ids)
    }

    /// Number of indexed templates
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Whether the index is empty
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    fn postings_size<K>(postings: &Postings<K>, key_size: impl Fn(&K) -> usize) -> usize {
        postings
            .iter()
            .map(|(key, ids)| key_size(key) + ids.iter().map(String::len).sum::<usize>())
            .sum()
    }

    /// Summarize the index
    pub fn stats(&self) -> IndexStats {
        let approximate_size_bytes = Self::postings_size(&self.by_category, |c| c.as_str().len())
            + Self::postings_size(&self.by_project_type, String::len)
            + Self::postings_size(&self.by_tag, String::len)
            + Self::postings_size(&self.by_author, String::len)
            + Self::postings_size(&self.by_token, String::len);

        IndexStats {
            total_templates: self.templates.len(),
            categories: self.by_category.len(),
            project_types: self.by_project_type.len(),
            tags: self.by_tag.len(),
            authors: self.by_author.len(),
            approximate_size_bytes,
        }
    }
}
