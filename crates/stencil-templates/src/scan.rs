//! Incremental change detection between discoveries

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::TemplateMetadata;

/// Templates that changed since the last snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanResult {
    /// Files not present in the snapshot
    pub new_templates: Vec<TemplateMetadata>,
    /// Files whose modification time moved forward
    pub modified_templates: Vec<TemplateMetadata>,
    /// Snapshot entries no longer discovered, with their last known metadata
    pub deleted_templates: Vec<TemplateMetadata>,
}

impl ScanResult {
    /// Whether nothing changed
    pub fn is_empty(&self) -> bool {
        self.new_templates.is_empty()
            && self.modified_templates.is_empty()
            && self.deleted_templates.is_empty()
    }

    /// Total number of reported changes
    pub fn len(&self) -> usize {
        self.new_templates.len() + self.modified_templates.len() + self.deleted_templates.len()
    }
}

/// Baseline of indexed files keyed by absolute path
#[derive(Debug, Clone, Default)]
pub struct IndexSnapshot {
    entries: HashMap<PathBuf, TemplateMetadata>,
}

impl IndexSnapshot {
    /// Empty snapshot; every discovered file is new against it
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture the state of a set of templates
    pub fn from_templates<'a>(templates: impl IntoIterator<Item = &'a TemplateMetadata>) -> Self {
        Self {
            entries: templates
                .into_iter()
                .map(|template| (template.file_path.clone(), template.clone()))
                .collect(),
        }
    }

    /// Modification time recorded for a path
    pub fn last_modified(&self, path: &Path) -> Option<DateTime<Utc>> {
        self.entries.get(path).map(|template| template.last_modified)
    }

    /// Metadata recorded for a path
    pub fn get(&self, path: &Path) -> Option<&TemplateMetadata> {
        self.entries.get(path)
    }

    /// Number of recorded files
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no files are recorded
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Recorded metadata keyed by path
    pub fn templates_by_path(&self) -> HashMap<PathBuf, TemplateMetadata> {
        self.entries.clone()
    }

    /// Fold a scan result into the snapshot
    pub fn apply(&mut self, result: &ScanResult) {
        for template in result.new_templates.iter().chain(&result.modified_templates) {
            self.entries.insert(template.file_path.clone(), template.clone());
        }
        for template in &result.deleted_templates {
            self.entries.remove(&template.file_path);
        }
    }

    /// Compare freshly discovered templates against the snapshot
    ///
    /// A file only counts as modified when its timestamp is strictly later
    /// than the recorded one.
    pub fn diff(&self, current: &[TemplateMetadata]) -> ScanResult {
        let mut result = ScanResult::default();

        for template in current {
            match self.entries.get(&template.file_path) {
                None => result.new_templates.push(template.clone()),
                Some(previous) if template.last_modified > previous.last_modified => {
                    result.modified_templates.push(template.clone())
                }
                Some(_) => {}
            }
        }

        let present: HashSet<&Path> = current.iter().map(|template| template.file_path.as_path()).collect();
        let mut deleted: Vec<&TemplateMetadata> = self
            .entries
            .iter()
            .filter(|(path, _)| !present.contains(path.as_path()))
            .map(|(_, template)| template)
            .collect();
        deleted.sort_by(|a, b| a.file_path.cmp(&b.file_path));
        result.deleted_templates = deleted.into_iter().cloned().collect();

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{QualityLevel, TemplateCategory, TemplateFormat, UsageStats, ValidationResult};
    use chrono::Duration;

    fn template(path: &str, last_modified: DateTime<Utc>) -> TemplateMetadata {
        TemplateMetadata {
            id: path.replace('/', "-"),
            name: path.to_string(),
            description: String::new(),
            version: None,
            author: "unknown".to_string(),
            file_path: PathBuf::from(format!("/t/{}", path)),
            relative_path: PathBuf::from(path),
            format: TemplateFormat::Json,
            category: TemplateCategory::General,
            tags: Vec::new(),
            supported_project_types: vec!["basic".to_string()],
            recommended_quality_levels: vec![QualityLevel::Medium],
            size: 2,
            last_modified,
            validation: ValidationResult {
                valid: true,
                errors: Vec::new(),
                timestamp: last_modified,
                validator: "test".to_string(),
            },
            usage_stats: UsageStats::default(),
        }
    }

    #[test]
    fn test_unchanged_set_is_empty() {
        let now = Utc::now();
        let templates = vec![template("a.json", now), template("b.json", now)];
        let snapshot = IndexSnapshot::from_templates(&templates);

        let result = snapshot.diff(&templates);
        assert!(result.is_empty());
        assert_eq!(result.len(), 0);
    }

    #[test]
    fn test_new_modified_deleted() {
        let now = Utc::now();
        let snapshot = IndexSnapshot::from_templates(&[
            template("keep.json", now),
            template("edit.json", now),
            template("gone.json", now),
        ]);

        let current = vec![
            template("keep.json", now),
            template("edit.json", now + Duration::seconds(1)),
            template("added.json", now),
        ];
        let result = snapshot.diff(&current);

        assert_eq!(result.new_templates.len(), 1);
        assert!(result.new_templates[0].file_path.ends_with("added.json"));
        assert_eq!(result.modified_templates.len(), 1);
        assert!(result.modified_templates[0].file_path.ends_with("edit.json"));
        assert_eq!(result.deleted_templates.len(), 1);
        assert!(result.deleted_templates[0].file_path.ends_with("gone.json"));
    }

    #[test]
    fn test_equal_or_earlier_timestamp_is_not_modified() {
        let now = Utc::now();
        let snapshot = IndexSnapshot::from_templates(&[template("a.json", now), template("b.json", now)]);

        let result = snapshot.diff(&[template("a.json", now), template("b.json", now - Duration::seconds(5))]);
        assert!(result.is_empty());
    }

    #[test]
    fn test_empty_snapshot_reports_everything_new() {
        let now = Utc::now();
        let result = IndexSnapshot::new().diff(&[template("a.json", now)]);
        assert_eq!(result.new_templates.len(), 1);
        assert!(result.deleted_templates.is_empty());
    }

    #[test]
    fn test_apply_moves_baseline() {
        let now = Utc::now();
        let mut snapshot = IndexSnapshot::from_templates(&[template("a.json", now), template("b.json", now)]);
        let later = now + Duration::seconds(2);
        let current = vec![template("a.json", later), template("c.json", now)];

        let result = snapshot.diff(&current);
        snapshot.apply(&result);

        assert!(snapshot.diff(&current).is_empty());
        assert_eq!(snapshot.last_modified(Path::new("/t/a.json")), Some(later));
        assert!(snapshot.get(Path::new("/t/b.json")).is_none());
        assert_eq!(snapshot.templates_by_path().len(), 2);
    }

    #[test]
    fn test_lookup() {
        let now = Utc::now();
        let snapshot = IndexSnapshot::from_templates(&[template("a.json", now)]);
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.last_modified(Path::new("/t/a.json")), Some(now));
        assert!(snapshot.get(Path::new("/t/missing.json")).is_none());
    }
}
