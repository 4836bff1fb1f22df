//! End-to-end tests for the template catalog
//!
//! Exercises the public API the way a scaffolding CLI would: load a
//! configuration file, open the catalog over a realistic template tree,
//! query it, then follow changes through scans and a live watch.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use stencil_templates::{
    CatalogConfig, ChangeKind, ContentValidator, QualityLevel, TemplateCatalog, TemplateCategory,
    TemplateFormat, ValidationContext,
};
use tempfile::TempDir;
use tokio_stream::StreamExt;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn backdate(path: &Path) {
    fs::File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(SystemTime::now() - Duration::from_secs(600))
        .unwrap();
}

/// Lay out a small but varied template tree
fn write_tree(root: &Path) {
    let files: &[(&str, &str)] = &[
        (
            "react/src/component.tsx.hbs",
            "---\nname: React Component\ndescription: Functional component with props\ntags: [react, ui, component]\nsupportedProjectTypes: [react, web]\nrecommendedQualityLevels: [strict, high]\nauthor: Stencil Team\nversion: 1.2.0\n---\nexport const {{Name}} = () => <div>{{children}}</div>;\n",
        ),
        (
            "react/tests/component.test.tsx.hbs",
            "{{!-- title: Component Test --}}\n{{!-- tags: react, testing --}}\nit('renders {{Name}}', () => {});\n",
        ),
        (
            "docs/readme.yaml",
            "# project readme metadata\nname: \"Project Readme\"\ndescription: Top-level README\ncategory: documentation\nsupportedProjectTypes: [basic, cli, library]\n",
        ),
        (
            "node/package.json",
            r#"{"name": "package-manifest", "description": "npm package manifest", "author": {"name": "Stencil Team"}, "supportedProjectTypes": ["express", "fastify"], "category": "configuration"}"#,
        ),
        ("scripts/deploy.yml", "name: Deploy Script\ntags: [ops]\n"),
        ("broken/invalid.json", "{\"name\": \"Broken\""),
        ("assets/logo.svg", "<svg/>"),
    ];

    for (relative, content) in files {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        backdate(&path);
    }
}

#[tokio::test]
async fn test_catalog_lifecycle_from_config_file() {
    init_tracing();
    let temp_dir = TempDir::new().unwrap();
    let templates = temp_dir.path().join("templates");
    write_tree(&templates);

    let config_path = temp_dir.path().join("stencil.yaml");
    fs::write(
        &config_path,
        format!(
            "templatesDir: {}\nautoDiscovery: true\ncache:\n  enabled: true\n  ttl: 300\n  maxSize: 100\n",
            templates.display()
        ),
    )
    .unwrap();

    let config = CatalogConfig::load_from_file(&config_path).unwrap();
    let mut catalog = TemplateCatalog::open(config).await.unwrap();

    // The broken manifest and the svg are skipped
    assert_eq!(catalog.len(), 5);
    let report = catalog.discover_with_report(&templates).await.unwrap();
    assert_eq!(report.skipped.len(), 1);
    assert!(report.skipped[0].path.ends_with("invalid.json"));

    let component = catalog.get("react-src-component-tsx-hbs").expect("component indexed");
    assert_eq!(component.name, "React Component");
    assert_eq!(component.format, TemplateFormat::Placeholder);
    assert_eq!(component.category, TemplateCategory::Source);
    assert_eq!(component.version.as_deref(), Some("1.2.0"));
    assert_eq!(component.recommended_quality_levels, vec![QualityLevel::Strict, QualityLevel::High]);
    assert!(component.validation.valid);

    let test = catalog.get("react-tests-component-test-tsx-hbs").unwrap();
    assert_eq!(test.category, TemplateCategory::Testing);
    assert_eq!(test.tags, vec!["react".to_string(), "testing".to_string()]);
    assert_eq!(test.author, "unknown");

    assert_eq!(catalog.by_category(TemplateCategory::Documentation).len(), 1);
    assert_eq!(catalog.by_category(TemplateCategory::Scripts).len(), 1);
    assert_eq!(catalog.by_project_type("react").len(), 1);
    assert_eq!(catalog.by_project_type("basic").len(), 3);
    assert_eq!(catalog.by_author("Stencil Team").len(), 2);
    assert_eq!(catalog.by_tag("react").len(), 2);
    assert_eq!(catalog.search("component").len(), 2);
    assert_eq!(catalog.search("readme top").len(), 1);
    assert!(catalog.search("kubernetes").is_empty());

    let stats = catalog.stats();
    assert_eq!(stats.total_templates, 5);
    assert_eq!(stats.categories, 5);
    assert!(stats.approximate_size_bytes > 0);

    // Second discovery over unchanged files is served from the cache
    assert!(catalog.cache_stats().hits >= 5);

    fs::write(templates.join("scripts/deploy.yml"), "name: Deploy Script v2\n").unwrap();
    fs::remove_file(templates.join("docs/readme.yaml")).unwrap();
    fs::write(templates.join("docs/guide.yaml"), "name: Guide\n").unwrap();

    let changes = catalog.scan(&templates).await.unwrap();
    assert_eq!(changes.new_templates.len(), 1);
    assert_eq!(changes.modified_templates.len(), 1);
    assert_eq!(changes.deleted_templates.len(), 1);
    assert_eq!(changes.deleted_templates[0].name, "Project Readme");
    assert_eq!(catalog.search("v2").len(), 1);

    catalog.close();
}

struct NoTodoMarkers;

impl ContentValidator for NoTodoMarkers {
    fn id(&self) -> &str {
        "no-todo"
    }

    fn validate(&self, ctx: &ValidationContext<'_>) -> Vec<String> {
        if ctx.content.contains("TODO") {
            vec!["unfinished template".to_string()]
        } else {
            Vec::new()
        }
    }
}

#[tokio::test]
async fn test_extensibility_settings() {
    init_tracing();
    let temp_dir = TempDir::new().unwrap();
    fs::write(
        temp_dir.path().join("desktop.yaml"),
        "name: Desktop\nsupportedProjectTypes: [electron, tauri]\n",
    )
    .unwrap();
    fs::write(temp_dir.path().join("draft.hbs"), "TODO {{x}}").unwrap();

    let mut config = CatalogConfig::new(temp_dir.path());
    config.validation_rules = vec!["non-empty".to_string()];
    config.extensibility.enabled = true;
    config.extensibility.auto_register_new_types = true;
    config.extensibility.custom_validators = vec!["no-todo".to_string()];

    let catalog = TemplateCatalog::builder(config)
        .validator(Arc::new(NoTodoMarkers))
        .open()
        .await
        .unwrap();

    assert_eq!(catalog.registered_project_types(), vec!["tauri".to_string()]);
    assert_eq!(catalog.by_project_type("tauri").len(), 1);

    let draft = catalog.get("draft-hbs").unwrap();
    assert!(!draft.validation.valid);
    assert_eq!(draft.validation.errors, vec!["[no-todo] unfinished template".to_string()]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_watch_stream_reports_changes() {
    init_tracing();
    let temp_dir = TempDir::new().unwrap();
    let existing = temp_dir.path().join("existing.json");
    fs::write(&existing, r#"{"name": "Existing"}"#).unwrap();

    let catalog = TemplateCatalog::open(CatalogConfig::new(temp_dir.path())).await.unwrap();
    let mut stream = catalog.watch(temp_dir.path()).await.unwrap().into_stream();

    fs::remove_file(&existing).unwrap();

    let deleted = tokio::time::timeout(Duration::from_secs(10), async {
        while let Some(change) = stream.next().await {
            if change.kind == ChangeKind::Deleted && change.path.ends_with("existing.json") {
                return Some(change);
            }
        }
        None
    })
    .await
    .ok()
    .flatten()
    .expect("deletion event");

    // Indexed files carry their last known metadata on deletion
    assert_eq!(deleted.template.map(|t| t.name), Some("Existing".to_string()));
}
