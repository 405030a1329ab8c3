// tests/config_validation.rs

use std::io::Write;
use std::path::Path;

use pedigree::config::{load_and_validate, ProjectConfig};
use pedigree::errors::PedigreeError;
use pedigree::dag::resolve_plugins;
use pedigree::plugin::{PluginId, PluginRegistry};
use pedigree_test_utils::builders::ProjectConfigBuilder;
use tempfile::{NamedTempFile, TempDir};

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", contents).unwrap();
    file
}

#[test]
fn defaults_apply_to_an_empty_file() {
    let file = write_config("");
    let cfg = load_and_validate(file.path()).unwrap();

    assert_eq!(cfg.locales(), ["en-US".to_string()]);
    assert_eq!(cfg.default_locale(), "en-US");
    assert!(!cfg.is_multilingual());
    assert_eq!(cfg.concurrency(), 512);
    assert_eq!(cfg.base_url(), "https://example.com");
    assert!(cfg.selected_plugins().is_empty());
    assert!(cfg.logo().is_none());
}

#[test]
fn relative_paths_resolve_against_the_config_directory() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("Pedigree.toml");
    std::fs::write(
        &path,
        r#"
[project]
output_directory = "site"
logo = "assets/logo.png"
"#,
    )
    .unwrap();

    let cfg = load_and_validate(&path).unwrap();
    assert_eq!(cfg.output_directory(), dir.path().join("site"));
    assert_eq!(cfg.www_directory(), dir.path().join("site").join("www"));
    assert_eq!(cfg.logo(), Some(dir.path().join("assets/logo.png").as_path()));
}

#[test]
fn full_config_is_loaded() {
    let file = write_config(
        r#"
[project]
base_url = "https://family.example.org/"
root_path = "/tree/"
locales = ["en-US", "nl-NL"]
concurrency = 16

[entity_type.person]
generate_html_list = true

[plugin.maps]

[plugin.nginx]
https = false

[plugin.trees]
enabled = false
"#,
    );
    let cfg = load_and_validate(file.path()).unwrap();

    assert_eq!(cfg.base_url(), "https://family.example.org");
    assert_eq!(cfg.root_path(), "tree");
    assert!(cfg.is_multilingual());
    assert_eq!(cfg.locale_prefix("nl-NL"), Path::new("nl-NL"));
    assert_eq!(cfg.concurrency(), 16);
    assert!(cfg.generates_html_list("person"));
    assert!(!cfg.generates_html_list("place"));
    assert_eq!(
        cfg.selected_plugins(),
        vec![PluginId::new("maps").unwrap(), PluginId::new("nginx").unwrap()]
    );
    let nginx = cfg.plugin_options("nginx").unwrap();
    assert_eq!(nginx.get("https").and_then(|v| v.as_bool()), Some(false));
    assert!(!nginx.contains_key("enabled"));
}

#[test]
fn empty_locales_are_rejected() {
    let raw = ProjectConfigBuilder::new().locales(&[]).raw();
    let err = ProjectConfig::try_from(raw).unwrap_err();
    assert!(matches!(err, PedigreeError::ConfigError(ref msg) if msg.contains("locale")));
}

#[test]
fn duplicate_locales_are_rejected() {
    let raw = ProjectConfigBuilder::new().locales(&["en-US", "en-US"]).raw();
    let err = ProjectConfig::try_from(raw).unwrap_err();
    assert!(matches!(err, PedigreeError::ConfigError(ref msg) if msg.contains("en-US")));
}

#[test]
fn locales_that_are_not_plain_path_segments_are_rejected() {
    for locale in ["../outside", "en/US", "en\\US", "..", "en\nUS", " "] {
        let raw = ProjectConfigBuilder::new().locales(&["en-US", locale]).raw();
        let err = ProjectConfig::try_from(raw).unwrap_err();
        assert!(
            matches!(err, PedigreeError::ConfigError(ref msg) if msg.contains("invalid locale")),
            "{locale:?} was accepted"
        );
    }
}

#[test]
fn zero_concurrency_is_rejected() {
    let raw = ProjectConfigBuilder::new().concurrency(0).raw();
    let err = ProjectConfig::try_from(raw).unwrap_err();
    assert!(matches!(err, PedigreeError::ConfigError(ref msg) if msg.contains("concurrency")));
}

#[test]
fn non_http_base_url_is_rejected() {
    let raw = ProjectConfigBuilder::new().base_url("ftp://example.com").raw();
    assert!(matches!(
        ProjectConfig::try_from(raw),
        Err(PedigreeError::ConfigError(_))
    ));
}

#[test]
fn invalid_plugin_ids_are_rejected() {
    let file = write_config(
        r#"
[plugin.Maps]
"#,
    );
    let err = load_and_validate(file.path()).unwrap_err();
    assert!(matches!(err, PedigreeError::ConfigError(ref msg) if msg.contains("Maps")));
}

#[test]
fn plugins_are_selected_in_configuration_order() {
    let file = write_config(
        r#"
[plugin.trees]

[plugin.nginx]

[plugin.anonymizer]
"#,
    );
    let cfg = load_and_validate(file.path()).unwrap();

    assert_eq!(
        cfg.selected_plugins(),
        vec![
            PluginId::new("trees").unwrap(),
            PluginId::new("nginx").unwrap(),
            PluginId::new("anonymizer").unwrap(),
        ]
    );

    let registry = PluginRegistry::builtin().unwrap();
    let batches = resolve_plugins(&cfg.selected_plugins(), &registry).unwrap();
    let first: Vec<&str> = batches.iter().next().unwrap().iter().map(|id| id.as_str()).collect();
    assert_eq!(first, ["nginx", "anonymizer", "js"]);
}

#[test]
fn unknown_plugin_ids_are_not_a_config_error() {
    let cfg = ProjectConfigBuilder::new().with_plugin("not-registered").build();
    assert_eq!(cfg.selected_plugins(), vec![PluginId::new("not-registered").unwrap()]);
}

#[test]
fn malformed_toml_is_reported() {
    let file = write_config("[project\nbase_url = ");
    let err = load_and_validate(file.path()).unwrap_err();
    assert!(matches!(err, PedigreeError::TomlError(_)));
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = TempDir::new().unwrap();
    let err = load_and_validate(dir.path().join("missing.toml")).unwrap_err();
    assert!(matches!(err, PedigreeError::IoError(_)));
}

#[test]
fn concurrency_override_never_drops_below_one() {
    let mut cfg = ProjectConfigBuilder::new().build();
    cfg.set_concurrency(0);
    assert_eq!(cfg.concurrency(), 1);
    cfg.set_concurrency(64);
    assert_eq!(cfg.concurrency(), 64);
}
