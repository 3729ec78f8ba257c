//! Tests for manifest validation against the filesystem.

use sheaf_config::{
    ConfigError, ConfigValidator, FsValidator, HtmlPageOptions, PluginSpec, SheafConfig,
};
use std::fs;
use tempfile::TempDir;

fn project() -> TempDir {
    let dir = TempDir::new().expect("tempdir");
    fs::create_dir_all(dir.path().join("src/js")).expect("create js dir");
    fs::create_dir_all(dir.path().join("src/pages")).expect("create pages dir");
    fs::write(dir.path().join("src/js/index.js"), "console.log('index');").expect("write entry");
    dir
}

fn config_with_entry() -> SheafConfig {
    let mut cfg = SheafConfig::default();
    cfg.entry.insert("index".into(), "./src/js/index.js".into());
    cfg
}

#[test]
fn validate_catches_missing_entry() {
    let dir = project();
    let mut cfg = config_with_entry();
    cfg.entry.insert("list".into(), "./src/js/list.js".into());

    match FsValidator::new(dir.path()).validate(&cfg).unwrap_err() {
        ConfigError::EntryNotFound { name, path } => {
            assert_eq!(name, "list");
            assert!(path.ends_with("src/js/list.js"));
        }
        other => panic!("expected EntryNotFound, got {other:?}"),
    }
}

#[test]
fn validate_succeeds_when_entry_exists() {
    let dir = project();
    let result = FsValidator::new(dir.path()).validate(&config_with_entry());
    assert!(result.is_ok());
}

#[test]
fn validate_catches_missing_template() {
    let dir = project();
    let mut cfg = config_with_entry();
    cfg.plugins.push(PluginSpec::Html(HtmlPageOptions::new(
        "pages/index.html",
        "./src/pages/index.html",
    )));

    match FsValidator::new(dir.path()).validate(&cfg).unwrap_err() {
        ConfigError::TemplateNotFound { path } => {
            assert!(path.ends_with("src/pages/index.html"));
        }
        other => panic!("expected TemplateNotFound, got {other:?}"),
    }

    fs::write(dir.path().join("src/pages/index.html"), "<html></html>").expect("write template");
    assert!(FsValidator::new(dir.path()).validate(&cfg).is_ok());
}

#[test]
fn fs_validator_runs_schema_checks_first() {
    let dir = project();
    let cfg = SheafConfig::default();
    assert!(matches!(
        FsValidator::new(dir.path()).validate(&cfg).unwrap_err(),
        ConfigError::NoEntries
    ));
}

#[test]
fn directory_is_not_an_entry() {
    let dir = project();
    let mut cfg = SheafConfig::default();
    cfg.entry.insert("index".into(), "./src/js".into());
    assert!(matches!(
        FsValidator::new(dir.path()).validate(&cfg).unwrap_err(),
        ConfigError::EntryNotFound { .. }
    ));
}
