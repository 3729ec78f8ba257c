//! Tests for manifest profiles and merging behavior.

use sheaf_config::{ConfigDiscovery, ConfigError, LoaderSpec, Mode};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

const MANIFEST: &str = r#"
mode = "development"

[entry]
index = "./src/js/index.js"
list = "./src/js/list.js"

[output]
path = "dist"
filename = "js/[name].js"
public_path = "../"

[[module.rules]]
test = '\.(jpg|png|gif)$'
use = [{ loader = "url", limit = 8192, name = "image/[name].[ext]" }]

[[plugins]]
kind = "html"
filename = "pages/index.html"
template = "./src/pages/index.html"
chunks = ["index"]
minify = false

[dev_server]
hot = true

[profiles.production]
mode = "production"

[profiles.production.output]
filename = "js/[name].[contenthash].js"

[profiles.ci.dev_server]
port = 9000
"#;

fn write_manifest() -> TempDir {
    let dir = TempDir::new().expect("tempdir");
    fs::write(dir.path().join("sheaf.toml"), MANIFEST).expect("write config");
    dir
}

#[test]
fn profile_overrides_mode_and_output() {
    let dir = write_manifest();
    let config = ConfigDiscovery::new(dir.path())
        .load_with_profile("production")
        .expect("load with profile");

    assert_eq!(config.mode, Mode::Production);
    assert_eq!(config.output.filename, "js/[name].[contenthash].js");
    // Untouched keys survive the merge
    assert_eq!(config.output.path, PathBuf::from("dist"));
    assert_eq!(config.output.public_path.as_deref(), Some("../"));
    assert_eq!(config.entry.len(), 2);
}

#[test]
fn profile_merges_into_nested_tables() {
    let dir = write_manifest();
    let config = ConfigDiscovery::new(dir.path())
        .load_with_profile("ci")
        .expect("load with profile");

    let dev = config.dev_server.expect("dev server");
    assert_eq!(dev.port, 9000);
    assert!(dev.hot);
    assert_eq!(config.mode, Mode::Development);
}

#[test]
fn profile_keeps_rules_and_plugins() {
    let dir = write_manifest();
    let config = ConfigDiscovery::new(dir.path())
        .load_with_profile("production")
        .expect("load with profile");

    assert_eq!(
        config.module.rules[0].loaders,
        vec![LoaderSpec::Url {
            limit: 8192,
            name: "image/[name].[ext]".into()
        }]
    );
    let page = config.html_pages().next().expect("page");
    assert_eq!(page.minify, Some(false));
}

#[test]
fn missing_profile_is_reported() {
    let dir = write_manifest();
    let err = ConfigDiscovery::new(dir.path())
        .load_with_profile("staging")
        .unwrap_err();
    assert!(matches!(err, ConfigError::UnknownProfile { .. }));
}
