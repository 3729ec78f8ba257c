//! End-to-end builds of a two-page project.

use std::fs;
use std::path::Path;

use sheaf_bundler::{Bundler, Error};
use sheaf_config::{ConfigError, SheafConfig};
use tempfile::TempDir;

const MANIFEST: &str = r#"
[entry]
index = "src/js/index.js"
list = "src/js/list.js"

[output]
path = "dist"
filename = "js/[name].js"
public_path = "../"

[[module.rules]]
test = '\.scss$'
use = [{ loader = "extract-css", public_path = "../" }, "css", "sass"]

[[module.rules]]
test = '\.(png|jpe?g|gif|svg)$'
use = [{ loader = "url", limit = 8192, name = "image/[name].[ext]" }]

[[module.rules]]
test = '\.html$'
use = ["html"]

[[plugins]]
kind = "html"
filename = "pages/index.html"
template = "src/pages/index.html"
chunks = ["index"]
minify = false

[[plugins]]
kind = "html"
filename = "pages/list.html"
template = "src/pages/list.html"
chunks = ["list"]

[[plugins]]
kind = "extract-css"
filename = "css/[name].css"

[[plugins]]
kind = "clean"
"#;

const PAGE: &str = "<!DOCTYPE html>
<html>
  <head>
    <meta charset=\"utf-8\">
    <!-- page -->
  </head>
  <body>
    <img src=\"../image/small.png\">
  </body>
</html>
";

fn project(manifest: &str) -> TempDir {
    let dir = TempDir::new().unwrap();
    let files: &[(&str, &[u8])] = &[
        (
            "src/js/index.js",
            b"import '../css/index.scss';\n\
              import { greet } from './shared';\n\
              import logo from '../image/small.png';\n\
              document.title = greet('index');\n\
              document.body.dataset.logo = logo;\n",
        ),
        (
            "src/js/list.js",
            b"import '../css/list.scss';\nimport { greet } from './shared';\ngreet('list');\n",
        ),
        (
            "src/js/shared.js",
            b"export function greet(name) {\n  return 'hello ' + name;\n}\n",
        ),
        (
            "src/css/index.scss",
            b".logo { background: url(../image/small.png); }\n\
              .hero { .banner { background: url(\"../image/big.png\"); } }\n",
        ),
        ("src/css/list.scss", b"$gap: 4px;\n.list { margin: $gap; }\n"),
        ("src/pages/index.html", PAGE.as_bytes()),
        ("src/pages/list.html", PAGE.as_bytes()),
        ("src/image/small.png", &[0x89, b'P', b'N', b'G', 1, 2, 3, 4]),
    ];
    for (path, content) in files {
        let path = dir.path().join(path);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }
    fs::write(dir.path().join("src/image/big.png"), vec![7u8; 10_000]).unwrap();
    fs::write(dir.path().join("sheaf.toml"), manifest).unwrap();
    dir
}

fn config(manifest: &str) -> SheafConfig {
    SheafConfig::from_toml_str(manifest).unwrap()
}

fn text(dir: &Path, file: &str) -> String {
    fs::read_to_string(dir.join(file)).unwrap()
}

#[test]
fn emits_one_bundle_per_entry() {
    let dir = project(MANIFEST);
    let output = Bundler::new(config(MANIFEST), dir.path()).build().unwrap();

    assert_eq!(output.entry_file("index"), Some("js/index.js"));
    assert_eq!(output.entry_file("list"), Some("js/list.js"));
    assert!(output.assets.contains("js/index.js"));
    assert!(output.assets.contains("js/list.js"));

    let index = output.assets.get("js/index.js").unwrap().as_str().unwrap();
    assert!(index.contains("\"./src/js/shared.js\": function (module, exports, __sheaf_require__)"));
    assert!(index.contains("__sheaf_require__(\"./src/js/index.js\");"));
    assert!(!index.contains("import "));
}

#[test]
fn small_images_inline_and_large_images_are_emitted() {
    let dir = project(MANIFEST);
    let output = Bundler::new(config(MANIFEST), dir.path()).build().unwrap();
    output.write().unwrap();
    let dist = dir.path().join("dist");

    let css = text(&dist, "css/index.css");
    assert!(css.contains("url(data:image/png;base64,"));
    assert!(css.contains("url(\"../image/big.png\")"));
    assert_eq!(fs::read(dist.join("image/big.png")).unwrap(), vec![7u8; 10_000]);
    assert!(!dist.join("image/small.png").exists());

    let script = text(&dist, "js/index.js");
    assert!(script.contains("module.exports = \"data:image/png;base64,"));

    let page = text(&dist, "pages/index.html");
    assert!(page.contains("<img src=\"data:image/png;base64,"));
}

#[test]
fn pages_reference_only_their_entries() {
    let dir = project(MANIFEST);
    let output = Bundler::new(config(MANIFEST), dir.path()).build().unwrap();

    let index = output.assets.get("pages/index.html").unwrap().as_str().unwrap();
    assert!(index.contains("<link rel=\"stylesheet\" href=\"../css/index.css\"></head>"));
    assert!(index.contains("<script src=\"../js/index.js\"></script></body>"));
    assert!(!index.contains("list.js"));
    assert!(index.contains("<!-- page -->"));

    let list = output.assets.get("pages/list.html").unwrap().as_str().unwrap();
    assert!(list.contains("../js/list.js"));
    assert!(list.contains("../css/list.css"));
    assert!(!list.contains("index.js"));
    assert!(!list.contains("index.css"));
}

#[test]
fn stylesheets_are_files_not_injected() {
    let dir = project(MANIFEST);
    let output = Bundler::new(config(MANIFEST), dir.path()).build().unwrap();

    assert_eq!(output.chunk("index").unwrap().css_file.as_deref(), Some("css/index.css"));
    let list_css = output.assets.get("css/list.css").unwrap().as_str().unwrap();
    assert!(list_css.contains(".list"));
    assert!(list_css.contains("margin: 4px"));

    for (name, asset) in output.assets.iter().filter(|(n, _)| n.ends_with(".js")) {
        let code = asset.as_str().unwrap();
        assert!(!code.contains("createElement(\"style\")"), "{name} injects styles");
        assert!(!code.contains(".list {"), "{name} embeds css");
    }
}

#[test]
fn rebuilding_removes_stale_output() {
    let dir = project(MANIFEST);
    let dist = dir.path().join("dist");
    fs::create_dir_all(dist.join("old")).unwrap();
    fs::write(dist.join("old/stale.js"), "stale").unwrap();

    Bundler::new(config(MANIFEST), dir.path())
        .build()
        .unwrap()
        .write()
        .unwrap();
    assert!(!dist.join("old").exists());

    let renamed = MANIFEST.replace("filename = \"js/[name].js\"", "filename = \"scripts/[name].js\"");
    Bundler::new(config(&renamed), dir.path())
        .build()
        .unwrap()
        .write()
        .unwrap();
    assert!(dist.join("scripts/index.js").exists());
    assert!(!dist.join("js").exists());
}

#[test]
fn without_clean_plugin_output_accumulates() {
    let manifest = MANIFEST.replace("[[plugins]]\nkind = \"clean\"\n", "");
    let dir = project(&manifest);
    let dist = dir.path().join("dist");
    fs::create_dir_all(&dist).unwrap();
    fs::write(dist.join("keep.txt"), "kept").unwrap();

    Bundler::new(config(&manifest), dir.path())
        .build()
        .unwrap()
        .write()
        .unwrap();
    assert!(dist.join("keep.txt").exists());
}

#[test]
fn relative_urls_without_public_path() {
    let manifest = MANIFEST
        .replace("public_path = \"../\"\n\n[[module.rules]]", "\n[[module.rules]]")
        .replace("{ loader = \"extract-css\", public_path = \"../\" }", "\"extract-css\"");
    let dir = project(&manifest);
    let output = Bundler::new(config(&manifest), dir.path()).build().unwrap();

    let css = output.assets.get("css/index.css").unwrap().as_str().unwrap();
    assert!(css.contains("url(\"../image/big.png\")"));
    let page = output.assets.get("pages/index.html").unwrap().as_str().unwrap();
    assert!(page.contains("<script src=\"../js/index.js\"></script>"));

    let script = output.assets.get("js/index.js").unwrap().as_str().unwrap();
    assert!(script.contains("new URL(\"../\", document.currentScript.src)"));
}

#[test]
fn dynamic_imports_become_async_chunks() {
    let dir = project(MANIFEST);
    fs::write(
        dir.path().join("src/js/list.js"),
        "import '../css/list.scss';\ndocument.onclick = () => import('./lazy');\n",
    )
    .unwrap();
    fs::write(dir.path().join("src/js/lazy.js"), "import { greet } from './shared';\ngreet('lazy');\n").unwrap();

    let output = Bundler::new(config(MANIFEST), dir.path()).build().unwrap();

    let chunk = output.chunk("0").unwrap();
    assert_eq!(chunk.js_file.as_deref(), Some("js/0.js"));
    assert_eq!(chunk.modules, ["./src/js/shared.js", "./src/js/lazy.js"]);

    let lazy = output.assets.get("js/0.js").unwrap().as_str().unwrap();
    assert!(lazy.starts_with("self.__sheaf__.define({"));

    let list = output.assets.get("js/list.js").unwrap().as_str().unwrap();
    assert!(list.contains("\"0\":{\"js\":\"js/0.js\",\"css\":null}"));
    assert!(list.contains("__sheaf_require__.e(\"0\")"));
    assert!(!list.contains("\"./src/js/lazy.js\": function"));
}

#[test]
fn production_minifies_styles_and_pages() {
    let manifest = format!("mode = \"production\"\n{MANIFEST}");
    let dir = project(&manifest);
    let output = Bundler::new(config(&manifest), dir.path()).build().unwrap();

    let css = output.assets.get("css/list.css").unwrap().as_str().unwrap();
    assert!(!css.contains('\n'));

    // minify = false on the index page overrides the mode
    let index = output.assets.get("pages/index.html").unwrap().as_str().unwrap();
    assert!(index.contains("<!-- page -->"));
    let list = output.assets.get("pages/list.html").unwrap().as_str().unwrap();
    assert!(!list.contains("<!-- page -->"));
    assert!(!list.contains(">\n"));

    let script = output.assets.get("js/index.js").unwrap().as_str().unwrap();
    assert!(!script.contains("// ./src/js/shared.js"));
}

#[test]
fn file_matching_two_rules_fails() {
    let manifest = MANIFEST.replace("test = '\\.html$'", "test = '\\.(html|png)$'");
    let dir = project(&manifest);
    let err = Bundler::new(config(&manifest), dir.path()).build().unwrap_err();
    match err {
        Error::AmbiguousRule { path, .. } => assert!(path.ends_with("small.png")),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn file_matching_no_rule_fails() {
    let dir = project(MANIFEST);
    fs::write(dir.path().join("src/js/notes.txt"), "notes").unwrap();
    fs::write(dir.path().join("src/js/list.js"), "import './notes.txt';\n").unwrap();

    let err = Bundler::new(config(MANIFEST), dir.path()).build().unwrap_err();
    assert!(matches!(err, Error::NoMatchingRule { path } if path.ends_with("notes.txt")));
}

#[test]
fn missing_template_fails_before_writing() {
    let dir = project(MANIFEST);
    fs::remove_file(dir.path().join("src/pages/list.html")).unwrap();

    let err = Bundler::new(config(MANIFEST), dir.path()).build().unwrap_err();
    assert!(matches!(err, Error::Config(ConfigError::TemplateNotFound { .. })));
    assert!(!dir.path().join("dist").exists());
}

#[test]
fn templated_pages_render_parameters() {
    let manifest = MANIFEST.replace(
        "chunks = [\"list\"]\n",
        "chunks = [\"list\"]\ntitle = \"All items\"\ntemplate_parameters = { items = [\"a\", \"b\"] }\n",
    );
    let dir = project(&manifest);
    fs::write(
        dir.path().join("src/pages/list.html"),
        "<html><head><title>{{ title }}</title></head><body>{% for i in items %}<li>{{ i }}</li>{% endfor %}</body></html>",
    )
    .unwrap();

    let output = Bundler::new(config(&manifest), dir.path()).build().unwrap();
    let list = output.assets.get("pages/list.html").unwrap().as_str().unwrap();
    assert!(list.contains("<title>All items</title>"));
    assert!(list.contains("<li>a</li><li>b</li>"));
}

#[test]
fn output_root_containing_the_project_is_not_cleaned() {
    let manifest = MANIFEST.replace("path = \"dist\"", "path = \".\"");
    let dir = project(&manifest);
    let output = Bundler::new(config(&manifest), dir.path()).build().unwrap();

    assert!(matches!(output.write().unwrap_err(), Error::UnsafeClean { .. }));
    assert!(dir.path().join("src/js/index.js").exists());
}

#[test]
fn numeric_entry_names_do_not_collide_with_async_chunks() {
    let manifest = MANIFEST
        .replace("index = \"src/js/index.js\"", "\"0\" = \"src/js/index.js\"")
        .replace("chunks = [\"index\"]", "chunks = [\"0\"]");
    let dir = project(&manifest);
    fs::write(
        dir.path().join("src/js/index.js"),
        "import '../css/index.scss';\ndocument.onclick = () => import('./lazy');\n",
    )
    .unwrap();
    fs::write(dir.path().join("src/js/lazy.js"), "export const lazy = true;\n").unwrap();

    let output = Bundler::new(config(&manifest), dir.path()).build().unwrap();

    assert!(output.assets.overwritten().is_empty());
    assert_eq!(output.entry_file("0"), Some("js/0.js"));
    assert_eq!(output.chunk("1").unwrap().js_file.as_deref(), Some("js/1.js"));

    let entry = output.assets.get("js/0.js").unwrap().as_str().unwrap();
    assert!(entry.contains("__sheaf_require__.e(\"1\")"));
    let lazy = output.assets.get("js/1.js").unwrap().as_str().unwrap();
    assert!(lazy.starts_with("self.__sheaf__.define({"));
}

#[test]
fn import_text_in_comments_and_strings_is_not_bundled() {
    let dir = project(MANIFEST);
    fs::write(
        dir.path().join("src/js/list.js"),
        "import '../css/list.scss';\n\
         // old: const legacy = require('./legacy');\n\
         const help = \"call import('./plugin') to load\";\n\
         const tip = `see require('./tip')`;\n\
         console.log(help, tip);\n",
    )
    .unwrap();

    let output = Bundler::new(config(MANIFEST), dir.path()).build().unwrap();
    let list = output.assets.get("js/list.js").unwrap().as_str().unwrap();
    assert!(list.contains("// old: const legacy = require('./legacy');"));
    assert!(list.contains("\"call import('./plugin') to load\""));
}

#[test]
fn every_exported_declarator_reaches_importers() {
    let dir = project(MANIFEST);
    fs::write(
        dir.path().join("src/js/shared.js"),
        "export const greet = (name) => 'hello ' + name, wave = () => 'wave';\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("src/js/list.js"),
        "import '../css/list.scss';\nimport { greet, wave } from './shared';\ngreet(wave());\n",
    )
    .unwrap();

    let output = Bundler::new(config(MANIFEST), dir.path()).build().unwrap();
    let list = output.assets.get("js/list.js").unwrap().as_str().unwrap();
    assert!(list.contains("\"greet\": function () { return greet; }"));
    assert!(list.contains("\"wave\": function () { return wave; }"));
}

#[test]
fn invalid_script_fails_with_its_path() {
    let dir = project(MANIFEST);
    fs::write(dir.path().join("src/js/list.js"), "import { from './shared';\n").unwrap();

    let err = Bundler::new(config(MANIFEST), dir.path()).build().unwrap_err();
    assert!(matches!(err, Error::Parse { path, .. } if path.ends_with("src/js/list.js")));
}
