//! Assets, the HTML document, the worker script, and write semantics.

mod common;

use common::{config, Project};
use shard_build::BuildError;
use shard_diagnostics::DiagnosticCode;

const WORKER: &str = r#"
[worker]
src = "src/serviceWorker.js"
"#;

#[test]
fn asset_ignore_globs_skip_matching_files() {
    let assets = r#"
[[assets]]
from = "src/img"
to = "img"
ignore = ["tmp/**"]
"#;
    let project = Project::new(&config("./src/index.js", assets));
    project.write("src/index.js", "export {};\n");
    project.write("src/img/a.png", [0x89, b'P', b'N', b'G']);
    project.write("src/img/tmp/b.png", "temp");

    project.build();
    let files = project.out_files();
    assert!(files.contains(&"img/a.png".to_string()));
    assert!(!files.iter().any(|f| f.contains("b.png")));
    assert_eq!(
        std::fs::read(project.out().join("img/a.png")).unwrap(),
        vec![0x89, b'P', b'N', b'G']
    );
}

#[test]
fn overlapping_asset_mappings_warn() {
    let assets = r#"
[[assets]]
from = "public"

[[assets]]
from = "src/robots.txt"
"#;
    let project = Project::new(&config("./src/index.js", assets));
    project.write("src/index.js", "export {};\n");
    project.write("public/robots.txt", "old");
    project.write("src/robots.txt", "new");

    let (_, sink) = project.build();
    assert_eq!(project.read_out("robots.txt"), "new");
    let warnings = sink.sorted();
    assert!(warnings.iter().any(|d| d.code == DiagnosticCode::DUPLICATE_ASSET));
}

#[test]
fn html_lists_runtime_shared_then_entry() {
    let extra = r#"
[[cache_groups]]
name = "vendors"
test = { packages = ["lib"] }
enforce = true

[html]
template = "src/index.html"
"#;
    let project = Project::new(&config("./src/index.js", extra));
    project.write("src/index.js", "import 'lib';\nimport('./lazy');\n");
    project.write("src/lazy.js", "export {};\n");
    project.write("node_modules/lib/index.js", "module.exports = 1;\n");
    project.write(
        "src/index.html",
        "<html><head><title>Ready</title></head><body><div id=\"root\"></div></body></html>",
    );

    let (report, _) = project.build();
    let html = project.read_out("index.html");
    let position = |name: &str| {
        let file = &report.chunks.iter().find(|c| c.name == name).unwrap().filename;
        html.find(file.as_str())
    };
    let runtime = position("runtime").unwrap();
    let vendors = position("vendors").unwrap();
    let bundle = position("bundle").unwrap();
    assert!(runtime < vendors && vendors < bundle);
    assert!(bundle < html.find("</body>").unwrap());

    let lazy = report
        .chunks
        .iter()
        .find(|c| c.kind == shard_chunk::ChunkKind::Async)
        .unwrap();
    assert!(!html.contains(&lazy.filename), "async chunks load at runtime");
}

#[test]
fn worker_receives_sorted_manifest() {
    let assets = r#"
[[assets]]
from = "src/robots.txt"

[worker]
src = "src/serviceWorker.js"
exclude = ["*.txt"]
"#;
    let project = Project::new(&config("./src/index.js", assets));
    project.write("src/index.js", "import('./page');\n");
    project.write("src/page.js", "export {};\n");
    project.write("src/robots.txt", "User-agent: *");
    project.write(
        "src/serviceWorker.js",
        "import { precacheAndRoute } from 'workbox-precaching';\nprecacheAndRoute(self.__WB_MANIFEST);\n",
    );

    let (report, _) = project.build();
    let urls: Vec<&str> = report.manifest.iter().map(|e| e.url.as_str()).collect();
    let mut sorted = urls.clone();
    sorted.sort();
    assert_eq!(urls, sorted);
    assert!(urls.contains(&"/index.html"));
    assert!(!urls.contains(&"/sw.js"));
    assert!(!urls.contains(&"/robots.txt"));
    for chunk in &report.chunks {
        assert!(urls.contains(&format!("/{}", chunk.filename).as_str()));
    }

    let worker = project.read_out("sw.js");
    assert!(!worker.contains("self.__WB_MANIFEST"));
    assert!(worker.contains(&format!("\"revision\":\"{}\"", report.manifest[0].revision)));
}

#[test]
fn asset_at_worker_path_is_replaced_and_not_precached() {
    let extra = r#"
[[assets]]
from = "static/sw.js"

[worker]
src = "src/serviceWorker.js"
"#;
    let project = Project::new(&config("./src/index.js", extra));
    project.write("src/index.js", "export {};\n");
    project.write("static/sw.js", "// stale worker\n");
    project.write("src/serviceWorker.js", "precacheAndRoute(self.__WB_MANIFEST);\n");

    let (report, sink) = project.build();
    let urls: Vec<&str> = report.manifest.iter().map(|e| e.url.as_str()).collect();
    assert!(!urls.contains(&"/sw.js"), "worker path precached: {urls:?}");
    assert!(urls.contains(&"/index.html"));
    assert!(sink
        .diagnostics()
        .iter()
        .any(|d| d.code == DiagnosticCode::DUPLICATE_ASSET));
    assert!(project.read_out("sw.js").starts_with("precacheAndRoute(["));
}

#[test]
fn missing_marker_fails_and_writes_nothing() {
    let project = Project::new(&config("./src/index.js", WORKER));
    project.write("src/index.js", "export {};\n");
    project.write("src/serviceWorker.js", "self.addEventListener('fetch', () => {});\n");
    project.write("build/previous.txt", "kept");

    let err = project.try_build().unwrap_err();
    assert!(matches!(err, BuildError::Emit(_)));
    assert_eq!(err.code(), DiagnosticCode::MANIFEST_INJECTION);
    assert_eq!(project.out_files(), vec!["previous.txt"]);
}

#[test]
fn clean_replaces_previous_output() {
    let project = Project::new(&config("./src/index.js", ""));
    project.write("src/index.js", "export {};\n");
    project.write("build/stale.bundle.00000000.js", "old");

    project.build();
    let files = project.out_files();
    assert!(!files.contains(&"stale.bundle.00000000.js".to_string()));
    assert!(files.contains(&"index.html".to_string()));
}

#[test]
fn plan_writes_nothing() {
    let project = Project::new(&config("./src/index.js", ""));
    project.write("src/index.js", "export {};\n");
    let plan = project.plan();
    assert_eq!(plan.chunks.len(), 2);
    assert!(!project.out().exists());
    let text = plan.to_string();
    assert!(text.starts_with("ready: 1 modules in 2 chunks"));
    assert!(text.contains("bundle (entry) -> bundle.bundle."));
}
