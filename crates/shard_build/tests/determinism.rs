//! Content-addressed naming across repeated and edited builds.

mod common;

use std::collections::BTreeMap;

use common::{config, Project};

fn app() -> Project {
    let project = Project::new(&config("./src/index.js", ""));
    project.write(
        "src/index.js",
        "import { util } from './util';\nconst a = import('./pages/a');\nconst b = import('./pages/b');\n",
    );
    project.write("src/util.js", "export const util = 1;\n");
    project.write("src/pages/a.js", "export default 'a';\n");
    project.write("src/pages/b.js", "export default 'b';\n");
    project
}

fn filenames(project: &Project) -> BTreeMap<String, String> {
    let (report, _) = project.build();
    report
        .chunks
        .into_iter()
        .map(|c| (c.name, c.filename))
        .collect()
}

fn async_name(project: &Project, module: &str) -> String {
    let plan = project.plan();
    plan.chunks
        .into_iter()
        .find(|c| c.modules == vec![module.to_string()])
        .map(|c| c.name)
        .unwrap()
}

#[test]
fn repeated_builds_are_byte_identical() {
    let project = app();
    let (first, _) = project.build();
    let first_bytes: Vec<_> = project
        .out_files()
        .into_iter()
        .map(|f| (f.clone(), project.read_out(&f)))
        .collect();

    let (second, _) = project.build();
    let second_bytes: Vec<_> = project
        .out_files()
        .into_iter()
        .map(|f| (f.clone(), project.read_out(&f)))
        .collect();

    let names = |r: &shard_build::BuildReport| {
        r.chunks.iter().map(|c| c.filename.clone()).collect::<Vec<_>>()
    };
    assert_eq!(names(&first), names(&second));
    assert_eq!(first_bytes, second_bytes);
}

#[test]
fn leaf_edit_renames_only_its_chunk_and_the_runtime() {
    let project = app();
    let a = async_name(&project, "src/pages/a.js");
    let b = async_name(&project, "src/pages/b.js");
    let before = filenames(&project);

    project.write("src/pages/a.js", "export default 'A';\n");
    let after = filenames(&project);

    assert_ne!(before[&a], after[&a], "edited chunk is renamed");
    assert_eq!(before[&b], after[&b], "sibling chunk keeps its name");
    assert_eq!(before["bundle"], after["bundle"], "parent references by name only");
    assert_ne!(before["runtime"], after["runtime"], "runtime embeds chunk filenames");
}

#[test]
fn edit_inside_entry_renames_entry_but_not_runtime() {
    let project = app();
    let before = filenames(&project);
    project.write("src/util.js", "export const util = 2;\n");
    let after = filenames(&project);

    assert_ne!(before["bundle"], after["bundle"]);
    assert_eq!(before["runtime"], after["runtime"]);
    for (name, file) in &before {
        if name != "bundle" {
            assert_eq!(file, &after[name], "{name} should be unchanged");
        }
    }
}

#[test]
fn hashed_names_follow_the_template() {
    let project = app();
    for (name, file) in filenames(&project) {
        let hash = file
            .strip_prefix(&format!("{name}.bundle."))
            .and_then(|rest| rest.strip_suffix(".js"))
            .unwrap_or_else(|| panic!("unexpected filename {file}"));
        assert_eq!(hash.len(), 8);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }
}

#[test]
fn development_mode_skips_minification_but_keeps_names() {
    let project = app();
    project.write(
        "src/util.js",
        "export const util = 1;\n\n\n\nexport const other = 2;\n",
    );
    let production = filenames(&project);
    let prod_bundle = project.read_out(&production["bundle"]);

    let mut options = project.options();
    options.minimize = false;
    let report = shard_build::build(&options, &shard_diagnostics::DiagnosticSink::new()).unwrap();
    let dev: BTreeMap<_, _> = report.chunks.into_iter().map(|c| (c.name, c.filename)).collect();
    let dev_bundle = project.read_out(&dev["bundle"]);

    assert_eq!(production, dev);
    assert!(dev_bundle.len() > prod_bundle.len());
}
