//! Temporary project trees for end-to-end pipeline tests.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use shard_build::{build, load_options, plan, BuildError, BuildReport, Plan};
use shard_config::{BuildOptions, Overrides};
use shard_diagnostics::DiagnosticSink;
use tempfile::TempDir;

pub struct Project {
    pub dir: TempDir,
}

impl Project {
    /// Creates a project whose `shard.toml` is `config`.
    pub fn new(config: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("shard.toml"), config).unwrap();
        Self { dir }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn write(&self, rel: &str, content: impl AsRef<[u8]>) {
        let path = self.dir.path().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    pub fn options(&self) -> BuildOptions {
        load_options(None, self.root(), &Overrides::default()).unwrap()
    }

    pub fn try_build(&self) -> Result<(BuildReport, DiagnosticSink), BuildError> {
        let sink = DiagnosticSink::new();
        let report = build(&self.options(), &sink)?;
        Ok((report, sink))
    }

    pub fn build(&self) -> (BuildReport, DiagnosticSink) {
        self.try_build().unwrap_or_else(|e| panic!("build failed: {e}"))
    }

    pub fn plan(&self) -> Plan {
        plan(&self.options(), &DiagnosticSink::new()).unwrap()
    }

    pub fn out(&self) -> PathBuf {
        self.dir.path().join("build")
    }

    pub fn read_out(&self, rel: &str) -> String {
        fs::read_to_string(self.out().join(rel)).unwrap()
    }

    /// Output files other than `shard.toml`-relative sources, sorted.
    pub fn out_files(&self) -> Vec<String> {
        let mut files: Vec<String> = walk(&self.out())
            .into_iter()
            .map(|p| {
                p.strip_prefix(self.out())
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect();
        files.sort();
        files
    }
}

fn walk(dir: &Path) -> Vec<PathBuf> {
    let mut out = Vec::new();
    let Ok(entries) = fs::read_dir(dir) else {
        return out;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            out.extend(walk(&path));
        } else {
            out.push(path);
        }
    }
    out
}

/// A config with one `bundle` entry and extra sections appended.
pub fn config(entry: &str, extra: &str) -> String {
    format!(
        r#"[project]
name = "ready"

[entry]
bundle = "{entry}"

[resolve]
modules = ["node_modules"]
extensions = [".js", ".jsx"]

[output]
filename = "[name].bundle.[contenthash:8].js"
{extra}
"#
    )
}
