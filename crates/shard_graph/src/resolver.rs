//! Specifier resolution.
//!
//! Relative specifiers (`./`, `../`) resolve against the importing module's
//! directory, absolute ones are used as-is, and bare specifiers are tried
//! against each search path in priority order. For every base path the
//! candidates are, in order:
//!
//! 1. the path itself, if it is a file
//! 2. the path with each configured extension appended
//! 3. for a directory, the `main` field of its `package.json`
//! 4. for a directory, `index` with each configured extension

use std::path::{Path, PathBuf};

use serde::Deserialize;
use shard_common::normalize_path;
use shard_config::BuildOptions;

/// Resolves import specifiers to files on disk.
#[derive(Debug, Clone)]
pub struct Resolver {
    search_paths: Vec<PathBuf>,
    extensions: Vec<String>,
}

#[derive(Deserialize)]
struct PackageManifest {
    main: Option<String>,
}

impl Resolver {
    /// Creates a resolver from explicit search paths and extensions.
    pub fn new(search_paths: Vec<PathBuf>, extensions: Vec<String>) -> Self {
        Self {
            search_paths,
            extensions,
        }
    }

    /// Creates a resolver from build options.
    pub fn from_options(options: &BuildOptions) -> Self {
        Self::new(options.search_paths.clone(), options.extensions.clone())
    }

    /// Resolves `specifier` imported from a file in `base_dir`.
    ///
    /// Returns `None` when no candidate exists; the caller turns that into
    /// an unresolved-import error with the importer's name.
    pub fn resolve(&self, specifier: &str, base_dir: &Path) -> Option<PathBuf> {
        if is_relative(specifier) {
            return self.resolve_path(&base_dir.join(specifier));
        }
        let path = Path::new(specifier);
        if path.is_absolute() {
            return self.resolve_path(path);
        }
        self.search_paths
            .iter()
            .find_map(|dir| self.resolve_path(&dir.join(specifier)))
    }

    fn resolve_path(&self, path: &Path) -> Option<PathBuf> {
        self.resolve_file(path)
            .or_else(|| self.resolve_directory(path, 0))
    }

    fn resolve_file(&self, path: &Path) -> Option<PathBuf> {
        if path.is_file() {
            return Some(path.to_path_buf());
        }
        self.extensions.iter().find_map(|ext| {
            let mut candidate = path.as_os_str().to_os_string();
            candidate.push(ext);
            let candidate = PathBuf::from(candidate);
            candidate.is_file().then_some(candidate)
        })
    }

    fn resolve_directory(&self, dir: &Path, depth: usize) -> Option<PathBuf> {
        if !dir.is_dir() {
            return None;
        }
        if depth < 2 {
            if let Some(main) = read_main(dir) {
                let target = dir.join(&main);
                let found = self.resolve_file(&target).or_else(|| {
                    // "main": "." or "./" points back at the package itself.
                    if normalize_path(&target) == normalize_path(dir) {
                        None
                    } else {
                        self.resolve_directory(&target, depth + 1)
                    }
                });
                if found.is_some() {
                    return found;
                }
            }
        }
        self.resolve_file(&dir.join("index"))
    }
}

fn read_main(dir: &Path) -> Option<String> {
    let text = std::fs::read_to_string(dir.join("package.json")).ok()?;
    match serde_json::from_str::<PackageManifest>(&text) {
        Ok(manifest) => manifest.main.filter(|m| !m.is_empty()),
        Err(err) => {
            tracing::debug!(dir = %dir.display(), error = %err, "ignoring malformed package.json");
            None
        }
    }
}

fn is_relative(specifier: &str) -> bool {
    specifier == "."
        || specifier == ".."
        || specifier.starts_with("./")
        || specifier.starts_with("../")
}
