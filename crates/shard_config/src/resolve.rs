//! Resolution of a parsed [`ProjectConfig`] into immutable [`BuildOptions`].

use std::path::{Path, PathBuf};

use shard_common::normalize_path;

use crate::types::{CacheGroupConfig, Mode, ProjectConfig};

/// Command-line overrides applied on top of `shard.toml`.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    /// Replaces `project.mode`.
    pub mode: Option<Mode>,
    /// Replaces `output.path`; relative paths are relative to the project root.
    pub out_dir: Option<PathBuf>,
}

/// A static-asset mapping with its source resolved to an absolute path.
#[derive(Debug, Clone)]
pub struct AssetMapping {
    /// Absolute source file or directory.
    pub from: PathBuf,
    /// Normalized destination directory relative to the output directory;
    /// empty for the output root.
    pub to: String,
    /// Ignore globs relative to `from`.
    pub ignore: Vec<String>,
}

/// Service-worker settings with the template resolved to an absolute path.
#[derive(Debug, Clone)]
pub struct WorkerOptions {
    /// Absolute path of the worker template.
    pub src: PathBuf,
    /// Output path relative to the output directory.
    pub dest: String,
    /// Marker text replaced by the manifest literal.
    pub marker: String,
    /// URL globs left out of the manifest.
    pub exclude: Vec<String>,
    /// Size limit for precached files, in bytes.
    pub maximum_file_size: u64,
}

/// Development server settings.
#[derive(Debug, Clone)]
pub struct ServerOptions {
    /// Interface to listen on.
    pub host: String,
    /// TCP port.
    pub port: u16,
    /// Serve the HTML document for unknown extension-less paths.
    pub history_fallback: bool,
}

/// Everything a build needs, with every path made absolute.
///
/// Constructed once per invocation and shared by reference with every stage.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Project name.
    pub name: String,
    /// Project root; relative entry specifiers resolve against it.
    pub root: PathBuf,
    /// Effective build mode.
    pub mode: Mode,
    /// Entries in iteration order.
    pub entries: Vec<(String, Vec<String>)>,
    /// Absolute search paths for bare specifiers, in priority order.
    pub search_paths: Vec<PathBuf>,
    /// Extension priority order.
    pub extensions: Vec<String>,
    /// Absolute output directory.
    pub out_dir: PathBuf,
    /// Chunk filename template.
    pub filename: String,
    /// URL prefix, always ending in `/`.
    pub public_path: String,
    /// Empty the output directory before writing.
    pub clean: bool,
    /// Whether the minifier runs over chunk text.
    pub minimize: bool,
    /// Minimum size of a non-enforced group chunk.
    pub min_size: u64,
    /// Maximum up-front chunk count per entry.
    pub max_initial_requests: Option<usize>,
    /// Cache-group rules in declaration order.
    pub cache_groups: Vec<CacheGroupConfig>,
    /// Asset mappings in declaration order.
    pub assets: Vec<AssetMapping>,
    /// Absolute HTML template path, if any.
    pub html_template: Option<PathBuf>,
    /// HTML output filename.
    pub html_filename: String,
    /// Worker settings, if a worker is configured.
    pub worker: Option<WorkerOptions>,
    /// Development server settings.
    pub server: ServerOptions,
}

/// Resolves a validated configuration against its project root.
pub fn resolve_options(config: &ProjectConfig, root: &Path, overrides: &Overrides) -> BuildOptions {
    let mode = overrides.mode.unwrap_or(config.project.mode);
    let absolute = |p: &str| -> PathBuf {
        let path = Path::new(p);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            root.join(path)
        }
    };

    let out_dir = match &overrides.out_dir {
        Some(dir) if dir.is_absolute() => dir.clone(),
        Some(dir) => root.join(dir),
        None => absolute(&config.output.path),
    };

    let mut public_path = config.output.public_path.clone();
    if !public_path.ends_with('/') {
        public_path.push('/');
    }

    let assets = config
        .assets
        .iter()
        .map(|m| AssetMapping {
            from: absolute(&m.from),
            to: normalize_path(Path::new(&m.to)),
            ignore: m.ignore.clone(),
        })
        .collect();

    let worker = config.worker.as_ref().map(|w| WorkerOptions {
        src: absolute(&w.src),
        dest: normalize_path(Path::new(&w.dest)),
        marker: w.marker.clone(),
        exclude: w.exclude.clone(),
        maximum_file_size: w.maximum_file_size,
    });

    let options = BuildOptions {
        name: config.project.name.clone(),
        root: root.to_path_buf(),
        mode,
        entries: config
            .entry
            .iter()
            .map(|(name, specs)| (name.clone(), specs.clone()))
            .collect(),
        search_paths: config.resolve.modules.iter().map(|m| absolute(m)).collect(),
        extensions: config.resolve.extensions.clone(),
        out_dir,
        filename: config.output.filename.clone(),
        public_path,
        clean: config.output.clean,
        minimize: config
            .optimization
            .minimize
            .unwrap_or(mode == Mode::Production),
        min_size: config.optimization.min_size,
        max_initial_requests: config.optimization.max_initial_requests,
        cache_groups: config.cache_groups.clone(),
        assets,
        html_template: config.html.template.as_deref().map(absolute),
        html_filename: config.html.filename.clone(),
        worker,
        server: ServerOptions {
            host: config.server.host.clone(),
            port: config.server.port,
            history_fallback: config.server.history_fallback,
        },
    };
    tracing::debug!(
        entries = options.entries.len(),
        cache_groups = options.cache_groups.len(),
        assets = options.assets.len(),
        "resolved build options"
    );
    options
}
