//! Stage orchestration for `shard build`.

use std::path::{Path, PathBuf};

use serde::Serialize;
use shard_chunk::{build_chunk_graph, ChunkGraph, RuleSet, SplitOptions};
use shard_common::relative_resource;
use shard_config::{
    find_project_root, load_config, load_config_file, resolve_options, BuildOptions, Overrides,
};
use shard_diagnostics::DiagnosticSink;
use shard_emit::{
    build_manifest, collect_assets, html_scripts, inject_manifest, name_chunks, render_html,
    resolve_collisions, write_output, EmitError, EmittedChunk, FileKind, FilenameTemplate,
    ManifestEntry, Minifier, OutputFile, Passthrough, PrecacheOptions, StripWhitespace,
};
use shard_graph::{build_module_graph, Identity, ModuleGraph, SourceTransform};

use crate::error::BuildError;

/// The pluggable byte-level collaborators.
pub struct Collaborators<'a> {
    /// Applied to every module before scanning and hashing.
    pub transform: &'a dyn SourceTransform,
    /// Applied to chunk text after hashing when minimization is enabled.
    pub minifier: &'a dyn Minifier,
}

impl Default for Collaborators<'static> {
    fn default() -> Self {
        Self {
            transform: &Identity,
            minifier: &StripWhitespace,
        }
    }
}

/// A file written by the build.
#[derive(Debug, Clone, Serialize)]
pub struct EmittedFile {
    /// Path relative to the output directory.
    pub path: String,
    /// Producer.
    pub kind: FileKind,
    /// Size in bytes.
    pub size: usize,
}

/// Summary of a successful build.
#[derive(Debug, Clone, Serialize)]
pub struct BuildReport {
    /// Where the files were written.
    pub out_dir: PathBuf,
    /// Number of modules in the graph.
    pub modules: usize,
    /// Named chunks in chunk order.
    pub chunks: Vec<EmittedChunk>,
    /// Written files sorted by path.
    pub files: Vec<EmittedFile>,
    /// The injected precache manifest; empty without a worker.
    pub manifest: Vec<ManifestEntry>,
}

/// Loads `shard.toml` and resolves it into build options.
///
/// With `config`, that file is used and its directory is the project root;
/// otherwise the nearest `shard.toml` at or above `cwd` is used.
pub fn load_options(
    config: Option<&Path>,
    cwd: &Path,
    overrides: &Overrides,
) -> Result<BuildOptions, BuildError> {
    let (project, root) = match config {
        Some(path) => {
            let path = if path.is_absolute() {
                path.to_path_buf()
            } else {
                cwd.join(path)
            };
            let root = path.parent().map(Path::to_path_buf).unwrap_or_else(|| cwd.to_path_buf());
            (load_config_file(&path)?, root)
        }
        None => {
            let root = find_project_root(cwd)?;
            (load_config(&root)?, root)
        }
    };
    Ok(resolve_options(&project, &root, overrides))
}

/// Builds the module and chunk graphs.
pub(crate) fn prepare(
    options: &BuildOptions,
    transform: &dyn SourceTransform,
    sink: &DiagnosticSink,
) -> Result<(ModuleGraph, ChunkGraph), BuildError> {
    let graph = build_module_graph(options, transform)?;
    let rules = RuleSet::compile(&options.cache_groups)?;
    let chunks = build_chunk_graph(&graph, &rules, &SplitOptions::from_options(options), sink)?;
    Ok((graph, chunks))
}

/// Runs a build with the default collaborators.
pub fn build(options: &BuildOptions, sink: &DiagnosticSink) -> Result<BuildReport, BuildError> {
    build_with(options, &Collaborators::default(), sink)
}

/// Runs a build.
///
/// Warnings go to `sink`. On error nothing has been written.
#[tracing::instrument(skip_all, fields(project = %options.name))]
pub fn build_with(
    options: &BuildOptions,
    collaborators: &Collaborators<'_>,
    sink: &DiagnosticSink,
) -> Result<BuildReport, BuildError> {
    let (graph, chunks) = prepare(options, collaborators.transform, sink)?;

    let minifier: &dyn Minifier = if options.minimize {
        collaborators.minifier
    } else {
        &Passthrough
    };
    let template = FilenameTemplate::new(options.filename.as_str());
    let (emitted, assets) = rayon::join(
        || name_chunks(&graph, &chunks, &template, &options.public_path, minifier),
        || collect_assets(&options.assets, sink),
    );
    let assets = assets?;

    let mut files: Vec<OutputFile> = assets
        .into_iter()
        .map(|asset| OutputFile {
            path: asset.path,
            bytes: asset.bytes,
            hash: asset.hash,
            kind: FileKind::Asset,
        })
        .collect();
    files.extend(emitted.iter().map(|chunk| OutputFile {
        path: chunk.filename.clone(),
        bytes: chunk.text.clone().into_bytes(),
        hash: chunk.hash,
        kind: FileKind::Chunk,
    }));
    let html = render_document(options, &chunks, &emitted)?;
    files.push(OutputFile::new(
        options.html_filename.as_str(),
        html.into_bytes(),
        FileKind::Html,
    ));
    let mut files = resolve_collisions(files, sink);

    let mut manifest = Vec::new();
    if let Some(worker) = &options.worker {
        let precache = PrecacheOptions::new(worker, &options.public_path)?;
        manifest = build_manifest(&files, &precache, sink);
        let template = read_text(&worker.src)?;
        let script = inject_manifest(
            &template,
            &relative_resource(&options.root, &worker.src),
            &worker.marker,
            &manifest,
        )?;
        files.push(OutputFile::new(
            worker.dest.as_str(),
            script.into_bytes(),
            FileKind::Worker,
        ));
        files = resolve_collisions(files, sink);
        tracing::debug!(entries = manifest.len(), "precache manifest injected");
    }

    write_output(&options.out_dir, &files, options.clean)?;

    let mut written: Vec<EmittedFile> = files
        .iter()
        .map(|f| EmittedFile {
            path: f.path.clone(),
            kind: f.kind,
            size: f.bytes.len(),
        })
        .collect();
    written.sort_by(|a, b| a.path.cmp(&b.path));
    tracing::info!(
        modules = graph.module_count(),
        chunks = emitted.len(),
        files = written.len(),
        "build finished"
    );
    Ok(BuildReport {
        out_dir: options.out_dir.clone(),
        modules: graph.module_count(),
        chunks: emitted,
        files: written,
        manifest,
    })
}

fn render_document(
    options: &BuildOptions,
    chunks: &ChunkGraph,
    emitted: &[EmittedChunk],
) -> Result<String, BuildError> {
    let template = options.html_template.as_deref().map(read_text).transpose()?;
    let scripts = html_scripts(chunks, emitted, &options.public_path);
    Ok(render_html(template.as_deref(), &options.name, &scripts))
}

fn read_text(path: &Path) -> Result<String, BuildError> {
    std::fs::read_to_string(path).map_err(|source| {
        EmitError::Io {
            path: path.to_path_buf(),
            source,
        }
        .into()
    })
}
