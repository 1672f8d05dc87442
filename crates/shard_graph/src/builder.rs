//! Breadth-first module graph construction.

use std::path::{Path, PathBuf};

use rayon::prelude::*;
use shard_common::ModuleId;
use shard_config::BuildOptions;

use crate::error::GraphError;
use crate::module::ModuleGraph;
use crate::resolver::Resolver;
use crate::scanner::{is_script, scan_imports, RawImport};
use crate::transform::SourceTransform;

/// A module read, transformed, and scanned off the main thread.
struct Loaded {
    id: ModuleId,
    content: Vec<u8>,
    imports: Vec<(RawImport, PathBuf)>,
}

/// Builds the module graph reachable from the configured entries.
///
/// Each discovery frontier is loaded in parallel. Results are merged in
/// frontier order, and imports are interned in source order, so module ids
/// and edge order are identical across runs. The first failure in that
/// order aborts the build.
pub fn build_module_graph(
    options: &BuildOptions,
    transform: &dyn SourceTransform,
) -> Result<ModuleGraph, GraphError> {
    let resolver = Resolver::from_options(options);
    let mut graph = ModuleGraph::new(&options.root);
    let mut frontier = Vec::new();

    for (name, specifiers) in &options.entries {
        let mut modules = Vec::with_capacity(specifiers.len());
        for specifier in specifiers {
            let path = resolver.resolve(specifier, &options.root).ok_or_else(|| {
                GraphError::UnresolvedImport {
                    specifier: specifier.clone(),
                    importer: format!("entry '{name}'"),
                }
            })?;
            let (id, is_new) = graph.intern(&path);
            if is_new {
                frontier.push(id);
            }
            if !modules.contains(&id) {
                modules.push(id);
            }
        }
        graph.add_entry(name, modules);
    }

    let mut rounds = 0usize;
    while !frontier.is_empty() {
        rounds += 1;
        let jobs: Vec<(ModuleId, PathBuf, String)> = frontier
            .iter()
            .map(|&id| {
                let module = graph.module(id);
                (id, module.path.clone(), module.name.clone())
            })
            .collect();

        let results: Vec<Result<Loaded, GraphError>> = jobs
            .par_iter()
            .map(|(id, path, name)| load_module(*id, path, name, &resolver, transform))
            .collect();

        let mut next = Vec::new();
        for result in results {
            let loaded = result?;
            graph.modules[loaded.id].content = loaded.content;
            for (import, path) in loaded.imports {
                let (target, is_new) = graph.intern(&path);
                if is_new {
                    next.push(target);
                }
                graph.add_dependency(loaded.id, target, import.kind, &import.specifier);
            }
        }
        tracing::trace!(round = rounds, discovered = next.len(), "graph frontier merged");
        frontier = next;
    }

    tracing::debug!(
        modules = graph.module_count(),
        entries = graph.entries.len(),
        rounds,
        "module graph built"
    );
    Ok(graph)
}

fn load_module(
    id: ModuleId,
    path: &Path,
    name: &str,
    resolver: &Resolver,
    transform: &dyn SourceTransform,
) -> Result<Loaded, GraphError> {
    let raw = std::fs::read(path).map_err(|source| GraphError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let content = transform
        .transform(name, raw)
        .map_err(|err| GraphError::Transform {
            resource: name.to_string(),
            message: err.to_string(),
        })?;

    let mut imports = Vec::new();
    if is_script(path) {
        let base_dir = path.parent().unwrap_or(Path::new("/"));
        for import in scan_imports(&String::from_utf8_lossy(&content)) {
            let resolved = resolver.resolve(&import.specifier, base_dir).ok_or_else(|| {
                GraphError::UnresolvedImport {
                    specifier: import.specifier.clone(),
                    importer: name.to_string(),
                }
            })?;
            imports.push((import, resolved));
        }
    }

    Ok(Loaded {
        id,
        content,
        imports,
    })
}
