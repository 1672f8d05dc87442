//! Dry-run chunk plans for `shard plan`.

use std::fmt;

use serde::Serialize;
use shard_chunk::ChunkKind;
use shard_config::BuildOptions;
use shard_diagnostics::DiagnosticSink;
use shard_emit::{name_chunks, FilenameTemplate, Passthrough};

use crate::error::BuildError;
use crate::pipeline::{prepare, Collaborators};

/// One chunk as a build would emit it.
#[derive(Debug, Clone, Serialize)]
pub struct PlannedChunk {
    /// Chunk name.
    pub name: String,
    /// Chunk kind.
    pub kind: ChunkKind,
    /// Loaded before entry code runs.
    pub initial: bool,
    /// Output filename.
    pub filename: String,
    /// Project-relative module names in emission order.
    pub modules: Vec<String>,
    /// Names of the chunks that load or reference this one.
    pub parents: Vec<String>,
}

/// What a build would produce, without writing anything.
#[derive(Debug, Clone, Serialize)]
pub struct Plan {
    /// Project name.
    pub project: String,
    /// Number of modules in the graph.
    pub modules: usize,
    /// Chunks in chunk order.
    pub chunks: Vec<PlannedChunk>,
}

/// Builds the module and chunk graphs and names the chunks.
pub fn plan(options: &BuildOptions, sink: &DiagnosticSink) -> Result<Plan, BuildError> {
    let collaborators = Collaborators::default();
    let (graph, chunks) = prepare(options, collaborators.transform, sink)?;
    let template = FilenameTemplate::new(options.filename.as_str());
    let named = name_chunks(&graph, &chunks, &template, &options.public_path, &Passthrough);

    let planned = named
        .into_iter()
        .map(|emitted| {
            let chunk = chunks.chunk(emitted.id);
            PlannedChunk {
                name: emitted.name,
                kind: emitted.kind,
                initial: chunk.initial,
                filename: emitted.filename,
                modules: chunk
                    .modules
                    .iter()
                    .map(|&m| graph.module(m).name.clone())
                    .collect(),
                parents: chunk
                    .parents
                    .iter()
                    .map(|&p| chunks.chunk(p).name.clone())
                    .collect(),
            }
        })
        .collect();

    Ok(Plan {
        project: options.name.clone(),
        modules: graph.module_count(),
        chunks: planned,
    })
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{}: {} modules in {} chunks",
            self.project,
            self.modules,
            self.chunks.len()
        )?;
        for chunk in &self.chunks {
            let kind = match chunk.kind {
                ChunkKind::Entry => "entry",
                ChunkKind::Async => "async",
                ChunkKind::Shared if chunk.initial => "shared, initial",
                ChunkKind::Shared => "shared",
                ChunkKind::Runtime => "runtime",
            };
            writeln!(f)?;
            writeln!(f, "{} ({kind}) -> {}", chunk.name, chunk.filename)?;
            if !chunk.parents.is_empty() {
                writeln!(f, "  parents: {}", chunk.parents.join(", "))?;
            }
            for module in &chunk.modules {
                writeln!(f, "  {module}")?;
            }
        }
        Ok(())
    }
}
