//! The chunk graph.

use std::collections::HashMap;

use serde::Serialize;
use shard_common::{Arena, ChunkId, ModuleId};

/// What a chunk is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkKind {
    /// Started by an entry; referenced from the HTML document.
    Entry,
    /// Loaded on demand by a dynamic import.
    Async,
    /// Modules moved out of several chunks by a cache group or by the
    /// default deduplication pass.
    Shared,
    /// The module-loading bootstrap shared by every entry.
    Runtime,
}

/// An emitted unit of bundled code.
#[derive(Debug, Clone, Serialize)]
pub struct Chunk {
    /// This chunk's id.
    pub id: ChunkId,
    /// Entry name, cache-group name, `default~...`, or the async root's key.
    pub name: String,
    /// Chunk kind.
    pub kind: ChunkKind,
    /// Whether the chunk is loaded before any entry code runs.
    pub initial: bool,
    /// Constituent modules in emission order.
    pub modules: Vec<ModuleId>,
    /// Modules executed when the chunk starts: an entry's configured modules,
    /// or an async chunk's import target.
    pub roots: Vec<ModuleId>,
    /// Chunks that load or reference this one, in chunk order.
    pub parents: Vec<ChunkId>,
    /// Chunks this one loads or references, in chunk order.
    pub children: Vec<ChunkId>,
    /// The cache group that produced a shared chunk.
    pub group: Option<String>,
}

impl Chunk {
    pub(crate) fn new(name: String, kind: ChunkKind) -> Self {
        Self {
            id: ChunkId::from_raw(0),
            name,
            kind,
            initial: matches!(kind, ChunkKind::Entry | ChunkKind::Runtime),
            modules: Vec::new(),
            roots: Vec::new(),
            parents: Vec::new(),
            children: Vec::new(),
            group: None,
        }
    }
}

/// Chunks plus the module → chunk assignment.
#[derive(Debug, Clone, Serialize)]
pub struct ChunkGraph {
    /// All chunks: entries, async chunks, shared chunks, then the runtime.
    pub chunks: Arena<ChunkId, Chunk>,
    #[serde(skip)]
    placement: HashMap<ModuleId, ChunkId>,
    runtime: ChunkId,
}

impl ChunkGraph {
    pub(crate) fn from_chunks(chunks: Vec<Chunk>) -> Self {
        let mut arena = Arena::new();
        let mut placement = HashMap::new();
        let mut runtime = ChunkId::from_raw(0);
        for mut chunk in chunks {
            let id = arena.next_id();
            chunk.id = id;
            for &module in &chunk.modules {
                placement.insert(module, id);
            }
            if chunk.kind == ChunkKind::Runtime {
                runtime = id;
            }
            arena.alloc(chunk);
        }
        Self {
            chunks: arena,
            placement,
            runtime,
        }
    }

    /// Returns the chunk with the given id.
    pub fn chunk(&self, id: ChunkId) -> &Chunk {
        &self.chunks[id]
    }

    /// Iterates chunks in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Chunk> {
        self.chunks.values()
    }

    /// Returns the number of chunks, runtime included.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Returns `true` if there are no chunks.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Returns the runtime chunk's id.
    pub fn runtime(&self) -> ChunkId {
        self.runtime
    }

    /// Looks up a chunk by name.
    pub fn find(&self, name: &str) -> Option<&Chunk> {
        self.chunks.values().find(|c| c.name == name)
    }

    /// Returns the chunk whose body contains `module`.
    pub fn chunk_of(&self, module: ModuleId) -> Option<ChunkId> {
        self.placement.get(&module).copied()
    }

    /// Iterates entry chunks in entry order.
    pub fn entry_chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.chunks.values().filter(|c| c.kind == ChunkKind::Entry)
    }

    /// Returns the shared chunks that must be loaded before `id`'s roots
    /// can run. An entry only waits for initial shared chunks; the others
    /// it references are fetched by its dynamic imports.
    pub fn required_chunks(&self, id: ChunkId) -> Vec<ChunkId> {
        let chunk = &self.chunks[id];
        chunk
            .children
            .iter()
            .copied()
            .filter(|&c| {
                let child = &self.chunks[c];
                child.kind == ChunkKind::Shared
                    && (chunk.kind != ChunkKind::Entry || child.initial)
            })
            .collect()
    }

    /// Returns the on-demand chunks a dynamic import of `module` loads: the
    /// async chunk started by it, the chunk holding it, and the shared
    /// chunks either of them references.
    ///
    /// A cache group may move the import target out of the async chunk it
    /// starts; that chunk still holds the target's other dependencies and
    /// is loaded too. Entry and runtime chunks are never loaded on demand,
    /// so a target that is already present up front yields an empty list.
    pub fn load_set(&self, module: ModuleId) -> Vec<ChunkId> {
        let started = self
            .chunks
            .values()
            .find(|c| c.kind == ChunkKind::Async && c.roots.contains(&module))
            .map(|c| c.id);
        let mut set = Vec::new();
        for start in started.into_iter().chain(self.chunk_of(module)) {
            let candidates = std::iter::once(start).chain(self.chunks[start].children.iter().copied());
            for id in candidates {
                let on_demand = match self.chunks[id].kind {
                    ChunkKind::Async => id == start,
                    ChunkKind::Shared => true,
                    ChunkKind::Entry | ChunkKind::Runtime => false,
                };
                if on_demand && !set.contains(&id) {
                    set.push(id);
                }
            }
        }
        set
    }
}
