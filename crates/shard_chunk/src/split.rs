//! Cache-group classification, deduplication, and chunk materialization.

use std::collections::{BTreeMap, HashMap, HashSet};

use shard_common::{ChunkId, ModuleId};
use shard_config::BuildOptions;
use shard_diagnostics::{Diagnostic, DiagnosticCode, DiagnosticSink};
use shard_graph::ModuleGraph;

use crate::chunk::{Chunk, ChunkGraph, ChunkKind};
use crate::error::ChunkError;
use crate::groups::{build_groups, GroupKind};
use crate::rule::RuleSet;

/// Name of the single runtime chunk.
pub const RUNTIME_CHUNK_NAME: &str = "runtime";

/// Heuristics applied to non-enforced cache groups.
#[derive(Debug, Clone, Default)]
pub struct SplitOptions {
    /// A group whose modules total fewer bytes is rejected.
    pub min_size: u64,
    /// Maximum number of chunks an entry may need up front, runtime excluded.
    pub max_initial_requests: Option<usize>,
}

impl SplitOptions {
    /// Takes the heuristics from build options.
    pub fn from_options(options: &BuildOptions) -> Self {
        Self {
            min_size: options.min_size,
            max_initial_requests: options.max_initial_requests,
        }
    }
}

/// A chunk under construction. Relations are indices into the draft list.
#[derive(Debug)]
struct Draft {
    name: String,
    kind: ChunkKind,
    initial: bool,
    modules: Vec<ModuleId>,
    roots: Vec<ModuleId>,
    group: Option<String>,
    parents: Vec<usize>,
    drained_by: Vec<String>,
    alive: bool,
}

impl Draft {
    fn new(name: String, kind: ChunkKind, initial: bool) -> Self {
        Self {
            name,
            kind,
            initial,
            modules: Vec::new(),
            roots: Vec::new(),
            group: None,
            parents: Vec::new(),
            drained_by: Vec::new(),
            alive: true,
        }
    }
}

/// Partitions the module graph into chunks.
///
/// Warnings (dangling modules) and notes (cache groups that matched
/// nothing) go to `sink`; an entry or async chunk emptied by cache groups
/// is fatal.
#[tracing::instrument(skip_all)]
pub fn build_chunk_graph(
    graph: &ModuleGraph,
    rules: &RuleSet,
    options: &SplitOptions,
    sink: &DiagnosticSink,
) -> Result<ChunkGraph, ChunkError> {
    let topology = build_groups(graph);
    let mut drafts: Vec<Draft> = topology
        .groups
        .into_iter()
        .zip(topology.parents)
        .map(|(group, parents)| {
            let kind = match group.kind {
                GroupKind::Entry => ChunkKind::Entry,
                GroupKind::Async => ChunkKind::Async,
            };
            let mut draft = Draft::new(group.name, kind, kind == ChunkKind::Entry);
            draft.modules = group.modules;
            draft.roots = group.roots;
            draft.parents = parents;
            draft
        })
        .collect();
    let group_count = drafts.len();

    // Every module's holders, in chunk order; modules in first-seen order.
    let mut holders: HashMap<ModuleId, Vec<usize>> = HashMap::new();
    let mut seen_order: Vec<ModuleId> = Vec::new();
    for (index, draft) in drafts.iter().enumerate() {
        for &module in &draft.modules {
            let list = holders.entry(module).or_default();
            if list.is_empty() {
                seen_order.push(module);
            }
            list.push(index);
        }
    }

    let mut moved: HashSet<ModuleId> = HashSet::new();
    assign_cache_groups(
        graph,
        rules,
        options,
        sink,
        &mut drafts,
        &holders,
        &seen_order,
        &mut moved,
    );
    deduplicate_remaining(&mut drafts, &holders, &seen_order, &mut moved);

    for draft in drafts.iter_mut().take(group_count) {
        draft.modules.retain(|m| !moved.contains(m));
    }
    dissolve_empty(&mut drafts, group_count)?;

    let mut runtime = Draft::new(RUNTIME_CHUNK_NAME.to_string(), ChunkKind::Runtime, true);
    runtime.parents = drafts
        .iter()
        .enumerate()
        .filter(|(_, d)| d.alive && d.kind == ChunkKind::Entry)
        .map(|(i, _)| i)
        .collect();
    drafts.push(runtime);

    report_dangling(graph, &drafts, sink);
    let chunks = materialize(drafts);
    tracing::info!(
        chunks = chunks.len(),
        modules = graph.module_count(),
        "chunk graph built"
    );
    Ok(chunks)
}

/// Moves every module claimed by a cache group into that group's chunk.
#[allow(clippy::too_many_arguments)]
fn assign_cache_groups(
    graph: &ModuleGraph,
    rules: &RuleSet,
    options: &SplitOptions,
    sink: &DiagnosticSink,
    drafts: &mut Vec<Draft>,
    holders: &HashMap<ModuleId, Vec<usize>>,
    seen_order: &[ModuleId],
    moved: &mut HashSet<ModuleId>,
) {
    // Claims keyed by declaration index; the best rule across all of a
    // module's holders wins.
    let mut claims: BTreeMap<usize, Vec<ModuleId>> = BTreeMap::new();
    for &module in seen_order {
        let resource = &graph.module(module).resource;
        let mut best = None;
        for &holder in &holders[&module] {
            if let Some(rule) = rules.classify(resource, drafts[holder].initial) {
                if best.map_or(true, |b| rule.outranks(b)) {
                    best = Some(rule);
                }
            }
        }
        if let Some(rule) = best {
            claims.entry(rule.index).or_default().push(module);
        }
    }

    for rule in rules.iter() {
        let Some(modules) = claims.remove(&rule.index) else {
            sink.emit(Diagnostic::note(
                DiagnosticCode::UNUSED_CACHE_GROUP,
                format!("cache group '{}' matched no modules", rule.name),
            ));
            continue;
        };

        let mut sources: Vec<usize> = modules
            .iter()
            .flat_map(|m| holders[m].iter().copied())
            .collect();
        sources.sort_unstable();
        sources.dedup();
        let initial = sources.iter().any(|&s| drafts[s].initial);

        if !rule.enforce {
            let size: u64 = modules.iter().map(|&m| graph.module(m).size()).sum();
            if size < options.min_size {
                tracing::debug!(group = %rule.name, size, min_size = options.min_size, "cache group below min_size");
                continue;
            }
            if let Some(max) = options.max_initial_requests {
                let over = initial
                    && sources.iter().any(|&s| {
                        drafts[s].kind == ChunkKind::Entry && initial_requests(&drafts[..], s) + 1 > max
                    });
                if over {
                    tracing::debug!(group = %rule.name, max, "cache group exceeds max_initial_requests");
                    continue;
                }
            }
        }

        tracing::debug!(group = %rule.name, modules = modules.len(), "cache group chunk created");
        for &source in &sources {
            if !drafts[source].drained_by.contains(&rule.name) {
                drafts[source].drained_by.push(rule.name.clone());
            }
        }
        moved.extend(modules.iter().copied());
        let mut shared = Draft::new(rule.name.clone(), ChunkKind::Shared, initial);
        shared.group = Some(rule.name.clone());
        shared.modules = modules;
        shared.parents = sources;
        drafts.push(shared);
    }
}

/// Number of chunks `entry` loads up front: itself plus its initial shared
/// chunks.
fn initial_requests(drafts: &[Draft], entry: usize) -> usize {
    1 + drafts
        .iter()
        .filter(|d| d.kind == ChunkKind::Shared && d.initial && d.parents.contains(&entry))
        .count()
}

/// Moves each unclaimed module held by two or more chunks into a
/// `default~<holder names>` chunk shared by exactly those holders.
fn deduplicate_remaining(
    drafts: &mut Vec<Draft>,
    holders: &HashMap<ModuleId, Vec<usize>>,
    seen_order: &[ModuleId],
    moved: &mut HashSet<ModuleId>,
) {
    let mut buckets: Vec<(Vec<usize>, Vec<ModuleId>)> = Vec::new();
    for &module in seen_order {
        if moved.contains(&module) {
            continue;
        }
        let sources = &holders[&module];
        if sources.len() < 2 {
            continue;
        }
        match buckets.iter_mut().find(|(key, _)| key == sources) {
            Some((_, modules)) => modules.push(module),
            None => buckets.push((sources.clone(), vec![module])),
        }
    }

    for (sources, modules) in buckets {
        let mut names: Vec<&str> = sources.iter().map(|&s| drafts[s].name.as_str()).collect();
        names.sort_unstable();
        let name = format!("default~{}", names.join("~"));
        let initial = sources.iter().any(|&s| drafts[s].initial);
        tracing::debug!(chunk = %name, modules = modules.len(), "deduplicated shared modules");
        moved.extend(modules.iter().copied());
        let mut shared = Draft::new(name, ChunkKind::Shared, initial);
        shared.modules = modules;
        shared.parents = sources;
        drafts.push(shared);
    }
}

/// Rejects chunks emptied by cache groups; dissolves async chunks emptied
/// by deduplication alone, re-parenting their children.
fn dissolve_empty(drafts: &mut [Draft], group_count: usize) -> Result<(), ChunkError> {
    for index in 0..group_count {
        if !drafts[index].modules.is_empty() {
            continue;
        }
        if !drafts[index].drained_by.is_empty() {
            return Err(ChunkError::EmptyChunk {
                chunk: drafts[index].name.clone(),
                rules: drafts[index].drained_by.clone(),
            });
        }
        if drafts[index].kind != ChunkKind::Async {
            // An entry whose modules all moved to shared chunks still
            // carries its startup record.
            continue;
        }
        tracing::debug!(chunk = %drafts[index].name, "dissolving async chunk emptied by deduplication");
        drafts[index].alive = false;
        let inherited = drafts[index].parents.clone();
        for draft in drafts.iter_mut() {
            if let Some(pos) = draft.parents.iter().position(|&p| p == index) {
                draft.parents.remove(pos);
                for &p in &inherited {
                    if !draft.parents.contains(&p) {
                        draft.parents.push(p);
                    }
                }
                draft.parents.sort_unstable();
            }
        }
    }
    Ok(())
}

fn report_dangling(graph: &ModuleGraph, drafts: &[Draft], sink: &DiagnosticSink) {
    let placed: HashSet<ModuleId> = drafts
        .iter()
        .filter(|d| d.alive)
        .flat_map(|d| d.modules.iter().copied())
        .collect();
    for module in graph.modules.values() {
        if !placed.contains(&module.id) {
            tracing::warn!(module = %module.name, "module is unreachable from every entry");
            sink.emit(
                Diagnostic::warning(
                    DiagnosticCode::DANGLING_MODULE,
                    "module is unreachable from every entry and was dropped",
                )
                .at(module.name.clone()),
            );
        }
    }
}

fn materialize(drafts: Vec<Draft>) -> ChunkGraph {
    // Entries and async chunks keep their order, followed by shared chunks
    // and the runtime, which is already last.
    let live: Vec<usize> = (0..drafts.len()).filter(|&i| drafts[i].alive).collect();
    let remap: HashMap<usize, ChunkId> = live
        .iter()
        .enumerate()
        .map(|(new, &old)| (old, ChunkId::from_raw(new as u32)))
        .collect();

    let mut children: Vec<Vec<ChunkId>> = vec![Vec::new(); live.len()];
    for &old in &live {
        let child = remap[&old];
        for parent in &drafts[old].parents {
            if let Some(&p) = remap.get(parent) {
                children[p.as_raw() as usize].push(child);
            }
        }
    }

    let mut chunks = Vec::with_capacity(live.len());
    let mut drafts: Vec<Option<Draft>> = drafts.into_iter().map(Some).collect();
    for (new, &old) in live.iter().enumerate() {
        let Some(draft) = drafts[old].take() else {
            continue;
        };
        let mut chunk = Chunk::new(draft.name, draft.kind);
        chunk.initial = draft.initial;
        chunk.modules = draft.modules;
        chunk.roots = draft.roots;
        chunk.group = draft.group;
        chunk.parents = draft.parents.iter().filter_map(|p| remap.get(p).copied()).collect();
        chunk.parents.sort_unstable();
        chunk.children = std::mem::take(&mut children[new]);
        chunk.children.sort_unstable();
        chunks.push(chunk);
    }
    ChunkGraph::from_chunks(chunks)
}
