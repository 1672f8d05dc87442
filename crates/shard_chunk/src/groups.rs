//! Chunk groups: the topology-only partition before cache groups apply.
//!
//! Each entry and each distinct dynamic-import target roots a group holding
//! the sync closure of its roots. Groups form a DAG through async edges;
//! an edge that would close a cycle is dropped, since the child is then
//! already loaded by the time the parent could request it.

use std::collections::{HashMap, HashSet};

use petgraph::algo::{has_path_connecting, toposort};
use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use shard_common::ModuleId;
use shard_graph::{DependencyKind, ModuleGraph};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum GroupKind {
    Entry,
    Async,
}

#[derive(Debug, Clone)]
pub(crate) struct ChunkGroup {
    pub name: String,
    pub kind: GroupKind,
    pub roots: Vec<ModuleId>,
    pub modules: Vec<ModuleId>,
}

/// Surviving groups in creation order with their parent lists.
#[derive(Debug)]
pub(crate) struct GroupGraph {
    pub groups: Vec<ChunkGroup>,
    /// `parents[i]` are indices into `groups`, in edge creation order.
    pub parents: Vec<Vec<usize>>,
}

pub(crate) fn build_groups(graph: &ModuleGraph) -> GroupGraph {
    let mut dag: StableDiGraph<ChunkGroup, ()> = StableDiGraph::new();
    let mut order: Vec<NodeIndex> = Vec::new();
    let mut async_groups: HashMap<ModuleId, NodeIndex> = HashMap::new();

    for entry in &graph.entries {
        let node = dag.add_node(ChunkGroup {
            name: entry.name.clone(),
            kind: GroupKind::Entry,
            roots: entry.modules.clone(),
            modules: Vec::new(),
        });
        order.push(node);
    }

    // `order` grows while it is walked: async groups are appended as found.
    let mut next = 0;
    while next < order.len() {
        let node = order[next];
        next += 1;
        let (modules, async_targets) = sync_closure(graph, &dag[node].roots);
        dag[node].modules = modules;

        for target in async_targets {
            let child = *async_groups.entry(target).or_insert_with(|| {
                let child = dag.add_node(ChunkGroup {
                    name: graph.module(target).key(),
                    kind: GroupKind::Async,
                    roots: vec![target],
                    modules: Vec::new(),
                });
                order.push(child);
                child
            });
            if child == node || dag.contains_edge(node, child) {
                continue;
            }
            if has_path_connecting(&dag, child, node, None) {
                tracing::trace!(
                    parent = %dag[node].name,
                    child = %dag[child].name,
                    "skipping cycle-forming async edge"
                );
                continue;
            }
            dag.add_edge(node, child, ());
        }
    }

    elide_available(&mut dag);
    fold_empty(&mut dag, &order);

    let survivors: Vec<NodeIndex> = order.into_iter().filter(|n| dag.contains_node(*n)).collect();
    let position: HashMap<NodeIndex, usize> =
        survivors.iter().enumerate().map(|(i, n)| (*n, i)).collect();
    let parents = survivors
        .iter()
        .map(|&n| {
            let mut ps: Vec<usize> = dag
                .neighbors_directed(n, petgraph::Direction::Incoming)
                .map(|p| position[&p])
                .collect();
            ps.sort_unstable();
            ps
        })
        .collect();
    let groups = survivors.iter().map(|&n| dag[n].clone()).collect();
    GroupGraph { groups, parents }
}

/// Pre-order DFS over sync edges, following edges in source order. Returns
/// the closure and the async targets seen along the way, first-seen order.
fn sync_closure(graph: &ModuleGraph, roots: &[ModuleId]) -> (Vec<ModuleId>, Vec<ModuleId>) {
    let mut visited = HashSet::new();
    let mut modules = Vec::new();
    let mut async_targets = Vec::new();
    let mut stack: Vec<ModuleId> = roots.iter().rev().copied().collect();

    while let Some(id) = stack.pop() {
        if !visited.insert(id) {
            continue;
        }
        modules.push(id);
        let deps = &graph.module(id).dependencies;
        for dep in deps {
            if dep.kind == DependencyKind::Async && !async_targets.contains(&dep.target) {
                async_targets.push(dep.target);
            }
        }
        for dep in deps.iter().rev() {
            if dep.kind == DependencyKind::Sync && !visited.contains(&dep.target) {
                stack.push(dep.target);
            }
        }
    }
    (modules, async_targets)
}

/// Removes from every async group the modules that all of its parent paths
/// have already loaded.
fn elide_available(dag: &mut StableDiGraph<ChunkGroup, ()>) {
    let Ok(topo) = toposort(&*dag, None) else {
        // Cycle-forming edges are never inserted.
        return;
    };
    let mut available: HashMap<NodeIndex, HashSet<ModuleId>> = HashMap::new();
    for node in topo {
        let mut parents = dag.neighbors_directed(node, petgraph::Direction::Incoming);
        let inherited = match parents.next() {
            None => HashSet::new(),
            Some(first) => {
                let loaded = |p: NodeIndex| -> HashSet<ModuleId> {
                    let mut set = available.get(&p).cloned().unwrap_or_default();
                    set.extend(dag[p].modules.iter().copied());
                    set
                };
                let mut acc = loaded(first);
                for p in parents {
                    let other = loaded(p);
                    acc.retain(|m| other.contains(m));
                }
                acc
            }
        };
        if dag[node].kind == GroupKind::Async {
            dag[node].modules.retain(|m| !inherited.contains(m));
        }
        available.insert(node, inherited);
    }
}

/// Folds async groups left empty by elision into their parents.
fn fold_empty(dag: &mut StableDiGraph<ChunkGroup, ()>, order: &[NodeIndex]) {
    for &node in order {
        let group = &dag[node];
        if group.kind != GroupKind::Async || !group.modules.is_empty() {
            continue;
        }
        tracing::debug!(group = %group.name, "folding fully-available async group");
        let parents: Vec<_> = dag
            .neighbors_directed(node, petgraph::Direction::Incoming)
            .collect();
        let children: Vec<_> = dag
            .neighbors_directed(node, petgraph::Direction::Outgoing)
            .collect();
        dag.remove_node(node);
        for &p in &parents {
            for &c in &children {
                if !dag.contains_edge(p, c) {
                    dag.add_edge(p, c, ());
                }
            }
        }
    }
}
