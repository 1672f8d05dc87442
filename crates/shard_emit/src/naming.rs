//! Content-addressed chunk naming.
//!
//! A chunk's hash covers its rendered, pre-minify text (its modules'
//! transformed content in order, plus the key and chunk-name references of
//! their dependency tables) followed by the ordered names of its children.
//! Children are referenced by name, never by content, so editing a child
//! renames only the child and the runtime. The runtime hashes its own text,
//! which embeds the on-demand chunk filenames, plus every chunk name.

use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::Serialize;
use shard_chunk::{ChunkGraph, ChunkKind};
use shard_common::{ChunkId, ContentHash, ContentHasher};
use shard_graph::ModuleGraph;

use crate::minify::Minifier;
use crate::render::{render_chunk, render_runtime};

/// An output filename pattern with `[name]` and `[contenthash]` or
/// `[contenthash:N]` placeholders.
#[derive(Debug, Clone)]
pub struct FilenameTemplate {
    pattern: String,
}

impl FilenameTemplate {
    /// Wraps a pattern such as `[name].bundle.[contenthash:8].js`.
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
        }
    }

    /// Substitutes the placeholders.
    pub fn render(&self, name: &str, hash: &ContentHash) -> String {
        let mut out = String::with_capacity(self.pattern.len() + 16);
        let mut rest = self.pattern.as_str();
        while let Some(start) = rest.find('[') {
            out.push_str(&rest[..start]);
            let tail = &rest[start..];
            let Some(end) = tail.find(']') else {
                out.push_str(tail);
                return out;
            };
            let token = &tail[1..end];
            match token.split_once(':') {
                _ if token == "name" => out.push_str(name),
                _ if token == "contenthash" => out.push_str(&hash.to_string()),
                Some(("contenthash", len)) if len.parse::<usize>().is_ok() => {
                    out.push_str(&hash.short(len.parse().unwrap_or(32)));
                }
                _ => out.push_str(&tail[..=end]),
            }
            rest = &tail[end + 1..];
        }
        out.push_str(rest);
        out
    }
}

/// A chunk with its final name and text.
#[derive(Debug, Clone, Serialize)]
pub struct EmittedChunk {
    /// The chunk's id.
    pub id: ChunkId,
    /// The chunk's name.
    pub name: String,
    /// The chunk's kind.
    pub kind: ChunkKind,
    /// Hash of the pre-minify text and child names.
    #[serde(serialize_with = "serialize_hash")]
    pub hash: ContentHash,
    /// Output filename relative to the output directory.
    pub filename: String,
    /// Final, possibly minified, text.
    #[serde(skip)]
    pub text: String,
}

fn serialize_hash<S: serde::Serializer>(hash: &ContentHash, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(hash)
}

/// Renders, hashes, and names every chunk; the runtime last.
///
/// Returned in chunk id order.
#[tracing::instrument(skip_all)]
pub fn name_chunks(
    graph: &ModuleGraph,
    chunks: &ChunkGraph,
    template: &FilenameTemplate,
    public_path: &str,
    minifier: &dyn Minifier,
) -> Vec<EmittedChunk> {
    let runtime = chunks.runtime();
    let ids: Vec<ChunkId> = chunks.chunks.ids().filter(|&id| id != runtime).collect();

    let mut emitted: Vec<EmittedChunk> = ids
        .par_iter()
        .map(|&id| {
            let chunk = chunks.chunk(id);
            let text = render_chunk(graph, chunks, id);
            let mut hasher = ContentHasher::new();
            hasher.update(text.as_bytes());
            for &child in &chunk.children {
                hasher.update(chunks.chunk(child).name.as_bytes());
            }
            let hash = hasher.finish();
            EmittedChunk {
                id,
                name: chunk.name.clone(),
                kind: chunk.kind,
                hash,
                filename: template.render(&chunk.name, &hash),
                text: minifier.minify(&text),
            }
        })
        .collect();

    let on_demand: BTreeMap<String, String> = emitted
        .iter()
        .filter(|c| c.kind != ChunkKind::Entry)
        .map(|c| (c.name.clone(), c.filename.clone()))
        .collect();
    let text = render_runtime(public_path, &on_demand);
    let mut names: Vec<&str> = emitted.iter().map(|c| c.name.as_str()).collect();
    names.sort_unstable();
    let mut hasher = ContentHasher::new();
    hasher.update(text.as_bytes());
    for name in names {
        hasher.update(name.as_bytes());
    }
    let hash = hasher.finish();
    let runtime_chunk = chunks.chunk(runtime);
    emitted.push(EmittedChunk {
        id: runtime,
        name: runtime_chunk.name.clone(),
        kind: ChunkKind::Runtime,
        hash,
        filename: template.render(&runtime_chunk.name, &hash),
        text: minifier.minify(&text),
    });
    emitted.sort_by_key(|c| c.id);

    tracing::debug!(chunks = emitted.len(), "chunks named");
    emitted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::minify::{Passthrough, StripWhitespace};
    use shard_chunk::{build_chunk_graph, RuleSet, SplitOptions};
    use shard_diagnostics::DiagnosticSink;
    use shard_graph::DependencyKind;
    use std::path::Path;

    fn hash() -> ContentHash {
        ContentHash::from_bytes(b"chunk")
    }

    #[test]
    fn template_placeholders() {
        let t = FilenameTemplate::new("[name].bundle.[contenthash:8].js");
        let name = t.render("vendors", &hash());
        assert_eq!(name, format!("vendors.bundle.{}.js", hash().short(8)));
    }

    #[test]
    fn template_full_hash_and_unknown_tokens() {
        let t = FilenameTemplate::new("js/[name]-[contenthash]-[id].js");
        assert_eq!(
            t.render("main", &hash()),
            format!("js/main-{}-[id].js", hash())
        );
        let unterminated = FilenameTemplate::new("[name].[contenthash");
        assert_eq!(unterminated.render("a", &hash()), "a.[contenthash");
    }

    fn graph(leaf: &str, sibling: &str) -> ModuleGraph {
        let mut g = ModuleGraph::new(Path::new("/app"));
        let a = g.add_module(Path::new("/app/a.js"), "import('./leaf'); import('./sib');");
        let leaf_id = g.add_module(Path::new("/app/leaf.js"), leaf);
        let sib = g.add_module(Path::new("/app/sib.js"), sibling);
        g.add_dependency(a, leaf_id, DependencyKind::Async, "./leaf");
        g.add_dependency(a, sib, DependencyKind::Async, "./sib");
        g.add_entry("main", vec![a]);
        g
    }

    fn named(g: &ModuleGraph, minifier: &dyn Minifier) -> Vec<EmittedChunk> {
        let chunks = build_chunk_graph(
            g,
            &RuleSet::default(),
            &SplitOptions::default(),
            &DiagnosticSink::new(),
        )
        .unwrap();
        name_chunks(
            g,
            &chunks,
            &FilenameTemplate::new("[name].[contenthash:8].js"),
            "/",
            minifier,
        )
    }

    fn by_name<'a>(chunks: &'a [EmittedChunk], name: &str) -> &'a EmittedChunk {
        chunks.iter().find(|c| c.name == name).unwrap()
    }

    #[test]
    fn naming_is_deterministic() {
        let g = graph("export const leaf = 1;", "export const sib = 2;");
        let first: Vec<_> = named(&g, &Passthrough).into_iter().map(|c| c.filename).collect();
        let second: Vec<_> = named(&g, &Passthrough).into_iter().map(|c| c.filename).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn leaf_change_leaves_siblings_and_entry_alone() {
        let before = graph("export const leaf = 1;", "export const sib = 2;");
        let after = graph("export const leaf = 3;", "export const sib = 2;");
        let leaf_key = before.module(before.find_by_name("leaf.js").unwrap()).key();
        let sib_key = before.module(before.find_by_name("sib.js").unwrap()).key();
        let (b, a) = (named(&before, &Passthrough), named(&after, &Passthrough));

        assert_ne!(by_name(&b, &leaf_key).hash, by_name(&a, &leaf_key).hash);
        assert_eq!(by_name(&b, &sib_key).hash, by_name(&a, &sib_key).hash);
        assert_eq!(by_name(&b, "main").hash, by_name(&a, "main").hash);
        assert_ne!(by_name(&b, "runtime").hash, by_name(&a, "runtime").hash);
    }

    #[test]
    fn minification_does_not_change_hashes() {
        let g = graph("export const leaf = 1;\n\n\n", "export const sib = 2;");
        let plain = named(&g, &Passthrough);
        let small = named(&g, &StripWhitespace);
        for (p, s) in plain.iter().zip(&small) {
            assert_eq!(p.filename, s.filename);
            assert!(s.text.len() <= p.text.len());
        }
    }

    #[test]
    fn runtime_is_last_and_maps_on_demand_chunks() {
        let g = graph("1", "2");
        let named = named(&g, &Passthrough);
        let runtime = named.last().unwrap();
        assert_eq!(runtime.kind, ChunkKind::Runtime);
        let main = by_name(&named, "main");
        assert!(!runtime.text.contains(&main.filename));
        for chunk in named.iter().filter(|c| c.kind == ChunkKind::Async) {
            assert!(runtime.text.contains(&chunk.filename));
        }
    }
}
