//! The HTML entry document.

use shard_chunk::{ChunkGraph, ChunkKind};
use shard_common::ChunkId;

use crate::naming::EmittedChunk;

/// Returns script URLs in load order: the runtime, then for each entry its
/// initial shared chunks followed by the entry chunk. Async chunks are
/// fetched by the runtime and never listed.
pub fn html_scripts(chunks: &ChunkGraph, emitted: &[EmittedChunk], public_path: &str) -> Vec<String> {
    let filename = |id: ChunkId| {
        emitted
            .iter()
            .find(|c| c.id == id)
            .map(|c| format!("{public_path}{}", c.filename))
    };
    let mut order: Vec<ChunkId> = vec![chunks.runtime()];
    for entry in chunks.entry_chunks() {
        for shared in chunks.required_chunks(entry.id) {
            if !order.contains(&shared) {
                order.push(shared);
            }
        }
        order.push(entry.id);
    }
    debug_assert!(order.iter().all(|&id| chunks.chunk(id).kind != ChunkKind::Async));
    order.into_iter().filter_map(filename).collect()
}

fn script_tags(scripts: &[String]) -> String {
    scripts
        .iter()
        .map(|src| format!("<script defer src=\"{src}\"></script>\n"))
        .collect()
}

/// Renders the document: the template with script tags inserted before its
/// last `</body>` (or appended when it has none), or a minimal default page.
pub fn render_html(template: Option<&str>, title: &str, scripts: &[String]) -> String {
    let tags = script_tags(scripts);
    match template {
        Some(template) => match template.to_ascii_lowercase().rfind("</body>") {
            Some(at) => format!("{}{tags}{}", &template[..at], &template[at..]),
            None => format!("{template}{tags}"),
        },
        None => format!(
            "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n</head>\n<body>\n{tags}</body>\n</html>\n"
        ),
    }
}
