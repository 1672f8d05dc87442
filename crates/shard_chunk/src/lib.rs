//! Chunk graph construction: cache-group classification and code splitting.
//!
//! [`build_chunk_graph`] turns a [`shard_graph::ModuleGraph`] into a
//! [`ChunkGraph`]. Entries and dynamic-import boundaries define chunk groups;
//! modules already loaded on every path to an async group are elided from
//! it; the [`RuleSet`] then moves modules into named cache-group chunks, and
//! any module still present in two or more chunks is moved into a shared
//! `default~...` chunk. Every module ends up in exactly one chunk.
//!
//! This stage runs single-threaded: every tie-break depends on the fixed
//! iteration order of entries, async boundaries, and rules.

#![warn(missing_docs)]

pub mod chunk;
pub mod error;
mod groups;
pub mod rule;
pub mod split;

pub use chunk::{Chunk, ChunkGraph, ChunkKind};
pub use error::ChunkError;
pub use rule::{CacheGroupRule, ModuleTest, RuleSet};
pub use split::{build_chunk_graph, SplitOptions, RUNTIME_CHUNK_NAME};
