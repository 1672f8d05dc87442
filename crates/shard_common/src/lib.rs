//! Shared foundational types used across the shard bundler.
//!
//! This crate provides content hashing for cache-busting names and precache
//! revisions, dense arena storage with opaque ids for the module and chunk
//! graphs, and canonical separator-normalized resource paths.

#![warn(missing_docs)]

pub mod arena;
pub mod hash;
pub mod ids;
pub mod path;

pub use arena::{Arena, ArenaId};
pub use hash::{ContentHash, ContentHasher};
pub use ids::{ChunkId, ModuleId};
pub use path::{normalize_path, relative_resource};
