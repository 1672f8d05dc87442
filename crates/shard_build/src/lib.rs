//! The shard build pipeline.
//!
//! [`build`] runs every stage in order: module graph, chunk graph, then
//! chunk naming and the asset pipeline in parallel, then the HTML document
//! and the precache manifest, and finally the write. Any fatal error stops
//! the pipeline before the output directory is touched. [`plan`] stops
//! after naming and reports what a build would produce.

#![warn(missing_docs)]

pub mod error;
pub mod pipeline;
pub mod plan;

pub use error::BuildError;
pub use pipeline::{build, build_with, load_options, BuildReport, Collaborators, EmittedFile};
pub use plan::{plan, Plan, PlannedChunk};
