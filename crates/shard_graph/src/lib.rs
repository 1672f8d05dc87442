//! Module graph construction: entry resolution, import scanning, and the
//! transitive closure over all imports.
//!
//! [`build_module_graph`] starts from the configured entries, reads each
//! module once, passes its bytes through the [`SourceTransform`]
//! collaborator, scans the result for import specifiers, and resolves them
//! with the [`Resolver`]. Files in one discovery frontier are processed in
//! parallel; results are merged in frontier order so discovery order never
//! depends on thread scheduling.

#![warn(missing_docs)]

pub mod builder;
pub mod error;
pub mod module;
pub mod resolver;
pub mod scanner;
pub mod transform;

pub use builder::build_module_graph;
pub use error::GraphError;
pub use module::{Dependency, DependencyKind, Entry, Module, ModuleGraph};
pub use resolver::Resolver;
pub use scanner::{is_script, scan_imports, RawImport};
pub use transform::{Identity, SourceTransform};
