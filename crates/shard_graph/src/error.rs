//! Error types for module graph construction.

use std::path::PathBuf;

/// Fatal errors raised while building the module graph.
///
/// Any of these aborts the build; no partial graph is returned.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// A specifier matched no search path/extension combination.
    #[error("cannot resolve '{specifier}' from {importer}")]
    UnresolvedImport {
        /// The specifier as written in the source.
        specifier: String,
        /// The importing module's project-relative path, or `entry '<name>'`.
        importer: String,
    },

    /// A resolved module could not be read.
    #[error("cannot read module {path}: {source}")]
    Read {
        /// The module path.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The source-transform collaborator rejected a module.
    #[error("transform failed for {resource}: {message}")]
    Transform {
        /// The module's project-relative path.
        resource: String,
        /// The collaborator's error message.
        message: String,
    },
}
