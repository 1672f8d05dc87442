//! Error types for output emission.

use std::path::PathBuf;

/// Fatal errors raised while emitting output.
#[derive(Debug, thiserror::Error)]
pub enum EmitError {
    /// The worker template does not contain the marker exactly once.
    #[error("worker template {template} must contain '{marker}' exactly once, found {found}")]
    ManifestInjection {
        /// The template path.
        template: String,
        /// The marker text.
        marker: String,
        /// Number of occurrences found.
        found: usize,
    },

    /// An asset mapping's source does not exist.
    #[error("asset source {0} does not exist")]
    MissingAssetSource(PathBuf),

    /// An ignore or exclude glob failed to compile.
    #[error("invalid glob '{pattern}': {message}")]
    InvalidGlob {
        /// The glob as configured.
        pattern: String,
        /// The compiler's message.
        message: String,
    },

    /// A filesystem operation failed.
    #[error("i/o error on {path}: {source}")]
    Io {
        /// The path being read or written.
        path: PathBuf,
        /// The underlying error.
        source: std::io::Error,
    },
}

impl EmitError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| EmitError::Io { path, source }
    }
}
