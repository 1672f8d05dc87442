//! Error types for the development server.

use std::path::PathBuf;

/// Errors that stop the development server.
#[derive(Debug, thiserror::Error)]
pub enum ServeError {
    /// The listening socket could not be opened.
    #[error("cannot listen on {addr}: {source}")]
    Bind {
        /// The requested `host:port`.
        addr: String,
        /// The underlying error.
        source: std::io::Error,
    },

    /// There is nothing to serve yet.
    #[error("output directory {0} does not exist; run a build first")]
    MissingRoot(PathBuf),

    /// The HTTP server failed while running.
    #[error("server error: {0}")]
    Server(#[from] hyper::Error),
}
