//! The pipeline's aggregate error type.

use shard_chunk::ChunkError;
use shard_config::ConfigError;
use shard_diagnostics::{Diagnostic, DiagnosticCode};
use shard_emit::EmitError;
use shard_graph::GraphError;

/// A fatal error from any stage.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// Configuration could not be loaded or validated.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Module graph construction failed.
    #[error(transparent)]
    Graph(#[from] GraphError),
    /// Chunk graph construction failed.
    #[error(transparent)]
    Chunk(#[from] ChunkError),
    /// Emission failed.
    #[error(transparent)]
    Emit(#[from] EmitError),
}

impl BuildError {
    /// Returns the diagnostic code reported for this error.
    pub fn code(&self) -> DiagnosticCode {
        match self {
            BuildError::Config(ConfigError::IoError(_)) => DiagnosticCode::IO,
            BuildError::Config(_) => DiagnosticCode::CONFIG,
            BuildError::Graph(GraphError::UnresolvedImport { .. }) => {
                DiagnosticCode::UNRESOLVED_IMPORT
            }
            BuildError::Graph(GraphError::Read { .. }) => DiagnosticCode::IO,
            BuildError::Graph(GraphError::Transform { .. }) => DiagnosticCode::TRANSFORM,
            BuildError::Chunk(ChunkError::EmptyChunk { .. }) => DiagnosticCode::EMPTY_CHUNK,
            BuildError::Chunk(ChunkError::InvalidPattern { .. }) => DiagnosticCode::CONFIG,
            BuildError::Emit(EmitError::ManifestInjection { .. }) => {
                DiagnosticCode::MANIFEST_INJECTION
            }
            BuildError::Emit(EmitError::InvalidGlob { .. }) => DiagnosticCode::CONFIG,
            BuildError::Emit(EmitError::MissingAssetSource(_) | EmitError::Io { .. }) => {
                DiagnosticCode::IO
            }
        }
    }

    /// Converts the error into an error diagnostic for rendering.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let diag = Diagnostic::error(self.code(), self.to_string());
        match self {
            BuildError::Graph(GraphError::UnresolvedImport { importer, .. }) => {
                diag.at(importer.clone())
            }
            BuildError::Chunk(ChunkError::EmptyChunk { chunk, .. }) => diag
                .at(chunk.clone())
                .with_help("narrow the cache group tests or lower their priority"),
            BuildError::Emit(EmitError::ManifestInjection { template, .. }) => diag.at(template.clone()),
            _ => diag,
        }
    }
}
