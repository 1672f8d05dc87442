//! Writing the output directory.

use std::collections::HashMap;
use std::path::Path;

use rayon::prelude::*;
use serde::Serialize;
use shard_common::ContentHash;
use shard_diagnostics::{Diagnostic, DiagnosticCode, DiagnosticSink};

use crate::error::EmitError;

/// What produced an output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    /// A rendered chunk.
    Chunk,
    /// A copied static asset.
    Asset,
    /// The HTML entry document.
    Html,
    /// The injected worker script.
    Worker,
}

/// One file to write, relative to the output directory.
#[derive(Debug, Clone)]
pub struct OutputFile {
    /// `/`-separated path relative to the output directory.
    pub path: String,
    /// File content.
    pub bytes: Vec<u8>,
    /// Content hash; for chunks, the naming hash.
    pub hash: ContentHash,
    /// Producer.
    pub kind: FileKind,
}

impl OutputFile {
    /// Creates a file whose hash is computed from `bytes`.
    pub fn new(path: impl Into<String>, bytes: Vec<u8>, kind: FileKind) -> Self {
        Self {
            path: path.into(),
            hash: ContentHash::from_bytes(&bytes),
            bytes,
            kind,
        }
    }
}

/// Drops earlier files that share a path with a later one, warning for
/// each collision. Generated files come after assets, so they win.
pub fn resolve_collisions(files: Vec<OutputFile>, sink: &DiagnosticSink) -> Vec<OutputFile> {
    let mut last: HashMap<&str, usize> = HashMap::new();
    for (index, file) in files.iter().enumerate() {
        if let Some(previous) = last.insert(file.path.as_str(), index) {
            sink.emit(
                Diagnostic::warning(
                    DiagnosticCode::DUPLICATE_ASSET,
                    format!(
                        "{:?} output replaced by {:?} output at the same path",
                        files[previous].kind, file.kind
                    ),
                )
                .at(file.path.clone()),
            );
        }
    }
    let keep: Vec<bool> = files
        .iter()
        .enumerate()
        .map(|(index, file)| last.get(file.path.as_str()) == Some(&index))
        .collect();
    files
        .into_iter()
        .zip(keep)
        .filter_map(|(file, keep)| keep.then_some(file))
        .collect()
}

/// Writes every file under `out_dir`, emptying it first when `clean` is set.
#[tracing::instrument(skip_all, fields(out_dir = %out_dir.display()))]
pub fn write_output(out_dir: &Path, files: &[OutputFile], clean: bool) -> Result<(), EmitError> {
    if clean && out_dir.exists() {
        tracing::debug!("cleaning output directory");
        std::fs::remove_dir_all(out_dir).map_err(EmitError::io(out_dir))?;
    }
    std::fs::create_dir_all(out_dir).map_err(EmitError::io(out_dir))?;

    let results: Vec<Result<(), EmitError>> = files
        .par_iter()
        .map(|file| {
            let path = out_dir.join(&file.path);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(EmitError::io(parent))?;
            }
            std::fs::write(&path, &file.bytes).map_err(EmitError::io(&path))
        })
        .collect();
    results.into_iter().collect::<Result<(), _>>()?;

    let bytes: usize = files.iter().map(|f| f.bytes.len()).sum();
    tracing::info!(files = files.len(), bytes, "output written");
    Ok(())
}
