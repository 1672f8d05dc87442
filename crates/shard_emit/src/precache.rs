//! Precache manifest construction and injection into the worker script.

use globset::GlobSet;
use serde::Serialize;
use shard_config::WorkerOptions;
use shard_diagnostics::{Diagnostic, DiagnosticCode, DiagnosticSink};

use crate::assets::compile_globs;
use crate::error::EmitError;
use crate::output::OutputFile;

/// One `{url, revision}` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestEntry {
    /// Public URL of the file.
    pub url: String,
    /// Full content hash in hex; a pure function of the bytes.
    pub revision: String,
}

/// Manifest filters compiled from the worker settings.
#[derive(Debug)]
pub struct PrecacheOptions {
    public_path: String,
    worker_dest: String,
    exclude: GlobSet,
    maximum_file_size: u64,
}

impl PrecacheOptions {
    /// Compiles the exclude globs.
    pub fn new(worker: &WorkerOptions, public_path: &str) -> Result<Self, EmitError> {
        Ok(Self {
            public_path: public_path.to_string(),
            worker_dest: worker.dest.clone(),
            exclude: compile_globs(&worker.exclude)?,
            maximum_file_size: worker.maximum_file_size,
        })
    }
}

/// Builds the manifest over every emitted file, sorted by URL.
///
/// The worker's own path and files matching an exclude glob are skipped
/// silently; files above the size limit are skipped with a warning.
pub fn build_manifest(
    files: &[OutputFile],
    options: &PrecacheOptions,
    sink: &DiagnosticSink,
) -> Vec<ManifestEntry> {
    let mut entries: Vec<ManifestEntry> = Vec::with_capacity(files.len());
    for file in files {
        if file.path == options.worker_dest || options.exclude.is_match(&file.path) {
            continue;
        }
        let size = file.bytes.len() as u64;
        if size > options.maximum_file_size {
            sink.emit(
                Diagnostic::warning(
                    DiagnosticCode::OVERSIZED_PRECACHE_ENTRY,
                    format!(
                        "file is {size} bytes, above the precache limit of {} bytes; not precached",
                        options.maximum_file_size
                    ),
                )
                .at(file.path.clone()),
            );
            continue;
        }
        entries.push(ManifestEntry {
            url: format!("{}{}", options.public_path, file.path),
            revision: file.hash.to_string(),
        });
    }
    entries.sort_by(|a, b| a.url.cmp(&b.url));
    entries.dedup_by(|a, b| a.url == b.url);
    entries
}

/// Replaces the single `marker` in `template` with the manifest literal.
///
/// `template_name` only labels the error.
pub fn inject_manifest(
    template: &str,
    template_name: &str,
    marker: &str,
    entries: &[ManifestEntry],
) -> Result<String, EmitError> {
    let found = if marker.is_empty() {
        0
    } else {
        template.matches(marker).count()
    };
    if found != 1 {
        return Err(EmitError::ManifestInjection {
            template: template_name.to_string(),
            marker: marker.to_string(),
            found,
        });
    }
    let literal = serde_json::to_string(entries).map_err(|e| EmitError::ManifestInjection {
        template: format!("{template_name} ({e})"),
        marker: marker.to_string(),
        found,
    })?;
    Ok(template.replacen(marker, &literal, 1))
}
