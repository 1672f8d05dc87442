//! Static asset collection.
//!
//! Each mapping copies one file, or every file under a directory whose
//! path relative to the source does not match an ignore glob, to a
//! destination directory. Bytes pass through untouched. When mappings
//! collide on a destination path the later mapping wins and a duplicate
//! asset warning is recorded.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use rayon::prelude::*;
use shard_common::{normalize_path, ContentHash};
use shard_config::AssetMapping;
use shard_diagnostics::{Diagnostic, DiagnosticCode, DiagnosticSink};

use crate::error::EmitError;

/// A static file bound for the output directory.
#[derive(Debug, Clone)]
pub struct Asset {
    /// Output path relative to the output directory.
    pub path: String,
    /// Where the bytes came from.
    pub source: PathBuf,
    /// File content.
    pub bytes: Vec<u8>,
    /// Hash of the content.
    pub hash: ContentHash,
}

/// Compiles globs that match `/`-separated relative paths, with `*` never
/// crossing a separator.
pub(crate) fn compile_globs(patterns: &[String]) -> Result<GlobSet, EmitError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = GlobBuilder::new(pattern)
            .literal_separator(true)
            .build()
            .map_err(|e| EmitError::InvalidGlob {
                pattern: pattern.clone(),
                message: e.kind().to_string(),
            })?;
        builder.add(glob);
    }
    builder.build().map_err(|e| EmitError::InvalidGlob {
        pattern: patterns.join(", "),
        message: e.to_string(),
    })
}

fn destination(to: &str, relative: &str) -> String {
    if to.is_empty() {
        relative.to_string()
    } else {
        format!("{to}/{relative}")
    }
}

/// Lists `(source, destination)` pairs for one mapping in file-name order.
fn plan_mapping(mapping: &AssetMapping) -> Result<Vec<(PathBuf, String)>, EmitError> {
    if mapping.from.is_file() {
        let name = mapping
            .from
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        return Ok(vec![(mapping.from.clone(), destination(&mapping.to, &name))]);
    }
    if !mapping.from.is_dir() {
        return Err(EmitError::MissingAssetSource(mapping.from.clone()));
    }

    let ignore = compile_globs(&mapping.ignore)?;
    let mut planned = Vec::new();
    for entry in walkdir::WalkDir::new(&mapping.from).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| mapping.from.clone());
            EmitError::Io {
                path,
                source: e.into(),
            }
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(&mapping.from) else {
            continue;
        };
        let relative = normalize_path(relative);
        if ignore.is_match(&relative) {
            tracing::trace!(file = %relative, "asset ignored");
            continue;
        }
        planned.push((entry.path().to_path_buf(), destination(&mapping.to, &relative)));
    }
    Ok(planned)
}

/// Collects every mapped asset, sorted by output path.
#[tracing::instrument(skip_all)]
pub fn collect_assets(
    mappings: &[AssetMapping],
    sink: &DiagnosticSink,
) -> Result<Vec<Asset>, EmitError> {
    let mut planned = Vec::new();
    for mapping in mappings {
        planned.extend(plan_mapping(mapping)?);
    }

    let read: Vec<Result<Asset, EmitError>> = planned
        .into_par_iter()
        .map(|(source, path)| {
            let bytes = std::fs::read(&source).map_err(EmitError::io(&source))?;
            Ok(Asset {
                hash: ContentHash::from_bytes(&bytes),
                path,
                source,
                bytes,
            })
        })
        .collect();

    let mut by_path: HashMap<String, usize> = HashMap::new();
    let mut assets: Vec<Asset> = Vec::new();
    for asset in read {
        let asset = asset?;
        match by_path.get(&asset.path) {
            Some(&index) => {
                sink.emit(
                    Diagnostic::warning(
                        DiagnosticCode::DUPLICATE_ASSET,
                        "asset written by more than one mapping; the last mapping wins",
                    )
                    .at(asset.path.clone())
                    .with_note(format!("replaced {}", assets[index].source.display()))
                    .with_note(format!("kept {}", asset.source.display())),
                );
                assets[index] = asset;
            }
            None => {
                by_path.insert(asset.path.clone(), assets.len());
                assets.push(asset);
            }
        }
    }
    assets.sort_by(|a, b| a.path.cmp(&b.path));
    tracing::debug!(assets = assets.len(), "assets collected");
    Ok(assets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn mapping(from: PathBuf, to: &str, ignore: &[&str]) -> AssetMapping {
        AssetMapping {
            from,
            to: to.to_string(),
            ignore: ignore.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn paths(assets: &[Asset]) -> Vec<&str> {
        assets.iter().map(|a| a.path.as_str()).collect()
    }

    #[test]
    fn ignore_globs_are_relative_to_source() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "src/img/a.png", "a");
        write(tmp.path(), "src/img/tmp/b.png", "b");
        write(tmp.path(), "src/img/icons/c.svg", "c");
        let sink = DiagnosticSink::new();
        let assets = collect_assets(
            &[mapping(tmp.path().join("src/img"), "img", &["tmp/**"])],
            &sink,
        )
        .unwrap();
        assert_eq!(paths(&assets), vec!["img/a.png", "img/icons/c.svg"]);
        assert_eq!(assets[0].bytes, b"a");
        assert_eq!(assets[0].hash, ContentHash::from_bytes(b"a"));
    }

    #[test]
    fn star_does_not_cross_directories() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "static/x.tmp", "");
        write(tmp.path(), "static/deep/y.tmp", "");
        let sink = DiagnosticSink::new();
        let assets =
            collect_assets(&[mapping(tmp.path().join("static"), "", &["*.tmp"])], &sink).unwrap();
        assert_eq!(paths(&assets), vec!["deep/y.tmp"]);
    }

    #[test]
    fn single_file_mapping() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "src/robots.txt", "User-agent: *");
        let sink = DiagnosticSink::new();
        let assets =
            collect_assets(&[mapping(tmp.path().join("src/robots.txt"), "", &[])], &sink).unwrap();
        assert_eq!(paths(&assets), vec!["robots.txt"]);
    }

    #[test]
    fn later_mapping_wins_with_warning() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "one/logo.png", "first");
        write(tmp.path(), "two/logo.png", "second");
        let sink = DiagnosticSink::new();
        let assets = collect_assets(
            &[
                mapping(tmp.path().join("one"), "img", &[]),
                mapping(tmp.path().join("two"), "img", &[]),
            ],
            &sink,
        )
        .unwrap();
        assert_eq!(assets.len(), 1);
        assert_eq!(assets[0].bytes, b"second");
        let warnings = sink.diagnostics();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].code, DiagnosticCode::DUPLICATE_ASSET);
        assert_eq!(warnings[0].location.as_deref(), Some("img/logo.png"));
    }

    #[test]
    fn missing_source_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let sink = DiagnosticSink::new();
        let err = collect_assets(&[mapping(tmp.path().join("nope"), "", &[])], &sink).unwrap_err();
        assert!(matches!(err, EmitError::MissingAssetSource(_)));
    }

    #[test]
    fn invalid_glob_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "s/a", "");
        let sink = DiagnosticSink::new();
        let err = collect_assets(&[mapping(tmp.path().join("s"), "", &["a["])], &sink)
            .unwrap_err();
        assert!(matches!(err, EmitError::InvalidGlob { .. }));
    }
}
