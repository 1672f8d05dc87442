//! Canonical, separator-normalized resource paths.
//!
//! Cache-group predicates, hashed module keys, and asset globs all match
//! against these strings, never against raw `Path`s, so a build produces the
//! same classification whether the platform separator is `/` or `\`.

use std::path::Path;

/// Normalizes a path into a `/`-separated string with `.` and `..`
/// segments resolved lexically.
///
/// Backslashes are treated as separators. A leading `/` and a drive prefix
/// such as `C:` are preserved. `..` never climbs above the root.
pub fn normalize_path(path: &Path) -> String {
    let raw = path.to_string_lossy().replace('\\', "/");
    let absolute = raw.starts_with('/');
    let mut segments: Vec<&str> = Vec::new();
    for segment in raw.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                let at_drive = segments.len() == 1 && segments[0].ends_with(':');
                match segments.last() {
                    Some(&"..") | None if !absolute => segments.push(".."),
                    Some(_) if !at_drive => {
                        segments.pop();
                    }
                    _ => {}
                }
            }
            other => segments.push(other),
        }
    }
    let joined = segments.join("/");
    if absolute {
        format!("/{joined}")
    } else {
        joined
    }
}

/// Returns `path` relative to `root` as a normalized string.
///
/// Falls back to the normalized absolute form when `path` is outside `root`.
pub fn relative_resource(root: &Path, path: &Path) -> String {
    let root = normalize_path(root);
    let path = normalize_path(path);
    let prefix = if root.ends_with('/') {
        root
    } else {
        format!("{root}/")
    };
    match path.strip_prefix(&prefix) {
        Some(rest) => rest.to_string(),
        None => path,
    }
}
