//! Mapping of request paths onto files in the output directory.

use std::path::{Path, PathBuf};

/// Where a request path leads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    /// An existing file, or the `index.html` of a directory.
    File(PathBuf),
    /// The HTML document, served in place of an unknown route.
    Fallback(PathBuf),
    /// The path tries to leave the output directory.
    Forbidden,
    /// Nothing matches.
    NotFound,
}

/// Resolves a request target against `root`.
///
/// The query string and fragment are dropped and percent-escapes decoded.
/// Any `..` segment is rejected. `fallback` names the HTML document to serve
/// for extension-less paths that match no file.
pub fn resolve_request(root: &Path, target: &str, fallback: Option<&str>) -> Resolved {
    let path = target.split(['?', '#']).next().unwrap_or("");
    let Ok(decoded) = urlencoding::decode(path) else {
        return Resolved::NotFound;
    };

    let mut file = root.to_path_buf();
    let mut last = "";
    for segment in decoded.split('/') {
        match segment {
            "" | "." => {}
            ".." => return Resolved::Forbidden,
            s if s.contains('\\') || s.contains('\0') => return Resolved::Forbidden,
            s => {
                file.push(s);
                last = s;
            }
        }
    }

    if file.is_file() {
        return Resolved::File(file);
    }
    if file.is_dir() {
        let index = file.join("index.html");
        if index.is_file() {
            return Resolved::File(index);
        }
    }

    match fallback {
        Some(document) if !last.contains('.') => {
            let document = root.join(document);
            if document.is_file() {
                Resolved::Fallback(document)
            } else {
                Resolved::NotFound
            }
        }
        _ => Resolved::NotFound,
    }
}

/// The `Content-Type` for a file, guessed from its extension.
pub fn content_type(path: &Path) -> String {
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    if mime.type_() == mime_guess::mime::TEXT || mime.subtype() == mime_guess::mime::JAVASCRIPT {
        format!("{mime}; charset=utf-8")
    } else {
        mime.to_string()
    }
}
