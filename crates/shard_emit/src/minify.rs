//! The minifier collaborator interface.

/// Reduces final chunk text.
///
/// Runs after content hashing, so it never affects names or revisions.
/// Implementations must preserve every identifier the runtime refers to
/// (`self.shardChunks`, module keys, chunk names).
pub trait Minifier: Send + Sync {
    /// Returns the reduced text.
    fn minify(&self, text: &str) -> String;
}

/// Leaves text unchanged; used in development mode.
#[derive(Debug, Default, Clone, Copy)]
pub struct Passthrough;

impl Minifier for Passthrough {
    fn minify(&self, text: &str) -> String {
        text.to_string()
    }
}

/// Strips trailing whitespace and blank lines.
#[derive(Debug, Default, Clone, Copy)]
pub struct StripWhitespace;

impl Minifier for StripWhitespace {
    fn minify(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        for line in text.lines() {
            let line = line.trim_end();
            if line.is_empty() {
                continue;
            }
            out.push_str(line);
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_whitespace_removes_blank_lines() {
        let text = "a();   \n\n\t\nb();\n";
        assert_eq!(StripWhitespace.minify(text), "a();\nb();\n");
    }

    #[test]
    fn strip_whitespace_never_grows() {
        let text = "x\r\n  y  \n";
        assert!(StripWhitespace.minify(text).len() <= text.len());
    }

    #[test]
    fn passthrough_is_identity() {
        assert_eq!(Passthrough.minify(" a \n\n"), " a \n\n");
    }
}
