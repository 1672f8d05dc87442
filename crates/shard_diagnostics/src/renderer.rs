//! Diagnostic rendering backends for human-readable and machine-readable output.

use crate::diagnostic::Diagnostic;
use crate::severity::Severity;

/// Trait for rendering diagnostics into formatted output strings.
pub trait DiagnosticRenderer {
    /// Renders a single diagnostic into a formatted string.
    fn render(&self, diag: &Diagnostic) -> String;

    /// Renders a batch of diagnostics, one after another.
    fn render_all(&self, diags: &[Diagnostic]) -> String {
        diags.iter().map(|d| self.render(d)).collect()
    }
}

/// Renders diagnostics in a rustc-style terminal format.
///
/// ```text
/// warning[W102]: asset 'img/logo.png' was produced by more than one mapping
///   --> img/logo.png
///    = note: the mapping declared last wins
/// ```
pub struct TerminalRenderer {
    /// Whether to use ANSI color codes in output.
    pub color: bool,
}

impl TerminalRenderer {
    /// Creates a new terminal renderer.
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    fn paint(&self, severity: Severity, text: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        let code = match severity {
            Severity::Error => "1;31",
            Severity::Warning => "1;33",
            Severity::Note => "1;36",
        };
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

impl DiagnosticRenderer for TerminalRenderer {
    fn render(&self, diag: &Diagnostic) -> String {
        let header = format!("{}[{}]", diag.severity, diag.code);
        let mut out = format!("{}: {}\n", self.paint(diag.severity, &header), diag.message);
        if let Some(location) = &diag.location {
            out.push_str(&format!("  --> {location}\n"));
        }
        for note in &diag.notes {
            out.push_str(&format!("   = note: {note}\n"));
        }
        for help in &diag.help {
            out.push_str(&format!("   = help: {help}\n"));
        }
        out
    }
}

/// Renders each diagnostic as one line of JSON.
pub struct JsonRenderer;

impl DiagnosticRenderer for JsonRenderer {
    fn render(&self, diag: &Diagnostic) -> String {
        match serde_json::to_string(diag) {
            Ok(line) => format!("{line}\n"),
            Err(e) => format!("{{\"error\":\"failed to serialize diagnostic: {e}\"}}\n"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::DiagnosticCode;

    #[test]
    fn render_warning_with_location_and_notes() {
        let diag = Diagnostic::warning(DiagnosticCode::DUPLICATE_ASSET, "duplicate asset")
            .at("img/logo.png")
            .with_note("the mapping declared last wins")
            .with_help("add an ignore glob to one mapping");
        let output = TerminalRenderer::new(false).render(&diag);
        assert!(output.starts_with("warning[W102]: duplicate asset\n"));
        assert!(output.contains("  --> img/logo.png\n"));
        assert!(output.contains("= note: the mapping declared last wins"));
        assert!(output.contains("= help: add an ignore glob to one mapping"));
    }

    #[test]
    fn render_without_location() {
        let diag = Diagnostic::error(DiagnosticCode::CONFIG, "missing [entry] section");
        let output = TerminalRenderer::new(false).render(&diag);
        assert_eq!(output, "error[E104]: missing [entry] section\n");
    }

    #[test]
    fn color_wraps_header_only() {
        let diag = Diagnostic::error(DiagnosticCode::EMPTY_CHUNK, "empty");
        let output = TerminalRenderer::new(true).render(&diag);
        assert!(output.starts_with("\x1b[1;31merror[E102]\x1b[0m: empty"));
    }

    #[test]
    fn json_is_one_line_per_diagnostic() {
        let diags = vec![
            Diagnostic::warning(DiagnosticCode::DANGLING_MODULE, "a").at("src/a.js"),
            Diagnostic::warning(DiagnosticCode::DANGLING_MODULE, "b").at("src/b.js"),
        ];
        let output = JsonRenderer.render_all(&diags);
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2);
        let parsed: Diagnostic = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(parsed, diags[0]);
    }
}
