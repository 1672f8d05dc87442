//! Shared plumbing for CLI commands: logging, option loading and
//! diagnostic output.

use std::path::{Path, PathBuf};

use shard_build::{load_options, BuildError};
use shard_config::{BuildOptions, Overrides};
use shard_diagnostics::{Diagnostic, DiagnosticRenderer, JsonRenderer, Severity, TerminalRenderer};
use tracing_subscriber::EnvFilter;

use crate::{GlobalArgs, ModeArg, ReportFormat};

/// Environment variable holding `tracing` filter directives.
pub const LOG_ENV: &str = "SHARD_LOG";

/// Installs the stderr `tracing` subscriber.
///
/// `SHARD_LOG` takes precedence over the level implied by `--quiet` and
/// `--verbose`.
pub fn init_logging(global: &GlobalArgs) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_directive(global)));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(global.color)
        .with_target(global.verbose)
        .without_time()
        .try_init();
}

fn default_directive(global: &GlobalArgs) -> &'static str {
    if global.quiet {
        "error"
    } else if global.verbose {
        "debug"
    } else {
        "warn"
    }
}

/// Loads `shard.toml` (from `--config` or by searching upward from the
/// current directory) and applies command-line overrides.
pub fn resolve_options(
    global: &GlobalArgs,
    mode: Option<ModeArg>,
    out_dir: Option<&str>,
) -> Result<BuildOptions, BuildError> {
    let cwd = std::env::current_dir().map_err(shard_config::ConfigError::IoError)?;
    let overrides = Overrides {
        mode: mode.map(Into::into),
        out_dir: out_dir.map(PathBuf::from),
    };
    load_options(global.config.as_deref().map(Path::new), &cwd, &overrides)
}

/// Writes diagnostics to stderr, rustc-style in text mode and as JSON lines
/// otherwise. `--quiet` keeps errors only.
pub fn print_diagnostics(diagnostics: &[Diagnostic], format: ReportFormat, global: &GlobalArgs) {
    let shown: Vec<Diagnostic> = diagnostics
        .iter()
        .filter(|d| !global.quiet || d.severity == Severity::Error)
        .cloned()
        .collect();
    eprint!("{}", render(&shown, format, global.color));
}

fn render(diagnostics: &[Diagnostic], format: ReportFormat, color: bool) -> String {
    match format {
        ReportFormat::Text => TerminalRenderer::new(color).render_all(diagnostics),
        ReportFormat::Json => JsonRenderer.render_all(diagnostics),
    }
}

/// Counts `(errors, warnings)`.
pub fn count(diagnostics: &[Diagnostic]) -> (usize, usize) {
    let errors = diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Error)
        .count();
    let warnings = diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Warning)
        .count();
    (errors, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shard_diagnostics::DiagnosticCode;

    fn global(quiet: bool, verbose: bool) -> GlobalArgs {
        GlobalArgs {
            quiet,
            verbose,
            color: false,
            config: None,
        }
    }

    #[test]
    fn quiet_wins_over_verbose() {
        assert_eq!(default_directive(&global(false, false)), "warn");
        assert_eq!(default_directive(&global(false, true)), "debug");
        assert_eq!(default_directive(&global(true, true)), "error");
    }

    #[test]
    fn count_splits_by_severity() {
        let diags = vec![
            Diagnostic::error(DiagnosticCode::EMPTY_CHUNK, "empty"),
            Diagnostic::warning(DiagnosticCode::DANGLING_MODULE, "a"),
            Diagnostic::warning(DiagnosticCode::DUPLICATE_ASSET, "b"),
            Diagnostic::note(DiagnosticCode::UNUSED_CACHE_GROUP, "c"),
        ];
        assert_eq!(count(&diags), (1, 2));
    }

    #[test]
    fn render_follows_format() {
        let diags = vec![
            Diagnostic::warning(DiagnosticCode::DANGLING_MODULE, "a").at("src/a.js"),
            Diagnostic::warning(DiagnosticCode::DANGLING_MODULE, "b"),
        ];
        let text = render(&diags, ReportFormat::Text, false);
        assert!(text.starts_with("warning[W101]: a\n  --> src/a.js\n"));
        let json = render(&diags, ReportFormat::Json, false);
        assert_eq!(json.lines().count(), 2);
        assert!(json.lines().all(|l| l.starts_with('{')));
    }
}
