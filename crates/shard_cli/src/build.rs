//! `shard build`: bundle the project into its output directory.
//!
//! Loads `shard.toml`, runs the full pipeline, prints collected warnings and
//! a summary. Fatal errors are rendered as error diagnostics with their
//! code; nothing has been written when one is reported.

use serde::Serialize;
use shard_build::{build, BuildReport};
use shard_config::Mode;
use shard_diagnostics::{Diagnostic, DiagnosticSink};

use crate::pipeline::{count, print_diagnostics, resolve_options};
use crate::{BuildArgs, GlobalArgs, ReportFormat};

#[derive(Serialize)]
struct JsonOutput<'a> {
    success: bool,
    report: Option<&'a BuildReport>,
    diagnostics: &'a [Diagnostic],
}

/// Runs the `shard build` command.
///
/// Returns exit code 0 on success and 1 when the build failed.
pub fn run(args: &BuildArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let options = match resolve_options(global, args.mode, args.out_dir.as_deref()) {
        Ok(options) => options,
        Err(e) => return report_failure(&[e.to_diagnostic()], args.format, global),
    };

    if !global.quiet && args.format == ReportFormat::Text {
        let mode = match options.mode {
            Mode::Production => "production",
            Mode::Development => "development",
        };
        eprintln!("   Building {} ({mode})", options.name);
    }

    let sink = DiagnosticSink::new();
    let result = build(&options, &sink);
    let mut diagnostics = sink.sorted();

    let report = match result {
        Ok(report) => report,
        Err(e) => {
            diagnostics.push(e.to_diagnostic());
            return report_failure(&diagnostics, args.format, global);
        }
    };

    print_diagnostics(&diagnostics, args.format, global);
    match args.format {
        ReportFormat::Text => {
            if !global.quiet {
                if global.verbose {
                    for file in &report.files {
                        eprintln!("    Emitting {} ({} bytes)", file.path, file.size);
                    }
                }
                let (_, warnings) = count(&diagnostics);
                eprintln!(
                    "    Finished {} modules into {} chunks, {} files in {} ({warnings} warning(s))",
                    report.modules,
                    report.chunks.len(),
                    report.files.len(),
                    report.out_dir.display()
                );
            }
        }
        ReportFormat::Json => {
            let output = JsonOutput {
                success: true,
                report: Some(&report),
                diagnostics: &diagnostics,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(0)
}

fn report_failure(
    diagnostics: &[Diagnostic],
    format: ReportFormat,
    global: &GlobalArgs,
) -> Result<i32, Box<dyn std::error::Error>> {
    match format {
        ReportFormat::Text => {
            print_diagnostics(diagnostics, format, global);
            let (errors, warnings) = count(diagnostics);
            eprintln!("   Result: {errors} error(s), {warnings} warning(s)");
        }
        ReportFormat::Json => {
            let output = JsonOutput {
                success: false,
                report: None,
                diagnostics,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(1)
}
