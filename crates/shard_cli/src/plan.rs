//! `shard plan`: print the chunk layout without writing files.

use shard_build::plan;
use shard_diagnostics::DiagnosticSink;

use crate::pipeline::{print_diagnostics, resolve_options};
use crate::{GlobalArgs, PlanArgs, ReportFormat};

/// Runs the `shard plan` command.
///
/// The plan goes to stdout; diagnostics go to stderr.
pub fn run(args: &PlanArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let options = match resolve_options(global, args.mode, None) {
        Ok(options) => options,
        Err(e) => {
            print_diagnostics(&[e.to_diagnostic()], args.format, global);
            return Ok(1);
        }
    };

    let sink = DiagnosticSink::new();
    let result = plan(&options, &sink);
    let mut diagnostics = sink.sorted();
    let plan = match result {
        Ok(plan) => plan,
        Err(e) => {
            diagnostics.push(e.to_diagnostic());
            print_diagnostics(&diagnostics, args.format, global);
            return Ok(1);
        }
    };

    print_diagnostics(&diagnostics, args.format, global);
    match args.format {
        ReportFormat::Text => print!("{plan}"),
        ReportFormat::Json => println!("{}", serde_json::to_string_pretty(&plan)?),
    }
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn plan_writes_no_output() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("src")).unwrap();
        fs::write(
            tmp.path().join("shard.toml"),
            "[project]\nname = \"demo\"\n\n[entry]\nmain = \"./src/index.js\"\n",
        )
        .unwrap();
        fs::write(tmp.path().join("src/index.js"), "export {};\n").unwrap();

        let global = GlobalArgs {
            quiet: true,
            verbose: false,
            color: false,
            config: Some(tmp.path().join("shard.toml").to_string_lossy().into_owned()),
        };
        let args = PlanArgs {
            mode: None,
            format: ReportFormat::Json,
        };
        assert_eq!(run(&args, &global).unwrap(), 0);
        assert!(!tmp.path().join("build").exists());
    }
}
