//! `shard serve`: build, then serve the output directory until interrupted.

use shard_serve::{bind, serve, ServeConfig};

use crate::pipeline::{print_diagnostics, resolve_options};
use crate::{BuildArgs, GlobalArgs, ReportFormat, ServeArgs};

/// Runs the `shard serve` command.
///
/// A failed build exits 1 without starting the server.
pub fn run(args: &ServeArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    if !args.no_build {
        let build_args = BuildArgs {
            mode: args.mode,
            out_dir: None,
            format: ReportFormat::Text,
        };
        let code = crate::build::run(&build_args, global)?;
        if code != 0 {
            return Ok(code);
        }
    }

    let options = match resolve_options(global, args.mode, None) {
        Ok(options) => options,
        Err(e) => {
            print_diagnostics(&[e.to_diagnostic()], ReportFormat::Text, global);
            return Ok(1);
        }
    };

    let host = args.host.clone().unwrap_or_else(|| options.server.host.clone());
    let port = pick_port(args.port, std::env::var("PORT").ok(), options.server.port);
    let config = ServeConfig::from_options(&options);

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        let listener = bind(&host, port)?;
        if !global.quiet {
            let port = listener.local_addr().map(|a| a.port()).unwrap_or(port);
            eprintln!("   Serving {} at http://{host}:{port}", config.root.display());
        }
        serve(listener, config, async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutting down");
        })
        .await
    })?;
    Ok(0)
}

/// `--port` wins over a numeric `PORT`, which wins over the configured port.
fn pick_port(flag: Option<u16>, env: Option<String>, configured: u16) -> u16 {
    flag.or_else(|| env.and_then(|v| v.trim().parse().ok()))
        .unwrap_or(configured)
}
