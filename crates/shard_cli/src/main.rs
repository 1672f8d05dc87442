//! Shard CLI: the command-line interface for the shard bundler.
//!
//! Provides `shard build` to bundle a project into its output directory,
//! `shard plan` to print the chunk layout a build would produce without
//! writing anything, and `shard serve` to build and serve the output.

#![warn(missing_docs)]

mod build;
mod pipeline;
mod plan;
mod serve;

use std::io::IsTerminal;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use shard_config::Mode;

/// Shard: a code-splitting bundler for browser applications.
#[derive(Parser, Debug)]
#[command(name = "shard", version, about = "Shard bundler")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose (debug-level) output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Control colored output.
    #[arg(long, global = true, value_enum, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    /// Path to a `shard.toml`; its directory becomes the project root.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Bundle the project and write the output directory.
    Build(BuildArgs),
    /// Print the chunk plan without writing any files.
    Plan(PlanArgs),
    /// Build, then serve the output directory over HTTP.
    Serve(ServeArgs),
}

/// Arguments for the `shard build` subcommand.
#[derive(Parser, Debug)]
pub struct BuildArgs {
    /// Override the configured build mode.
    #[arg(short, long, value_enum)]
    pub mode: Option<ModeArg>,

    /// Override the output directory (relative to the project root).
    #[arg(short, long)]
    pub out_dir: Option<String>,

    /// Output format for the report and diagnostics.
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,
}

/// Arguments for the `shard plan` subcommand.
#[derive(Parser, Debug)]
pub struct PlanArgs {
    /// Override the configured build mode.
    #[arg(short, long, value_enum)]
    pub mode: Option<ModeArg>,

    /// Output format for the plan and diagnostics.
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,
}

/// Arguments for the `shard serve` subcommand.
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Override the configured build mode.
    #[arg(short, long, value_enum)]
    pub mode: Option<ModeArg>,

    /// Port to listen on; falls back to `PORT`, then `server.port`.
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Interface to listen on.
    #[arg(long)]
    pub host: Option<String>,

    /// Serve the existing output without building first.
    #[arg(long)]
    pub no_build: bool,
}

/// Build mode selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    /// Minified output.
    Production,
    /// Unminified output.
    Development,
}

impl From<ModeArg> for Mode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Production => Mode::Production,
            ModeArg::Development => Mode::Development,
        }
    }
}

/// Controls whether colored output is produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ColorChoice {
    /// Detect from terminal capabilities.
    Auto,
    /// Always produce colored output.
    Always,
    /// Never produce colored output.
    Never,
}

/// Report and diagnostic output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Human-readable terminal output.
    Text,
    /// Machine-readable JSON output on stdout.
    Json,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to print verbose/debug information.
    pub verbose: bool,
    /// Whether to use colored output.
    pub color: bool,
    /// Optional path to a custom config file.
    pub config: Option<String>,
}

fn main() {
    let cli = Cli::parse();

    let color = match cli.color {
        ColorChoice::Auto => std::io::stderr().is_terminal(),
        ColorChoice::Always => true,
        ColorChoice::Never => false,
    };

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        color,
        config: cli.config,
    };
    pipeline::init_logging(&global);

    let result = match cli.command {
        Command::Build(ref args) => build::run(args, &global),
        Command::Plan(ref args) => plan::run(args, &global),
        Command::Serve(ref args) => serve::run(args, &global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn parse_build_default() {
        let cli = Cli::parse_from(["shard", "build"]);
        match cli.command {
            Command::Build(ref args) => {
                assert!(args.mode.is_none());
                assert!(args.out_dir.is_none());
                assert_eq!(args.format, ReportFormat::Text);
            }
            _ => panic!("expected Build command"),
        }
    }

    #[test]
    fn parse_build_with_args() {
        let cli = Cli::parse_from([
            "shard",
            "build",
            "--mode",
            "development",
            "--out-dir",
            "dist",
            "--format",
            "json",
        ]);
        match cli.command {
            Command::Build(ref args) => {
                assert_eq!(args.mode, Some(ModeArg::Development));
                assert_eq!(args.out_dir.as_deref(), Some("dist"));
                assert_eq!(args.format, ReportFormat::Json);
            }
            _ => panic!("expected Build command"),
        }
    }

    #[test]
    fn parse_build_short_flags() {
        let cli = Cli::parse_from(["shard", "build", "-m", "production", "-o", "out"]);
        match cli.command {
            Command::Build(ref args) => {
                assert_eq!(args.mode, Some(ModeArg::Production));
                assert_eq!(args.out_dir.as_deref(), Some("out"));
            }
            _ => panic!("expected Build command"),
        }
    }

    #[test]
    fn parse_plan_default() {
        let cli = Cli::parse_from(["shard", "plan"]);
        match cli.command {
            Command::Plan(ref args) => {
                assert!(args.mode.is_none());
                assert_eq!(args.format, ReportFormat::Text);
            }
            _ => panic!("expected Plan command"),
        }
    }

    #[test]
    fn parse_plan_json() {
        let cli = Cli::parse_from(["shard", "plan", "--format", "json"]);
        match cli.command {
            Command::Plan(ref args) => assert_eq!(args.format, ReportFormat::Json),
            _ => panic!("expected Plan command"),
        }
    }

    #[test]
    fn plan_has_no_out_dir() {
        let result = Cli::try_parse_from(["shard", "plan", "--out-dir", "dist"]);
        assert!(result.is_err());
    }

    #[test]
    fn parse_global_flags() {
        let cli = Cli::parse_from(["shard", "--quiet", "--color", "never", "build"]);
        assert!(cli.quiet);
        assert!(!cli.verbose);
        assert_eq!(cli.color, ColorChoice::Never);
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::parse_from(["shard", "plan", "--verbose", "--color", "always"]);
        assert!(cli.verbose);
        assert_eq!(cli.color, ColorChoice::Always);
    }

    #[test]
    fn parse_config_path() {
        let cli = Cli::parse_from(["shard", "--config", "/path/to/shard.toml", "build"]);
        assert_eq!(cli.config.as_deref(), Some("/path/to/shard.toml"));
    }

    #[test]
    fn unknown_mode_is_rejected() {
        let result = Cli::try_parse_from(["shard", "build", "--mode", "staging"]);
        assert!(result.is_err());
    }

    #[test]
    fn subcommand_is_required() {
        assert!(Cli::try_parse_from(["shard"]).is_err());
    }

    #[test]
    fn parse_serve_default() {
        let cli = Cli::parse_from(["shard", "serve"]);
        match cli.command {
            Command::Serve(ref args) => {
                assert!(args.port.is_none());
                assert!(args.host.is_none());
                assert!(!args.no_build);
            }
            _ => panic!("expected Serve command"),
        }
    }

    #[test]
    fn parse_serve_with_args() {
        let cli = Cli::parse_from([
            "shard",
            "serve",
            "-p",
            "8080",
            "--host",
            "0.0.0.0",
            "--no-build",
            "-m",
            "development",
        ]);
        match cli.command {
            Command::Serve(ref args) => {
                assert_eq!(args.port, Some(8080));
                assert_eq!(args.host.as_deref(), Some("0.0.0.0"));
                assert!(args.no_build);
                assert_eq!(args.mode, Some(ModeArg::Development));
            }
            _ => panic!("expected Serve command"),
        }
    }

    #[test]
    fn serve_port_must_be_numeric() {
        assert!(Cli::try_parse_from(["shard", "serve", "--port", "http"]).is_err());
        assert!(Cli::try_parse_from(["shard", "serve", "--port", "70000"]).is_err());
    }

    #[test]
    fn mode_arg_maps_to_config_mode() {
        assert_eq!(Mode::from(ModeArg::Production), Mode::Production);
        assert_eq!(Mode::from(ModeArg::Development), Mode::Development);
    }
}
