//! Parsing and validation of `shard.toml` project configuration files.
//!
//! The raw [`ProjectConfig`] is deserialized with `toml`, validated, and then
//! resolved into an immutable [`BuildOptions`] with absolute paths. The
//! pipeline only ever sees `BuildOptions`, shared by reference and never
//! mutated mid-build.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod resolve;
pub mod types;

pub use error::ConfigError;
pub use loader::{find_project_root, load_config, load_config_file, load_config_from_str, CONFIG_FILE};
pub use resolve::{resolve_options, AssetMapping, BuildOptions, Overrides, ServerOptions, WorkerOptions};
pub use types::*;
