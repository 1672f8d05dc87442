//! Configuration types deserialized from `shard.toml`.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;

/// The top-level project configuration parsed from `shard.toml`.
#[derive(Debug, Deserialize)]
pub struct ProjectConfig {
    /// Project metadata and build mode.
    pub project: ProjectMeta,
    /// Named entries, each mapped to one or more module specifiers.
    ///
    /// Entries are iterated in name order, which fixes the order in which
    /// entry chunks are created.
    #[serde(default, deserialize_with = "deserialize_entries")]
    pub entry: BTreeMap<String, Vec<String>>,
    /// Module resolution settings.
    #[serde(default)]
    pub resolve: ResolveConfig,
    /// Output directory and naming.
    #[serde(default)]
    pub output: OutputConfig,
    /// Splitting heuristics and minification.
    #[serde(default)]
    pub optimization: OptimizationConfig,
    /// Ordered cache-group rules. Declaration order breaks priority ties.
    #[serde(default)]
    pub cache_groups: Vec<CacheGroupConfig>,
    /// Static asset copy mappings.
    #[serde(default)]
    pub assets: Vec<AssetMappingConfig>,
    /// HTML entry document settings.
    #[serde(default)]
    pub html: HtmlConfig,
    /// Service-worker precache settings. No worker is emitted when absent.
    #[serde(default)]
    pub worker: Option<WorkerConfig>,
    /// Development server settings for `shard serve`.
    #[serde(default)]
    pub server: ServerConfig,
}

/// Core project metadata.
#[derive(Debug, Deserialize)]
pub struct ProjectMeta {
    /// The project name.
    pub name: String,
    /// Build mode; production enables minification.
    #[serde(default)]
    pub mode: Mode,
}

/// Build mode.
#[derive(Debug, Default, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Minified output.
    #[default]
    Production,
    /// Unminified output.
    Development,
}

/// Module resolution settings.
#[derive(Debug, Deserialize)]
pub struct ResolveConfig {
    /// Search paths for bare specifiers, tried in order. Relative paths are
    /// relative to the project root.
    #[serde(default = "default_modules")]
    pub modules: Vec<String>,
    /// Extensions appended to extension-less specifiers, in priority order.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

impl Default for ResolveConfig {
    fn default() -> Self {
        Self {
            modules: default_modules(),
            extensions: default_extensions(),
        }
    }
}

fn default_modules() -> Vec<String> {
    vec!["node_modules".to_string()]
}

fn default_extensions() -> Vec<String> {
    vec![".js".to_string()]
}

/// Output directory and chunk naming.
#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    /// Output directory, relative to the project root.
    #[serde(default = "default_output_path")]
    pub path: String,
    /// Chunk filename template. Supports `[name]`, `[contenthash]` and
    /// `[contenthash:N]`.
    #[serde(default = "default_filename")]
    pub filename: String,
    /// URL prefix for emitted files in the HTML document and precache manifest.
    #[serde(default = "default_public_path")]
    pub public_path: String,
    /// Empty the output directory before writing.
    #[serde(default = "default_true")]
    pub clean: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
            filename: default_filename(),
            public_path: default_public_path(),
            clean: true,
        }
    }
}

fn default_output_path() -> String {
    "build".to_string()
}

fn default_filename() -> String {
    "[name].bundle.[contenthash:8].js".to_string()
}

fn default_public_path() -> String {
    "/".to_string()
}

fn default_true() -> bool {
    true
}

/// Splitting heuristics applied to non-enforced cache groups.
#[derive(Debug, Default, Deserialize)]
pub struct OptimizationConfig {
    /// Minimum total module size, in bytes, for a non-enforced group chunk.
    #[serde(default)]
    pub min_size: u64,
    /// Maximum number of chunks an entry may load up front. Unlimited when absent.
    #[serde(default)]
    pub max_initial_requests: Option<usize>,
    /// Overrides the mode's minification default.
    #[serde(default)]
    pub minimize: Option<bool>,
}

/// Which chunks a cache group applies to, by the kind of chunk a module is
/// being placed into.
#[derive(Debug, Default, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChunkScope {
    /// Entry and async chunks.
    #[default]
    All,
    /// Only chunks loaded on demand.
    Async,
    /// Only entry chunks.
    Initial,
}

/// A module-matching predicate, written as a one-key table.
///
/// All variants match against the canonical `/`-separated absolute resource
/// path of a module.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TestConfig {
    /// Matches modules under `/node_modules/<name>/` for any listed package.
    Packages(Vec<String>),
    /// Matches when the path contains any of the listed substrings.
    Contains(Vec<String>),
    /// Matches modules with `/<dir>/` somewhere in their path.
    Directory(String),
    /// Matches a regular expression.
    Regex(String),
}

/// One cache-group rule as written in the configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheGroupConfig {
    /// Name of the chunk matched modules are moved into.
    pub name: String,
    /// The module predicate.
    pub test: TestConfig,
    /// The chunk kinds this rule applies to.
    #[serde(default)]
    pub chunks: ChunkScope,
    /// Higher priorities are evaluated first.
    #[serde(default)]
    pub priority: i32,
    /// Bypass the size heuristics once selected.
    #[serde(default)]
    pub enforce: bool,
}

/// One static-asset copy mapping.
#[derive(Debug, Clone, Deserialize)]
pub struct AssetMappingConfig {
    /// Source file or directory, relative to the project root.
    pub from: String,
    /// Destination directory, relative to the output directory.
    #[serde(default = "default_dot")]
    pub to: String,
    /// Globs, relative to `from`, of files to skip.
    #[serde(default)]
    pub ignore: Vec<String>,
}

fn default_dot() -> String {
    ".".to_string()
}

/// HTML entry document settings.
#[derive(Debug, Deserialize)]
pub struct HtmlConfig {
    /// Template path relative to the project root; a default document is
    /// generated when absent.
    #[serde(default)]
    pub template: Option<String>,
    /// Output filename.
    #[serde(default = "default_html_filename")]
    pub filename: String,
}

impl Default for HtmlConfig {
    fn default() -> Self {
        Self {
            template: None,
            filename: default_html_filename(),
        }
    }
}

fn default_html_filename() -> String {
    "index.html".to_string()
}

/// Service-worker precache settings.
#[derive(Debug, Deserialize)]
pub struct WorkerConfig {
    /// Worker template path relative to the project root.
    pub src: String,
    /// Output filename of the injected worker.
    #[serde(default = "default_worker_dest")]
    pub dest: String,
    /// Text in the template that is replaced by the manifest literal.
    #[serde(default = "default_marker")]
    pub marker: String,
    /// Globs of emitted URLs (relative to the output directory) left out of the manifest.
    #[serde(default)]
    pub exclude: Vec<String>,
    /// Files larger than this many bytes are left out of the manifest.
    #[serde(default = "default_maximum_file_size")]
    pub maximum_file_size: u64,
}

fn default_worker_dest() -> String {
    "sw.js".to_string()
}

fn default_marker() -> String {
    "self.__WB_MANIFEST".to_string()
}

fn default_maximum_file_size() -> u64 {
    2 * 1024 * 1024
}

/// Development server settings.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Interface to listen on.
    #[serde(default = "default_host")]
    pub host: String,
    /// TCP port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Answer unknown extension-less paths with the HTML document so
    /// client-side routes survive a reload.
    #[serde(default = "default_true")]
    pub history_fallback: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            history_fallback: true,
        }
    }
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    3000
}

/// Deserializes the `[entry]` table, where each value is either a single
/// specifier or a list of specifiers.
fn deserialize_entries<'de, D>(deserializer: D) -> Result<BTreeMap<String, Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    struct EntryTable;

    impl<'de> Visitor<'de> for EntryTable {
        type Value = BTreeMap<String, Vec<String>>;

        fn expecting(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            formatter.write_str("a table of entry names to a specifier or a list of specifiers")
        }

        fn visit_map<A: de::MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
            let mut entries = BTreeMap::new();
            while let Some((name, specifiers)) = map.next_entry::<String, OneOrMany>()? {
                let specifiers = match specifiers {
                    OneOrMany::One(s) => vec![s],
                    OneOrMany::Many(v) => v,
                };
                entries.insert(name, specifiers);
            }
            Ok(entries)
        }
    }

    deserializer.deserialize_map(EntryTable)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}
