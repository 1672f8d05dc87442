//! Configuration file discovery, loading, and validation.

use crate::error::ConfigError;
use crate::types::{ProjectConfig, TestConfig};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Name of the project configuration file.
pub const CONFIG_FILE: &str = "shard.toml";

/// Chunk name reserved for the single runtime chunk.
pub(crate) const RUNTIME_CHUNK_NAME: &str = "runtime";

/// Walks up from `start` looking for the nearest directory containing `shard.toml`.
pub fn find_project_root(start: &Path) -> Result<PathBuf, ConfigError> {
    let mut current = start.to_path_buf();
    loop {
        if current.join(CONFIG_FILE).is_file() {
            return Ok(current);
        }
        if !current.pop() {
            return Err(ConfigError::NotFound(start.display().to_string()));
        }
    }
}

/// Loads and validates `<project_dir>/shard.toml`.
pub fn load_config(project_dir: &Path) -> Result<ProjectConfig, ConfigError> {
    load_config_file(&project_dir.join(CONFIG_FILE))
}

/// Loads and validates a configuration file at an explicit path.
pub fn load_config_file(path: &Path) -> Result<ProjectConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    tracing::debug!(path = %path.display(), "loading configuration");
    load_config_from_str(&content)
}

/// Parses and validates a configuration from a string.
pub fn load_config_from_str(content: &str) -> Result<ProjectConfig, ConfigError> {
    let config: ProjectConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Checks required fields and cross-field consistency.
fn validate_config(config: &ProjectConfig) -> Result<(), ConfigError> {
    if config.project.name.is_empty() {
        return Err(ConfigError::MissingField("project.name".to_string()));
    }
    if config.entry.is_empty() {
        return Err(ConfigError::MissingField("entry".to_string()));
    }
    for (name, specifiers) in &config.entry {
        if specifiers.is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "entry '{name}' lists no modules"
            )));
        }
    }
    if !config.output.filename.contains("[name]") {
        return Err(ConfigError::ValidationError(format!(
            "output.filename '{}' must contain [name]",
            config.output.filename
        )));
    }
    if config.resolve.extensions.iter().any(|e| !e.starts_with('.')) {
        return Err(ConfigError::ValidationError(
            "resolve.extensions must start with '.'".to_string(),
        ));
    }

    let mut chunk_names: BTreeSet<&str> = config.entry.keys().map(String::as_str).collect();
    if chunk_names.contains(RUNTIME_CHUNK_NAME) {
        return Err(ConfigError::ValidationError(format!(
            "entry name '{RUNTIME_CHUNK_NAME}' is reserved for the runtime chunk"
        )));
    }
    for group in &config.cache_groups {
        if group.name.is_empty() {
            return Err(ConfigError::MissingField("cache_groups.name".to_string()));
        }
        if group.name == RUNTIME_CHUNK_NAME || !chunk_names.insert(&group.name) {
            return Err(ConfigError::ValidationError(format!(
                "cache group name '{}' collides with another chunk name",
                group.name
            )));
        }
        let empty_test = match &group.test {
            TestConfig::Packages(v) | TestConfig::Contains(v) => {
                v.is_empty() || v.iter().any(String::is_empty)
            }
            TestConfig::Directory(s) | TestConfig::Regex(s) => s.is_empty(),
        };
        if empty_test {
            return Err(ConfigError::ValidationError(format!(
                "cache group '{}' has an empty test",
                group.name
            )));
        }
    }

    for mapping in &config.assets {
        if mapping.from.is_empty() {
            return Err(ConfigError::MissingField("assets.from".to_string()));
        }
    }
    if let Some(worker) = &config.worker {
        if worker.src.is_empty() {
            return Err(ConfigError::MissingField("worker.src".to_string()));
        }
        if worker.marker.is_empty() {
            return Err(ConfigError::MissingField("worker.marker".to_string()));
        }
    }
    Ok(())
}
