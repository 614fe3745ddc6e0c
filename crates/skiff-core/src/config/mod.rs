//! Host configuration file management.
//!
//! This module handles reading and writing host configuration files
//! (e.g., `~/.cursor/mcp.json`, `~/.codex/config.toml`) in two formats and
//! merging server entries into them without touching unrelated content.

pub mod document;
mod json;
pub mod store;
mod table;

use std::path::Path;

use anyhow::{Context, Result};
use serde_json::{Map, Value};

pub use document::{ConfigDocument, RemoveResult, ServerEntry, merge_servers, remove_servers};
pub use json::JsonSerializer;
pub use store::{BACKUP_SUFFIX, ConfigStore};
pub use table::TableSerializer;

/// Configuration file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    /// Minimal dotted-table format (`[section.table]` + `key = value`).
    Table,
}

impl ConfigFormat {
    /// Select the format from a file's extension: `.toml` is the table
    /// format, everything else is JSON.
    pub fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => ConfigFormat::Table,
            _ => ConfigFormat::Json,
        }
    }
}

/// Trait for serializing/deserializing host configuration files.
///
/// All implementations normalize to `serde_json::Map<String, Value>` as the
/// intermediate representation.
pub trait ConfigSerializer: Send + Sync {
    /// Parse file content into a JSON-compatible map.
    fn parse(&self, content: &str) -> Result<Map<String, Value>>;

    /// Render a JSON-compatible map as file content.
    fn render(&self, map: &Map<String, Value>) -> Result<String>;

    /// Get the format this serializer handles.
    fn format(&self) -> ConfigFormat;

    /// Load a configuration file.
    ///
    /// Returns an empty map if the file does not exist.
    fn load(&self, path: &Path) -> Result<Map<String, Value>> {
        if !path.exists() {
            return Ok(Map::new());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        self.parse(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Save a map to the configuration file.
    ///
    /// Creates parent directories if they don't exist.
    fn save(&self, path: &Path, map: &Map<String, Value>) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }
        let content = self.render(map)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }
}

/// Create a serializer for the given format.
pub fn serializer_for_format(format: ConfigFormat) -> Box<dyn ConfigSerializer> {
    match format {
        ConfigFormat::Json => Box::new(JsonSerializer),
        ConfigFormat::Table => Box::new(TableSerializer),
    }
}

/// Create a serializer for the format implied by `path`.
pub fn serializer_for_path(path: &Path) -> Box<dyn ConfigSerializer> {
    serializer_for_format(ConfigFormat::for_path(path))
}
