//! Config store for loading, merging and saving host config files.

use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::{debug, info, warn};

use crate::types::ServerDescriptor;

use super::{ConfigDocument, merge_servers, remove_servers, serializer_for_path};

/// Suffix appended to a config file's name when it is backed up as unreadable.
pub const BACKUP_SUFFIX: &str = ".backup";

/// Reads and writes host config documents, choosing the format per path.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfigStore;

impl ConfigStore {
    pub fn new() -> Self {
        Self
    }

    /// Path a corrupt `path` is copied to before being reset.
    pub fn backup_path(path: &Path) -> PathBuf {
        let mut name = path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(BACKUP_SUFFIX);
        path.with_file_name(name)
    }

    /// Load the document at `path`.
    ///
    /// A missing file is an empty document. A file that cannot be decoded is
    /// copied to [`Self::backup_path`] and treated as empty, so installation
    /// can proceed; the original bytes stay available for manual recovery.
    /// Only a failure to read or back up the file is returned as an error.
    pub fn load(&self, path: &Path) -> anyhow::Result<ConfigDocument> {
        if !path.exists() {
            return Ok(ConfigDocument::new());
        }
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let parsed = std::str::from_utf8(&bytes)
            .map_err(anyhow::Error::from)
            .and_then(|content| serializer_for_path(path).parse(content));

        match parsed {
            Ok(map) => Ok(ConfigDocument::from_map(map)),
            Err(err) => {
                let backup = Self::backup_path(path);
                std::fs::copy(path, &backup).with_context(|| {
                    format!(
                        "Failed to back up unreadable config {} to {}",
                        path.display(),
                        backup.display()
                    )
                })?;
                warn!(
                    path = %path.display(),
                    backup = %backup.display(),
                    error = %err,
                    "Config file could not be parsed; backed up and starting from an empty document"
                );
                Ok(ConfigDocument::new())
            }
        }
    }

    /// Write `document` to `path` in the format implied by its extension.
    pub fn save(&self, path: &Path, document: &ConfigDocument) -> anyhow::Result<()> {
        serializer_for_path(path).save(path, document.as_map())
    }

    /// Merge `servers` into the `section_key` section of the file at `path`.
    pub fn install(
        &self,
        path: &Path,
        servers: &[ServerDescriptor],
        section_key: &str,
    ) -> anyhow::Result<ConfigDocument> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }
        let existing = self.load(path)?;
        let merged = merge_servers(&existing, servers, section_key)
            .with_context(|| format!("Failed to merge servers into {}", path.display()))?;
        self.save(path, &merged)?;
        info!(
            path = %path.display(),
            section = section_key,
            count = servers.len(),
            "Registered servers"
        );
        Ok(merged)
    }

    /// Remove the named servers from the file at `path`.
    ///
    /// Returns how many entries were removed; the file is not written when
    /// that is zero.
    pub fn remove<S: AsRef<str>>(
        &self,
        path: &Path,
        names: &[S],
        section_key: &str,
    ) -> anyhow::Result<usize> {
        let existing = self.load(path)?;
        let result = remove_servers(&existing, names, section_key);
        if result.removed_count == 0 {
            debug!(path = %path.display(), "No matching servers; skipping write");
            return Ok(0);
        }
        self.save(path, &result.updated)?;
        info!(
            path = %path.display(),
            section = section_key,
            count = result.removed_count,
            "Removed servers"
        );
        Ok(result.removed_count)
    }
}
