//! Shared core types used across path resolution, provisioning and config layers.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Installation scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// Under the current project root.
    Local,
    /// Under the user's profile.
    Global,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Local => "local",
            Scope::Global => "global",
        }
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A registrable command-based server, ready to be written into host configs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerDescriptor {
    /// Unique key within a server section.
    pub name: String,
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub server_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_repo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_command: Option<String>,
    /// Where the backing repository was provisioned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo_dir: Option<PathBuf>,
}

impl ServerDescriptor {
    pub fn new(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            args: Vec::new(),
            server_type: None,
            source_repo_url: None,
            build_command: None,
            repo_dir: None,
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_type(mut self, server_type: impl Into<String>) -> Self {
        self.server_type = Some(server_type.into());
        self
    }
}

/// Placeholder substituted with the provisioned repository path in server args.
pub const REPO_DIR_PLACEHOLDER: &str = "{repo_dir}";

/// Replace every `{repo_dir}` occurrence in `args` with `repo_dir`.
pub fn expand_repo_dir(args: &[String], repo_dir: &Path) -> Vec<String> {
    let repo = repo_dir.to_string_lossy();
    args.iter()
        .map(|arg| arg.replace(REPO_DIR_PLACEHOLDER, &repo))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expand_repo_dir_replaces_placeholder_only() {
        let args = vec![
            "{repo_dir}/dist/index.js".to_string(),
            "--stdio".to_string(),
        ];
        let expanded = expand_repo_dir(&args, Path::new("/opt/repos/wcag"));
        assert_eq!(expanded, vec!["/opt/repos/wcag/dist/index.js", "--stdio"]);
    }

    #[test]
    fn scope_serializes_lowercase() {
        let json = serde_json::to_string(&Scope::Global).expect("scope serialization");
        assert_eq!(json, "\"global\"");
    }
}
