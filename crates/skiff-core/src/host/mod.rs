//! Host descriptors for cross-host compatibility
//!
//! A host is an external application (IDE, coding assistant) with its own
//! MCP configuration file and skills directory. Hosts are described
//! declaratively; the built-in set can be replaced from `skiff.toml`.

pub mod paths;
pub mod registry;

use serde::{Deserialize, Serialize};

pub use paths::{ResolvedHostPaths, ResolvedHosts, resolve_host_paths};
pub use registry::HostRegistry;

/// How a host's global (per-user) paths are rooted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GlobalBase {
    /// Application-support directory with platform overrides on Windows/macOS
    /// when the host declares them, home directory otherwise.
    #[default]
    Auto,
    /// Always the home directory with default names, ignoring overrides.
    Home,
}

/// Folder/file names used on a specific platform instead of the defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skills_folder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mcp_config_file: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub windows: Option<PlatformOverride>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mac: Option<PlatformOverride>,
}

/// Declarative description of a host application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostDescriptor {
    pub id: String,
    pub display_name: String,
    /// Defaults to `.{id}/skills`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skills_folder: Option<String>,
    /// Defaults to `.{id}/mcp.json`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mcp_config_file: Option<String>,
    /// Top-level key holding the server map in the host's config.
    pub server_section_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform_overrides: Option<PlatformOverrides>,
    #[serde(default)]
    pub global_base: GlobalBase,
}

impl HostDescriptor {
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        server_section_key: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            skills_folder: None,
            mcp_config_file: None,
            server_section_key: server_section_key.into(),
            platform_overrides: None,
            global_base: GlobalBase::Auto,
        }
    }

    pub fn with_skills_folder(mut self, folder: impl Into<String>) -> Self {
        self.skills_folder = Some(folder.into());
        self
    }

    pub fn with_mcp_config_file(mut self, file: impl Into<String>) -> Self {
        self.mcp_config_file = Some(file.into());
        self
    }

    pub fn with_platform_overrides(mut self, overrides: PlatformOverrides) -> Self {
        self.platform_overrides = Some(overrides);
        self
    }

    pub fn with_global_base(mut self, base: GlobalBase) -> Self {
        self.global_base = base;
        self
    }

    pub fn default_skills_folder(&self) -> String {
        self.skills_folder
            .clone()
            .unwrap_or_else(|| format!(".{}/skills", self.id))
    }

    pub fn default_mcp_config_file(&self) -> String {
        self.mcp_config_file
            .clone()
            .unwrap_or_else(|| format!(".{}/mcp.json", self.id))
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.id.trim().is_empty() {
            anyhow::bail!("Host id must not be empty");
        }
        if self.server_section_key.trim().is_empty() {
            anyhow::bail!("Host '{}' has an empty server_section_key", self.id);
        }
        Ok(())
    }
}

/// Hosts known out of the box.
pub fn builtin_hosts() -> Vec<HostDescriptor> {
    vec![
        HostDescriptor::new("claude", "Claude Code", "mcpServers"),
        HostDescriptor::new("cursor", "Cursor", "mcpServers"),
        HostDescriptor::new("vscode", "VS Code", "servers").with_platform_overrides(
            PlatformOverrides {
                windows: Some(PlatformOverride {
                    skills_folder: Some("Code/User/skills".to_string()),
                    mcp_config_file: Some("Code/User/mcp.json".to_string()),
                }),
                mac: Some(PlatformOverride {
                    skills_folder: Some("Code/User/skills".to_string()),
                    mcp_config_file: Some("Code/User/mcp.json".to_string()),
                }),
            },
        ),
        HostDescriptor::new("windsurf", "Windsurf", "mcpServers")
            .with_skills_folder(".codeium/windsurf/skills")
            .with_mcp_config_file(".codeium/windsurf/mcp_config.json"),
        HostDescriptor::new("codex", "Codex", "mcp_servers")
            .with_mcp_config_file(".codex/config.toml"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_derive_from_id() {
        let host = HostDescriptor::new("cursor", "Cursor", "mcpServers");
        assert_eq!(host.default_skills_folder(), ".cursor/skills");
        assert_eq!(host.default_mcp_config_file(), ".cursor/mcp.json");
    }

    #[test]
    fn explicit_names_win_over_defaults() {
        let host = HostDescriptor::new("codex", "Codex", "mcp_servers")
            .with_mcp_config_file(".codex/config.toml");
        assert_eq!(host.default_mcp_config_file(), ".codex/config.toml");
        assert_eq!(host.default_skills_folder(), ".codex/skills");
    }

    #[test]
    fn builtin_hosts_are_valid_and_unique() {
        let hosts = builtin_hosts();
        let mut ids: Vec<_> = hosts.iter().map(|h| h.id.as_str()).collect();
        for host in &hosts {
            host.validate().expect("builtin host should be valid");
        }
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), hosts.len());
    }

    #[test]
    fn deserializes_from_toml_with_overrides() {
        let host: HostDescriptor = toml::from_str(
            r#"
id = "vscode"
display_name = "VS Code"
server_section_key = "servers"
global_base = "home"

[platform_overrides.windows]
mcp_config_file = "Code/User/mcp.json"
"#,
        )
        .expect("host should parse");

        assert_eq!(host.global_base, GlobalBase::Home);
        let windows = host
            .platform_overrides
            .and_then(|o| o.windows)
            .expect("windows override");
        assert_eq!(windows.mcp_config_file.as_deref(), Some("Code/User/mcp.json"));
        assert!(windows.skills_folder.is_none());
    }

    #[test]
    fn validate_rejects_empty_section_key() {
        let host = HostDescriptor::new("x", "X", " ");
        assert!(host.validate().is_err());
    }
}
