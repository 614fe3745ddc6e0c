//! `skiff.toml` manifest: settings, host declarations and integrations.

mod parser;

use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::build::BuildPolicy;
use crate::git::{DEFAULT_NAMESPACE, RepoRequest};
use crate::host::{HostDescriptor, HostRegistry};
use crate::process::{CommandSpec, DEFAULT_COMMAND_TIMEOUT};

pub use parser::{MANIFEST_FILE_NAME, parse_manifest, parse_manifest_str};

/// Root of `skiff.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub settings: Settings,

    /// Host declarations. When empty the built-in hosts are used.
    #[serde(default)]
    pub hosts: Vec<HostDescriptor>,

    #[serde(default)]
    pub integrations: Vec<IntegrationDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Directory name used for provisioned repositories.
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Bound on each git/build command, in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command_timeout_secs: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            command_timeout_secs: None,
        }
    }
}

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

impl Settings {
    pub fn command_timeout(&self) -> Duration {
        self.command_timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_COMMAND_TIMEOUT)
    }
}

/// A repository-backed server to install.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrationDefinition {
    pub name: String,
    pub url: String,
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub server_type: Option<String>,

    /// Shell command run after provisioning; failure only warns.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build: Option<String>,

    /// `[program, args...]` commands run in order; failure aborts.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub build_steps: Vec<Vec<String>>,

    /// Host ids to install into (whitelist). All hosts when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub targets: Option<Vec<String>>,
}

impl IntegrationDefinition {
    pub fn new(name: impl Into<String>, url: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            command: command.into(),
            args: Vec::new(),
            server_type: None,
            build: None,
            build_steps: Vec::new(),
            targets: None,
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        validate_integration_name(&self.name)?;
        if self.url.trim().is_empty() {
            anyhow::bail!("Integration '{}' has an empty url", self.name);
        }
        if self.command.trim().is_empty() {
            anyhow::bail!("Integration '{}' has an empty command", self.name);
        }
        if self.build.is_some() && !self.build_steps.is_empty() {
            anyhow::bail!(
                "Integration '{}': cannot specify both build and build_steps",
                self.name
            );
        }
        if let Some(index) = self.build_steps.iter().position(|s| s.is_empty()) {
            anyhow::bail!(
                "Integration '{}': build_steps[{}] is empty",
                self.name,
                index
            );
        }
        Ok(())
    }

    pub fn build_policy(&self) -> BuildPolicy {
        if let Some(script) = &self.build {
            return BuildPolicy::BestEffort(script.clone());
        }
        let steps: Vec<CommandSpec> = self
            .build_steps
            .iter()
            .filter_map(|argv| CommandSpec::from_argv(argv))
            .collect();
        if steps.is_empty() {
            BuildPolicy::None
        } else {
            BuildPolicy::Steps(steps)
        }
    }

    pub fn repo_request(&self) -> RepoRequest {
        RepoRequest {
            name: self.name.clone(),
            url: self.url.clone(),
            command: self.command.clone(),
            args: self.args.clone(),
            server_type: self.server_type.clone(),
        }
    }

    /// Whether this integration should be installed into `host_id`.
    pub fn targets_host(&self, host_id: &str) -> bool {
        self.targets
            .as_ref()
            .is_none_or(|targets| targets.iter().any(|t| t == host_id))
    }
}

/// Integration names become a directory name, so they must be a single
/// plain path component.
pub fn validate_integration_name(name: &str) -> anyhow::Result<()> {
    if name.trim().is_empty() {
        anyhow::bail!("Integration name must not be empty");
    }
    if name == "." || name == ".." {
        anyhow::bail!("Invalid integration name '{}'", name);
    }
    if name
        .chars()
        .any(|c| matches!(c, '/' | '\\' | ':') || c.is_control())
    {
        anyhow::bail!(
            "Invalid integration name '{}': must not contain path separators",
            name
        );
    }
    Ok(())
}

impl Manifest {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.settings.namespace.trim().is_empty() {
            anyhow::bail!("settings.namespace must not be empty");
        }
        validate_integration_name(&self.settings.namespace).context("Invalid settings.namespace")?;
        if self.settings.command_timeout_secs == Some(0) {
            anyhow::bail!("settings.command_timeout_secs must be greater than zero");
        }

        let registry = self.host_registry()?;
        let mut seen = std::collections::HashSet::new();
        for integration in &self.integrations {
            integration
                .validate()
                .with_context(|| format!("Invalid integration '{}'", integration.name))?;
            if !seen.insert(integration.name.as_str()) {
                anyhow::bail!(
                    "Integration '{}' is declared more than once",
                    integration.name
                );
            }
            if let Some(targets) = &integration.targets {
                registry
                    .check_targets(targets)
                    .with_context(|| format!("Invalid targets for '{}'", integration.name))?;
            }
        }
        Ok(())
    }

    /// Declared hosts, or the built-in set when none are declared.
    pub fn host_registry(&self) -> anyhow::Result<HostRegistry> {
        if self.hosts.is_empty() {
            return Ok(HostRegistry::with_default_hosts());
        }
        HostRegistry::from_descriptors(self.hosts.clone())
    }

    pub fn integration(&self, name: &str) -> Option<&IntegrationDefinition> {
        self.integrations.iter().find(|i| i.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_policy_selection() {
        let mut integration = IntegrationDefinition::new("wcag", "u", "node");
        assert_eq!(integration.build_policy(), BuildPolicy::None);

        integration.build = Some("npm install && npm run build".to_string());
        assert_eq!(
            integration.build_policy(),
            BuildPolicy::BestEffort("npm install && npm run build".to_string())
        );

        integration.build = None;
        integration.build_steps = vec![vec!["npm".to_string(), "ci".to_string()]];
        assert_eq!(
            integration.build_policy(),
            BuildPolicy::Steps(vec![CommandSpec::new("npm").with_args(["ci"])])
        );
    }

    #[test]
    fn targets_host_defaults_to_all() {
        let mut integration = IntegrationDefinition::new("wcag", "u", "node");
        assert!(integration.targets_host("cursor"));
        integration.targets = Some(vec!["claude".to_string()]);
        assert!(integration.targets_host("claude"));
        assert!(!integration.targets_host("cursor"));
    }

    #[test]
    fn names_must_be_single_path_components() {
        for bad in ["", "..", "a/b", "a\\b", "c:"] {
            assert!(
                IntegrationDefinition::new(bad, "u", "node").validate().is_err(),
                "{bad:?} should be rejected"
            );
        }
        assert!(IntegrationDefinition::new("wcag-mcp_2", "u", "node").validate().is_ok());
    }

    #[test]
    fn empty_manifest_uses_builtin_hosts() {
        let manifest = Manifest::default();
        assert_eq!(manifest.settings.namespace, "skiff");
        assert_eq!(manifest.settings.command_timeout(), DEFAULT_COMMAND_TIMEOUT);
        let registry = manifest.host_registry().expect("registry");
        assert!(registry.get("codex").is_some());
    }
}
