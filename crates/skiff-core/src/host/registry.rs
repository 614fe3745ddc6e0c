//! Host registry for managing the set of known hosts.
//!
//! The registry provides a central place to look up hosts and filter them
//! by explicit target lists.

use super::{HostDescriptor, builtin_hosts};

/// Ordered collection of host descriptors.
#[derive(Debug, Clone)]
pub struct HostRegistry {
    hosts: Vec<HostDescriptor>,
}

impl Default for HostRegistry {
    fn default() -> Self {
        Self::with_default_hosts()
    }
}

impl HostRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self { hosts: Vec::new() }
    }

    /// Create a registry with the built-in hosts.
    pub fn with_default_hosts() -> Self {
        Self {
            hosts: builtin_hosts(),
        }
    }

    /// Create a registry from declared hosts, rejecting duplicates.
    pub fn from_descriptors(hosts: Vec<HostDescriptor>) -> anyhow::Result<Self> {
        let mut registry = Self::new();
        for host in hosts {
            registry.register(host)?;
        }
        Ok(registry)
    }

    /// Register a host descriptor.
    pub fn register(&mut self, host: HostDescriptor) -> anyhow::Result<()> {
        host.validate()?;
        if self.get(&host.id).is_some() {
            anyhow::bail!("Host '{}' is declared more than once", host.id);
        }
        self.hosts.push(host);
        Ok(())
    }

    pub fn all(&self) -> &[HostDescriptor] {
        &self.hosts
    }

    pub fn get(&self, id: &str) -> Option<&HostDescriptor> {
        self.hosts.iter().find(|h| h.id == id)
    }

    /// Fail if any target names an unknown host.
    pub fn check_targets(&self, targets: &[String]) -> anyhow::Result<()> {
        let unknown: Vec<&str> = targets
            .iter()
            .filter(|t| self.get(t).is_none())
            .map(|t| t.as_str())
            .collect();
        if !unknown.is_empty() {
            anyhow::bail!(
                "Unknown host(s): {}. Known hosts: {}",
                unknown.join(", "),
                self.host_ids().join(", ")
            );
        }
        Ok(())
    }

    pub fn host_ids(&self) -> Vec<&str> {
        self.hosts.iter().map(|h| h.id.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_hosts_registered() {
        let registry = HostRegistry::with_default_hosts();
        let ids = registry.host_ids();

        assert!(ids.contains(&"claude"));
        assert!(ids.contains(&"cursor"));
        assert!(ids.contains(&"vscode"));
        assert!(ids.contains(&"windsurf"));
        assert!(ids.contains(&"codex"));
        assert_eq!(ids.len(), 5);
    }

    #[test]
    fn test_register_rejects_duplicates() {
        let mut registry = HostRegistry::new();
        registry
            .register(HostDescriptor::new("a", "A", "mcpServers"))
            .expect("first registration");
        let err = registry
            .register(HostDescriptor::new("a", "Again", "servers"))
            .unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn test_check_targets_reports_unknown() {
        let registry = HostRegistry::with_default_hosts();
        assert!(registry.check_targets(&["cursor".to_string()]).is_ok());
        let err = registry
            .check_targets(&["cursor".to_string(), "emacs".to_string()])
            .unwrap_err();
        assert!(err.to_string().contains("emacs"));
    }

    #[test]
    fn test_empty_registry() {
        let registry = HostRegistry::new();
        assert!(registry.all().is_empty());
        assert!(registry.get("claude").is_none());
    }
}
