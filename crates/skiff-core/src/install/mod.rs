//! Install and uninstall runs across integrations and hosts.
//!
//! Runs are strictly sequential: one integration at a time, one host at a
//! time, so no two read-merge-write cycles on the same config file overlap.
//! Failures are recorded per (integration, host) pair in the report instead
//! of aborting the run; only a declined overwrite stops it early.

mod orchestrator;
mod uninstall;

use std::path::PathBuf;

use serde::Serialize;

use crate::git::RepoAction;
use crate::types::{Scope, ServerDescriptor};

pub use orchestrator::{InstallOptions, InstallOrchestrator, ProvisionMode};
pub use uninstall::{
    HostRemoval, RemovalStatus, RepoCleanup, UninstallOptions, UninstallOrchestrator,
    UninstallReport,
};

/// Outcome for one host within one integration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum HostStatus {
    Installed,
    Skipped { reason: String },
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostOutcome {
    pub host: String,
    pub config_path: PathBuf,
    #[serde(flatten)]
    pub status: HostStatus,
}

/// Everything that happened to one integration.
#[derive(Debug, Clone, Serialize)]
pub struct IntegrationOutcome {
    pub name: String,
    pub repo_dir: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repo_action: Option<RepoAction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server: Option<ServerDescriptor>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    /// Provisioning or build error; hosts are all skipped when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub hosts: Vec<HostOutcome>,
}

impl IntegrationOutcome {
    pub fn new(name: impl Into<String>, repo_dir: PathBuf) -> Self {
        Self {
            name: name.into(),
            repo_dir,
            repo_action: None,
            server: None,
            warnings: Vec::new(),
            error: None,
            hosts: Vec::new(),
        }
    }

    pub fn host(&self, id: &str) -> Option<&HostOutcome> {
        self.hosts.iter().find(|h| h.host == id)
    }

    pub fn installed_hosts(&self) -> impl Iterator<Item = &HostOutcome> {
        self.hosts
            .iter()
            .filter(|h| h.status == HostStatus::Installed)
    }

    pub fn has_failures(&self) -> bool {
        self.error.is_some()
            || self
                .hosts
                .iter()
                .any(|h| matches!(h.status, HostStatus::Failed { .. }))
    }
}

/// Result of an install run.
#[derive(Debug, Clone, Serialize)]
pub struct InstallReport {
    pub scope: Scope,
    pub integrations: Vec<IntegrationOutcome>,
    /// Set when the user declined an overwrite; later integrations were not run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancelled: Option<String>,
}

impl InstallReport {
    pub fn new(scope: Scope) -> Self {
        Self {
            scope,
            integrations: Vec::new(),
            cancelled: None,
        }
    }

    pub fn integration(&self, name: &str) -> Option<&IntegrationOutcome> {
        self.integrations.iter().find(|i| i.name == name)
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.is_some()
    }

    pub fn has_failures(&self) -> bool {
        self.integrations.iter().any(IntegrationOutcome::has_failures)
    }

    /// Number of integrations with at least one failure.
    pub fn failure_count(&self) -> usize {
        self.integrations.iter().filter(|i| i.has_failures()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn host_status_serializes_flat() {
        let outcome = HostOutcome {
            host: "cursor".to_string(),
            config_path: PathBuf::from("/p/.cursor/mcp.json"),
            status: HostStatus::Skipped {
                reason: "not targeted".to_string(),
            },
        };
        assert_eq!(
            serde_json::to_value(&outcome).expect("serialize"),
            json!({
                "host": "cursor",
                "config_path": "/p/.cursor/mcp.json",
                "status": "skipped",
                "reason": "not targeted"
            })
        );
    }

    #[test]
    fn failures_are_counted_per_integration() {
        let mut report = InstallReport::new(Scope::Local);
        let mut ok = IntegrationOutcome::new("ok", PathBuf::from("/r/ok"));
        ok.hosts.push(HostOutcome {
            host: "claude".to_string(),
            config_path: PathBuf::from("/p/.claude/mcp.json"),
            status: HostStatus::Installed,
        });
        let mut bad = IntegrationOutcome::new("bad", PathBuf::from("/r/bad"));
        bad.error = Some("clone failed".to_string());
        report.integrations.extend([ok, bad]);

        assert!(report.has_failures());
        assert_eq!(report.failure_count(), 1);
        assert_eq!(report.integration("ok").map(|i| i.installed_hosts().count()), Some(1));
    }
}
