//! Removing registered servers and their repositories.

use std::path::PathBuf;

use serde::Serialize;
use tracing::{info, warn};

use crate::config::ConfigStore;
use crate::context::AppContext;
use crate::host::HostDescriptor;
use crate::manifest::validate_integration_name;
use crate::types::Scope;

#[derive(Debug, Clone)]
pub struct UninstallOptions {
    pub scope: Scope,
    /// Leave provisioned repositories on disk.
    pub keep_repos: bool,
    pub host_filter: Option<Vec<String>>,
}

impl UninstallOptions {
    pub fn new(scope: Scope) -> Self {
        Self {
            scope,
            keep_repos: false,
            host_filter: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RemovalStatus {
    Removed { count: usize },
    NotPresent,
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostRemoval {
    pub host: String,
    pub config_path: PathBuf,
    #[serde(flatten)]
    pub status: RemovalStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepoCleanup {
    pub name: String,
    pub dir: PathBuf,
    pub removed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UninstallReport {
    pub scope: Scope,
    pub hosts: Vec<HostRemoval>,
    pub repos: Vec<RepoCleanup>,
}

impl UninstallReport {
    pub fn host(&self, id: &str) -> Option<&HostRemoval> {
        self.hosts.iter().find(|h| h.host == id)
    }

    pub fn has_failures(&self) -> bool {
        self.hosts
            .iter()
            .any(|h| matches!(h.status, RemovalStatus::Failed { .. }))
            || self.repos.iter().any(|r| r.error.is_some())
    }
}

/// Removes servers from host configs and deletes their repositories.
pub struct UninstallOrchestrator<'a> {
    ctx: &'a AppContext,
    store: ConfigStore,
}

impl<'a> UninstallOrchestrator<'a> {
    pub fn new(ctx: &'a AppContext) -> Self {
        Self {
            ctx,
            store: ConfigStore::new(),
        }
    }

    /// Remove the servers called `names` from every selected host in scope.
    pub fn run(
        &self,
        hosts: &[HostDescriptor],
        names: &[String],
        options: &UninstallOptions,
    ) -> UninstallReport {
        let scope = options.scope;
        let resolved = self.ctx.resolve_hosts(hosts);

        let hosts = resolved
            .iter()
            .filter(|host| {
                options
                    .host_filter
                    .as_ref()
                    .is_none_or(|ids| ids.iter().any(|id| id == &host.id))
            })
            .map(|host| {
                let config_path = host.config_path(scope);
                let status = match self
                    .store
                    .remove(config_path, names, &host.server_section_key)
                {
                    Ok(0) => RemovalStatus::NotPresent,
                    Ok(count) => RemovalStatus::Removed { count },
                    Err(err) => {
                        warn!(host = %host.id, error = %format!("{err:#}"), "Config update failed");
                        RemovalStatus::Failed {
                            error: format!("{err:#}"),
                        }
                    }
                };
                HostRemoval {
                    host: host.id.clone(),
                    config_path: config_path.to_path_buf(),
                    status,
                }
            })
            .collect();

        let repos = if options.keep_repos {
            Vec::new()
        } else {
            self.cleanup_repos(names, scope)
        };

        info!(scope = %scope, count = names.len(), "Uninstall finished");
        UninstallReport { scope, hosts, repos }
    }

    fn cleanup_repos(&self, names: &[String], scope: Scope) -> Vec<RepoCleanup> {
        let provisioner = self.ctx.provisioner();
        let layout = self.ctx.repo_layout();
        names
            .iter()
            .map(|name| {
                let dir =
                    layout.repo_dir(scope, self.ctx.project_root(), self.ctx.platform(), name);
                let cleaned = validate_integration_name(name)
                    .map_err(|err| err.to_string())
                    .and_then(|()| provisioner.cleanup(&dir).map_err(|err| err.to_string()));
                let (removed, error) = match cleaned {
                    Ok(removed) => (removed, None),
                    Err(err) => (false, Some(err)),
                };
                RepoCleanup {
                    name: name.clone(),
                    dir,
                    removed,
                    error,
                }
            })
            .collect()
    }
}
