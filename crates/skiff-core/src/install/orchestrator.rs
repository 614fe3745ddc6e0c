//! Core install orchestration across hosts.

use std::path::Path;

use tracing::{info, warn};

use crate::build::{BuildOutcome, run_build};
use crate::config::ConfigStore;
use crate::context::AppContext;
use crate::git::{ProvisionOutcome, RepoAction, RepoLayout, RepoProvisioner};
use crate::host::{HostDescriptor, ResolvedHosts};
use crate::manifest::IntegrationDefinition;
use crate::platform::PlatformInfo;
use crate::prompt::ConfirmPrompt;
use crate::types::{Scope, ServerDescriptor};

use super::{HostOutcome, HostStatus, InstallReport, IntegrationOutcome};

/// How repositories are provisioned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProvisionMode {
    /// Shallow clone when missing, fast-forward when present.
    #[default]
    Update,
    /// Ask before deleting an existing directory, then clone from scratch.
    Reinstall,
}

#[derive(Debug, Clone)]
pub struct InstallOptions {
    pub scope: Scope,
    pub mode: ProvisionMode,
    /// Only install into these host ids. All hosts when `None`.
    pub host_filter: Option<Vec<String>>,
}

impl InstallOptions {
    pub fn new(scope: Scope) -> Self {
        Self {
            scope,
            mode: ProvisionMode::Update,
            host_filter: None,
        }
    }

    pub fn with_mode(mut self, mode: ProvisionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_host_filter(mut self, hosts: Vec<String>) -> Self {
        self.host_filter = Some(hosts);
        self
    }

    fn selects(&self, host_id: &str) -> bool {
        self.host_filter
            .as_ref()
            .is_none_or(|hosts| hosts.iter().any(|h| h == host_id))
    }
}

enum Flow {
    Continue(IntegrationOutcome),
    Cancelled(IntegrationOutcome),
}

/// Provisions integrations and registers them with every selected host.
pub struct InstallOrchestrator<'a> {
    ctx: &'a AppContext,
    store: ConfigStore,
    provisioner: RepoProvisioner,
    layout: RepoLayout,
    prompt: &'a dyn ConfirmPrompt,
}

impl<'a> InstallOrchestrator<'a> {
    pub fn new(ctx: &'a AppContext, prompt: &'a dyn ConfirmPrompt) -> Self {
        Self {
            ctx,
            store: ConfigStore::new(),
            provisioner: ctx.provisioner(),
            layout: ctx.repo_layout(),
            prompt,
        }
    }

    /// Install `integrations` into `hosts`, one integration at a time.
    pub fn run(
        &self,
        hosts: &[HostDescriptor],
        integrations: &[IntegrationDefinition],
        options: &InstallOptions,
    ) -> InstallReport {
        let resolved = self.ctx.resolve_hosts(hosts);
        let mut report = InstallReport::new(options.scope);

        for integration in integrations {
            match self.install_one(integration, &resolved, options) {
                Flow::Continue(outcome) => report.integrations.push(outcome),
                Flow::Cancelled(outcome) => {
                    report.cancelled = Some(format!(
                        "installation cancelled: overwrite of '{}' declined",
                        outcome.name
                    ));
                    report.integrations.push(outcome);
                    break;
                }
            }
        }

        report
    }

    fn install_one(
        &self,
        integration: &IntegrationDefinition,
        resolved: &ResolvedHosts,
        options: &InstallOptions,
    ) -> Flow {
        let scope = options.scope;
        let repo_dir = self.layout.repo_dir(
            scope,
            self.ctx.project_root(),
            self.ctx.platform(),
            &integration.name,
        );
        let mut outcome = IntegrationOutcome::new(&integration.name, repo_dir.clone());
        info!(integration = %integration.name, scope = %scope, "Installing integration");

        let request = integration.repo_request();
        let provisioned = match options.mode {
            ProvisionMode::Update => self
                .provisioner
                .ensure_repo(&request.url, &repo_dir)
                .map(|action| Some((action, request.descriptor(&repo_dir)))),
            ProvisionMode::Reinstall => self
                .provisioner
                .install_with_conflict_prompt(
                    &request,
                    scope,
                    self.ctx.project_root(),
                    self.ctx.platform(),
                    &|scope: Scope, root: &Path, platform: &PlatformInfo, name: &str| {
                        self.layout.repo_dir(scope, root, platform, name)
                    },
                    self.prompt,
                )
                .map(|result| match result {
                    ProvisionOutcome::Installed(server) => Some((RepoAction::Cloned, server)),
                    ProvisionOutcome::Cancelled => None,
                }),
        };

        let mut server = match provisioned {
            Ok(Some((action, mut server))) => {
                outcome.repo_action = Some(action);
                if action == RepoAction::Updated {
                    self.check_origin(&request.url, &repo_dir, &mut server, &mut outcome);
                }
                server
            }
            Ok(None) => {
                skip_all(&mut outcome, resolved, scope, "installation cancelled");
                return Flow::Cancelled(outcome);
            }
            Err(err) => {
                warn!(integration = %integration.name, error = %err, "Provisioning failed");
                outcome.error = Some(err.to_string());
                skip_all(&mut outcome, resolved, scope, "repository provisioning failed");
                return Flow::Continue(outcome);
            }
        };

        let policy = integration.build_policy();
        server.build_command = policy.describe();
        match run_build(&self.ctx.runner(), &policy, &repo_dir) {
            Ok(BuildOutcome::FailedWithWarning(message)) => outcome.warnings.push(message),
            Ok(_) => {}
            Err(err) => {
                warn!(integration = %integration.name, error = %err, "Build failed");
                outcome.error = Some(err.to_string());
                skip_all(&mut outcome, resolved, scope, "build failed");
                return Flow::Continue(outcome);
            }
        }

        for host in resolved.iter() {
            let config_path = host.config_path(scope);
            let status = if !integration.targets_host(&host.id) {
                HostStatus::Skipped {
                    reason: "not targeted by integration".to_string(),
                }
            } else if !options.selects(&host.id) {
                HostStatus::Skipped {
                    reason: "host not selected".to_string(),
                }
            } else {
                self.install_into(&server, config_path, &host.server_section_key, &host.id)
            };
            outcome.hosts.push(HostOutcome {
                host: host.id.clone(),
                config_path: config_path.to_path_buf(),
                status,
            });
        }

        outcome.server = Some(server);
        Flow::Continue(outcome)
    }

    /// Record the remote an existing checkout actually tracks when it is not
    /// the declared url.
    fn check_origin(
        &self,
        url: &str,
        repo_dir: &Path,
        server: &mut ServerDescriptor,
        outcome: &mut IntegrationOutcome,
    ) {
        let Some(origin) = self.provisioner.origin_url(repo_dir) else {
            return;
        };
        if same_remote(&origin, url) {
            return;
        }
        warn!(integration = %outcome.name, origin = %origin, url, "Checkout tracks a different remote");
        outcome.warnings.push(format!(
            "repository at {} tracks {}, not {}; run with --reinstall to switch",
            repo_dir.display(),
            origin,
            url
        ));
        server.source_repo_url = Some(origin);
    }

    fn install_into(
        &self,
        server: &ServerDescriptor,
        config_path: &Path,
        section_key: &str,
        host_id: &str,
    ) -> HostStatus {
        match self
            .store
            .install(config_path, std::slice::from_ref(server), section_key)
        {
            Ok(_) => HostStatus::Installed,
            Err(err) => {
                warn!(host = host_id, error = %format!("{err:#}"), "Config write failed");
                HostStatus::Failed {
                    error: format!("{err:#}"),
                }
            }
        }
    }
}

fn skip_all(outcome: &mut IntegrationOutcome, resolved: &ResolvedHosts, scope: Scope, reason: &str) {
    outcome.hosts = resolved
        .iter()
        .map(|host| HostOutcome {
            host: host.id.clone(),
            config_path: host.config_path(scope).to_path_buf(),
            status: HostStatus::Skipped {
                reason: reason.to_string(),
            },
        })
        .collect();
}

fn same_remote(a: &str, b: &str) -> bool {
    a.trim_end_matches('/') == b.trim_end_matches('/')
}
