//! Application context for unified dependency injection.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::git::{DEFAULT_NAMESPACE, RepoLayout, RepoProvisioner};
use crate::host::{HostDescriptor, ResolvedHosts, resolve_host_paths};
use crate::manifest::Settings;
use crate::platform::{Environment, PlatformInfo};
use crate::process::{DEFAULT_COMMAND_TIMEOUT, ProcessRunner};

/// Everything a run needs to resolve paths and spawn commands.
///
/// Frontends create this once and pass it to the orchestrators; nothing in
/// the core reads the process environment on its own.
#[derive(Debug, Clone)]
pub struct AppContext {
    project_root: PathBuf,
    platform: PlatformInfo,
    env: Environment,
    namespace: String,
    command_timeout: Duration,
}

impl AppContext {
    /// Create a context with explicit platform and environment.
    pub fn new(project_root: PathBuf, platform: PlatformInfo, env: Environment) -> Self {
        Self {
            project_root,
            platform,
            env,
            namespace: DEFAULT_NAMESPACE.to_string(),
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
        }
    }

    /// Create a context for the running OS and process environment.
    pub fn from_process(project_root: PathBuf) -> anyhow::Result<Self> {
        Ok(Self::new(
            project_root,
            PlatformInfo::detect(),
            Environment::from_process()?,
        ))
    }

    /// Apply manifest settings.
    pub fn with_settings(mut self, settings: &Settings) -> Self {
        self.namespace = settings.namespace.clone();
        self.command_timeout = settings.command_timeout();
        self
    }

    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn platform(&self) -> &PlatformInfo {
        &self.platform
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn command_timeout(&self) -> Duration {
        self.command_timeout
    }

    pub fn runner(&self) -> ProcessRunner {
        ProcessRunner::new(self.command_timeout)
    }

    pub fn provisioner(&self) -> RepoProvisioner {
        RepoProvisioner::new(self.runner())
    }

    pub fn repo_layout(&self) -> RepoLayout {
        RepoLayout::new(self.namespace.clone(), self.env.clone())
    }

    /// Resolve every host's paths for this project and platform.
    pub fn resolve_hosts(&self, hosts: &[HostDescriptor]) -> ResolvedHosts {
        resolve_host_paths(&self.project_root, &self.platform, &self.env, hosts)
    }
}
