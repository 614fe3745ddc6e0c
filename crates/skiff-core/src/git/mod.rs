//! Repository provisioning for integrations.
//!
//! Repositories are cloned with the `git` CLI into a per-scope layout:
//! - local: `<project>/.<namespace>/repos/<name>`
//! - global: `<application support>/<namespace>/repos/<name>`

mod provisioner;

use std::path::{Path, PathBuf};

use crate::platform::{Environment, PlatformInfo, application_support_dir};
use crate::types::{REPO_DIR_PLACEHOLDER, Scope, ServerDescriptor, expand_repo_dir};

pub use provisioner::{RepoDirResolver, RepoProvisioner};

/// Default namespace directory name.
pub const DEFAULT_NAMESPACE: &str = "skiff";

/// What [`RepoProvisioner::ensure_repo`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RepoAction {
    Cloned,
    Updated,
}

/// Result of provisioning through the overwrite prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisionOutcome {
    Installed(ServerDescriptor),
    /// The user declined to overwrite an existing directory.
    Cancelled,
}

/// A repository-backed server to provision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRequest {
    pub name: String,
    pub url: String,
    pub command: String,
    pub args: Vec<String>,
    pub server_type: Option<String>,
}

impl RepoRequest {
    pub fn new(
        name: impl Into<String>,
        url: impl Into<String>,
        command: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            command: command.into(),
            args: Vec::new(),
            server_type: None,
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

    /// The server entry for this request once provisioned at `repo_dir`.
    ///
    /// `{repo_dir}` in the command or args is replaced with the directory.
    pub fn descriptor(&self, repo_dir: &Path) -> ServerDescriptor {
        let command = self
            .command
            .replace(REPO_DIR_PLACEHOLDER, &repo_dir.to_string_lossy());
        ServerDescriptor {
            name: self.name.clone(),
            command,
            args: expand_repo_dir(&self.args, repo_dir),
            server_type: self.server_type.clone(),
            source_repo_url: Some(self.url.clone()),
            build_command: None,
            repo_dir: Some(repo_dir.to_path_buf()),
        }
    }
}

/// Where provisioned repositories live.
#[derive(Debug, Clone)]
pub struct RepoLayout {
    namespace: String,
    env: Environment,
}

impl RepoLayout {
    pub fn new(namespace: impl Into<String>, env: Environment) -> Self {
        Self {
            namespace: namespace.into(),
            env,
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Directory holding every repository for `scope`.
    pub fn repos_root(&self, scope: Scope, project_root: &Path, platform: &PlatformInfo) -> PathBuf {
        match scope {
            Scope::Local => project_root
                .join(format!(".{}", self.namespace))
                .join("repos"),
            Scope::Global => application_support_dir(platform, &self.env)
                .join(&self.namespace)
                .join("repos"),
        }
    }

    pub fn repo_dir(
        &self,
        scope: Scope,
        project_root: &Path,
        platform: &PlatformInfo,
        name: &str,
    ) -> PathBuf {
        self.repos_root(scope, project_root, platform).join(name)
    }
}
