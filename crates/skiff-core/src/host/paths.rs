//! Host path resolution helpers.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

use crate::platform::{Environment, PlatformInfo, application_support_dir};
use crate::types::Scope;

use super::{GlobalBase, HostDescriptor, PlatformOverride};

/// The canonical config and skills locations of one host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedHostPaths {
    pub id: String,
    pub display_name: String,
    pub global_config_path: PathBuf,
    pub local_config_path: PathBuf,
    pub server_section_key: String,
    pub global_skills_dir: PathBuf,
    pub local_skills_dir: PathBuf,
}

impl ResolvedHostPaths {
    pub fn config_path(&self, scope: Scope) -> &Path {
        match scope {
            Scope::Local => &self.local_config_path,
            Scope::Global => &self.global_config_path,
        }
    }

    pub fn skills_dir(&self, scope: Scope) -> &Path {
        match scope {
            Scope::Local => &self.local_skills_dir,
            Scope::Global => &self.global_skills_dir,
        }
    }
}

/// Resolved paths for every host, in descriptor order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolvedHosts {
    hosts: Vec<ResolvedHostPaths>,
}

impl ResolvedHosts {
    pub fn get(&self, id: &str) -> Option<&ResolvedHostPaths> {
        self.hosts.iter().find(|h| h.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResolvedHostPaths> {
        self.hosts.iter()
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }
}

/// Compute local and global paths for each host.
///
/// Local paths are always `<project_root>/<default name>`. Global paths are
/// rooted at the application-support directory, with names from the matching
/// platform override, only when the host declares overrides and the platform
/// is Windows or macOS; otherwise they are rooted at the home directory with
/// the default names.
pub fn resolve_host_paths(
    project_root: &Path,
    platform: &PlatformInfo,
    env: &Environment,
    hosts: &[HostDescriptor],
) -> ResolvedHosts {
    let hosts = hosts
        .iter()
        .map(|host| resolve_one(project_root, platform, env, host))
        .collect();
    ResolvedHosts { hosts }
}

fn resolve_one(
    project_root: &Path,
    platform: &PlatformInfo,
    env: &Environment,
    host: &HostDescriptor,
) -> ResolvedHostPaths {
    let skills_folder = host.default_skills_folder();
    let config_file = host.default_mcp_config_file();

    let (global_base, global_skills, global_config) = match platform_override(host, platform) {
        Some(ov) => (
            application_support_dir(platform, env),
            ov.skills_folder.unwrap_or_else(|| skills_folder.clone()),
            ov.mcp_config_file.unwrap_or_else(|| config_file.clone()),
        ),
        None => (
            env.home_dir.clone(),
            skills_folder.clone(),
            config_file.clone(),
        ),
    };

    let resolved = ResolvedHostPaths {
        id: host.id.clone(),
        display_name: host.display_name.clone(),
        global_config_path: global_base.join(global_config),
        local_config_path: project_root.join(&config_file),
        server_section_key: host.server_section_key.clone(),
        global_skills_dir: global_base.join(global_skills),
        local_skills_dir: project_root.join(&skills_folder),
    };
    debug!(
        host = %resolved.id,
        global = %resolved.global_config_path.display(),
        local = %resolved.local_config_path.display(),
        "Resolved host paths"
    );
    resolved
}

/// The override applicable to this host on this platform, if any.
///
/// A host that declares overrides but none for the running platform still
/// resolves against the application-support directory with default names.
fn platform_override(host: &HostDescriptor, platform: &PlatformInfo) -> Option<PlatformOverride> {
    if host.global_base == GlobalBase::Home {
        return None;
    }
    let overrides = host.platform_overrides.as_ref()?;
    let matching = if platform.is_windows {
        &overrides.windows
    } else if platform.is_mac {
        &overrides.mac
    } else {
        return None;
    };
    Some(matching.clone().unwrap_or_default())
}
