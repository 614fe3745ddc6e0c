//! Skiff Core Library
//!
//! Provisions repository-backed MCP servers and registers them in the
//! configuration files of multiple host applications, per scope and platform.

pub mod build;
pub mod config;
pub mod context;
pub mod error;
pub mod git;
pub mod host;
pub mod install;
pub mod manifest;
pub mod platform;
pub mod process;
pub mod prompt;
pub mod types;

/// Re-exports of commonly used types
pub mod prelude {
    // Context
    pub use crate::context::AppContext;
    pub use crate::platform::{Environment, PlatformInfo};
    pub use crate::types::{Scope, ServerDescriptor};

    // Hosts
    pub use crate::host::{HostDescriptor, HostRegistry, ResolvedHostPaths, ResolvedHosts};

    // Config
    pub use crate::config::{ConfigDocument, ConfigStore};

    // Provisioning
    pub use crate::error::{ProvisionError, RepoFailureKind};
    pub use crate::git::{ProvisionOutcome, RepoAction, RepoProvisioner, RepoRequest};
    pub use crate::prompt::{AcceptDefaults, ConfirmPrompt};

    // Orchestration
    pub use crate::install::{
        HostStatus, InstallOptions, InstallOrchestrator, InstallReport, ProvisionMode,
        UninstallOptions, UninstallOrchestrator, UninstallReport,
    };
    pub use crate::manifest::{IntegrationDefinition, Manifest};
}
