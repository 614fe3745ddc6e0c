//! Clone-or-update of integration repositories through the `git` CLI.

use std::ffi::OsStr;
use std::path::Path;
use std::process::Command;

use tracing::{debug, info, warn};

use crate::error::{ProvisionError, RepoFailureKind};
use crate::platform::PlatformInfo;
use crate::process::{ProcessRunner, RunError};
use crate::prompt::ConfirmPrompt;
use crate::types::Scope;

use super::{ProvisionOutcome, RepoAction, RepoRequest};

/// Maps (scope, project root, platform, integration name) to a repository directory.
pub type RepoDirResolver<'a> = dyn Fn(Scope, &Path, &PlatformInfo, &str) -> std::path::PathBuf + 'a;

const GIT_ENV_OVERRIDES: [&str; 4] = [
    "GIT_DIR",
    "GIT_WORK_TREE",
    "GIT_INDEX_FILE",
    "GIT_COMMON_DIR",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CloneDepth {
    Shallow,
    Full,
}

/// Clones, updates and removes integration repositories.
#[derive(Debug, Clone, Copy, Default)]
pub struct RepoProvisioner {
    runner: ProcessRunner,
}

impl RepoProvisioner {
    pub fn new(runner: ProcessRunner) -> Self {
        Self { runner }
    }

    pub fn runner(&self) -> &ProcessRunner {
        &self.runner
    }

    /// Whether `dir` was established by a clone.
    pub fn is_managed(dir: &Path) -> bool {
        dir.join(".git").exists()
    }

    /// Make `dir` an up-to-date checkout of `url`.
    ///
    /// A missing directory gets a shallow clone. An existing managed checkout
    /// is fast-forwarded, which fails on diverged history. An existing
    /// directory without `.git` is left untouched.
    pub fn ensure_repo(&self, url: &str, dir: &Path) -> Result<RepoAction, ProvisionError> {
        if dir.exists() {
            if !Self::is_managed(dir) {
                return Err(ProvisionError::NotManagedDirectory(dir.to_path_buf()));
            }
            info!(url, dir = %dir.display(), "Updating repository");
            self.run_git("update", url, dir, ["pull", "--ff-only"])?;
            return Ok(RepoAction::Updated);
        }

        self.clone_into(url, dir, CloneDepth::Shallow)?;
        Ok(RepoAction::Cloned)
    }

    /// Provision `request` from scratch, asking before replacing an existing
    /// directory.
    ///
    /// Declining yields [`ProvisionOutcome::Cancelled`]. Confirming deletes the
    /// directory and performs a full clone.
    pub fn install_with_conflict_prompt(
        &self,
        request: &RepoRequest,
        scope: Scope,
        project_root: &Path,
        platform: &PlatformInfo,
        resolve_dir: &RepoDirResolver<'_>,
        prompt: &dyn ConfirmPrompt,
    ) -> Result<ProvisionOutcome, ProvisionError> {
        let dir = resolve_dir(scope, project_root, platform, &request.name);

        if dir.exists() {
            warn!(
                integration = %request.name,
                dir = %dir.display(),
                "Repository directory already exists"
            );
            let question = format!(
                "{} already exists at {}. Remove it and clone again?",
                request.name,
                dir.display()
            );
            let overwrite = prompt
                .confirm(&question, true)
                .map_err(ProvisionError::Prompt)?;
            if !overwrite {
                info!(integration = %request.name, "Overwrite declined");
                return Ok(ProvisionOutcome::Cancelled);
            }
            std::fs::remove_dir_all(&dir).map_err(|e| ProvisionError::filesystem(&dir, e))?;
        }

        self.clone_into(&request.url, &dir, CloneDepth::Full)?;
        Ok(ProvisionOutcome::Installed(request.descriptor(&dir)))
    }

    /// The `origin` remote URL of the checkout at `dir`, if it has one.
    pub fn origin_url(&self, dir: &Path) -> Option<String> {
        let mut command = git_command();
        command.args(["remote", "get-url", "origin"]).current_dir(dir);
        match self.runner.run(&mut command, "git") {
            Ok(output) if output.success() => {
                let url = output.stdout.trim();
                (!url.is_empty()).then(|| url.to_string())
            }
            _ => None,
        }
    }

    /// Remove `dir` if it exists. Returns whether anything was removed.
    pub fn cleanup(&self, dir: &Path) -> Result<bool, ProvisionError> {
        if !dir.exists() {
            debug!(dir = %dir.display(), "Nothing to clean up");
            return Ok(false);
        }
        std::fs::remove_dir_all(dir).map_err(|e| ProvisionError::filesystem(dir, e))?;
        info!(dir = %dir.display(), "Removed repository directory");
        Ok(true)
    }

    fn clone_into(&self, url: &str, dir: &Path, depth: CloneDepth) -> Result<(), ProvisionError> {
        let parent = dir.parent().unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(parent).map_err(|e| ProvisionError::filesystem(parent, e))?;

        info!(url, dir = %dir.display(), shallow = depth == CloneDepth::Shallow, "Cloning repository");
        let mut args: Vec<&OsStr> = vec![OsStr::new("clone")];
        if depth == CloneDepth::Shallow {
            args.extend([OsStr::new("--depth"), OsStr::new("1")]);
        }
        args.extend([OsStr::new(url), dir.as_os_str()]);
        self.run_git("clone", url, parent, args)
    }

    fn run_git<I, S>(
        &self,
        operation: &'static str,
        url: &str,
        cwd: &Path,
        args: I,
    ) -> Result<(), ProvisionError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut command = git_command();
        command.args(args).current_dir(cwd);

        let output = self
            .runner
            .run(&mut command, "git")
            .map_err(|err| repo_error(operation, url, &err))?;

        if !output.success() {
            return Err(ProvisionError::RepoOperation {
                operation,
                url: url.to_string(),
                kind: RepoFailureKind::classify(&output.stderr),
                detail: output.failure_detail(),
            });
        }
        Ok(())
    }
}

fn git_command() -> Command {
    let mut cmd = Command::new("git");
    for key in GIT_ENV_OVERRIDES {
        cmd.env_remove(key);
    }
    cmd.env("GIT_TERMINAL_PROMPT", "0");
    cmd
}

fn repo_error(operation: &'static str, url: &str, err: &RunError) -> ProvisionError {
    let kind = if err.is_program_missing() {
        RepoFailureKind::ToolMissing
    } else {
        RepoFailureKind::Generic
    };
    ProvisionError::RepoOperation {
        operation,
        url: url.to_string(),
        kind,
        detail: err.to_string(),
    }
}
