//! Error taxonomy for repository provisioning.
//!
//! Config corruption never surfaces here: the config store backs the file up and
//! starts from an empty document instead. Cancellation is not an error either;
//! it is reported as [`crate::git::ProvisionOutcome::Cancelled`].

use std::path::PathBuf;

use thiserror::Error;

/// Why a git clone/update failed, derived from the tool's output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepoFailureKind {
    AuthRequired,
    NotFound,
    ToolMissing,
    Generic,
}

impl RepoFailureKind {
    /// Classify a failed git invocation from its stderr text.
    pub fn classify(stderr: &str) -> Self {
        let text = stderr.to_lowercase();
        if text.contains("authentication failed")
            || text.contains("could not read username")
            || text.contains("terminal prompts disabled")
            || text.contains("permission denied (publickey)")
        {
            RepoFailureKind::AuthRequired
        } else if text.contains("command not found")
            || text.contains("is not recognized as an internal or external command")
        {
            RepoFailureKind::ToolMissing
        } else if text.contains("repository not found")
            || text.contains("does not appear to be a git repository")
            || text.contains("does not exist")
            || text.contains("not found")
        {
            RepoFailureKind::NotFound
        } else {
            RepoFailureKind::Generic
        }
    }

    /// User-facing explanation for this failure class.
    pub fn message(&self) -> &'static str {
        match self {
            RepoFailureKind::AuthRequired => {
                "authentication required: check your git credentials or repository access"
            }
            RepoFailureKind::NotFound => "repository not found: check the repository URL",
            RepoFailureKind::ToolMissing => "git is not installed or not on PATH",
            RepoFailureKind::Generic => "git operation failed",
        }
    }
}

/// Errors raised while provisioning an integration's repository.
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// The target directory exists but was not created by a clone.
    #[error("{} exists but is not a managed repository (no .git); refusing to modify it", .0.display())]
    NotManagedDirectory(PathBuf),

    /// A clone, pull or other git invocation exited unsuccessfully.
    #[error("{operation} {url}: {}: {detail}", .kind.message())]
    RepoOperation {
        operation: &'static str,
        url: String,
        kind: RepoFailureKind,
        detail: String,
    },

    /// A strict build step failed.
    #[error("build step `{step}` failed in {}: {detail}", .dir.display())]
    BuildFailed {
        step: String,
        dir: PathBuf,
        detail: String,
    },

    /// The overwrite confirmation could not be read.
    #[error("confirmation prompt failed: {0:#}")]
    Prompt(anyhow::Error),

    /// Directory creation, removal or copy failed.
    #[error("filesystem error at {}: {source}", .path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ProvisionError {
    pub fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ProvisionError::Filesystem {
            path: path.into(),
            source,
        }
    }

    /// The failure class for repository operations, if any.
    pub fn repo_failure_kind(&self) -> Option<RepoFailureKind> {
        match self {
            ProvisionError::RepoOperation { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_auth_failures() {
        assert_eq!(
            RepoFailureKind::classify(
                "fatal: could not read Username for 'https://github.com': terminal prompts disabled"
            ),
            RepoFailureKind::AuthRequired
        );
        assert_eq!(
            RepoFailureKind::classify("git@github.com: Permission denied (publickey)."),
            RepoFailureKind::AuthRequired
        );
    }

    #[test]
    fn classify_not_found() {
        assert_eq!(
            RepoFailureKind::classify("remote: Repository not found.\nfatal: repository 'x' not found"),
            RepoFailureKind::NotFound
        );
        assert_eq!(
            RepoFailureKind::classify("fatal: '/tmp/nope' does not appear to be a git repository"),
            RepoFailureKind::NotFound
        );
    }

    #[test]
    fn classify_tool_missing_and_generic() {
        assert_eq!(
            RepoFailureKind::classify("sh: git: command not found"),
            RepoFailureKind::ToolMissing
        );
        assert_eq!(
            RepoFailureKind::classify("fatal: Not possible to fast-forward, aborting."),
            RepoFailureKind::Generic
        );
    }

    #[test]
    fn repo_operation_message_includes_class() {
        let err = ProvisionError::RepoOperation {
            operation: "clone",
            url: "https://example.com/x.git".to_string(),
            kind: RepoFailureKind::NotFound,
            detail: "remote: Repository not found.".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("repository not found"));
        assert!(msg.contains("https://example.com/x.git"));
        assert_eq!(err.repo_failure_kind(), Some(RepoFailureKind::NotFound));
    }
}
