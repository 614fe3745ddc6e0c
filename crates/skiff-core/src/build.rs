//! Build steps run inside a provisioned repository.
//!
//! Two policies are supported. A single shell string is best effort: a
//! failure is logged and the server is still registered. A list of structured
//! steps is strict: steps run in order and the first failure is returned.

use std::path::Path;

use tracing::{info, warn};

use crate::error::ProvisionError;
use crate::process::{CommandSpec, ProcessRunner};

/// How an integration's repository is built after provisioning.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum BuildPolicy {
    #[default]
    None,
    /// One shell command; failure is downgraded to a warning.
    BestEffort(String),
    /// Discrete commands run in order; the first failure aborts.
    Steps(Vec<CommandSpec>),
}

impl BuildPolicy {
    /// Text recorded on the server descriptor, if any.
    pub fn describe(&self) -> Option<String> {
        match self {
            BuildPolicy::None => None,
            BuildPolicy::BestEffort(script) => Some(script.clone()),
            BuildPolicy::Steps(steps) => Some(
                steps
                    .iter()
                    .map(CommandSpec::display)
                    .collect::<Vec<_>>()
                    .join(" && "),
            ),
        }
    }
}

/// Result of [`run_build`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutcome {
    Skipped,
    Succeeded,
    /// A best-effort build failed; the message is a warning for the report.
    FailedWithWarning(String),
}

/// Run `policy` in `dir`.
pub fn run_build(
    runner: &ProcessRunner,
    policy: &BuildPolicy,
    dir: &Path,
) -> Result<BuildOutcome, ProvisionError> {
    match policy {
        BuildPolicy::None => Ok(BuildOutcome::Skipped),
        BuildPolicy::BestEffort(script) => {
            info!(dir = %dir.display(), command = %script, "Running build");
            let failure = match runner.run_shell(script, dir) {
                Ok(output) if output.success() => return Ok(BuildOutcome::Succeeded),
                Ok(output) => output.failure_detail(),
                Err(err) => err.to_string(),
            };
            let message = format!("build `{script}` failed: {failure}");
            warn!(dir = %dir.display(), "{}; continuing without a build", message);
            Ok(BuildOutcome::FailedWithWarning(message))
        }
        BuildPolicy::Steps(steps) => {
            for step in steps {
                let step_display = step.display();
                info!(dir = %dir.display(), step = %step_display, "Running build step");
                let detail = match runner.run_spec(step, dir) {
                    Ok(output) if output.success() => continue,
                    Ok(output) => output.failure_detail(),
                    Err(err) => err.to_string(),
                };
                return Err(ProvisionError::BuildFailed {
                    step: step_display,
                    dir: dir.to_path_buf(),
                    detail,
                });
            }
            Ok(BuildOutcome::Succeeded)
        }
    }
}
