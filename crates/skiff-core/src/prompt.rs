//! Confirmation prompts used during provisioning.
//!
//! The core never talks to a terminal; the CLI supplies an interactive
//! implementation.

/// Asks the user a yes/no question.
pub trait ConfirmPrompt {
    fn confirm(&self, message: &str, default: bool) -> anyhow::Result<bool>;
}

/// Answers every question with its default. Used for `--yes`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptDefaults;

impl ConfirmPrompt for AcceptDefaults {
    fn confirm(&self, _message: &str, default: bool) -> anyhow::Result<bool> {
        Ok(default)
    }
}

/// Answers every question the same way.
#[derive(Debug, Clone, Copy)]
pub struct FixedAnswer(pub bool);

impl ConfirmPrompt for FixedAnswer {
    fn confirm(&self, _message: &str, _default: bool) -> anyhow::Result<bool> {
        Ok(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accept_defaults_returns_default() {
        assert!(AcceptDefaults.confirm("overwrite?", true).unwrap());
        assert!(!AcceptDefaults.confirm("overwrite?", false).unwrap());
    }

    #[test]
    fn fixed_answer_ignores_default() {
        assert!(!FixedAnswer(false).confirm("overwrite?", true).unwrap());
    }
}
