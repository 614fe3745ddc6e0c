//! Terminal prompts for the install command.
//!
//! Uses dialoguer for confirmation prompts. Prompts are refused when no user
//! is attached so an unattended run fails instead of hanging.

use anyhow::Result;
use console::style;
use dialoguer::{Confirm, theme::ColorfulTheme};

use skiff_core::prompt::ConfirmPrompt;

/// Asks on the terminal.
pub struct TerminalPrompt {
    theme: ColorfulTheme,
}

impl Default for TerminalPrompt {
    fn default() -> Self {
        Self {
            theme: ColorfulTheme::default(),
        }
    }
}

impl ConfirmPrompt for TerminalPrompt {
    fn confirm(&self, message: &str, default: bool) -> Result<bool> {
        if !console::user_attended_stderr() {
            anyhow::bail!(
                "cannot ask \"{}\" without a terminal; pass --yes to accept the default",
                message
            );
        }

        eprintln!("{} {}", style("!").yellow().bold(), style(message).bold());
        let confirmed = Confirm::with_theme(&self.theme)
            .with_prompt("Proceed?")
            .default(default)
            .interact()?;

        Ok(confirmed)
    }
}
