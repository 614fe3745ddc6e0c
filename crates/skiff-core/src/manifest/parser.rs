//! TOML parser with helpful error messages

use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use super::Manifest;

/// Default manifest file name at the project root.
pub const MANIFEST_FILE_NAME: &str = "skiff.toml";

/// Parse and validate a manifest file.
pub fn parse_manifest(path: &Path) -> Result<Manifest> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read manifest: {}", path.display()))?;

    parse_manifest_str(&content)
        .with_context(|| format!("Failed to parse manifest: {}", path.display()))
}

/// Parse and validate manifest content.
pub fn parse_manifest_str(content: &str) -> Result<Manifest> {
    let manifest: Manifest =
        toml::from_str(content).map_err(|e| enhance_toml_error(e, content))?;
    manifest.validate()?;
    Ok(manifest)
}

fn enhance_toml_error(error: toml::de::Error, content: &str) -> anyhow::Error {
    let message = error.message().split_whitespace().collect::<Vec<_>>().join(" ");
    let Some(span) = error.span() else {
        return anyhow::anyhow!("TOML parsing error: {}", message);
    };

    let line_num = content[..span.start.min(content.len())]
        .matches('\n')
        .count()
        + 1;
    debug!(
        line = line_num,
        "Manifest parse error context:\n{}",
        line_context(content, line_num)
    );
    anyhow::anyhow!("TOML parsing error at line {}: {}", line_num, message)
}

fn line_context(content: &str, line_num: usize) -> String {
    let lines: Vec<&str> = content.lines().collect();
    let start = line_num.saturating_sub(2);
    let end = (line_num + 1).min(lines.len());

    lines
        .get(start..end)
        .unwrap_or_default()
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let num = start + i + 1;
            let marker = if num == line_num { ">>>" } else { "   " };
            format!("{} {:4} | {}", marker, num, line)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
