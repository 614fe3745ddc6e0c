//! Platform detection and per-user directory conventions.
//!
//! Everything here is a pure function of a [`PlatformInfo`] and an
//! [`Environment`] snapshot, so callers (and tests) can resolve paths for any
//! OS without touching the process environment.

use std::path::{Path, PathBuf};

use serde::Serialize;

/// Operating system family of the running process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlatformInfo {
    pub platform_id: String,
    pub is_windows: bool,
    pub is_mac: bool,
    pub is_linux: bool,
}

impl PlatformInfo {
    /// Detect the platform this binary is running on.
    pub fn detect() -> Self {
        Self::from_os(std::env::consts::OS)
    }

    /// Build platform info from an OS identifier as reported by `std::env::consts::OS`.
    pub fn from_os(os: &str) -> Self {
        Self {
            platform_id: os.to_string(),
            is_windows: os == "windows",
            is_mac: os == "macos",
            is_linux: os == "linux",
        }
    }

    pub fn windows() -> Self {
        Self::from_os("windows")
    }

    pub fn mac() -> Self {
        Self::from_os("macos")
    }

    pub fn linux() -> Self {
        Self::from_os("linux")
    }
}

/// Snapshot of the user-level environment inputs path resolution depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment {
    pub home_dir: PathBuf,
    /// `APPDATA` (Windows roaming profile).
    pub appdata: Option<PathBuf>,
    /// `XDG_CONFIG_HOME`.
    pub xdg_config_home: Option<PathBuf>,
}

impl Environment {
    pub fn new(home_dir: impl Into<PathBuf>) -> Self {
        Self {
            home_dir: home_dir.into(),
            appdata: None,
            xdg_config_home: None,
        }
    }

    pub fn with_appdata(mut self, appdata: impl Into<PathBuf>) -> Self {
        self.appdata = Some(appdata.into());
        self
    }

    pub fn with_xdg_config_home(mut self, dir: impl Into<PathBuf>) -> Self {
        self.xdg_config_home = Some(dir.into());
        self
    }

    /// Capture the current process environment.
    pub fn from_process() -> anyhow::Result<Self> {
        let home_dir = dirs::home_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))?;
        Ok(Self {
            home_dir,
            appdata: non_empty_var("APPDATA"),
            xdg_config_home: non_empty_var("XDG_CONFIG_HOME"),
        })
    }

    pub fn home_dir(&self) -> &Path {
        &self.home_dir
    }
}

fn non_empty_var(key: &str) -> Option<PathBuf> {
    std::env::var_os(key)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

/// The OS-conventional per-user application support directory.
///
/// - Windows: `APPDATA`, else `<home>/AppData/Roaming`
/// - macOS: `<home>/Library/Application Support`
/// - otherwise: `XDG_CONFIG_HOME`, else `<home>/.config`
pub fn application_support_dir(platform: &PlatformInfo, env: &Environment) -> PathBuf {
    if platform.is_windows {
        env.appdata
            .clone()
            .unwrap_or_else(|| env.home_dir.join("AppData").join("Roaming"))
    } else if platform.is_mac {
        env.home_dir.join("Library").join("Application Support")
    } else {
        env.xdg_config_home
            .clone()
            .unwrap_or_else(|| env.home_dir.join(".config"))
    }
}
