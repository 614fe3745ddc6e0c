use std::path::{Path, PathBuf};

use skiff_core::host::{GlobalBase, HostDescriptor, builtin_hosts, resolve_host_paths};
use skiff_core::platform::{Environment, PlatformInfo};
use skiff_core::types::Scope;

fn env() -> Environment {
    Environment::new("/home/u")
        .with_appdata("/appdata")
        .with_xdg_config_home("/xdg")
}

#[test]
fn vscode_uses_application_support_overrides_on_windows_and_mac() {
    let project = Path::new("/work/app");

    let windows = resolve_host_paths(project, &PlatformInfo::windows(), &env(), &builtin_hosts());
    let vscode = windows.get("vscode").unwrap();
    assert_eq!(
        vscode.global_config_path,
        PathBuf::from("/appdata/Code/User/mcp.json")
    );
    assert_eq!(
        vscode.global_skills_dir,
        PathBuf::from("/appdata/Code/User/skills")
    );
    assert_eq!(
        vscode.local_config_path,
        PathBuf::from("/work/app/.vscode/mcp.json")
    );

    let mac = resolve_host_paths(project, &PlatformInfo::mac(), &env(), &builtin_hosts());
    assert_eq!(
        mac.get("vscode").unwrap().global_config_path,
        PathBuf::from("/home/u/Library/Application Support/Code/User/mcp.json")
    );
}

#[test]
fn linux_and_hosts_without_overrides_use_home() {
    let project = Path::new("/work/app");
    let linux = resolve_host_paths(project, &PlatformInfo::linux(), &env(), &builtin_hosts());

    assert_eq!(
        linux.get("vscode").unwrap().global_config_path,
        PathBuf::from("/home/u/.vscode/mcp.json")
    );
    let codex = linux.get("codex").unwrap();
    assert_eq!(
        codex.config_path(Scope::Global),
        Path::new("/home/u/.codex/config.toml")
    );
    assert_eq!(
        codex.config_path(Scope::Local),
        Path::new("/work/app/.codex/config.toml")
    );
    assert_eq!(codex.server_section_key, "mcp_servers");

    let windows = resolve_host_paths(project, &PlatformInfo::windows(), &env(), &builtin_hosts());
    assert_eq!(
        windows.get("windsurf").unwrap().global_config_path,
        PathBuf::from("/home/u/.codeium/windsurf/mcp_config.json")
    );
}

#[test]
fn home_base_ignores_declared_overrides() {
    let vscode = builtin_hosts()
        .into_iter()
        .find(|h| h.id == "vscode")
        .unwrap()
        .with_global_base(GlobalBase::Home);

    let resolved = resolve_host_paths(
        Path::new("/work"),
        &PlatformInfo::windows(),
        &env(),
        &[vscode],
    );

    assert_eq!(
        resolved.get("vscode").unwrap().global_config_path,
        PathBuf::from("/home/u/.vscode/mcp.json")
    );
}

#[test]
fn partial_override_falls_back_to_default_names() {
    let host = HostDescriptor::new("tool", "Tool", "servers").with_platform_overrides(
        skiff_core::host::PlatformOverrides {
            windows: Some(skiff_core::host::PlatformOverride {
                skills_folder: None,
                mcp_config_file: Some("Tool/mcp.json".to_string()),
            }),
            mac: None,
        },
    );

    let windows = resolve_host_paths(Path::new("/w"), &PlatformInfo::windows(), &env(), &[host.clone()]);
    let tool = windows.get("tool").unwrap();
    assert_eq!(tool.global_config_path, PathBuf::from("/appdata/Tool/mcp.json"));
    assert_eq!(tool.global_skills_dir, PathBuf::from("/appdata/.tool/skills"));

    let mac = resolve_host_paths(Path::new("/w"), &PlatformInfo::mac(), &env(), &[host]);
    assert_eq!(
        mac.get("tool").unwrap().global_config_path,
        PathBuf::from("/home/u/Library/Application Support/.tool/mcp.json")
    );
}
