//! Skiff - repository-backed MCP server installer
//!
//! Usage:
//!   skiff install [NAME]...      # Provision integrations from skiff.toml
//!   skiff uninstall NAME...      # Remove servers and their repositories
//!   skiff paths                  # Show resolved host config locations

mod interactive;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use console::style;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use skiff_core::context::AppContext;
use skiff_core::host::HostRegistry;
use skiff_core::install::{
    HostStatus, InstallOptions, InstallOrchestrator, InstallReport, ProvisionMode, RemovalStatus,
    UninstallOptions, UninstallOrchestrator, UninstallReport,
};
use skiff_core::manifest::{
    IntegrationDefinition, MANIFEST_FILE_NAME, Manifest, parse_manifest,
};
use skiff_core::prompt::{AcceptDefaults, ConfirmPrompt};
use skiff_core::types::Scope;

use crate::interactive::TerminalPrompt;

const EXIT_CANCELLED: u8 = 2;

#[derive(Parser)]
#[command(name = "skiff")]
#[command(about = "Repository-backed MCP server installer", long_about = None)]
struct Cli {
    /// Path to the manifest (defaults to ./skiff.toml)
    #[arg(long, global = true)]
    manifest: Option<PathBuf>,

    /// Project root used for local scope (defaults to the current directory)
    #[arg(long, global = true)]
    project: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Provision integrations and register them with every host
    Install(InstallArgs),

    /// Remove servers from host configs and delete their repositories
    #[command(alias = "rm")]
    Uninstall(UninstallArgs),

    /// Show where each host's config and skills live
    Paths {
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },
}

#[derive(Args)]
struct InstallArgs {
    /// Integrations to install (all from the manifest when omitted)
    names: Vec<String>,
    /// Configuration scope
    #[arg(long, value_enum, default_value = "local")]
    scope: ScopeArg,
    /// Skip all confirmation prompts, accepting defaults
    #[arg(short = 'y', long)]
    yes: bool,
    /// Delete existing repositories (after confirmation) and clone again
    #[arg(long)]
    reinstall: bool,
    /// Only install into these hosts
    #[arg(long = "host", value_name = "ID")]
    hosts: Vec<String>,
    /// Output format
    #[arg(short, long, default_value = "table")]
    format: OutputFormat,
}

#[derive(Args)]
struct UninstallArgs {
    /// Server names to remove
    #[arg(required = true)]
    names: Vec<String>,
    /// Configuration scope
    #[arg(long, value_enum, default_value = "local")]
    scope: ScopeArg,
    /// Keep the provisioned repositories on disk
    #[arg(long)]
    keep_repo: bool,
    /// Only remove from these hosts
    #[arg(long = "host", value_name = "ID")]
    hosts: Vec<String>,
    /// Output format
    #[arg(short, long, default_value = "table")]
    format: OutputFormat,
}

#[derive(Clone, Copy, ValueEnum)]
enum ScopeArg {
    /// Under the current project
    Local,
    /// Under the user's profile
    Global,
}

impl From<ScopeArg> for Scope {
    fn from(arg: ScopeArg) -> Self {
        match arg {
            ScopeArg::Local => Scope::Local,
            ScopeArg::Global => Scope::Global,
        }
    }
}

#[derive(Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// Machine-readable JSON
    Json,
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "skiff=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{} {}", style("error:").red().bold(), error_line(&err));
            ExitCode::FAILURE
        }
    }
}

/// Render an error chain on a single line.
fn error_line(err: &anyhow::Error) -> String {
    format!("{err:#}")
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn run(cli: Cli) -> Result<ExitCode> {
    let project_root = match cli.project {
        Some(path) => path,
        None => std::env::current_dir().context("Failed to determine current directory")?,
    };
    let manifest_path = cli
        .manifest
        .unwrap_or_else(|| project_root.join(MANIFEST_FILE_NAME));

    match cli.command {
        Commands::Install(args) => {
            let manifest = parse_manifest(&manifest_path)?;
            run_install(project_root, &manifest, args)
        }
        Commands::Uninstall(args) => {
            let manifest = load_optional_manifest(&manifest_path)?;
            run_uninstall(project_root, &manifest, args)
        }
        Commands::Paths { format } => {
            let manifest = load_optional_manifest(&manifest_path)?;
            run_paths(project_root, &manifest, format)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// The manifest is only required for install; other commands fall back to
/// the built-in hosts.
fn load_optional_manifest(path: &Path) -> Result<Manifest> {
    if path.exists() {
        parse_manifest(path)
    } else {
        Ok(Manifest::default())
    }
}

fn host_registry(manifest: &Manifest, filter: &[String]) -> Result<HostRegistry> {
    let registry = manifest.host_registry()?;
    registry.check_targets(filter)?;
    Ok(registry)
}

fn select_integrations(
    manifest: &Manifest,
    names: &[String],
) -> Result<Vec<IntegrationDefinition>> {
    if names.is_empty() {
        if manifest.integrations.is_empty() {
            anyhow::bail!("No integrations declared in the manifest");
        }
        return Ok(manifest.integrations.clone());
    }
    names
        .iter()
        .map(|name| {
            manifest.integration(name).cloned().ok_or_else(|| {
                anyhow::anyhow!("Integration '{}' is not declared in the manifest", name)
            })
        })
        .collect()
}

fn run_install(project_root: PathBuf, manifest: &Manifest, args: InstallArgs) -> Result<ExitCode> {
    let registry = host_registry(manifest, &args.hosts)?;
    let integrations = select_integrations(manifest, &args.names)?;
    let ctx = AppContext::from_process(project_root)?.with_settings(&manifest.settings);

    let mut options = InstallOptions::new(args.scope.into()).with_mode(if args.reinstall {
        ProvisionMode::Reinstall
    } else {
        ProvisionMode::Update
    });
    if !args.hosts.is_empty() {
        options = options.with_host_filter(args.hosts.clone());
    }

    let prompt: Box<dyn ConfirmPrompt> = if args.yes {
        Box::new(AcceptDefaults)
    } else {
        Box::new(TerminalPrompt::default())
    };

    let report = InstallOrchestrator::new(&ctx, prompt.as_ref()).run(
        registry.all(),
        &integrations,
        &options,
    );

    match args.format {
        OutputFormat::Table => print_install_table(&report),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }

    if let Some(reason) = &report.cancelled {
        eprintln!("{} {}", style("error:").red().bold(), reason);
        return Ok(ExitCode::from(EXIT_CANCELLED));
    }
    if report.has_failures() {
        eprintln!(
            "{} {} of {} integration(s) failed",
            style("error:").red().bold(),
            report.failure_count(),
            report.integrations.len()
        );
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

fn print_install_table(report: &InstallReport) {
    for integration in &report.integrations {
        match &integration.error {
            Some(error) => println!("{} {}: {}", style("✗").red(), integration.name, error),
            None => {
                let action = integration
                    .repo_action
                    .map(|a| format!("{:?}", a).to_lowercase())
                    .unwrap_or_else(|| "skipped".to_string());
                println!(
                    "{} {} ({}) -> {}",
                    style("✓").green(),
                    integration.name,
                    action,
                    integration.repo_dir.display()
                );
            }
        }

        for host in &integration.hosts {
            match &host.status {
                HostStatus::Installed => println!(
                    "    {} {:<10} {}",
                    style("✓").green(),
                    host.host,
                    host.config_path.display()
                ),
                HostStatus::Skipped { reason } => {
                    println!("    {} {:<10} skipped: {}", style("-").dim(), host.host, reason)
                }
                HostStatus::Failed { error } => println!(
                    "    {} {:<10} failed: {}",
                    style("✗").red(),
                    host.host,
                    error
                ),
            }
        }

        for warning in &integration.warnings {
            println!("  {} {}", style("⚠").yellow(), warning);
        }
    }
}

fn run_uninstall(
    project_root: PathBuf,
    manifest: &Manifest,
    args: UninstallArgs,
) -> Result<ExitCode> {
    let registry = host_registry(manifest, &args.hosts)?;
    let ctx = AppContext::from_process(project_root)?.with_settings(&manifest.settings);

    let mut options = UninstallOptions::new(args.scope.into());
    options.keep_repos = args.keep_repo;
    if !args.hosts.is_empty() {
        options.host_filter = Some(args.hosts.clone());
    }

    let report = UninstallOrchestrator::new(&ctx).run(registry.all(), &args.names, &options);

    match args.format {
        OutputFormat::Table => print_uninstall_table(&report),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }

    if report.has_failures() {
        eprintln!(
            "{} uninstall finished with errors",
            style("error:").red().bold()
        );
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

fn print_uninstall_table(report: &UninstallReport) {
    for host in &report.hosts {
        match &host.status {
            RemovalStatus::Removed { count } => println!(
                "{} {:<10} removed {} from {}",
                style("✓").green(),
                host.host,
                count,
                host.config_path.display()
            ),
            RemovalStatus::NotPresent => {
                println!("{} {:<10} not present", style("•").dim(), host.host)
            }
            RemovalStatus::Failed { error } => {
                println!("{} {:<10} failed: {}", style("✗").red(), host.host, error)
            }
        }
    }
    for repo in &report.repos {
        match (&repo.error, repo.removed) {
            (Some(error), _) => println!("{} {}: {}", style("✗").red(), repo.name, error),
            (None, true) => println!("{} deleted {}", style("✓").green(), repo.dir.display()),
            (None, false) => {}
        }
    }
}

fn run_paths(project_root: PathBuf, manifest: &Manifest, format: OutputFormat) -> Result<()> {
    let registry = manifest.host_registry()?;
    let ctx = AppContext::from_process(project_root)?.with_settings(&manifest.settings);
    let resolved = ctx.resolve_hosts(registry.all());

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "platform": ctx.platform(),
                "hosts": resolved,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Table => {
            println!("Platform: {}", ctx.platform().platform_id);
            for host in resolved.iter() {
                println!(
                    "\n  {} ({}) [{}]",
                    style(&host.display_name).bold(),
                    host.id,
                    host.server_section_key
                );
                println!("    local config   {}", host.local_config_path.display());
                println!("    global config  {}", host.global_config_path.display());
                println!("    local skills   {}", host.local_skills_dir.display());
                println!("    global skills  {}", host.global_skills_dir.display());
            }
        }
    }
    Ok(())
}
