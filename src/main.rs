//! fomod-engine - Main entry point
//!
//! Drives installer packages headlessly: validate a package description, run
//! its wizard with preset choices, or inspect an archive listing.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use fomod_engine::archive;
use fomod_engine::cli::{Cli, Commands};
use fomod_engine::host::StaticHost;
use fomod_engine::model_file::load_model;
use fomod_engine::tree::DirectoryTree;
use fomod_engine::wizard::WizardSession;

/// Initialize the logger with appropriate settings
fn init_logger(verbose: bool) {
    // RUST_LOG overrides the default unless --verbose asks for everything
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Main application entry point
fn main() -> Result<()> {
    let cli = Cli::parse_args();
    init_logger(cli.verbose);
    debug!("CLI arguments parsed");

    match cli.command {
        Commands::Validate { model } => run_validate(&model),
        Commands::Install { model, archive, host, selections, json } => {
            run_install(&model, &archive, host.as_deref(), &selections, json)
        }
        Commands::Inspect { archive } => run_inspect(&archive),
    }
}

/// Load a package description and print what the wizard would show
fn run_validate(path: &Path) -> Result<()> {
    info!("Validating package description: {:?}", path);
    let model = match load_model(path) {
        Ok(model) => model,
        Err(e) => {
            error!("Package description is invalid: {:#}", e);
            eprintln!("✗ Package description is invalid: {:#}", e);
            std::process::exit(1);
        }
    };

    println!("✓ {} ({} steps)", model.module_name, model.steps.len());
    if !model.has_options() {
        println!("  no options: installs the required files only");
    }
    for step in &model.steps {
        let gated = if step.visible.is_some() { " [conditional]" } else { "" };
        println!("  {}{}", step.name, gated);
        for group in &step.groups {
            println!("    {} ({})", group.name, group.group_type);
            for plugin in &group.plugins {
                println!("      - {} [{}]", plugin.name, plugin.type_info.default_type);
            }
        }
    }

    let diagnostics = model.diagnostics();
    if !diagnostics.is_empty() {
        println!("\n{} diagnostic(s):", diagnostics.len());
        for diagnostic in diagnostics.entries() {
            println!("  {:?}: {}", diagnostic.severity(), diagnostic);
        }
    }
    Ok(())
}

/// Walk the wizard with preset choices and print the install plan
fn run_install(
    model_path: &Path,
    archive_path: &Path,
    host_path: Option<&Path>,
    selections: &[(String, String)],
    json: bool,
) -> Result<()> {
    let model = load_model(model_path)?;
    let host = match host_path {
        Some(path) => StaticHost::load_from_file(path)?,
        None => StaticHost::new(),
    };
    let source = DirectoryTree::load_listing(archive_path)
        .with_context(|| format!("Failed to read archive listing {:?}", archive_path))?;
    if !archive::is_fomod_archive(&source) {
        warn!("{:?} does not list a fomod/ModuleConfig.xml", archive_path);
    }

    let mut session = WizardSession::new(model, host).context("Cannot start the installer")?;

    while let Some((_, step)) = session.current_step() {
        let step_name = step.name.clone();
        for (_, plugin) in selections.iter().filter(|(s, _)| s.eq_ignore_ascii_case(&step_name)) {
            session
                .select_by_name(plugin)
                .with_context(|| format!("Cannot select {:?} on step {:?}", plugin, step_name))?;
        }
        if !session.next()? {
            break;
        }
    }

    let plan = session.finish(&source)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&plan).context("Failed to serialize install plan")?);
    } else {
        print!("{}", plan.tree.dump());
        if !plan.diagnostics.is_empty() {
            println!("\n{} diagnostic(s):", plan.diagnostics.len());
            for diagnostic in &plan.diagnostics {
                println!("  {:?}: {}", diagnostic.severity(), diagnostic);
            }
        }
    }
    Ok(())
}

/// Report whether an archive listing is an installer archive
fn run_inspect(path: &Path) -> Result<()> {
    let source = DirectoryTree::load_listing(path)
        .with_context(|| format!("Failed to read archive listing {:?}", path))?;

    if !archive::is_fomod_archive(&source) {
        println!("✗ {:?} is not a fomod archive", path);
        std::process::exit(1);
    }

    println!("✓ fomod archive, package root: /{}", archive::package_root(&source).unwrap_or_default());
    for file in archive::installer_files(&source) {
        println!("  {}", file);
    }
    Ok(())
}
