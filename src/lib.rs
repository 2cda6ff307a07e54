pub mod channel;
pub mod cli;
pub mod config;
pub mod error;
pub mod guest;
pub mod plugin;
pub mod registry;

pub use error::VmnoopError;

use std::io::Write;

use anyhow::{Context, Result};
use tracing::{error, info, warn};
use tracing_subscriber::{FmtSubscriber, filter::LevelFilter};

use crate::config::{Manifest, Selection};
use crate::guest::CapabilityArg;
use crate::registry::Registry;

pub fn init_logging(log_level: cli::LogLevel) -> Result<()> {
    let filter = match log_level {
        cli::LogLevel::Trace => LevelFilter::TRACE,
        cli::LogLevel::Debug => LevelFilter::DEBUG,
        cli::LogLevel::Info => LevelFilter::INFO,
        cli::LogLevel::Warn => LevelFilter::WARN,
        cli::LogLevel::Error => LevelFilter::ERROR,
    };

    tracing::subscriber::set_global_default(
        FmtSubscriber::builder().with_max_level(filter).finish(),
    )
    .context("failed to set global default tracing subscriber")
}

/// Readiness outcome for one machine.
#[derive(Debug)]
pub struct MachineReport {
    pub machine: String,
    pub selection: Selection,
    /// `Ok(ready)` once both backends resolved, `Err` if either is unknown.
    pub outcome: Result<bool, VmnoopError>,
}

impl MachineReport {
    pub fn is_ready(&self) -> bool {
        matches!(self.outcome, Ok(true))
    }
}

/// Selects backends for every machine and waits for readiness.
///
/// The guest is resolved as well so that a machine pointing at an unknown
/// guest is reported before any capability is invoked on it.
pub fn check_machines(manifest: &Manifest, registry: &Registry) -> Vec<MachineReport> {
    manifest
        .machines
        .iter()
        .map(|machine| {
            let selection = machine.selection(&manifest.defaults);
            let outcome = registry.channel(&selection.communicator).and_then(|channel| {
                registry.guest(&selection.guest)?;
                Ok(channel.wait_for_ready(selection.boot_timeout))
            });
            MachineReport {
                machine: machine.name.clone(),
                selection,
                outcome,
            }
        })
        .collect()
}

pub fn run_list(registry: &Registry, out: &mut dyn Write) -> Result<()> {
    for plugin in registry.plugins() {
        writeln!(out, "plugin: {} ({})", plugin.name, plugin.description)?;
    }
    for name in registry.channel_names() {
        writeln!(out, "communicator: {}", name)?;
    }
    for guest in registry.guest_names() {
        writeln!(out, "guest: {}", guest)?;
        for capability in registry.guest_capabilities(guest) {
            writeln!(out, "  capability: {}", capability)?;
        }
    }
    Ok(())
}

pub fn run_validate(opts: &cli::ManifestArgs) -> Result<()> {
    let manifest = config::load_manifest(&opts.file)
        .with_context(|| format!("failed to load manifest from {}", opts.file))?;
    manifest.validate().context("manifest validation failed")?;
    info!("validation successful:\n{:#?}", manifest);
    Ok(())
}

pub fn run_check(opts: &cli::ManifestArgs) -> Result<Vec<MachineReport>> {
    let manifest = config::load_manifest(&opts.file)
        .with_context(|| format!("failed to load manifest from {}", opts.file))?;
    manifest.validate().context("manifest validation failed")?;

    let registry = plugin::default_registry(manifest.registry.duplicate_policy)
        .context("failed to initialize registry")?;

    let reports = check_machines(&manifest, &registry);
    let mut failures = 0;
    for report in &reports {
        match &report.outcome {
            Ok(true) if report.selection.fallback => info!(
                "{}: ready (no address, using {}/{})",
                report.machine, report.selection.communicator, report.selection.guest
            ),
            Ok(true) => info!("{}: ready via {}", report.machine, report.selection.communicator),
            Ok(false) => {
                failures += 1;
                warn!(
                    "{}: not ready within {}s via {}",
                    report.machine, report.selection.boot_timeout, report.selection.communicator
                );
            }
            Err(e) => {
                failures += 1;
                error!("{}: {}", report.machine, e);
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{} of {} machine(s) are not ready", failures, reports.len());
    }
    Ok(reports)
}

/// Parses CLI arguments into capability arguments.
///
/// Each argument is read as YAML, so `my-host` is a string, `42` a number
/// and `'[{type: dhcp}]'` a list of mappings.
pub fn parse_capability_args(args: &[String]) -> Result<Vec<CapabilityArg>> {
    args.iter()
        .enumerate()
        .map(|(index, arg)| {
            serde_yaml::from_str(arg)
                .with_context(|| format!("failed to parse argument {} as YAML: {}", index + 1, arg))
        })
        .collect()
}

pub fn run_invoke(opts: &cli::InvokeArgs, registry: &Registry) -> Result<()> {
    let args = parse_capability_args(&opts.args)?;
    let succeeded = registry
        .invoke_guest_capability(&opts.guest, &opts.capability, &args)
        .with_context(|| format!("failed to resolve {}.{}", opts.guest, opts.capability))?;

    if !succeeded {
        anyhow::bail!("capability {}.{} reported failure", opts.guest, opts.capability);
    }

    info!("capability {}.{} succeeded", opts.guest, opts.capability);
    Ok(())
}
