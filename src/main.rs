use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mass_storage_gadget::command::SystemExecutor;
use mass_storage_gadget::config::{self, GadgetConfig};
use mass_storage_gadget::{Action, ActionRequest, AppError, GadgetService};

/// Log level for the application
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Verbose,
    Debug,
    Trace,
}

/// mass-storage-gadget command line arguments
#[derive(Parser, Debug)]
#[command(name = "mass-storage-gadget")]
#[command(version, about = "Manage a USB mass-storage gadget and its FAT32 backing file", long_about = None)]
struct CliArgs {
    /// Action to perform
    #[arg(value_enum)]
    action: Action,

    /// Backing image file exposed by the gadget
    #[arg(short = 'f', long, value_name = "FILE")]
    backing_file: PathBuf,

    /// Size of a newly created backing file in GiB (default: 64)
    #[arg(short = 's', long, value_name = "GB", value_parser = clap::value_parser!(u32).range(1..))]
    size_gb: Option<u32>,

    /// Local mount point for the backing file
    #[arg(short = 'm', long, value_name = "DIR")]
    mount_path: Option<PathBuf>,

    /// Mount read-write on remount
    #[arg(short = 'w', long)]
    mount_read_write: bool,

    /// User-space FAT32 mount tool (overrides config file)
    #[arg(long, value_name = "PATH")]
    mount_tool_path: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short = 'c', long, value_name = "FILE", env = "MASS_STORAGE_GADGET_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, verbose, debug, trace)
    #[arg(short = 'l', long, value_name = "LEVEL", default_value = "info")]
    log_level: LogLevel,

    /// Increase verbosity (-v for verbose, -vv for debug, -vvv for trace)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let args = CliArgs::parse();

    init_logging(args.log_level, args.verbose);

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => ExitCode::from(report_failure(&err, &mut io::stdout())),
    }
}

/// Report a failed run and return the process exit code
///
/// Usage errors go to `out` as `error: <message>`; everything else is logged.
fn report_failure(err: &anyhow::Error, out: &mut impl Write) -> u8 {
    if let Some(AppError::Usage(msg)) = err.downcast_ref::<AppError>() {
        if let Err(e) = writeln!(out, "error: {}", msg) {
            tracing::error!("{}: {}", msg, e);
        }
    } else {
        tracing::error!("{:#}", err);
    }
    1
}

fn run(args: CliArgs) -> anyhow::Result<()> {
    let mut config = match &args.config {
        Some(path) => config::load(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => GadgetConfig::default(),
    };

    // Apply CLI argument overrides to config (only if explicitly specified)
    if let Some(tool) = args.mount_tool_path {
        config.mount_tool_path = tool;
    }
    config::validate(&config)?;
    tracing::debug!("Effective configuration: {:?}", config);

    let request = ActionRequest {
        action: args.action,
        backing_file: args.backing_file,
        size_gb: args.size_gb.unwrap_or(config.default_size_gb),
        mount_path: args.mount_path,
        read_write: args.mount_read_write,
    };

    let service = GadgetService::new(&config, Arc::new(SystemExecutor::new()));
    service.execute(&request)?;
    Ok(())
}

fn init_logging(level: LogLevel, verbose_count: u8) {
    // Verbose count overrides log level
    let effective_level = match verbose_count {
        0 => level,
        1 => LogLevel::Verbose,
        2 => LogLevel::Debug,
        _ => LogLevel::Trace,
    };

    let filter = match effective_level {
        LogLevel::Error => "mass_storage_gadget=error",
        LogLevel::Warn => "mass_storage_gadget=warn",
        LogLevel::Info => "mass_storage_gadget=info",
        LogLevel::Verbose => "mass_storage_gadget=debug",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "mass_storage_gadget=trace,debug",
    };

    // Environment variable takes highest priority
    let env_filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into());

    if let Err(err) = tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
    {
        eprintln!("failed to initialize tracing: {}", err);
    }
}
