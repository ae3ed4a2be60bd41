use anyhow::Result;
use clap::Parser;
use pwshfind::config::{CONFIG_ENV_VAR, Config};
use pwshfind::finder::InstallationFinder;
use pwshfind::platform::{DefaultPlatformDetector, PlatformDetector};
use pwshfind::runtime::RealRuntime;
use std::path::{Path, PathBuf};

/// pwshfind - locate PowerShell installations
///
/// Probes the well-known install locations of the current platform and prints
/// the installations that exist, preferred first.
///
/// Examples:
///   pwshfind list             # All installations, in priority order
///   pwshfind first            # Path of the preferred installation
#[derive(Parser, Debug)]
#[command(author, version = env!("PWSHFIND_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (defaults to <config dir>/pwshfind/config.json)
    #[arg(long, short = 'c', env = CONFIG_ENV_VAR, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// List every installation found, preferred first
    #[command(visible_alias = "ls")]
    List(OutputArgs),

    /// Show the preferred installation
    First(OutputArgs),

    /// Rewrite a SysWOW64 or Sysnative path to its System32 form
    FixPath(FixPathArgs),
}

#[derive(clap::Args, Debug)]
struct OutputArgs {
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

#[derive(clap::Args, Debug)]
struct FixPathArgs {
    /// Path to an executable under a Windows system directory
    #[arg(value_name = "PATH")]
    path: String,
}

fn init_logging(verbose: u8) {
    let default_filter = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

fn build_finder(config_path: Option<&Path>) -> Result<InstallationFinder<RealRuntime>> {
    let runtime = RealRuntime;
    let platform = DefaultPlatformDetector::new(&runtime).detect()?;
    let config = Config::load(&runtime, config_path)?;
    Ok(InstallationFinder::from_config(runtime, platform, &config))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::List(args) => {
            let finder = build_finder(cli.config.as_deref())?;
            pwshfind::commands::list(&finder, args.json).await?
        }
        Commands::First(args) => {
            let finder = build_finder(cli.config.as_deref())?;
            pwshfind::commands::first(&finder, args.json)?
        }
        Commands::FixPath(args) => pwshfind::commands::fix_path(&args.path),
    }
    Ok(())
}
