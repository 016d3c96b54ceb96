use clap::{Parser, Subcommand};
use color_eyre::Result;
use env_logger::Env;
use log::info;
use std::path::PathBuf;

use ircnetsim::config::{Config, OperConfig};
use ircnetsim::config_loader::{self, CliOverrides};
use ircnetsim::orchestrator;
use ircnetsim::software::{self, SoftwareKind};

/// Provision simulated IRC networks
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a new network map
    Generate {
        /// Path to a network configuration YAML file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// IRCd to run on client servers and hubs
        #[arg(long)]
        ircd: Option<String>,

        /// Services package to attach
        #[arg(long, conflicts_with = "no_services")]
        services: Option<String>,

        /// Build a network without services
        #[arg(long)]
        no_services: bool,

        /// Service bots to attach, comma separated
        #[arg(long, value_delimiter = ',')]
        service_bots: Option<Vec<String>>,

        /// Number of client servers and hubs
        #[arg(short, long)]
        servers: Option<usize>,

        /// Oper account as name:password, may be repeated
        #[arg(long = "oper")]
        opers: Vec<OperConfig>,

        /// Provision Rizon's IRCd, services and bots
        #[arg(long)]
        rizon: bool,

        /// Include moo in a Rizon network
        #[arg(long, requires = "rizon")]
        with_moo: bool,

        /// Seed for a reproducible map
        #[arg(long)]
        seed: Option<u64>,

        /// Output directory for the network map
        #[arg(short, long, default_value = "ircnet_output")]
        output: PathBuf,
    },
    /// Write per-server bundles from an existing network map
    Write {
        /// Directory containing map.yaml
        #[arg(short, long, default_value = "ircnet_output")]
        output: PathBuf,
    },
    /// List supported software
    ListSoftware,
}

fn list_software() {
    for kind in [SoftwareKind::Ircd, SoftwareKind::Services, SoftwareKind::ServiceBot] {
        println!("{}:", kind);
        for entry in software::list(kind) {
            let release = entry.release.map(|r| format!(" {}", r)).unwrap_or_default();
            let requirements = entry.requirements();
            if requirements.is_empty() {
                println!("  {:<10} {}{}", entry.name, entry.description, release);
            } else {
                println!("  {:<10} {}{} ({})", entry.name, entry.description, release, requirements);
            }
        }
    }
}

fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    let args = Args::parse();

    // Initialize logging with default filter level of "info"
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    match args.command {
        Command::Generate {
            config,
            ircd,
            services,
            no_services,
            service_bots,
            servers,
            opers,
            rizon,
            with_moo,
            seed,
            output,
        } => {
            let mut network_config = match &config {
                Some(path) => config_loader::load_config(path)?,
                None => Config::default(),
            };
            let overrides = CliOverrides {
                ircd,
                services,
                no_services,
                service_bots,
                servers,
                opers,
                seed,
                rizon,
                with_moo,
            };
            config_loader::apply_overrides(&mut network_config, &overrides)?;

            info!("Output directory: {:?}", output);
            let network = orchestrator::generate(&network_config, &output)?;
            info!("Generated {} servers; run `write` to emit server bundles", network.len());
        }
        Command::Write { output } => {
            let written = orchestrator::write_configs(&output)?;
            info!("Wrote {} server bundles to {:?}", written, output.join(orchestrator::CONFIGS_DIR));
        }
        Command::ListSoftware => list_software(),
    }

    Ok(())
}
