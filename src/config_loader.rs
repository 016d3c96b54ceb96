use crate::config::{Config, OperConfig};
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use log::info;
use std::fs::File;
use std::path::Path;

/// Load and parse configuration from a YAML file
pub fn load_config(config_path: &Path) -> Result<Config> {
    info!("Loading configuration from: {:?}", config_path);

    let file = File::open(config_path)
        .wrap_err_with(|| format!("Failed to open configuration '{}'", config_path.display()))?;

    let config: Config = serde_yaml::from_reader(file)
        .wrap_err_with(|| format!("Failed to parse configuration '{}'", config_path.display()))?;

    config.validate()?;

    Ok(config)
}

/// CLI arguments that override YAML settings
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub ircd: Option<String>,
    pub services: Option<String>,
    pub no_services: bool,
    pub service_bots: Option<Vec<String>>,
    pub servers: Option<usize>,
    pub opers: Vec<OperConfig>,
    pub seed: Option<u64>,
    /// Provision Rizon's IRCd, services and bots
    pub rizon: bool,
    /// Include moo in a Rizon network
    pub with_moo: bool,
}

/// Apply CLI overrides to a configuration.
///
/// The Rizon preset is applied last and replaces any software choice.
pub fn apply_overrides(config: &mut Config, overrides: &CliOverrides) -> Result<()> {
    if let Some(ircd) = &overrides.ircd {
        config.software.ircd = ircd.clone();
    }
    if let Some(services) = &overrides.services {
        config.software.services = Some(services.clone());
    }
    if overrides.no_services {
        config.software.services = None;
    }
    if let Some(bots) = &overrides.service_bots {
        config.software.service_bots = bots.clone();
    }
    if let Some(servers) = overrides.servers {
        config.network.servers = servers;
    }
    if overrides.seed.is_some() {
        config.network.seed = overrides.seed;
    }
    config.opers.extend(overrides.opers.iter().cloned());

    if overrides.rizon {
        info!("Using Rizon preset{}", if overrides.with_moo { " with moo" } else { "" });
        config.software.ircd = "plexus4".to_string();
        config.software.services = Some("anope2".to_string());
        config.software.service_bots = vec!["acid".to_string()];
        if overrides.with_moo {
            config.software.service_bots.push("moo".to_string());
        }
        config.network.name = "Rizon".to_string();
        config.network.suffix = ".rizon.net".to_string();
    }

    // Re-validate after applying overrides
    config.validate()?;

    Ok(())
}
