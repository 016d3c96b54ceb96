//! Network orchestrator.
//!
//! Coordinates the two phases of provisioning: `generate` turns a
//! configuration into an allocated network map on disk, and `write_configs`
//! reads that map back and emits one info bundle per server for the config
//! writers.

use crate::allocation::{allocate, AllocationOptions};
use crate::config::{Config, OperConfig};
use crate::info::{all_server_infos, network_summary};
use crate::serial::{load_network_map, save_network_map, MAP_FILE_NAME};
use crate::topology::{capacity_violations, validate_network, Network, NetworkBuilder};
use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use log::{info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Directory under the output directory holding per-server bundles
pub const CONFIGS_DIR: &str = "configs";
pub const NETWORK_SUMMARY_FILE: &str = "network.json";

#[derive(Serialize)]
struct IrcdAccount<'a> {
    oper: bool,
    oper_pass: &'a str,
}

#[derive(Serialize)]
struct ServicesAccount<'a> {
    password: &'a str,
    level: &'static str,
}

#[derive(Serialize)]
struct UserRecord<'a> {
    ircd: IrcdAccount<'a>,
    services: ServicesAccount<'a>,
    email: &'a str,
}

fn users_value(opers: &[OperConfig]) -> Result<serde_yaml::Value> {
    let mut users = serde_yaml::Mapping::new();
    for oper in opers {
        let record = UserRecord {
            ircd: IrcdAccount {
                oper: true,
                oper_pass: &oper.password,
            },
            services: ServicesAccount {
                password: &oper.password,
                level: "root",
            },
            email: &oper.email,
        };
        users.insert(
            serde_yaml::Value::String(oper.name.clone()),
            serde_yaml::to_value(&record)?,
        );
    }
    Ok(serde_yaml::Value::Mapping(users))
}

/// Build and allocate a network in memory
pub fn generate_network(config: &Config) -> Result<Network> {
    config.validate()?;

    let mut rng = match config.network.seed {
        Some(seed) => {
            info!("Using seed {}", seed);
            StdRng::seed_from_u64(seed)
        }
        None => StdRng::from_entropy(),
    };

    let software = &config.software;
    let mut builder = NetworkBuilder::new(&mut rng);
    builder
        .build(&software.ircd, config.network.servers)
        .wrap_err("Failed to build network topology")?;
    if let Some(services) = &software.services {
        builder
            .attach_services(services)
            .wrap_err_with(|| format!("Failed to attach services '{}'", services))?;
    }
    for bot in &software.service_bots {
        builder
            .attach_service_bot(bot)
            .wrap_err_with(|| format!("Failed to attach service bot '{}'", bot))?;
    }
    let mut network = builder.finish();

    let options = AllocationOptions {
        suffix: config.network.suffix.clone(),
    };
    allocate(&mut network, &options, &mut rng).wrap_err("Failed to allocate server identifiers")?;

    network
        .info
        .insert("name".to_string(), config.network.name.clone().into());
    network
        .info
        .insert("suffix".to_string(), config.network.suffix.clone().into());
    network
        .info
        .insert("users".to_string(), users_value(&config.opers)?);

    let stats = network.stats();
    info!(
        "Generated network '{}': {} client servers, {} hubs ({} core), {} services, {} service bots, {} links",
        config.network.name,
        stats.client_servers,
        stats.hubs,
        stats.core_hubs,
        stats.service_servers,
        stats.service_bots,
        stats.links
    );

    Ok(network)
}

/// Generate a network and save its map under `output_dir`
pub fn generate(config: &Config, output_dir: &Path) -> Result<Network> {
    let network = generate_network(config)?;

    fs::create_dir_all(output_dir)
        .wrap_err_with(|| format!("Failed to create output directory '{}'", output_dir.display()))?;
    save_network_map(&network, &output_dir.join(MAP_FILE_NAME))?;

    Ok(network)
}

/// Read the saved map and write per-server info bundles.
///
/// Returns the number of bundles written.
pub fn write_configs(output_dir: &Path) -> Result<usize> {
    let network = load_network_map(&output_dir.join(MAP_FILE_NAME))?;

    validate_network(&network).map_err(|e| eyre!("Network map failed validation: {}", e))?;
    for violation in capacity_violations(&network) {
        warn!("Capacity exceeded: {}", violation);
    }

    let configs_dir = output_dir.join(CONFIGS_DIR);
    if configs_dir.exists() {
        fs::remove_dir_all(&configs_dir)
            .wrap_err_with(|| format!("Failed to remove '{}'", configs_dir.display()))?;
    }
    fs::create_dir_all(&configs_dir)
        .wrap_err_with(|| format!("Failed to create '{}'", configs_dir.display()))?;

    let infos = all_server_infos(&network)?;
    for server in &infos {
        let path = configs_dir.join(format!("{}.json", server.name));
        let json = serde_json::to_string_pretty(server)?;
        fs::write(&path, json)
            .wrap_err_with(|| format!("Failed to write '{}'", path.display()))?;
        info!("Wrote {} bundle for {} ({})", server.role, server.name, server.sid);
    }

    let summary_path = output_dir.join(NETWORK_SUMMARY_FILE);
    fs::write(&summary_path, serde_json::to_string_pretty(&network_summary(&network)?)?)
        .wrap_err_with(|| format!("Failed to write '{}'", summary_path.display()))?;

    Ok(infos.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn seeded_config(servers: usize) -> Config {
        let mut config = Config::default();
        config.network.servers = servers;
        config.network.seed = Some(11);
        config.opers = vec!["dan:hunter2".parse().unwrap()];
        config
    }

    #[test]
    fn test_generate_network_counts() {
        let network = generate_network(&seeded_config(5)).unwrap();
        let stats = network.stats();

        assert_eq!(stats.client_servers + stats.hubs, 5);
        assert_eq!(stats.service_servers, 1);
        assert_eq!(stats.service_bots, 0);
        assert!(validate_network(&network).is_ok());
        assert!(capacity_violations(&network).is_empty());
        assert_eq!(network.info["name"].as_str(), Some("VagrIRC"));
    }

    #[test]
    fn test_users_recorded_as_root() {
        let network = generate_network(&seeded_config(1)).unwrap();
        let user = &network.info["users"]["dan"];
        assert_eq!(user["ircd"]["oper"].as_bool(), Some(true));
        assert_eq!(user["ircd"]["oper_pass"].as_str(), Some("hunter2"));
        assert_eq!(user["services"]["level"].as_str(), Some("root"));
        assert_eq!(user["email"].as_str(), Some("oper@example.com"));
    }

    #[test]
    fn test_seed_reproducible() {
        let first = crate::serial::dump(&generate_network(&seeded_config(8)).unwrap()).unwrap();
        let second = crate::serial::dump(&generate_network(&seeded_config(8)).unwrap()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = seeded_config(3);
        config.software.service_bots = vec!["acid".to_string()];
        assert!(generate_network(&config).is_err());
    }

    #[test]
    fn test_generate_then_write() {
        let dir = tempdir().unwrap();
        let network = generate(&seeded_config(4), dir.path()).unwrap();
        assert!(dir.path().join(MAP_FILE_NAME).exists());

        let written = write_configs(dir.path()).unwrap();
        assert_eq!(written, network.len());
        assert!(dir.path().join(NETWORK_SUMMARY_FILE).exists());

        let bundles = fs::read_dir(dir.path().join(CONFIGS_DIR)).unwrap().count();
        assert_eq!(bundles, network.len());
        assert!(dir.path().join(CONFIGS_DIR).join("services.dnt.json").exists());
    }

    #[test]
    fn test_write_without_map_fails() {
        let dir = tempdir().unwrap();
        assert!(write_configs(dir.path()).is_err());
    }
}
