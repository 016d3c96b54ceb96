use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::str::FromStr;

use crate::software::{self, SoftwareKind};

fn default_network_name() -> String {
    "VagrIRC".to_string()
}

fn default_suffix() -> String {
    ".dnt".to_string()
}

fn default_servers() -> usize {
    1
}

fn default_ircd() -> String {
    "hybrid".to_string()
}

fn default_services() -> Option<String> {
    Some("anope2".to_string())
}

fn default_oper_email() -> String {
    "oper@example.com".to_string()
}

/// Network generation configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub network: NetworkSettings,
    #[serde(default)]
    pub software: SoftwareSelection,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub opers: Vec<OperConfig>,
}

/// Shape and naming of the generated network
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NetworkSettings {
    #[serde(default = "default_network_name")]
    pub name: String,
    /// Appended to every server name, e.g. `.dnt`
    #[serde(default = "default_suffix")]
    pub suffix: String,
    /// Number of client servers and hubs to build
    #[serde(default = "default_servers")]
    pub servers: usize,
    /// Seed for reproducible maps; random when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for NetworkSettings {
    fn default() -> Self {
        NetworkSettings {
            name: default_network_name(),
            suffix: default_suffix(),
            servers: default_servers(),
            seed: None,
        }
    }
}

/// Which packages run on the network
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SoftwareSelection {
    #[serde(default = "default_ircd")]
    pub ircd: String,
    /// Services package; `null` provisions a network without services
    #[serde(default = "default_services")]
    pub services: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub service_bots: Vec<String>,
}

impl Default for SoftwareSelection {
    fn default() -> Self {
        SoftwareSelection {
            ircd: default_ircd(),
            services: default_services(),
            service_bots: Vec::new(),
        }
    }
}

/// An IRC operator account, also registered with services as root
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct OperConfig {
    pub name: String,
    pub password: String,
    #[serde(default = "default_oper_email")]
    pub email: String,
}

impl FromStr for OperConfig {
    type Err = String;

    /// Parse `name:password`
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.split_once(':') {
            Some((name, password)) if !name.is_empty() && !password.is_empty() => Ok(OperConfig {
                name: name.to_string(),
                password: password.to_string(),
                email: default_oper_email(),
            }),
            _ => Err(format!("expected <name:password>, got '{}'", value)),
        }
    }
}

/// Configuration validation errors
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid network configuration: {0}")]
    InvalidNetwork(String),
    #[error("Invalid software selection: {0}")]
    InvalidSoftware(String),
    #[error("Invalid oper configuration: {0}")]
    InvalidOper(String),
}

impl Config {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.validate_network()?;
        self.validate_software()?;
        self.validate_opers()?;
        Ok(())
    }

    fn validate_network(&self) -> Result<(), ValidationError> {
        let network = &self.network;
        if network.servers < 1 {
            return Err(ValidationError::InvalidNetwork(
                "servers must be at least 1".to_string(),
            ));
        }
        if network.name.trim().is_empty() {
            return Err(ValidationError::InvalidNetwork(
                "name cannot be empty".to_string(),
            ));
        }
        if !network.suffix.starts_with('.') || network.suffix.len() < 2 {
            return Err(ValidationError::InvalidNetwork(format!(
                "suffix '{}' must start with '.' followed by a domain",
                network.suffix
            )));
        }
        Ok(())
    }

    fn validate_software(&self) -> Result<(), ValidationError> {
        let selection = &self.software;

        if software::find(SoftwareKind::Ircd, &selection.ircd).is_none() {
            return Err(ValidationError::InvalidSoftware(format!(
                "unknown IRCd '{}'",
                selection.ircd
            )));
        }

        if let Some(services) = &selection.services {
            if software::find(SoftwareKind::Services, services).is_none() {
                return Err(ValidationError::InvalidSoftware(format!(
                    "unknown services package '{}'",
                    services
                )));
            }
        }

        let mut seen = HashSet::new();
        for bot in &selection.service_bots {
            let entry = software::find(SoftwareKind::ServiceBot, bot).ok_or_else(|| {
                ValidationError::InvalidSoftware(format!("unknown service bot '{}'", bot))
            })?;
            if !seen.insert(bot.as_str()) {
                return Err(ValidationError::InvalidSoftware(format!(
                    "service bot '{}' listed more than once",
                    bot
                )));
            }
            if let Some(ircd) = entry.requires_ircd {
                if ircd != selection.ircd {
                    return Err(ValidationError::InvalidSoftware(format!(
                        "service bot '{}' requires IRCd '{}', not '{}'",
                        bot, ircd, selection.ircd
                    )));
                }
            }
            if let Some(services) = entry.requires_services {
                if selection.services.as_deref() != Some(services) {
                    return Err(ValidationError::InvalidSoftware(format!(
                        "service bot '{}' requires services '{}'",
                        bot, services
                    )));
                }
            }
        }
        Ok(())
    }

    fn validate_opers(&self) -> Result<(), ValidationError> {
        let mut names = HashSet::new();
        for oper in &self.opers {
            if oper.name.is_empty() || oper.password.is_empty() {
                return Err(ValidationError::InvalidOper(
                    "oper name and password cannot be empty".to_string(),
                ));
            }
            if !names.insert(oper.name.as_str()) {
                return Err(ValidationError::InvalidOper(format!(
                    "oper '{}' defined more than once",
                    oper.name
                )));
            }
        }
        Ok(())
    }
}
