//! Network map serialization.
//!
//! The map is the handoff between the `generate` and `write` phases, so it
//! must round-trip exactly: same SIDs, same roles, same links and the same
//! attribute bags. The YAML layout is:
//!
//! ```yaml
//! network:
//!   name: VagrIRC
//!   suffix: .dnt
//! servers:
//!   12A:
//!     software: hybrid
//!     client: true
//!     hidden: false
//!     info: { name: hybrid.dnt, sid: 12A, client_port: 6667 }
//!   40K:
//!     software: hybrid
//!     hub: true
//!     hidden: true
//!     capacity: { max_clients: 3, max_hubs: 1 }
//!     info: { name: hybrid-hub.dnt, sid: 40K }
//! links:
//!   ? - 12A
//!     - 40K
//!   : port: 10000
//!     password: 4mQd81LkPz
//! ```
//!
//! Link keys are the sorted pair of endpoint SIDs, so a link is written the
//! same way whichever endpoint it was created from.

use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use crate::error::TopologyError;
use crate::topology::{Capacity, InfoBag, Network, NodeIndex, Role, ServerNode, Sid};

/// File name of the persisted map inside the output directory
pub const MAP_FILE_NAME: &str = "map.yaml";

fn is_false(value: &bool) -> bool {
    !*value
}

/// Persisted form of a single server
#[derive(Debug, Default, Serialize, Deserialize)]
struct ServerRecord {
    #[serde(default)]
    software: String,
    #[serde(default, skip_serializing_if = "is_false")]
    client: bool,
    #[serde(default)]
    hidden: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    hub: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    core_hub: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    for_services: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    services: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    service_bot: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    capacity: Option<Capacity>,
    #[serde(default)]
    info: InfoBag,
}

impl ServerRecord {
    fn from_node(node: &ServerNode) -> Self {
        ServerRecord {
            software: node.software.clone(),
            client: node.role.is_client(),
            hidden: node.role.is_hidden(),
            hub: node.role.is_hub(),
            core_hub: node.role.is_core_hub(),
            for_services: node.role.is_for_services(),
            services: node.role.is_services(),
            service_bot: node.role.is_service_bot(),
            capacity: node.role.capacity(),
            info: node.info.clone(),
        }
    }

    /// Map the role flags back onto exactly one role
    fn role(&self, sid: &str) -> Result<Role, TopologyError> {
        let invalid = |reason: &str| TopologyError::InvalidRole {
            sid: sid.to_string(),
            reason: reason.to_string(),
        };

        let primary = [self.client, self.hub, self.services, self.service_bot]
            .iter()
            .filter(|flag| **flag)
            .count();
        match primary {
            0 => return Err(invalid("no role flag set")),
            1 => {}
            _ => return Err(invalid("conflicting role flags")),
        }
        if (self.core_hub || self.for_services) && !self.hub {
            return Err(invalid("core_hub and for_services are only valid on hubs"));
        }
        if self.core_hub && self.for_services {
            return Err(invalid("a core hub cannot be reserved for services"));
        }
        if !self.hub && self.capacity.is_some() {
            return Err(invalid("only hubs carry a capacity"));
        }

        let role = if self.client {
            Role::Client
        } else if self.services {
            Role::Services
        } else if self.service_bot {
            Role::ServiceBot
        } else {
            let capacity = self.capacity.ok_or_else(|| invalid("hub without capacity"))?;
            if self.core_hub {
                Role::CoreHub { capacity }
            } else {
                Role::Hub {
                    capacity,
                    for_services: self.for_services,
                }
            }
        };

        if role.is_hidden() != self.hidden {
            warn!("Server {}: hidden flag does not match role {}, ignoring it", sid, role.label());
        }
        Ok(role)
    }
}

/// Top-level persisted document
#[derive(Debug, Default, Serialize, Deserialize)]
struct TopologyDocument {
    #[serde(default, skip_serializing_if = "InfoBag::is_empty")]
    network: InfoBag,
    #[serde(default)]
    servers: BTreeMap<String, ServerRecord>,
    #[serde(default)]
    links: Mapping,
}

fn sid_of(network: &Network, index: NodeIndex) -> Result<&Sid, TopologyError> {
    network
        .node(index)
        .and_then(|n| n.sid.as_ref())
        .ok_or(TopologyError::MissingSid(index.index()))
}

/// Serialize a fully allocated network to YAML
pub fn dump(network: &Network) -> Result<String, TopologyError> {
    let mut document = TopologyDocument {
        network: network.info.clone(),
        ..TopologyDocument::default()
    };

    for (index, node) in network.nodes() {
        let sid = node.sid.as_ref().ok_or(TopologyError::MissingSid(index.index()))?;
        document.servers.insert(sid.to_string(), ServerRecord::from_node(node));
    }

    for link in network.links() {
        let (a, b) = link.endpoints();
        let (first, second) = {
            let (sa, sb) = (sid_of(network, a)?, sid_of(network, b)?);
            if sa <= sb {
                (sa, sb)
            } else {
                (sb, sa)
            }
        };
        let key = Value::Sequence(vec![
            Value::String(first.to_string()),
            Value::String(second.to_string()),
        ]);
        document.links.insert(key, serde_yaml::to_value(&link.attrs)?);
    }

    Ok(serde_yaml::to_string(&document)?)
}

/// Parse one link key into its two endpoint SIDs
fn link_key(key: &Value) -> Result<(Sid, Sid), TopologyError> {
    let malformed = || TopologyError::MalformedLink(format!("{:?}", key));
    let items = key.as_sequence().ok_or_else(malformed)?;
    if items.len() != 2 {
        return Err(malformed());
    }
    let first = items[0].as_str().ok_or_else(malformed)?;
    let second = items[1].as_str().ok_or_else(malformed)?;
    Ok((Sid::parse(first)?, Sid::parse(second)?))
}

/// Rebuild a network from its YAML form.
///
/// Any inconsistency (unknown role combination, link to an unknown SID,
/// malformed link key) is an error; nothing is silently dropped.
pub fn load(input: &str) -> Result<Network, TopologyError> {
    let mut network = Network::new();
    if input.trim().is_empty() {
        return Ok(network);
    }

    let document: Option<TopologyDocument> = serde_yaml::from_str(input)?;
    let Some(document) = document else {
        return Ok(network);
    };
    network.info = document.network;

    let mut by_sid: HashMap<Sid, NodeIndex> = HashMap::new();
    for (sid, record) in document.servers {
        let parsed = Sid::parse(&sid)?;
        let role = record.role(&sid)?;

        let mut node = ServerNode::new(role, record.software);
        node.info = record.info;
        node.sid = Some(parsed.clone());
        by_sid.insert(parsed, network.add_node(node));
    }

    for (key, value) in document.links {
        let (first, second) = link_key(&key)?;
        let a = *by_sid
            .get(&first)
            .ok_or_else(|| TopologyError::UnknownSid(first.to_string()))?;
        let b = *by_sid
            .get(&second)
            .ok_or_else(|| TopologyError::UnknownSid(second.to_string()))?;
        let attrs: InfoBag = if value.is_null() {
            InfoBag::new()
        } else {
            serde_yaml::from_value(value)?
        };
        network.link(a, b, attrs)?;
    }

    Ok(network)
}

/// Write the network map to `path`
pub fn save_network_map(network: &Network, path: &Path) -> Result<()> {
    let content = dump(network).wrap_err("Failed to serialize network map")?;
    fs::write(path, content)
        .wrap_err_with(|| format!("Failed to write network map '{}'", path.display()))?;
    info!("Saved network map to {:?}", path);
    Ok(())
}

/// Read a network map previously written by [`save_network_map`]
pub fn load_network_map(path: &Path) -> Result<Network> {
    let content = fs::read_to_string(path)
        .wrap_err_with(|| format!("Failed to read network map '{}'", path.display()))?;
    let network = load(&content)
        .wrap_err_with(|| format!("Network map '{}' is invalid", path.display()))?;
    info!(
        "Loaded network map from {:?}: {} servers, {} links",
        path,
        network.len(),
        network.link_count()
    );
    Ok(network)
}
