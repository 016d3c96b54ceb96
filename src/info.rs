//! Per-server info bundles.
//!
//! Config writers for each package consume one bundle per server: its role,
//! assigned identifiers, and one entry per link with the shared port and
//! password. Services and bots also learn which IRCd sits on the other side
//! of each link, so their configs can pick protocol-specific settings.

use serde::Serialize;

use crate::error::TopologyError;
use crate::topology::{InfoBag, Network, NodeIndex};

/// One link as seen from a single server
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct LinkInfo {
    pub remote_name: String,
    pub remote_sid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// IRCd on the far side, set for servers that are not client servers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_software: Option<String>,
}

/// Everything a config writer needs to know about one server
#[derive(Serialize, Debug, Clone)]
pub struct ServerInfo {
    pub sid: String,
    pub name: String,
    pub software: String,
    pub role: String,
    pub client: bool,
    pub hidden: bool,
    pub hub: bool,
    pub services: bool,
    pub service_bot: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_port: Option<u16>,
    pub network_name: String,
    pub network_suffix: String,
    /// Full info bag, including fields added by later phases
    pub info: InfoBag,
    pub links: Vec<LinkInfo>,
}

/// Short listing of one server for the network summary
#[derive(Serialize, Debug, Clone)]
pub struct ServerEntry {
    pub sid: String,
    pub name: String,
    pub role: String,
    pub software: String,
}

/// Network-wide summary written alongside the per-server bundles
#[derive(Serialize, Debug, Clone)]
pub struct NetworkSummary {
    pub info: InfoBag,
    pub servers: Vec<ServerEntry>,
}

fn network_field(network: &Network, key: &str) -> String {
    network
        .info
        .get(key)
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string()
}

fn sid_and_name(network: &Network, index: NodeIndex) -> Result<(String, String), TopologyError> {
    let node = network
        .node(index)
        .ok_or(TopologyError::UnknownNode(index.index()))?;
    let sid = node
        .sid
        .as_ref()
        .ok_or(TopologyError::MissingSid(index.index()))?
        .to_string();
    let name = node.name().map(str::to_string).unwrap_or_else(|| sid.clone());
    Ok((sid, name))
}

/// Build the info bundle for one server
pub fn server_info(network: &Network, index: NodeIndex) -> Result<ServerInfo, TopologyError> {
    let node = network
        .node(index)
        .ok_or(TopologyError::UnknownNode(index.index()))?;
    let (sid, name) = sid_and_name(network, index)?;

    let mut links = Vec::new();
    for link in network.links_of(index) {
        let Some(remote) = link.other(index) else {
            continue;
        };
        let (remote_sid, remote_name) = sid_and_name(network, remote)?;
        let remote_node = network
            .node(remote)
            .ok_or(TopologyError::UnknownNode(remote.index()))?;

        let server_software = if !node.role.is_client()
            && (remote_node.role.is_client() || remote_node.role.is_hub())
        {
            Some(remote_node.software.clone())
        } else {
            None
        };

        links.push(LinkInfo {
            remote_name,
            remote_sid,
            port: link.port(),
            password: link.password().map(str::to_string),
            server_software,
        });
    }

    Ok(ServerInfo {
        sid,
        name,
        software: node.software.clone(),
        role: node.role.label().to_string(),
        client: node.role.is_client(),
        hidden: node.role.is_hidden(),
        hub: node.role.is_hub(),
        services: node.role.is_services(),
        service_bot: node.role.is_service_bot(),
        client_port: node.client_port(),
        network_name: network_field(network, "name"),
        network_suffix: network_field(network, "suffix"),
        info: node.info.clone(),
        links,
    })
}

/// Bundles for every server, in network order
pub fn all_server_infos(network: &Network) -> Result<Vec<ServerInfo>, TopologyError> {
    network.nodes().map(|(index, _)| server_info(network, index)).collect()
}

pub fn network_summary(network: &Network) -> Result<NetworkSummary, TopologyError> {
    let mut servers = Vec::with_capacity(network.len());
    for (index, node) in network.nodes() {
        let (sid, name) = sid_and_name(network, index)?;
        servers.push(ServerEntry {
            sid,
            name,
            role: node.role.label().to_string(),
            software: node.software.clone(),
        });
    }
    Ok(NetworkSummary {
        info: network.info.clone(),
        servers,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocation::{allocate, AllocationOptions};
    use crate::topology::NetworkBuilder;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn network() -> Network {
        let mut builder = NetworkBuilder::new(StdRng::seed_from_u64(31));
        builder.build("plexus4", 2).unwrap();
        builder.attach_services("anope2").unwrap();
        builder.attach_service_bot("acid").unwrap();
        let mut network = builder.finish();
        allocate(&mut network, &AllocationOptions::default(), &mut StdRng::seed_from_u64(32)).unwrap();
        network.info.insert("name".to_string(), "Rizon".into());
        network.info.insert("suffix".to_string(), ".dnt".into());
        network
    }

    #[test]
    fn test_link_entries_mirror_each_other() {
        let network = network();
        let client = server_info(&network, NodeIndex(0)).unwrap();
        let hub = server_info(&network, NodeIndex(1)).unwrap();

        assert!(client.client);
        assert_eq!(client.client_port, Some(6667));
        assert_eq!(client.network_name, "Rizon");

        let to_hub = client.links.iter().find(|l| l.remote_sid == hub.sid).unwrap();
        let to_client = hub.links.iter().find(|l| l.remote_sid == client.sid).unwrap();
        assert_eq!(to_hub.port, to_client.port);
        assert_eq!(to_hub.password, to_client.password);
        assert_eq!(to_hub.remote_name, hub.name);
        // client servers do not get the remote IRCd
        assert!(to_hub.server_software.is_none());
        assert_eq!(to_client.server_software.as_deref(), Some("plexus4"));
    }

    #[test]
    fn test_services_learn_uplink_software() {
        let network = network();
        let infos = all_server_infos(&network).unwrap();
        assert_eq!(infos.len(), network.len());

        for info in infos.iter().filter(|i| i.services || i.service_bot) {
            assert_eq!(info.links.len(), 1);
            assert_eq!(info.links[0].server_software.as_deref(), Some("plexus4"));
            assert!(info.hidden);
        }
    }

    #[test]
    fn test_summary_lists_all_servers() {
        let network = network();
        let summary = network_summary(&network).unwrap();
        assert_eq!(summary.servers.len(), network.len());
        assert!(summary.servers.iter().any(|s| s.role == "services"));
        let json = serde_json::to_string(&summary).unwrap();
        assert!(json.contains("\"Rizon\""));
    }
}
