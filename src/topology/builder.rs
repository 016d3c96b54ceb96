//! Incremental network construction.
//!
//! The builder grows a network one server at a time. Client servers hang off
//! hubs, and hubs hang off core hubs. Growth is greedy: once a branch is full
//! the next server goes to a sibling or a new branch, existing links are never
//! rebalanced.

use log::{debug, info};
use rand::seq::SliceRandom;
use rand::Rng;

use super::network::Network;
use super::types::{Capacity, InfoBag, NodeIndex, Role, ServerNode};
use crate::error::TopologyError;

/// Range of client-facing servers a regular hub accepts
const HUB_CLIENT_CAPACITY: std::ops::RangeInclusive<usize> = 2..=3;
/// Range of hubs a core hub accepts
const CORE_HUB_CAPACITY: std::ops::RangeInclusive<usize> = 3..=7;

/// Grows a [`Network`] under connectivity and capacity constraints
pub struct NetworkBuilder<R: Rng> {
    network: Network,
    rng: R,
    services_anchor: Option<NodeIndex>,
}

impl<R: Rng> NetworkBuilder<R> {
    pub fn new(rng: R) -> Self {
        NetworkBuilder {
            network: Network::new(),
            rng,
            services_anchor: None,
        }
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    /// Consume the builder and return the shaped network
    pub fn finish(self) -> Network {
        self.network
    }

    /// Add `server_count` client and hub servers running `software`.
    ///
    /// Core hubs created along the way are not counted.
    pub fn build(&mut self, software: &str, server_count: usize) -> Result<(), TopologyError> {
        if server_count < 1 {
            return Err(TopologyError::InvalidServerCount(server_count));
        }

        info!("Building network of {} '{}' servers", server_count, software);
        for _ in 0..server_count {
            self.grow(software)?;
        }

        let stats = self.network.stats();
        info!(
            "Network shaped: {} client servers, {} hubs, {} core hubs, {} links",
            stats.client_servers, stats.hubs, stats.core_hubs, stats.links
        );
        Ok(())
    }

    /// Add a single client server or hub
    fn grow(&mut self, software: &str) -> Result<(), TopologyError> {
        match self.network.len() {
            0 => {
                let root = self.network.add_node(ServerNode::new(Role::Client, software));
                debug!("Created root client server {}", root.index());
            }
            1 => {
                let hub = self.new_hub(software);
                self.network.link(hub, NodeIndex(0), InfoBag::new())?;
                debug!("Created backbone hub {}", hub.index());
            }
            _ => {
                if let Some(hub) = self.find_empty_hub() {
                    let client = self.network.add_node(ServerNode::new(Role::Client, software));
                    self.network.link(client, hub, InfoBag::new())?;
                    debug!("Attached client server {} to hub {}", client.index(), hub.index());
                    return Ok(());
                }

                let core_hub = match self.find_empty_core_hub() {
                    Some(core_hub) => core_hub,
                    None => self.new_core_hub(software)?,
                };

                let hub = self.new_hub(software);
                self.network.link(hub, core_hub, InfoBag::new())?;
                debug!("Attached hub {} to core hub {}", hub.index(), core_hub.index());
            }
        }
        Ok(())
    }

    /// First real hub, in creation order, with room for a client server
    fn find_empty_hub(&self) -> Option<NodeIndex> {
        self.network
            .find_by_role(Role::is_real_hub)
            .into_iter()
            .find(|&hub| self.network.has_client_capacity(hub))
    }

    /// First core hub that can take a hub while keeping a backbone slot free
    fn find_empty_core_hub(&self) -> Option<NodeIndex> {
        self.network
            .find_by_role(Role::is_core_hub)
            .into_iter()
            .find(|&core_hub| self.network.free_hub_slots(core_hub) > 1)
    }

    fn new_hub(&mut self, software: &str) -> NodeIndex {
        let capacity = Capacity {
            max_clients: self.rng.gen_range(HUB_CLIENT_CAPACITY),
            max_hubs: 1,
        };
        self.network.add_node(ServerNode::new(
            Role::Hub {
                capacity,
                for_services: false,
            },
            software,
        ))
    }

    /// Create a core hub and link it to a random backbone anchor.
    ///
    /// While no core hub exists the anchor is a real hub; afterwards it is a
    /// core hub. Either way the anchor must have a free hub-link slot.
    fn new_core_hub(&mut self, software: &str) -> Result<NodeIndex, TopologyError> {
        let has_core_hubs = !self.network.find_by_role(Role::is_core_hub).is_empty();
        let candidates: Vec<NodeIndex> = if has_core_hubs {
            self.network.find_by_role(Role::is_core_hub)
        } else {
            self.network.find_by_role(Role::is_real_hub)
        }
        .into_iter()
        .filter(|&n| self.network.free_hub_slots(n) > 0)
        .collect();

        let anchor = *candidates
            .choose(&mut self.rng)
            .ok_or(TopologyError::NoBackboneAnchor)?;

        let capacity = Capacity {
            max_clients: 0,
            max_hubs: self.rng.gen_range(CORE_HUB_CAPACITY),
        };
        let core_hub = self
            .network
            .add_node(ServerNode::new(Role::CoreHub { capacity }, software));
        self.network.link(core_hub, anchor, InfoBag::new())?;
        debug!(
            "Created core hub {} (max {} hubs) anchored to {}",
            core_hub.index(),
            capacity.max_hubs,
            anchor.index()
        );
        Ok(core_hub)
    }

    /// Pick where services attach: a random core hub, else a random real hub,
    /// else the lone server of a one-node network.
    fn choose_services_anchor(&mut self, kind: &str) -> Result<NodeIndex, TopologyError> {
        if self.network.is_empty() {
            return Err(TopologyError::EmptyNetwork(kind.to_string()));
        }

        let core_hubs = self.network.find_by_role(Role::is_core_hub);
        let real_hubs = self.network.find_by_role(Role::is_real_hub);
        let candidates = if !core_hubs.is_empty() { core_hubs } else { real_hubs };

        if let Some(&anchor) = candidates.choose(&mut self.rng) {
            return Ok(anchor);
        }
        if self.network.len() == 1 {
            return Ok(NodeIndex(0));
        }
        // multi-node networks always have a hub when grown by this builder
        Err(TopologyError::EmptyNetwork(kind.to_string()))
    }

    /// Add a services server running `kind`
    pub fn attach_services(&mut self, kind: &str) -> Result<NodeIndex, TopologyError> {
        let anchor = self.choose_services_anchor(kind)?;
        let services = self.network.add_node(ServerNode::new(Role::Services, kind));
        self.network.link(services, anchor, InfoBag::new())?;
        self.services_anchor = Some(anchor);
        info!("Attached '{}' services to server {}", kind, anchor.index());
        Ok(services)
    }

    /// Add a service bot running `kind`, linked where services are linked
    pub fn attach_service_bot(&mut self, kind: &str) -> Result<NodeIndex, TopologyError> {
        let anchor = match self.services_anchor {
            Some(anchor) => anchor,
            None => {
                let anchor = self.choose_services_anchor(kind)?;
                self.services_anchor = Some(anchor);
                anchor
            }
        };
        let bot = self.network.add_node(ServerNode::new(Role::ServiceBot, kind));
        self.network.link(bot, anchor, InfoBag::new())?;
        info!("Attached '{}' service bot to server {}", kind, anchor.index());
        Ok(bot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn builder(seed: u64) -> NetworkBuilder<StdRng> {
        NetworkBuilder::new(StdRng::seed_from_u64(seed))
    }

    fn assert_capacity_respected(network: &Network) {
        for (index, node) in network.nodes() {
            if let Some(capacity) = node.role.capacity() {
                assert!(
                    network.client_links(index) <= capacity.max_clients,
                    "server {} exceeds client capacity",
                    index.index()
                );
                assert!(
                    network.hub_links(index) <= capacity.max_hubs,
                    "server {} exceeds hub capacity",
                    index.index()
                );
            }
        }
    }

    #[test]
    fn test_zero_servers_rejected() {
        let mut b = builder(1);
        assert!(matches!(b.build("hybrid", 0), Err(TopologyError::InvalidServerCount(0))));
        assert!(b.network().is_empty());
    }

    #[test]
    fn test_single_server() {
        let mut b = builder(1);
        b.build("hybrid", 1).unwrap();
        let network = b.finish();

        assert_eq!(network.len(), 1);
        assert_eq!(network.link_count(), 0);
        assert!(network.node(NodeIndex(0)).unwrap().role.is_client());
    }

    #[test]
    fn test_two_servers() {
        let mut b = builder(2);
        b.build("hybrid", 2).unwrap();
        let network = b.finish();

        assert_eq!(network.len(), 2);
        let hub = network.node(NodeIndex(1)).unwrap();
        let capacity = hub.role.capacity().unwrap();
        assert!(hub.role.is_real_hub());
        assert!(HUB_CLIENT_CAPACITY.contains(&capacity.max_clients));
        assert_eq!(capacity.max_hubs, 1);
        assert!(network.link_between(NodeIndex(0), NodeIndex(1)).is_some());
    }

    #[test]
    fn test_first_hub_fills_before_core_hub() {
        let mut b = builder(3);
        b.build("hybrid", 2).unwrap();
        let max_clients = b.network().node(NodeIndex(1)).unwrap().role.capacity().unwrap().max_clients;

        // fill the first hub
        b.build("hybrid", max_clients - 1).unwrap();
        assert_eq!(b.network().stats().core_hubs, 0);
        assert_eq!(b.network().client_links(NodeIndex(1)), max_clients);

        // next growth creates a core hub and a hub beneath it
        b.build("hybrid", 1).unwrap();
        let stats = b.network().stats();
        assert_eq!(stats.core_hubs, 1);
        assert_eq!(stats.hubs, 2);

        let core_hub = b.network().find_by_role(Role::is_core_hub)[0];
        assert!(b.network().link_between(core_hub, NodeIndex(1)).is_some());
    }

    #[test]
    fn test_build_invariants_across_sizes() {
        for seed in 0..8u64 {
            for count in 1..=40usize {
                let mut b = builder(seed * 100 + count as u64);
                b.build("hybrid", count).unwrap();
                let network = b.finish();

                let stats = network.stats();
                assert_eq!(stats.client_servers + stats.hubs, count);
                assert!(network.is_connected());
                assert_capacity_respected(&network);
                // tree-shaped by construction
                assert_eq!(network.link_count() + 1, network.len());
            }
        }
    }

    #[test]
    fn test_services_on_single_server() {
        let mut b = builder(4);
        b.build("hybrid", 1).unwrap();
        let services = b.attach_services("anope2").unwrap();
        let network = b.finish();

        assert!(network.link_between(services, NodeIndex(0)).is_some());
        assert!(network.is_connected());
    }

    #[test]
    fn test_services_prefer_core_hubs() {
        let mut b = builder(5);
        b.build("hybrid", 12).unwrap();
        assert!(b.network().stats().core_hubs > 0);

        let services = b.attach_services("anope2").unwrap();
        let bot = b.attach_service_bot("acid").unwrap();
        let network = b.finish();

        let anchors: Vec<NodeIndex> = network.neighbors(services).collect();
        assert_eq!(anchors.len(), 1);
        assert!(network.node(anchors[0]).unwrap().role.is_core_hub());

        let bot_anchors: Vec<NodeIndex> = network.neighbors(bot).collect();
        assert_eq!(bot_anchors, anchors);
        assert_capacity_respected(&network);
    }

    #[test]
    fn test_bot_without_services() {
        let mut b = builder(6);
        b.build("hybrid", 2).unwrap();
        let bot = b.attach_service_bot("moo").unwrap();
        let network = b.finish();

        let anchors: Vec<NodeIndex> = network.neighbors(bot).collect();
        assert_eq!(anchors, vec![NodeIndex(1)]);
    }

    #[test]
    fn test_services_on_empty_network() {
        let mut b = builder(7);
        assert!(matches!(b.attach_services("anope2"), Err(TopologyError::EmptyNetwork(_))));
    }

    #[test]
    fn test_same_seed_same_shape() {
        let shape = |seed| {
            let mut b = builder(seed);
            b.build("hybrid", 25).unwrap();
            b.attach_services("anope2").unwrap();
            let network = b.finish();
            network
                .links()
                .map(|l| {
                    let (a, b) = l.endpoints();
                    (a.index(), b.index())
                })
                .collect::<Vec<_>>()
        };
        assert_eq!(shape(42), shape(42));
    }
}
