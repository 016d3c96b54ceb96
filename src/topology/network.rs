//! In-memory network graph.
//!
//! Servers live in a node table addressed by [`NodeIndex`]; links live in an
//! edge table keyed by the sorted pair of endpoint indices, so a link's
//! attributes are found no matter which endpoint is given first.

use std::collections::{HashMap, HashSet, VecDeque};

use super::types::{InfoBag, Link, NodeIndex, Role, ServerNode, Sid};
use crate::error::TopologyError;

/// Server counts per role, used for summaries
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct NetworkStats {
    pub client_servers: usize,
    pub hubs: usize,
    pub core_hubs: usize,
    pub service_servers: usize,
    pub service_bots: usize,
    pub links: usize,
}

/// An undirected IRC network map
#[derive(Debug, Clone, Default)]
pub struct Network {
    nodes: Vec<ServerNode>,
    links: Vec<Link>,
    link_index: HashMap<(NodeIndex, NodeIndex), usize>,
    /// Network-wide attributes (name, suffix, users)
    pub info: InfoBag,
}

fn ordered(a: NodeIndex, b: NodeIndex) -> (NodeIndex, NodeIndex) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

impl Network {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// Add a server and return its index
    pub fn add_node(&mut self, node: ServerNode) -> NodeIndex {
        let index = NodeIndex(self.nodes.len());
        self.nodes.push(node);
        index
    }

    /// Link two servers. Self-links and duplicate links are rejected.
    pub fn link(&mut self, a: NodeIndex, b: NodeIndex, attrs: InfoBag) -> Result<usize, TopologyError> {
        self.check_index(a)?;
        self.check_index(b)?;
        if a == b {
            return Err(TopologyError::SelfLink(a.0));
        }
        let key = ordered(a, b);
        if self.link_index.contains_key(&key) {
            return Err(TopologyError::DuplicateLink(self.describe(a), self.describe(b)));
        }
        let position = self.links.len();
        self.links.push(Link { endpoints: key, attrs });
        self.link_index.insert(key, position);
        Ok(position)
    }

    fn check_index(&self, index: NodeIndex) -> Result<(), TopologyError> {
        if index.0 < self.nodes.len() {
            Ok(())
        } else {
            Err(TopologyError::UnknownNode(index.0))
        }
    }

    /// SID if assigned, otherwise the arena index
    fn describe(&self, index: NodeIndex) -> String {
        self.nodes
            .get(index.0)
            .and_then(|n| n.sid.as_ref())
            .map(|sid| sid.to_string())
            .unwrap_or_else(|| format!("#{}", index.0))
    }

    pub fn node(&self, index: NodeIndex) -> Option<&ServerNode> {
        self.nodes.get(index.0)
    }

    pub fn node_mut(&mut self, index: NodeIndex) -> Option<&mut ServerNode> {
        self.nodes.get_mut(index.0)
    }

    /// Servers in creation order
    pub fn nodes(&self) -> impl Iterator<Item = (NodeIndex, &ServerNode)> + '_ {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeIndex(i), n))
    }

    pub(crate) fn nodes_mut(&mut self) -> impl Iterator<Item = (NodeIndex, &mut ServerNode)> + '_ {
        self.nodes.iter_mut().enumerate().map(|(i, n)| (NodeIndex(i), n))
    }

    /// Links in creation order
    pub fn links(&self) -> impl Iterator<Item = &Link> + '_ {
        self.links.iter()
    }

    pub(crate) fn links_mut(&mut self) -> impl Iterator<Item = &mut Link> + '_ {
        self.links.iter_mut()
    }

    /// Link between two servers, in either order
    pub fn link_between(&self, a: NodeIndex, b: NodeIndex) -> Option<&Link> {
        self.link_index.get(&ordered(a, b)).map(|&i| &self.links[i])
    }

    pub fn link_between_mut(&mut self, a: NodeIndex, b: NodeIndex) -> Option<&mut Link> {
        match self.link_index.get(&ordered(a, b)) {
            Some(&i) => self.links.get_mut(i),
            None => None,
        }
    }

    /// Links touching `index`, in creation order
    pub fn links_of(&self, index: NodeIndex) -> impl Iterator<Item = &Link> + '_ {
        self.links.iter().filter(move |l| l.other(index).is_some())
    }

    pub fn neighbors(&self, index: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.links_of(index).filter_map(move |l| l.other(index))
    }

    /// Number of client-facing servers linked to `index`
    pub fn client_links(&self, index: NodeIndex) -> usize {
        self.neighbors(index)
            .filter(|&n| self.nodes[n.0].role.is_client())
            .count()
    }

    /// Number of hubs and core hubs linked to `index`
    pub fn hub_links(&self, index: NodeIndex) -> usize {
        self.neighbors(index)
            .filter(|&n| self.nodes[n.0].role.is_hub())
            .count()
    }

    /// Whether a hub can take another client-facing server
    pub fn has_client_capacity(&self, index: NodeIndex) -> bool {
        self.node(index)
            .and_then(|n| n.role.capacity())
            .map_or(false, |c| self.client_links(index) < c.max_clients)
    }

    /// Number of free hub-link slots on a hub-type server
    pub fn free_hub_slots(&self, index: NodeIndex) -> usize {
        self.node(index)
            .and_then(|n| n.role.capacity())
            .map_or(0, |c| c.max_hubs.saturating_sub(self.hub_links(index)))
    }

    /// Indices of servers whose role matches `predicate`, in creation order
    pub fn find_by_role<F>(&self, predicate: F) -> Vec<NodeIndex>
    where
        F: Fn(&Role) -> bool,
    {
        self.nodes()
            .filter(|(_, n)| predicate(&n.role))
            .map(|(i, _)| i)
            .collect()
    }

    pub fn find_by_sid(&self, sid: &Sid) -> Option<NodeIndex> {
        self.nodes()
            .find(|(_, n)| n.sid.as_ref() == Some(sid))
            .map(|(i, _)| i)
    }

    /// True when every server is reachable from every other one.
    /// An empty network counts as connected.
    pub fn is_connected(&self) -> bool {
        if self.nodes.is_empty() {
            return true;
        }

        let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); self.nodes.len()];
        for link in &self.links {
            let (a, b) = link.endpoints;
            adjacency[a.0].push(b.0);
            adjacency[b.0].push(a.0);
        }

        let mut seen = HashSet::new();
        let mut queue = VecDeque::new();
        seen.insert(0usize);
        queue.push_back(0usize);
        while let Some(current) = queue.pop_front() {
            for &next in &adjacency[current] {
                if seen.insert(next) {
                    queue.push_back(next);
                }
            }
        }

        seen.len() == self.nodes.len()
    }

    pub fn stats(&self) -> NetworkStats {
        let mut stats = NetworkStats {
            links: self.links.len(),
            ..NetworkStats::default()
        };
        for node in &self.nodes {
            match node.role {
                Role::Client => stats.client_servers += 1,
                Role::Hub { .. } => stats.hubs += 1,
                Role::CoreHub { .. } => stats.core_hubs += 1,
                Role::Services => stats.service_servers += 1,
                Role::ServiceBot => stats.service_bots += 1,
            }
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::types::Capacity;

    fn hub() -> ServerNode {
        ServerNode::new(
            Role::Hub {
                capacity: Capacity { max_clients: 2, max_hubs: 1 },
                for_services: false,
            },
            "hybrid",
        )
    }

    #[test]
    fn test_link_lookup_is_order_independent() {
        let mut network = Network::new();
        let a = network.add_node(ServerNode::new(Role::Client, "hybrid"));
        let b = network.add_node(hub());

        let mut attrs = InfoBag::new();
        attrs.insert("port".to_string(), serde_yaml::Value::from(10000u16));
        network.link(b, a, attrs).unwrap();

        assert_eq!(network.link_between(a, b).and_then(|l| l.port()), Some(10000));
        assert_eq!(network.link_between(b, a).and_then(|l| l.port()), Some(10000));

        network
            .link_between_mut(b, a)
            .unwrap()
            .attrs
            .insert("password".to_string(), "hunter2hunter2".into());
        assert_eq!(network.link_between(a, b).and_then(|l| l.password()), Some("hunter2hunter2"));
    }

    #[test]
    fn test_rejects_self_and_duplicate_links() {
        let mut network = Network::new();
        let a = network.add_node(ServerNode::new(Role::Client, "hybrid"));
        let b = network.add_node(hub());

        assert!(matches!(network.link(a, a, InfoBag::new()), Err(TopologyError::SelfLink(0))));
        network.link(a, b, InfoBag::new()).unwrap();
        assert!(matches!(
            network.link(b, a, InfoBag::new()),
            Err(TopologyError::DuplicateLink(_, _))
        ));
        assert!(matches!(
            network.link(a, NodeIndex(7), InfoBag::new()),
            Err(TopologyError::UnknownNode(7))
        ));
        assert_eq!(network.link_count(), 1);
    }

    #[test]
    fn test_capacity_counters() {
        let mut network = Network::new();
        let h = network.add_node(hub());
        let c1 = network.add_node(ServerNode::new(Role::Client, "hybrid"));
        let c2 = network.add_node(ServerNode::new(Role::Client, "hybrid"));
        let s = network.add_node(ServerNode::new(Role::Services, "anope2"));

        network.link(h, c1, InfoBag::new()).unwrap();
        assert!(network.has_client_capacity(h));
        network.link(h, c2, InfoBag::new()).unwrap();
        assert!(!network.has_client_capacity(h));

        // services do not count against either limit
        network.link(h, s, InfoBag::new()).unwrap();
        assert_eq!(network.client_links(h), 2);
        assert_eq!(network.hub_links(h), 0);
        assert_eq!(network.free_hub_slots(h), 1);
        assert_eq!(network.free_hub_slots(c1), 0);
    }

    #[test]
    fn test_connectivity() {
        let mut network = Network::new();
        assert!(network.is_connected());

        let a = network.add_node(ServerNode::new(Role::Client, "hybrid"));
        assert!(network.is_connected());

        let b = network.add_node(hub());
        assert!(!network.is_connected());

        network.link(a, b, InfoBag::new()).unwrap();
        assert!(network.is_connected());

        let stats = network.stats();
        assert_eq!(stats.client_servers, 1);
        assert_eq!(stats.hubs, 1);
        assert_eq!(stats.links, 1);
    }
}
