//! Topology type definitions.
//!
//! This file contains the node, link and role types that make up an IRC
//! network map, plus the SID newtype used as the persistent node key.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::TopologyError;

/// Open attribute bag attached to servers, links and the network itself.
///
/// Downstream config writers each need different fields, so this stays untyped.
pub type InfoBag = BTreeMap<String, serde_yaml::Value>;

/// Server identifier: two ASCII digits followed by an uppercase ASCII letter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Sid(String);

impl Sid {
    /// Parse and validate a SID string
    pub fn parse(value: &str) -> Result<Self, TopologyError> {
        if Self::is_valid(value) {
            Ok(Sid(value.to_string()))
        } else {
            Err(TopologyError::InvalidSid(value.to_string()))
        }
    }

    /// Check whether a string matches `[0-9][0-9][A-Z]`
    pub fn is_valid(value: &str) -> bool {
        let bytes = value.as_bytes();
        bytes.len() == 3
            && bytes[0].is_ascii_digit()
            && bytes[1].is_ascii_digit()
            && bytes[2].is_ascii_uppercase()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Sid {
    type Error = TopologyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Sid::parse(&value)
    }
}

impl From<Sid> for String {
    fn from(sid: Sid) -> Self {
        sid.0
    }
}

impl fmt::Display for Sid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Link limits of a hub-type server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capacity {
    /// Maximum number of attached client-facing servers
    pub max_clients: usize,
    /// Maximum number of attached hubs and core hubs
    pub max_hubs: usize,
}

/// Role of a server within the network.
///
/// Capacity only exists on the hub variants, so a client with a hub limit or
/// a core hub serving clients cannot be represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Client-facing server
    Client,
    /// Hub relaying between client servers and the backbone
    Hub {
        capacity: Capacity,
        /// Reserved for services use; never used for client or backbone growth
        for_services: bool,
    },
    /// Hub that only connects other hubs together
    CoreHub { capacity: Capacity },
    /// Services package (NickServ, ChanServ, ...)
    Services,
    /// Automated bot linked to the network
    ServiceBot,
}

impl Role {
    pub fn is_client(&self) -> bool {
        matches!(self, Role::Client)
    }

    /// True for hubs and core hubs
    pub fn is_hub(&self) -> bool {
        matches!(self, Role::Hub { .. } | Role::CoreHub { .. })
    }

    pub fn is_core_hub(&self) -> bool {
        matches!(self, Role::CoreHub { .. })
    }

    /// A regular hub that is not reserved for services
    pub fn is_real_hub(&self) -> bool {
        matches!(self, Role::Hub { for_services: false, .. })
    }

    pub fn is_for_services(&self) -> bool {
        matches!(self, Role::Hub { for_services: true, .. })
    }

    pub fn is_services(&self) -> bool {
        matches!(self, Role::Services)
    }

    pub fn is_service_bot(&self) -> bool {
        matches!(self, Role::ServiceBot)
    }

    /// Hidden servers are not visible to connected users
    pub fn is_hidden(&self) -> bool {
        !self.is_client()
    }

    pub fn capacity(&self) -> Option<Capacity> {
        match self {
            Role::Hub { capacity, .. } | Role::CoreHub { capacity } => Some(*capacity),
            _ => None,
        }
    }

    /// Short role label used in logs and bundle output
    pub fn label(&self) -> &'static str {
        match self {
            Role::Client => "client",
            Role::Hub { for_services: true, .. } => "services-hub",
            Role::Hub { .. } => "hub",
            Role::CoreHub { .. } => "core-hub",
            Role::Services => "services",
            Role::ServiceBot => "service-bot",
        }
    }
}

/// Arena index of a server within a [`crate::topology::Network`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIndex(pub(crate) usize);

impl NodeIndex {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// A single server in the network map
#[derive(Debug, Clone, PartialEq)]
pub struct ServerNode {
    pub role: Role,
    /// Implementing package (IRCd, services or bot name), opaque to the builder
    pub software: String,
    /// Assigned once the topology shape is frozen
    pub sid: Option<Sid>,
    pub info: InfoBag,
}

impl ServerNode {
    pub fn new(role: Role, software: impl Into<String>) -> Self {
        ServerNode {
            role,
            software: software.into(),
            sid: None,
            info: InfoBag::new(),
        }
    }

    /// Display name from the info bag, if assigned
    pub fn name(&self) -> Option<&str> {
        self.info.get("name").and_then(|v| v.as_str())
    }

    /// Client port from the info bag, if assigned
    pub fn client_port(&self) -> Option<u16> {
        self.info
            .get("client_port")
            .and_then(|v| v.as_u64())
            .and_then(|p| u16::try_from(p).ok())
    }
}

/// An undirected link between two servers.
///
/// Endpoints are stored sorted, so `(a, b)` and `(b, a)` describe the same link.
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    pub(crate) endpoints: (NodeIndex, NodeIndex),
    pub attrs: InfoBag,
}

impl Link {
    pub fn endpoints(&self) -> (NodeIndex, NodeIndex) {
        self.endpoints
    }

    /// The endpoint opposite `node`, if `node` is on this link
    pub fn other(&self, node: NodeIndex) -> Option<NodeIndex> {
        let (a, b) = self.endpoints;
        if a == node {
            Some(b)
        } else if b == node {
            Some(a)
        } else {
            None
        }
    }

    pub fn port(&self) -> Option<u16> {
        self.attrs
            .get("port")
            .and_then(|v| v.as_u64())
            .and_then(|p| u16::try_from(p).ok())
    }

    pub fn password(&self) -> Option<&str> {
        self.attrs.get("password").and_then(|v| v.as_str())
    }
}
