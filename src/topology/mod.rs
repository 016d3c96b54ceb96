//! Network topology module.
//!
//! This module contains the IRC network graph model, the incremental
//! builder that shapes it, and validation of completed maps.

pub mod builder;
pub mod network;
pub mod types;
pub mod validation;

// Re-export key types and functions for easier access
pub use builder::NetworkBuilder;
pub use network::{Network, NetworkStats};
pub use types::{Capacity, InfoBag, Link, NodeIndex, Role, ServerNode, Sid};
pub use validation::{capacity_violations, validate_network};
