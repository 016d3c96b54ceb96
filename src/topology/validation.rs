//! Network map validation.
//!
//! This module checks a completed (allocated or loaded) network before it is
//! handed to config writers.

use std::collections::HashSet;

use super::network::Network;
use crate::allocation::allocator::MIN_PASSWORD_LEN;
use crate::topology::Sid;

/// Validate a completed network map
///
/// Checks for:
/// - Connectivity (no orphan servers)
/// - Every server has a well-formed, unique SID
/// - Every link has a unique port and a unique password of sufficient length
///
/// # Returns
/// * `Ok(())` if validation succeeds
/// * `Err(String)` with an error message if validation fails
pub fn validate_network(network: &Network) -> Result<(), String> {
    if !network.is_connected() {
        return Err("Network is not connected: some servers cannot reach the rest".to_string());
    }

    let mut sids = HashSet::new();
    for (index, node) in network.nodes() {
        let sid = node
            .sid
            .as_ref()
            .ok_or_else(|| format!("Server {} has no SID assigned", index.index()))?;
        if !Sid::is_valid(sid.as_str()) {
            return Err(format!("Server {} has malformed SID '{}'", index.index(), sid));
        }
        if !sids.insert(sid.clone()) {
            return Err(format!("Duplicate SID '{}'", sid));
        }
    }

    let mut ports = HashSet::new();
    let mut passwords = HashSet::new();
    for link in network.links() {
        let (a, b) = link.endpoints();
        let label = format!("{}-{}", a.index(), b.index());

        let port = link.port().ok_or_else(|| format!("Link {} has no port", label))?;
        if !ports.insert(port) {
            return Err(format!("Duplicate link port {} on link {}", port, label));
        }

        let password = link
            .password()
            .ok_or_else(|| format!("Link {} has no password", label))?;
        if password.len() < MIN_PASSWORD_LEN {
            return Err(format!(
                "Link {} password is shorter than {} characters",
                label, MIN_PASSWORD_LEN
            ));
        }
        if !passwords.insert(password.to_string()) {
            return Err(format!("Duplicate password on link {}", label));
        }
    }

    log::debug!(
        "Validated network: {} servers, {} links",
        network.len(),
        network.link_count()
    );
    Ok(())
}

/// List hub-type servers linked beyond their declared capacity.
///
/// Loaded maps may have been edited by hand, so violations are reported
/// rather than treated as fatal.
pub fn capacity_violations(network: &Network) -> Vec<String> {
    let mut violations = Vec::new();
    for (index, node) in network.nodes() {
        let Some(capacity) = node.role.capacity() else {
            continue;
        };
        let label = node
            .sid
            .as_ref()
            .map(|s| s.to_string())
            .unwrap_or_else(|| format!("#{}", index.index()));

        let clients = network.client_links(index);
        if clients > capacity.max_clients {
            violations.push(format!(
                "{} {} has {} client servers (max {})",
                node.role.label(),
                label,
                clients,
                capacity.max_clients
            ));
        }
        let hubs = network.hub_links(index);
        if hubs > capacity.max_hubs {
            violations.push(format!(
                "{} {} has {} hub links (max {})",
                node.role.label(),
                label,
                hubs,
                capacity.max_hubs
            ));
        }
    }
    violations
}
