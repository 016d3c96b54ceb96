//! Allocation pass over a shaped network.
//!
//! Servers are visited in creation order and links in creation order, so a
//! given network shape and RNG state always produce the same assignment.
//! SIDs and passwords are drawn at random and retried until unique; the retry
//! count is bounded and running out is reported as an error rather than
//! handing out a duplicate.

use log::{debug, info};
use rand::distributions::Alphanumeric;
use rand::Rng;

use super::registry::UsedRegistry;
use crate::error::TopologyError;
use crate::topology::{Network, Role, ServerNode, Sid};

/// First port handed to client-facing servers
pub const CLIENT_PORT_START: u16 = 6667;
/// Starting point for the link port range
pub const LINK_PORT_START: u16 = 10000;
/// Step used to move the link port range clear of client ports
pub const LINK_PORT_STEP: u32 = 500;
/// Shortest link password accepted
pub const MIN_PASSWORD_LEN: usize = 9;
/// Length range of generated password tokens
const PASSWORD_LENGTH: std::ops::RangeInclusive<usize> = 8..=16;
/// Number of distinct SIDs (10 * 10 * 26)
const SID_SPACE: usize = 2600;
const MAX_SID_ATTEMPTS: usize = 10_000;
const MAX_PASSWORD_ATTEMPTS: usize = 1_000;

/// Settings for an allocation pass
#[derive(Debug, Clone)]
pub struct AllocationOptions {
    /// Appended to every display name, e.g. `.dnt`
    pub suffix: String,
}

impl Default for AllocationOptions {
    fn default() -> Self {
        AllocationOptions {
            suffix: ".dnt".to_string(),
        }
    }
}

/// Draw a random SID of the form `DDL`
pub fn generate_sid<R: Rng>(rng: &mut R) -> Result<Sid, TopologyError> {
    let first = rng.gen_range(0..10u8);
    let second = rng.gen_range(0..10u8);
    let letter = char::from(rng.gen_range(b'A'..=b'Z'));
    Sid::parse(&format!("{}{}{}", first, second, letter))
}

/// Draw a random alphanumeric password token.
///
/// The token may be shorter than [`MIN_PASSWORD_LEN`]; callers reject those.
pub fn generate_password<R: Rng>(rng: &mut R) -> String {
    let len = rng.gen_range(PASSWORD_LENGTH);
    (0..len).map(|_| char::from(rng.sample(Alphanumeric))).collect()
}

fn unique_sid<R: Rng>(rng: &mut R, registry: &mut UsedRegistry) -> Result<Sid, TopologyError> {
    let exhausted = TopologyError::AllocationExhausted {
        kind: "SID",
        attempts: MAX_SID_ATTEMPTS,
    };
    if registry.sid_count() >= SID_SPACE {
        return Err(exhausted);
    }
    for _ in 0..MAX_SID_ATTEMPTS {
        let sid = generate_sid(rng)?;
        if registry.claim_sid(&sid) {
            return Ok(sid);
        }
    }
    Err(exhausted)
}

fn unique_password<R: Rng>(rng: &mut R, registry: &mut UsedRegistry) -> Result<String, TopologyError> {
    for _ in 0..MAX_PASSWORD_ATTEMPTS {
        let password = generate_password(rng);
        if password.len() >= MIN_PASSWORD_LEN && registry.claim_password(&password) {
            return Ok(password);
        }
    }
    Err(TopologyError::AllocationExhausted {
        kind: "link password",
        attempts: MAX_PASSWORD_ATTEMPTS,
    })
}

/// Base display name for a server, before de-duplication and suffix
fn base_name(node: &ServerNode) -> String {
    match node.role {
        Role::Client => node.software.clone(),
        Role::Hub { for_services: true, .. } => format!("{}-serviceshub", node.software),
        Role::Hub { .. } => format!("{}-hub", node.software),
        Role::CoreHub { .. } => format!("{}-core", node.software),
        Role::Services => "services".to_string(),
        Role::ServiceBot => node.software.clone(),
    }
}

fn unique_name(registry: &mut UsedRegistry, base: &str, suffix: &str) -> String {
    let mut candidate = format!("{}{}", base, suffix);
    let mut counter = 2;
    while !registry.claim_name(&candidate) {
        candidate = format!("{}{}{}", base, counter, suffix);
        counter += 1;
    }
    candidate
}

/// First link port, moved up in steps until it is above `next_client_port`
fn link_port_base(next_client_port: u32) -> u32 {
    let mut base = u32::from(LINK_PORT_START);
    while base <= next_client_port {
        base += LINK_PORT_STEP;
    }
    base
}

/// Assign SIDs, names, client ports, link ports and link passwords.
///
/// Expects a freshly shaped network; any previously assigned values are
/// overwritten.
pub fn allocate<R: Rng>(network: &mut Network, options: &AllocationOptions, rng: &mut R) -> Result<(), TopologyError> {
    let mut registry = UsedRegistry::new();
    let mut next_client_port = u32::from(CLIENT_PORT_START);

    for (index, node) in network.nodes_mut() {
        let sid = unique_sid(rng, &mut registry)?;
        let name = unique_name(&mut registry, &base_name(node), &options.suffix);

        node.info.insert("name".to_string(), name.clone().into());
        node.info.insert("sid".to_string(), sid.as_str().into());

        if node.role.is_client() {
            let port = u16::try_from(next_client_port).map_err(|_| TopologyError::AllocationExhausted {
                kind: "client port",
                attempts: 1,
            })?;
            node.info.insert("client_port".to_string(), port.into());
            next_client_port += 1;
        }

        debug!("Server {} ({}) -> {} [{}]", index.index(), node.role.label(), name, sid);
        node.sid = Some(sid);
    }

    let port_base = link_port_base(next_client_port);
    let mut link_port = port_base;

    for link in network.links_mut() {
        let port = u16::try_from(link_port).map_err(|_| TopologyError::AllocationExhausted {
            kind: "link port",
            attempts: 1,
        })?;
        let password = unique_password(rng, &mut registry)?;

        link.attrs.insert("port".to_string(), port.into());
        link.attrs.insert("password".to_string(), password.into());
        link_port += 1;
    }

    info!(
        "Allocated {} SIDs, {} client ports, {} links from port {}",
        network.len(),
        next_client_port - u32::from(CLIENT_PORT_START),
        network.link_count(),
        port_base
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::NetworkBuilder;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn built(count: usize, seed: u64) -> Network {
        let mut builder = NetworkBuilder::new(StdRng::seed_from_u64(seed));
        builder.build("hybrid", count).unwrap();
        builder.attach_services("anope2").unwrap();
        builder.attach_service_bot("acid").unwrap();
        let mut network = builder.finish();
        let mut rng = StdRng::seed_from_u64(seed + 1);
        allocate(&mut network, &AllocationOptions::default(), &mut rng).unwrap();
        network
    }

    #[test]
    fn test_generated_sids_are_well_formed() {
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..500 {
            let sid = generate_sid(&mut rng).unwrap();
            assert!(Sid::is_valid(sid.as_str()));
        }
    }

    #[test]
    fn test_generated_passwords_vary_in_length() {
        let mut rng = StdRng::seed_from_u64(10);
        for _ in 0..200 {
            let password = generate_password(&mut rng);
            assert!(PASSWORD_LENGTH.contains(&password.len()));
            assert!(password.chars().all(|c| c.is_ascii_alphanumeric()));
        }
    }

    #[test]
    fn test_sids_and_passwords_unique() {
        let network = built(30, 11);

        let sids: HashSet<_> = network.nodes().map(|(_, n)| n.sid.clone().unwrap()).collect();
        assert_eq!(sids.len(), network.len());

        let passwords: HashSet<_> = network.links().map(|l| l.password().unwrap().to_string()).collect();
        assert_eq!(passwords.len(), network.link_count());
        assert!(passwords.iter().all(|p| p.len() >= MIN_PASSWORD_LEN));
    }

    #[test]
    fn test_client_ports_contiguous() {
        let network = built(20, 12);
        let ports: Vec<u16> = network.nodes().filter_map(|(_, n)| n.client_port()).collect();

        let expected: Vec<u16> = (0..ports.len() as u16).map(|i| CLIENT_PORT_START + i).collect();
        assert_eq!(ports, expected);

        for (_, node) in network.nodes() {
            assert_eq!(node.client_port().is_some(), node.role.is_client());
        }
    }

    #[test]
    fn test_link_ports_sequential_from_base() {
        let network = built(8, 13);
        let ports: Vec<u16> = network.links().map(|l| l.port().unwrap()).collect();
        assert_eq!(ports[0], LINK_PORT_START);
        for pair in ports.windows(2) {
            assert_eq!(pair[1], pair[0] + 1);
        }
    }

    #[test]
    fn test_link_port_base_moves_past_client_ports() {
        assert_eq!(link_port_base(6670), 10000);
        assert_eq!(link_port_base(9999), 10000);
        assert_eq!(link_port_base(10000), 10500);
        assert_eq!(link_port_base(10067), 10500);
        assert_eq!(link_port_base(10500), 11000);
    }

    #[test]
    fn test_sid_space_exhaustion() {
        let mut network = Network::new();
        for _ in 0..(SID_SPACE + 1) {
            network.add_node(ServerNode::new(Role::Client, "hybrid"));
        }

        let mut rng = StdRng::seed_from_u64(14);
        let result = allocate(&mut network, &AllocationOptions::default(), &mut rng);
        assert!(matches!(
            result,
            Err(TopologyError::AllocationExhausted { kind: "SID", .. })
        ));
    }

    #[test]
    fn test_names_unique_and_role_qualified() {
        let network = built(10, 16);
        let names: HashSet<_> = network.nodes().map(|(_, n)| n.name().unwrap().to_string()).collect();
        assert_eq!(names.len(), network.len());

        for (_, node) in network.nodes() {
            let name = node.name().unwrap();
            assert!(name.ends_with(".dnt"));
            match node.role {
                Role::Hub { .. } => assert!(name.starts_with("hybrid-hub")),
                Role::CoreHub { .. } => assert!(name.starts_with("hybrid-core")),
                Role::Services => assert_eq!(name, "services.dnt"),
                Role::ServiceBot => assert_eq!(name, "acid.dnt"),
                Role::Client => assert!(name.starts_with("hybrid")),
            }
        }
        assert!(names.contains("hybrid.dnt"));
        assert!(names.contains("hybrid-hub.dnt"));
    }
}
