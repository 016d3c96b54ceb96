//! Catalog of supported IRC software.
//!
//! The topology builder treats software names as opaque; this catalog is
//! what configuration validation and `list-software` check them against.

use std::fmt;

/// Which slot a package fills in the network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SoftwareKind {
    Ircd,
    Services,
    ServiceBot,
}

impl fmt::Display for SoftwareKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SoftwareKind::Ircd => "IRCd",
            SoftwareKind::Services => "Services",
            SoftwareKind::ServiceBot => "Service Bots",
        };
        f.write_str(label)
    }
}

/// A supported package
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Software {
    pub name: &'static str,
    pub kind: SoftwareKind,
    pub description: &'static str,
    /// Pinned release, if the package is fetched from a release archive
    pub release: Option<&'static str>,
    /// IRCd this package only works with
    pub requires_ircd: Option<&'static str>,
    /// Services package this package only works with
    pub requires_services: Option<&'static str>,
}

impl Software {
    /// Human-readable requirement summary, empty when unrestricted
    pub fn requirements(&self) -> String {
        let mut parts = Vec::new();
        if let Some(ircd) = self.requires_ircd {
            parts.push(format!("ircd [{}]", ircd));
        }
        if let Some(services) = self.requires_services {
            parts.push(format!("services [{}]", services));
        }
        if parts.is_empty() {
            String::new()
        } else {
            format!("Requires {}", parts.join(", "))
        }
    }
}

pub const CATALOG: &[Software] = &[
    Software {
        name: "hybrid",
        kind: SoftwareKind::Ircd,
        description: "ircd-hybrid",
        release: Some("8.2.5"),
        requires_ircd: None,
        requires_services: None,
    },
    Software {
        name: "plexus4",
        kind: SoftwareKind::Ircd,
        description: "Rizon's plexus4 IRCd",
        release: None,
        requires_ircd: None,
        requires_services: None,
    },
    Software {
        name: "anope2",
        kind: SoftwareKind::Services,
        description: "Anope 2 services",
        release: Some("2.0.1"),
        requires_ircd: None,
        requires_services: None,
    },
    Software {
        name: "acid",
        kind: SoftwareKind::ServiceBot,
        description: "Rizon's acid service bots",
        release: None,
        requires_ircd: Some("plexus4"),
        requires_services: Some("anope2"),
    },
    Software {
        name: "moo",
        kind: SoftwareKind::ServiceBot,
        description: "Rizon's moo bot",
        release: None,
        requires_ircd: Some("plexus4"),
        requires_services: Some("anope2"),
    },
];

/// Look up a package by name and kind
pub fn find(kind: SoftwareKind, name: &str) -> Option<&'static Software> {
    CATALOG.iter().find(|s| s.kind == kind && s.name == name)
}

/// All packages of one kind, sorted by name
pub fn list(kind: SoftwareKind) -> Vec<&'static Software> {
    let mut entries: Vec<_> = CATALOG.iter().filter(|s| s.kind == kind).collect();
    entries.sort_by_key(|s| s.name);
    entries
}
