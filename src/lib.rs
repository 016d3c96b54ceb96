//! # ircnetsim - Provisioning tool for simulated IRC networks
//!
//! This library generates the topology of a test IRC network and the
//! per-server information needed to configure each daemon in it.
//!
//! ## Overview
//!
//! A network is a tree of servers: client servers accept users, hubs and
//! core hubs relay between them, and services plus optional service bots
//! hang off a hub. Each server gets a unique SID, a display name, and for
//! client servers a client port; each link gets a port and a password.
//!
//! ## Architecture
//!
//! - `topology`: Network graph, incremental builder and validation
//! - `allocation`: SID, name, port and password assignment
//! - `serial`: YAML network map format
//! - `info`: Per-server bundles consumed by config writers
//! - `config` / `config_loader`: Configuration structures, file loading and CLI overrides
//! - `software`: Catalog of supported IRCds, services and bots
//! - `orchestrator`: The `generate` and `write` phases
//! - `error`: Topology error type
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use ircnetsim::{config_loader, orchestrator};
//! use std::path::Path;
//!
//! let config = config_loader::load_config(Path::new("network.yaml"))?;
//!
//! // Writes ircnet_output/map.yaml
//! orchestrator::generate(&config, Path::new("ircnet_output"))?;
//!
//! // Writes ircnet_output/configs/<server>.json and network.json
//! orchestrator::write_configs(Path::new("ircnet_output"))?;
//! # Ok::<(), color_eyre::eyre::Error>(())
//! ```
//!
//! ## Configuration Format
//!
//! ```yaml
//! network:
//!   name: "VagrIRC"
//!   suffix: ".dnt"
//!   servers: 6
//!   seed: 42          # optional
//! software:
//!   ircd: "plexus4"
//!   services: "anope2" # null for no services
//!   service_bots: ["acid"]
//! opers:
//!   - name: "dan"
//!     password: "hunter2"
//! ```
//!
//! ## Error Handling
//!
//! Graph and map operations return [`error::TopologyError`]. The application
//! layer wraps everything in `color_eyre` reports with file context.

pub mod allocation;
pub mod config;
pub mod config_loader;
pub mod error;
pub mod info;
pub mod orchestrator;
pub mod serial;
pub mod software;
pub mod topology;

pub use config::Config;
pub use error::TopologyError;
pub use topology::{Network, NetworkBuilder};
