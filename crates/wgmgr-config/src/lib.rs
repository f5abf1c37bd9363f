//! Mesh configuration model and mutation engine for wgmgr.
//!
//! A [`MeshConfig`] holds the peers of a `WireGuard` mesh, the subnets their
//! addresses come from, the default listening port and any point-to-point
//! links. All changes go through a [`MutationEngine`], which keeps the
//! configuration consistent and reports what it did as [`Notice`]s.
//!
//! # Example
//!
//! ```
//! use wgmgr_config::{MeshConfig, MutationEngine, NewPeer, DEFAULT_PORT};
//! use wgmgr_keys::NativeKeyProvider;
//!
//! let mut config = MeshConfig::new(DEFAULT_PORT, Some("10.0.0.0/24".parse()?), None);
//! let engine = MutationEngine::new(NativeKeyProvider::new());
//!
//! let peer = engine.add_peer(&mut config, NewPeer::named("gateway"))?.into_value();
//! assert_eq!(peer.ipv4().map(|a| a.value.to_string()), Some("10.0.0.1".into()));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![forbid(unsafe_code)]

mod allocation;
mod assignable;
mod engine;
pub mod error;
mod link;
mod mesh;
mod notice;
mod peer;
mod validate;

#[cfg(test)]
mod testing;

pub use allocation::{next_free, AddressFamily, Subnet, SubnetAllocator};
pub use assignable::Assignable;
pub use engine::{MutationEngine, NewLink, NewPeer};
pub use error::ConfigError;
pub use link::{LinkHost, LinkRecord};
pub use mesh::{MeshConfig, DEFAULT_PORT};
pub use notice::{Notice, NoticeKind, Outcome, Severity};
pub use peer::PeerRecord;
pub use validate::{parse_ipv4_network, parse_ipv6_network, parse_port};
