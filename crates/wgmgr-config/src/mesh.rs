//! The mesh configuration aggregate and its snapshot codec.

use std::collections::HashSet;
use std::net::{Ipv4Addr, Ipv6Addr};

use ipnet::{Ipv4Net, Ipv6Net};
use serde::{Deserialize, Serialize};
use wgmgr_keys::PublicKey;

use crate::allocation::Subnet;
use crate::assignable::Assignable;
use crate::error::{ConfigError, Result};
use crate::link::LinkRecord;
use crate::peer::PeerRecord;

/// Default `WireGuard` listening port.
pub const DEFAULT_PORT: u16 = 51820;

/// Complete state of a mesh: global defaults, peers and point-to-point links.
///
/// Peers keep insertion order; names are unique. The struct serializes to
/// the snapshot shape storage backends exchange:
///
/// ```text
/// { ipv4_network, ipv6_network, default_port, peers: [...], point_to_point: [...] }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeshConfig {
    pub(crate) ipv4_network: Option<Ipv4Net>,
    pub(crate) ipv6_network: Option<Ipv6Net>,
    pub(crate) default_port: u16,
    #[serde(default)]
    pub(crate) peers: Vec<PeerRecord>,
    #[serde(default)]
    pub(crate) point_to_point: Vec<LinkRecord>,
}

impl MeshConfig {
    /// Creates an empty configuration.
    #[must_use]
    pub const fn new(
        default_port: u16,
        ipv4_network: Option<Ipv4Net>,
        ipv6_network: Option<Ipv6Net>,
    ) -> Self {
        Self {
            ipv4_network,
            ipv6_network,
            default_port,
            peers: Vec::new(),
            point_to_point: Vec::new(),
        }
    }

    /// IPv4 subnet addresses are drawn from.
    #[must_use]
    pub const fn ipv4_network(&self) -> Option<&Ipv4Net> {
        self.ipv4_network.as_ref()
    }

    /// IPv6 subnet addresses are drawn from.
    #[must_use]
    pub const fn ipv6_network(&self) -> Option<&Ipv6Net> {
        self.ipv6_network.as_ref()
    }

    /// Port given to peers without a pinned port.
    #[must_use]
    pub const fn default_port(&self) -> u16 {
        self.default_port
    }

    /// Peers in insertion order.
    #[must_use]
    pub fn peers(&self) -> &[PeerRecord] {
        &self.peers
    }

    /// Point-to-point links.
    #[must_use]
    pub fn links(&self) -> &[LinkRecord] {
        &self.point_to_point
    }

    /// Returns true if a peer named `name` exists.
    #[must_use]
    pub fn contains_peer(&self, name: &str) -> bool {
        self.peers.iter().any(|p| p.name == name)
    }

    /// Looks up a peer by name.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownPeer`] if there is no such peer.
    pub fn get_peer(&self, name: &str) -> Result<&PeerRecord> {
        self.peers
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| ConfigError::UnknownPeer { name: name.to_string() })
    }

    pub(crate) fn peer_index(&self, name: &str) -> Result<usize> {
        self.peers
            .iter()
            .position(|p| p.name == name)
            .ok_or_else(|| ConfigError::UnknownPeer { name: name.to_string() })
    }

    /// Looks up a peer by public key.
    #[must_use]
    pub fn peer_by_public_key(&self, key: &PublicKey) -> Option<&PeerRecord> {
        self.peers.iter().find(|p| p.public_key == *key)
    }

    /// Links with the named peer at either end.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownPeer`] if there is no such peer.
    pub fn links_for_peer(&self, name: &str) -> Result<Vec<&LinkRecord>> {
        let key = self.get_peer(name)?.public_key;
        Ok(self.point_to_point.iter().filter(|l| l.involves(&key)).collect())
    }

    /// Links with at least one end matching no current peer.
    #[must_use]
    pub fn dangling_links(&self) -> Vec<&LinkRecord> {
        self.point_to_point
            .iter()
            .filter(|l| self.is_dangling(l))
            .collect()
    }

    pub(crate) fn is_dangling(&self, link: &LinkRecord) -> bool {
        self.peer_by_public_key(&link.host1.public_key).is_none()
            || self.peer_by_public_key(&link.host2.public_key).is_none()
    }

    /// IPv4 addresses held by peers.
    #[must_use]
    pub fn used_ipv4_addresses(&self) -> HashSet<Ipv4Addr> {
        used_addresses::<Ipv4Net>(self)
    }

    /// IPv6 addresses held by peers.
    #[must_use]
    pub fn used_ipv6_addresses(&self) -> HashSet<Ipv6Addr> {
        used_addresses::<Ipv6Net>(self)
    }

    /// Checks the invariants a loaded snapshot must satisfy: unique,
    /// non-empty peer names, non-zero ports and public keys derived from
    /// their private keys.
    ///
    /// # Errors
    ///
    /// Returns the first violation found.
    pub fn validate(&self) -> Result<()> {
        if self.default_port == 0 {
            return Err(ConfigError::InvalidPort { value: "0".to_string() });
        }
        let mut names = HashSet::new();
        for peer in &self.peers {
            if peer.name.trim().is_empty() {
                return Err(ConfigError::InvalidPeerName { name: peer.name.clone() });
            }
            if !names.insert(peer.name.as_str()) {
                return Err(ConfigError::DuplicatePeer { name: peer.name.clone() });
            }
            if peer.port.value == 0 {
                return Err(ConfigError::InvalidPort { value: "0".to_string() });
            }
            if peer.private_key.public_key() != peer.public_key {
                return Err(ConfigError::KeyMismatch { name: peer.name.clone() });
            }
        }
        Ok(())
    }

    /// Serializes the configuration as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parses and validates a JSON snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid snapshot.
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Converts the configuration into a JSON value.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_value(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Builds and validates a configuration from a JSON value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not a valid snapshot.
    pub fn from_json_value(value: serde_json::Value) -> Result<Self> {
        let config: Self = serde_json::from_value(value)?;
        config.validate()?;
        Ok(config)
    }
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self::new(DEFAULT_PORT, None, None)
    }
}

/// Gives generic code access to one address family of a configuration.
pub(crate) trait AddressSlot: Subnet {
    fn network(config: &MeshConfig) -> Option<Self>;
    fn set_network(config: &mut MeshConfig, network: Self);
    fn slot(peer: &PeerRecord) -> Option<&Assignable<Self::Addr>>;
    fn slot_mut(peer: &mut PeerRecord) -> &mut Option<Assignable<Self::Addr>>;
}

impl AddressSlot for Ipv4Net {
    fn network(config: &MeshConfig) -> Option<Self> {
        config.ipv4_network
    }

    fn set_network(config: &mut MeshConfig, network: Self) {
        config.ipv4_network = Some(network);
    }

    fn slot(peer: &PeerRecord) -> Option<&Assignable<Ipv4Addr>> {
        peer.ipv4.as_ref()
    }

    fn slot_mut(peer: &mut PeerRecord) -> &mut Option<Assignable<Ipv4Addr>> {
        &mut peer.ipv4
    }
}

impl AddressSlot for Ipv6Net {
    fn network(config: &MeshConfig) -> Option<Self> {
        config.ipv6_network
    }

    fn set_network(config: &mut MeshConfig, network: Self) {
        config.ipv6_network = Some(network);
    }

    fn slot(peer: &PeerRecord) -> Option<&Assignable<Ipv6Addr>> {
        peer.ipv6.as_ref()
    }

    fn slot_mut(peer: &mut PeerRecord) -> &mut Option<Assignable<Ipv6Addr>> {
        &mut peer.ipv6
    }
}

/// Addresses of family `N` held by peers.
pub(crate) fn used_addresses<N: AddressSlot>(config: &MeshConfig) -> HashSet<N::Addr> {
    config
        .peers
        .iter()
        .filter_map(|p| N::slot(p).map(|a| a.value))
        .collect()
}
