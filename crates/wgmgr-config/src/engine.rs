//! Operations that mutate a [`MeshConfig`].
//!
//! Every operation takes the configuration by `&mut`, runs to completion
//! without I/O and returns an [`Outcome`] with the notices it raised. Apart
//! from [`MutationEngine::regenerate_all_keys`], operations either commit
//! fully or leave the configuration untouched.

use std::collections::HashSet;
use std::net::{Ipv4Addr, Ipv6Addr};

use ipnet::{Ipv4Net, Ipv6Net};
use tracing::{debug, info};
use wgmgr_keys::{KeyPairProvider, PublicKey};

use crate::allocation::{next_free, SubnetAllocator};
use crate::assignable::Assignable;
use crate::error::{ConfigError, Result};
use crate::link::{LinkHost, LinkRecord};
use crate::mesh::{used_addresses, AddressSlot, MeshConfig};
use crate::notice::{Notice, NoticeKind, NoticeLog, Outcome};
use crate::peer::PeerRecord;

/// Request to add a peer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewPeer {
    /// Unique peer name.
    pub name: String,
    /// Pinned IPv4 address; drawn from the subnet when absent.
    pub ipv4: Option<Ipv4Addr>,
    /// Pinned IPv6 address; drawn from the subnet when absent.
    pub ipv6: Option<Ipv6Addr>,
    /// Pinned port; follows the default port when absent.
    pub port: Option<u16>,
}

impl NewPeer {
    /// A peer with every field left to the defaults.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Pins the IPv4 address.
    #[must_use]
    pub fn with_ipv4(mut self, addr: Ipv4Addr) -> Self {
        self.ipv4 = Some(addr);
        self
    }

    /// Pins the IPv6 address.
    #[must_use]
    pub fn with_ipv6(mut self, addr: Ipv6Addr) -> Self {
        self.ipv6 = Some(addr);
        self
    }

    /// Pins the port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }
}

/// Request to link two peers directly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewLink {
    /// Name of the first peer.
    pub peer1: String,
    /// Name of the second peer.
    pub peer2: String,
    /// Address the second peer uses to reach the first.
    pub endpoint1: Option<String>,
    /// Address the first peer uses to reach the second.
    pub endpoint2: Option<String>,
}

impl NewLink {
    /// A link between two named peers without endpoints.
    #[must_use]
    pub fn between(peer1: impl Into<String>, peer2: impl Into<String>) -> Self {
        Self {
            peer1: peer1.into(),
            peer2: peer2.into(),
            ..Self::default()
        }
    }

    /// Sets the endpoint of the first peer.
    #[must_use]
    pub fn with_endpoint1(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint1 = Some(endpoint.into());
        self
    }

    /// Sets the endpoint of the second peer.
    #[must_use]
    pub fn with_endpoint2(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint2 = Some(endpoint.into());
        self
    }
}

/// Applies mutations to a [`MeshConfig`], drawing key material from `P`.
#[derive(Debug, Clone, Default)]
pub struct MutationEngine<P> {
    keys: P,
}

impl<P: KeyPairProvider> MutationEngine<P> {
    /// Creates an engine using `keys` for all key generation.
    pub const fn new(keys: P) -> Self {
        Self { keys }
    }

    /// Adds a peer with a fresh key pair.
    ///
    /// Addresses not given explicitly are drawn from the configured subnets;
    /// a family without a subnet leaves the address absent. The new peer is
    /// appended after all existing peers.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::InvalidPeerName`] for an empty name
    /// - [`ConfigError::DuplicatePeer`] if the name is taken
    /// - [`ConfigError::InvalidPort`] for port 0
    /// - [`ConfigError::AddressExhausted`] if a subnet is full
    /// - [`ConfigError::Key`] if the key provider fails
    pub fn add_peer(&self, config: &mut MeshConfig, request: NewPeer) -> Result<Outcome<PeerRecord>> {
        let NewPeer {
            name,
            ipv4,
            ipv6,
            port,
        } = request;

        if name.trim().is_empty() {
            return Err(ConfigError::InvalidPeerName { name });
        }
        if config.contains_peer(&name) {
            return Err(ConfigError::DuplicatePeer { name });
        }
        if port == Some(0) {
            return Err(ConfigError::InvalidPort {
                value: "0".to_string(),
            });
        }

        let mut log = NoticeLog::default();
        let ipv4 = resolve_address::<Ipv4Net>(config, &name, ipv4, &mut log)?;
        let ipv6 = resolve_address::<Ipv6Net>(config, &name, ipv6, &mut log)?;
        let port = port.map_or_else(|| Assignable::auto(config.default_port), Assignable::manual);
        let keys = self.keys.generate_keypair()?;

        let mut peer = PeerRecord::new(name, keys, port);
        peer.ipv4 = ipv4;
        peer.ipv6 = ipv6;

        info!(
            peer = %peer.name,
            public_key = %peer.public_key,
            port = peer.port.value,
            "adding peer"
        );
        config.peers.push(peer.clone());

        Ok(log.finish(peer))
    }

    /// Removes a peer, keeping the order of the others.
    ///
    /// Links naming the peer are left in place and reported as
    /// [`NoticeKind::DanglingLinks`]; see
    /// [`MutationEngine::prune_dangling_links`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownPeer`] if there is no such peer.
    pub fn remove_peer(&self, config: &mut MeshConfig, name: &str) -> Result<Outcome<PeerRecord>> {
        let index = config.peer_index(name)?;
        let peer = config.peers.remove(index);

        let mut log = NoticeLog::default();
        let dangling = config
            .point_to_point
            .iter()
            .filter(|l| l.involves(&peer.public_key))
            .count();
        if dangling > 0 {
            log.push(Notice::new(
                NoticeKind::DanglingLinks,
                name,
                format!("{dangling} point-to-point link(s) still refer to this peer"),
            ));
        }

        info!(peer = %name, "removed peer");
        Ok(log.finish(peer))
    }

    /// Changes the default port and moves every auto-assigned peer port to it.
    ///
    /// Setting the current value again is a no-op reported as
    /// [`NoticeKind::PortUnchanged`]. Returns the number of peers updated.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidPort`] for port 0.
    pub fn set_default_port(&self, config: &mut MeshConfig, port: u16) -> Result<Outcome<usize>> {
        if port == 0 {
            return Err(ConfigError::InvalidPort {
                value: "0".to_string(),
            });
        }

        let mut log = NoticeLog::default();
        if port == config.default_port {
            log.push(Notice::new(
                NoticeKind::PortUnchanged,
                "default-port",
                format!("port already set to {port}, nothing to do"),
            ));
            return Ok(log.finish(0));
        }

        config.default_port = port;
        let mut updated = 0;
        for peer in config.peers.iter_mut().filter(|p| p.port.is_auto()) {
            peer.port.value = port;
            updated += 1;
            log.push(Notice::new(
                NoticeKind::PortUpdated,
                peer.name.as_str(),
                format!("port set to {port}"),
            ));
        }

        Ok(log.finish(updated))
    }

    /// Sets the IPv4 subnet and brings every peer's IPv4 address inside it.
    ///
    /// Addresses already inside the subnet stay, whatever their provenance.
    /// Peers outside it, or without an IPv4 address, receive the next free
    /// address and become auto-assigned; a pinned address replaced this way
    /// is reported as [`NoticeKind::ManualAddressReplaced`]. Returns the
    /// number of peers that received a new address.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::AddressExhausted`] if the subnet cannot hold
    /// every peer; the configuration is then left unchanged.
    pub fn set_ipv4_subnet(&self, config: &mut MeshConfig, network: Ipv4Net) -> Result<Outcome<usize>> {
        set_subnet(config, network.trunc())
    }

    /// Sets the IPv6 subnet; the IPv6 counterpart of
    /// [`MutationEngine::set_ipv4_subnet`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::AddressExhausted`] if the subnet cannot hold
    /// every peer; the configuration is then left unchanged.
    pub fn set_ipv6_subnet(&self, config: &mut MeshConfig, network: Ipv6Net) -> Result<Outcome<usize>> {
        set_subnet(config, network.trunc())
    }

    /// Gives a peer a fresh key pair and rekeys its links.
    ///
    /// Every link naming the old public key is pointed at the new one and
    /// gets a new preshared key. Other links are not touched. Returns the
    /// new public key.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::UnknownPeer`] if there is no such peer
    /// - [`ConfigError::Key`] if the key provider fails, in which case
    ///   nothing was changed
    pub fn regenerate_keys_for_peer(
        &self,
        config: &mut MeshConfig,
        name: &str,
    ) -> Result<Outcome<PublicKey>> {
        let mut log = NoticeLog::default();
        let key = self.rotate_peer(config, name, &mut log)?;
        Ok(log.finish(key))
    }

    /// Regenerates the keys of every peer, in peer order.
    ///
    /// Not atomic across peers: if the key provider fails part way, peers
    /// rotated before the failure keep their new keys. Returns the number of
    /// peers rotated.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Key`] if the key provider fails.
    pub fn regenerate_all_keys(&self, config: &mut MeshConfig) -> Result<Outcome<usize>> {
        let names: Vec<String> = config.peers.iter().map(|p| p.name.clone()).collect();
        let mut log = NoticeLog::default();
        for name in &names {
            self.rotate_peer(config, name, &mut log)?;
        }
        Ok(log.finish(names.len()))
    }

    fn rotate_peer(&self, config: &mut MeshConfig, name: &str, log: &mut NoticeLog) -> Result<PublicKey> {
        let index = config.peer_index(name)?;
        let old_key = config.peers[index].public_key;

        let keys = self.keys.generate_keypair()?;
        let new_key = *keys.public_key();
        let mut rekeyed = Vec::new();
        for (i, link) in config.point_to_point.iter().enumerate() {
            if link.involves(&old_key) {
                rekeyed.push((i, self.keys.generate_preshared_key()?));
            }
        }

        config.peers[index].replace_keys(keys);
        let links = rekeyed.len();
        for (i, psk) in rekeyed {
            let link = &mut config.point_to_point[i];
            link.rekey_host(&old_key, new_key);
            link.preshared_key = psk;

            let other = config.point_to_point[i]
                .other_end(&new_key)
                .and_then(|end| config.peer_by_public_key(&end.public_key))
                .map_or_else(|| "a removed peer".to_string(), |p| format!("peer {}", p.name));
            log.push(Notice::new(
                NoticeKind::LinkRekeyed,
                name,
                format!("link to {other} follows the new key with a fresh preshared key"),
            ));
        }

        info!(peer = %name, public_key = %new_key, links, "regenerated keys");
        Ok(new_key)
    }

    /// Creates a point-to-point link between two peers with a fresh
    /// preshared key.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::SelfLink`] if both names are the same
    /// - [`ConfigError::UnknownPeer`] if either peer is missing
    /// - [`ConfigError::DuplicateLink`] if the peers are already linked
    /// - [`ConfigError::Key`] if the key provider fails
    pub fn add_link(&self, config: &mut MeshConfig, request: NewLink) -> Result<Outcome<LinkRecord>> {
        let NewLink {
            peer1,
            peer2,
            endpoint1,
            endpoint2,
        } = request;

        if peer1 == peer2 {
            return Err(ConfigError::SelfLink { name: peer1 });
        }
        let key1 = config.get_peer(&peer1)?.public_key;
        let key2 = config.get_peer(&peer2)?.public_key;
        if config.point_to_point.iter().any(|l| l.connects(&key1, &key2)) {
            return Err(ConfigError::DuplicateLink { peer1, peer2 });
        }

        let link = LinkRecord::new(
            LinkHost::new(key1, endpoint1),
            LinkHost::new(key2, endpoint2),
            self.keys.generate_preshared_key()?,
        );
        info!(peer1 = %peer1, peer2 = %peer2, "adding point-to-point link");
        config.point_to_point.push(link.clone());

        Ok(Outcome::new(link))
    }

    /// Removes the link between two peers, in either orientation.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::UnknownPeer`] if either peer is missing
    /// - [`ConfigError::UnknownLink`] if the peers are not linked
    pub fn remove_link(
        &self,
        config: &mut MeshConfig,
        peer1: &str,
        peer2: &str,
    ) -> Result<Outcome<LinkRecord>> {
        let key1 = config.get_peer(peer1)?.public_key;
        let key2 = config.get_peer(peer2)?.public_key;
        let index = config
            .point_to_point
            .iter()
            .position(|l| l.connects(&key1, &key2))
            .ok_or_else(|| ConfigError::UnknownLink {
                peer1: peer1.to_string(),
                peer2: peer2.to_string(),
            })?;

        info!(peer1 = %peer1, peer2 = %peer2, "removing point-to-point link");
        Ok(Outcome::new(config.point_to_point.remove(index)))
    }

    /// Removes every link with an end that matches no current peer.
    /// Returns the number of links removed.
    pub fn prune_dangling_links(&self, config: &mut MeshConfig) -> Outcome<usize> {
        let keys: HashSet<PublicKey> = config.peers.iter().map(|p| p.public_key).collect();
        let before = config.point_to_point.len();
        config
            .point_to_point
            .retain(|l| keys.contains(&l.host1.public_key) && keys.contains(&l.host2.public_key));
        let removed = before - config.point_to_point.len();

        let mut log = NoticeLog::default();
        if removed > 0 {
            log.push(Notice::new(
                NoticeKind::LinksPruned,
                "point-to-point",
                format!("removed {removed} link(s) referring to missing peers"),
            ));
        }
        log.finish(removed)
    }
}

/// Picks the address of family `N` for a new peer.
fn resolve_address<N: AddressSlot>(
    config: &MeshConfig,
    name: &str,
    explicit: Option<N::Addr>,
    log: &mut NoticeLog,
) -> Result<Option<Assignable<N::Addr>>> {
    if let Some(addr) = explicit {
        if let Some(owner) = config
            .peers
            .iter()
            .find(|p| N::slot(p).is_some_and(|a| a.value == addr))
        {
            log.push(Notice::new(
                NoticeKind::AddressShared,
                name,
                format!("{} address {addr} is also used by peer {}", N::FAMILY, owner.name),
            ));
        }
        return Ok(Some(Assignable::manual(addr)));
    }

    let Some(network) = N::network(config) else {
        debug!(peer = %name, family = %N::FAMILY, "no subnet configured, leaving address unset");
        return Ok(None);
    };
    let addr = next_free(&network, &used_addresses::<N>(config))?;
    log.push(Notice::new(
        NoticeKind::AddressAssigned,
        name,
        format!("assigned {} address {addr}", N::FAMILY),
    ));
    Ok(Some(Assignable::auto(addr)))
}

/// Sets the subnet of family `N` after planning every reassignment.
fn set_subnet<N: AddressSlot>(config: &mut MeshConfig, network: N) -> Result<Outcome<usize>> {
    let kept = config
        .peers
        .iter()
        .filter_map(|p| N::slot(p).map(|a| a.value))
        .filter(|addr| network.contains_addr(addr));
    let mut allocator = SubnetAllocator::new(network, kept);

    let mut log = NoticeLog::default();
    let mut plan = Vec::new();
    for (index, peer) in config.peers.iter().enumerate() {
        match N::slot(peer) {
            Some(current) if network.contains_addr(&current.value) => {}
            Some(current) => {
                let addr = allocator.allocate()?;
                let notice = if current.is_auto() {
                    Notice::new(
                        NoticeKind::AddressAssigned,
                        peer.name.as_str(),
                        format!("{} address moved from {} to {addr}", N::FAMILY, current.value),
                    )
                } else {
                    Notice::new(
                        NoticeKind::ManualAddressReplaced,
                        peer.name.as_str(),
                        format!(
                            "pinned {} address {} is outside {network}, replaced with {addr}",
                            N::FAMILY,
                            current.value
                        ),
                    )
                };
                log.push(notice);
                plan.push((index, addr));
            }
            None => {
                let addr = allocator.allocate()?;
                log.push(Notice::new(
                    NoticeKind::AddressAssigned,
                    peer.name.as_str(),
                    format!("assigned {} address {addr}", N::FAMILY),
                ));
                plan.push((index, addr));
            }
        }
    }

    N::set_network(config, network);
    for (index, addr) in &plan {
        let slot = N::slot_mut(&mut config.peers[*index]);
        match slot {
            Some(current) => current.reassign(*addr),
            None => *slot = Some(Assignable::auto(*addr)),
        }
    }

    info!(family = %N::FAMILY, network = %network, reassigned = plan.len(), "subnet updated");
    Ok(log.finish(plan.len()))
}
