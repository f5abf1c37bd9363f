//! Peer records.

use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

use serde::{Deserialize, Serialize};
use wgmgr_keys::{KeyPair, PrivateKey, PublicKey};

use crate::assignable::Assignable;

/// One mesh participant.
///
/// The key pair is only ever replaced as a whole, so the public key always
/// belongs to the private key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerRecord {
    pub(crate) name: String,
    pub(crate) private_key: PrivateKey,
    pub(crate) public_key: PublicKey,
    pub(crate) ipv4: Option<Assignable<Ipv4Addr>>,
    pub(crate) ipv6: Option<Assignable<Ipv6Addr>>,
    pub(crate) port: Assignable<u16>,
}

impl PeerRecord {
    pub(crate) fn new(name: String, keys: KeyPair, port: Assignable<u16>) -> Self {
        let (private_key, public_key) = keys.into_parts();
        Self {
            name,
            private_key,
            public_key,
            ipv4: None,
            ipv6: None,
            port,
        }
    }

    /// Unique peer name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The peer's private key.
    #[must_use]
    pub const fn private_key(&self) -> &PrivateKey {
        &self.private_key
    }

    /// The peer's public key.
    #[must_use]
    pub const fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// IPv4 address, if the peer has one.
    #[must_use]
    pub const fn ipv4(&self) -> Option<&Assignable<Ipv4Addr>> {
        self.ipv4.as_ref()
    }

    /// IPv6 address, if the peer has one.
    #[must_use]
    pub const fn ipv6(&self) -> Option<&Assignable<Ipv6Addr>> {
        self.ipv6.as_ref()
    }

    /// Listening port.
    #[must_use]
    pub const fn port(&self) -> &Assignable<u16> {
        &self.port
    }

    pub(crate) fn replace_keys(&mut self, keys: KeyPair) -> PublicKey {
        let (private_key, public_key) = keys.into_parts();
        self.private_key = private_key;
        std::mem::replace(&mut self.public_key, public_key)
    }
}

impl fmt::Display for PeerRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
