//! Errors raised by configuration operations.

use thiserror::Error;
use wgmgr_keys::KeyError;

use crate::allocation::AddressFamily;

/// Errors that can occur while reading or mutating a mesh configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A peer with this name already exists.
    #[error("peer already exists: {name}")]
    DuplicatePeer {
        /// The conflicting name.
        name: String,
    },
    /// No peer with this name exists.
    #[error("unknown peer: {name}")]
    UnknownPeer {
        /// The name that was looked up.
        name: String,
    },
    /// Peer names must be non-empty.
    #[error("invalid peer name: {name:?}")]
    InvalidPeerName {
        /// The rejected name.
        name: String,
    },
    /// Every usable host address of the subnet is taken.
    #[error("no free {family} address")]
    AddressExhausted {
        /// Address family of the exhausted subnet.
        family: AddressFamily,
    },
    /// A port outside 1..=65535.
    #[error("invalid port number {value} (should be in range 1..=65535)")]
    InvalidPort {
        /// The rejected value as given.
        value: String,
    },
    /// A subnet that cannot be used for address allocation.
    #[error("invalid {family} subnet {subnet}: {reason}")]
    InvalidSubnet {
        /// Address family the subnet was given for.
        family: AddressFamily,
        /// The rejected subnet as given.
        subnet: String,
        /// Why it was rejected.
        reason: String,
    },
    /// The two peers already share a point-to-point link.
    #[error("peers {peer1} and {peer2} are already linked")]
    DuplicateLink {
        /// First peer name.
        peer1: String,
        /// Second peer name.
        peer2: String,
    },
    /// No point-to-point link exists between the two peers.
    #[error("no link between peers {peer1} and {peer2}")]
    UnknownLink {
        /// First peer name.
        peer1: String,
        /// Second peer name.
        peer2: String,
    },
    /// A stored public key does not belong to the peer's private key.
    #[error("public key of peer {name} does not match its private key")]
    KeyMismatch {
        /// The peer with the inconsistent key pair.
        name: String,
    },
    /// A link must join two different peers.
    #[error("cannot link peer {name} to itself")]
    SelfLink {
        /// The peer named on both sides.
        name: String,
    },
    /// The key provider failed.
    #[error("key provider error: {0}")]
    Key(#[from] KeyError),
    /// The snapshot could not be encoded or decoded.
    #[error("invalid configuration snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),
}

/// Result alias for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;
