//! WireGuard key types and key generation for wgmgr.
//!
//! Provides the Curve25519 key types stored in a mesh configuration and the
//! [`KeyPairProvider`] capability the configuration engine draws fresh
//! secrets from.

#![forbid(unsafe_code)]

pub mod error;
mod keys;
mod provider;

pub use error::KeyError;
pub use keys::{KeyPair, PresharedKey, PrivateKey, PublicKey, KEY_SIZE};
pub use provider::{KeyPairProvider, NativeKeyProvider, WgToolProvider};
