//! Deterministic key providers for tests.

use std::cell::Cell;
use std::sync::atomic::{AtomicU64, Ordering};

use wgmgr_keys::error::Result;
use wgmgr_keys::{KeyError, KeyPairProvider, PresharedKey, PrivateKey, PublicKey, KEY_SIZE};

use crate::engine::MutationEngine;
pub(crate) use crate::engine::NewPeer;

static NEXT_KEY: AtomicU64 = AtomicU64::new(1);

/// Hands out distinct keys from a process-wide counter, so engines created
/// by separate helpers never repeat a key.
#[derive(Debug, Default)]
pub(crate) struct SequentialKeyProvider;

impl SequentialKeyProvider {
    fn next_bytes(tag: u8) -> [u8; KEY_SIZE] {
        let n = NEXT_KEY.fetch_add(1, Ordering::Relaxed);
        let mut bytes = [tag; KEY_SIZE];
        // Bytes 0 and 31 are clamped by X25519; keep the counter clear of them.
        bytes[8..16].copy_from_slice(&n.to_le_bytes());
        bytes
    }
}

impl KeyPairProvider for SequentialKeyProvider {
    fn generate_private_key(&self) -> Result<PrivateKey> {
        Ok(PrivateKey::from_bytes_array(Self::next_bytes(0x11)))
    }

    fn derive_public_key(&self, private: &PrivateKey) -> Result<PublicKey> {
        Ok(private.public_key())
    }

    fn generate_preshared_key(&self) -> Result<PresharedKey> {
        Ok(PresharedKey::from_bytes_array(Self::next_bytes(0x22)))
    }
}

/// Generates `remaining` private keys, then fails.
#[derive(Debug)]
pub(crate) struct ExhaustingKeyProvider {
    inner: SequentialKeyProvider,
    remaining: Cell<usize>,
}

impl ExhaustingKeyProvider {
    pub(crate) fn new(remaining: usize) -> Self {
        Self {
            inner: SequentialKeyProvider,
            remaining: Cell::new(remaining),
        }
    }
}

impl KeyPairProvider for ExhaustingKeyProvider {
    fn generate_private_key(&self) -> Result<PrivateKey> {
        let remaining = self.remaining.get();
        if remaining == 0 {
            return Err(KeyError::Generation("entropy source exhausted".to_string()));
        }
        self.remaining.set(remaining - 1);
        self.inner.generate_private_key()
    }

    fn derive_public_key(&self, private: &PrivateKey) -> Result<PublicKey> {
        self.inner.derive_public_key(private)
    }

    fn generate_preshared_key(&self) -> Result<PresharedKey> {
        self.inner.generate_preshared_key()
    }
}

pub(crate) fn engine() -> MutationEngine<SequentialKeyProvider> {
    MutationEngine::new(SequentialKeyProvider)
}
