//! Key generation capability.
//!
//! The configuration engine never generates key material itself; it asks a
//! [`KeyPairProvider`] for fresh secrets. Two providers exist: an in-process
//! one built on `x25519-dalek`, and one that shells out to the `wg` tool.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::debug;

use crate::error::{KeyError, Result};
use crate::keys::{KeyPair, PresharedKey, PrivateKey, PublicKey};

/// Source of private keys, public key derivation and preshared keys.
pub trait KeyPairProvider {
    /// Generates a fresh private key.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider cannot produce a key.
    fn generate_private_key(&self) -> Result<PrivateKey>;

    /// Derives the public key belonging to `private`.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider cannot derive the key.
    fn derive_public_key(&self, private: &PrivateKey) -> Result<PublicKey>;

    /// Generates a fresh preshared key.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider cannot produce a key.
    fn generate_preshared_key(&self) -> Result<PresharedKey>;

    /// Generates a private key and derives its public key.
    ///
    /// # Errors
    ///
    /// Returns an error if either step fails.
    fn generate_keypair(&self) -> Result<KeyPair> {
        let private = self.generate_private_key()?;
        let public = self.derive_public_key(&private)?;
        Ok(KeyPair::new(private, public))
    }
}

impl<P: KeyPairProvider + ?Sized> KeyPairProvider for &P {
    fn generate_private_key(&self) -> Result<PrivateKey> {
        (**self).generate_private_key()
    }

    fn derive_public_key(&self, private: &PrivateKey) -> Result<PublicKey> {
        (**self).derive_public_key(private)
    }

    fn generate_preshared_key(&self) -> Result<PresharedKey> {
        (**self).generate_preshared_key()
    }
}

impl<P: KeyPairProvider + ?Sized> KeyPairProvider for Box<P> {
    fn generate_private_key(&self) -> Result<PrivateKey> {
        (**self).generate_private_key()
    }

    fn derive_public_key(&self, private: &PrivateKey) -> Result<PublicKey> {
        (**self).derive_public_key(private)
    }

    fn generate_preshared_key(&self) -> Result<PresharedKey> {
        (**self).generate_preshared_key()
    }
}

/// In-process Curve25519 key generation backed by the OS CSPRNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeKeyProvider;

impl NativeKeyProvider {
    /// Creates a new native provider.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl KeyPairProvider for NativeKeyProvider {
    fn generate_private_key(&self) -> Result<PrivateKey> {
        Ok(PrivateKey::generate())
    }

    fn derive_public_key(&self, private: &PrivateKey) -> Result<PublicKey> {
        Ok(private.public_key())
    }

    fn generate_preshared_key(&self) -> Result<PresharedKey> {
        Ok(PresharedKey::generate())
    }
}

/// Key generation through the `wg` command-line tool.
///
/// Runs `wg genkey`, `wg pubkey` (private key on stdin) and `wg genpsk`.
#[derive(Debug, Clone)]
pub struct WgToolProvider {
    program: PathBuf,
}

impl WgToolProvider {
    /// Uses the `wg` binary found on `PATH`.
    #[must_use]
    pub fn new() -> Self {
        Self::with_program("wg")
    }

    /// Uses a specific `wg` binary.
    #[must_use]
    pub fn with_program(program: impl AsRef<Path>) -> Self {
        Self {
            program: program.as_ref().to_path_buf(),
        }
    }

    /// Returns the program this provider runs.
    #[must_use]
    pub fn program(&self) -> &Path {
        &self.program
    }

    fn run(&self, subcommand: &str, stdin: Option<&str>) -> Result<String> {
        debug!(program = %self.program.display(), subcommand, "running wg");

        let mut child = Command::new(&self.program)
            .arg(subcommand)
            .stdin(if stdin.is_some() { Stdio::piped() } else { Stdio::null() })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                KeyError::Generation(format!("cannot run {}: {e}", self.program.display()))
            })?;

        if let Some(input) = stdin {
            let mut pipe = child
                .stdin
                .take()
                .ok_or_else(|| KeyError::Generation("stdin not captured".to_string()))?;
            writeln!(pipe, "{input}")
                .map_err(|e| KeyError::Generation(format!("writing to wg {subcommand}: {e}")))?;
        }

        let output = child
            .wait_with_output()
            .map_err(|e| KeyError::Generation(format!("wg {subcommand}: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(KeyError::Generation(format!(
                "wg {subcommand} failed: {}",
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

impl Default for WgToolProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyPairProvider for WgToolProvider {
    fn generate_private_key(&self) -> Result<PrivateKey> {
        PrivateKey::from_base64(&self.run("genkey", None)?)
    }

    fn derive_public_key(&self, private: &PrivateKey) -> Result<PublicKey> {
        PublicKey::from_base64(&self.run("pubkey", Some(&private.to_base64()))?)
    }

    fn generate_preshared_key(&self) -> Result<PresharedKey> {
        PresharedKey::from_base64(&self.run("genpsk", None)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn native_provider_pairs_match() {
        let provider = NativeKeyProvider::new();
        let pair = provider.generate_keypair().expect("keypair");
        assert_eq!(pair.private_key().public_key(), *pair.public_key());
    }

    #[test]
    fn native_provider_psks_are_fresh() {
        let provider = NativeKeyProvider::new();
        let a = provider.generate_preshared_key().expect("psk");
        let b = provider.generate_preshared_key().expect("psk");
        assert_ne!(a, b);
    }

    #[test]
    fn boxed_provider_delegates() {
        let provider: Box<dyn KeyPairProvider> = Box::new(NativeKeyProvider::new());
        let private = provider.generate_private_key().expect("private");
        assert_eq!(
            provider.derive_public_key(&private).expect("public"),
            private.public_key()
        );
    }

    #[test]
    fn wg_tool_missing_binary_is_generation_error() {
        let provider = WgToolProvider::with_program("/nonexistent/bin/wg");
        let err = provider.generate_private_key().expect_err("should fail");
        assert!(matches!(err, KeyError::Generation(_)));
    }

    #[test]
    fn wg_tool_defaults_to_path_lookup() {
        assert_eq!(WgToolProvider::default().program(), Path::new("wg"));
    }
}
