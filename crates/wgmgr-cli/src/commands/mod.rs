//! CLI command implementations.
//!
//! Each submodule implements one command group:
//! - [`config`] - Create and change the global settings
//! - [`peer`] - Peer management
//! - [`p2p`] - Point-to-point links
//!
//! Every mutating command loads the configuration, applies one engine
//! operation and saves the result. Nothing is saved when the operation fails.

pub mod config;
pub mod p2p;
pub mod peer;

use std::io::Write;

use tracing::debug;
use wgmgr_config::{ConfigError, MeshConfig, MutationEngine, Outcome};
use wgmgr_keys::{KeyPairProvider, NativeKeyProvider, WgToolProvider};
use wgmgr_persist::{Backend, DocumentKeyBackend, FileBackend};

use crate::cli::{Cli, Keygen};
use crate::error::CliError;
use crate::output::write_notices;

pub use config::ConfigCommand;
pub use p2p::P2pCommand;
pub use peer::PeerCommand;

/// Engine type used by the CLI.
pub type Engine = MutationEngine<Box<dyn KeyPairProvider>>;

/// Storage backend and engine shared by all commands of one invocation.
pub struct Session {
    backend: Box<dyn Backend>,
    engine: Engine,
}

impl Session {
    /// Creates a session from explicit parts.
    #[must_use]
    pub fn new(backend: Box<dyn Backend>, keys: Box<dyn KeyPairProvider>) -> Self {
        Self {
            backend,
            engine: MutationEngine::new(keys),
        }
    }

    /// Creates a session from the global options.
    #[must_use]
    pub fn from_cli(cli: &Cli) -> Self {
        let backend: Box<dyn Backend> = match &cli.key {
            Some(key) => Box::new(DocumentKeyBackend::new(&cli.config, key.as_str())),
            None => Box::new(FileBackend::new(&cli.config)),
        };
        let keys: Box<dyn KeyPairProvider> = match cli.keygen {
            Keygen::Native => Box::new(NativeKeyProvider::new()),
            Keygen::WgTool => Box::new(WgToolProvider::new()),
        };
        debug!(location = %backend.describe(), keygen = ?cli.keygen, "session ready");
        Self::new(backend, keys)
    }

    /// The storage backend.
    #[must_use]
    pub fn backend(&self) -> &dyn Backend {
        self.backend.as_ref()
    }

    /// The mutation engine.
    #[must_use]
    pub const fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Loads the stored configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded.
    pub fn load(&self) -> Result<MeshConfig, CliError> {
        Ok(self.backend.load()?)
    }

    /// Loads the configuration, applies `operation` and saves the result.
    ///
    /// Notices are written to `diag` before the value is returned.
    ///
    /// # Errors
    ///
    /// Returns an error if loading, the operation or saving fails. The
    /// stored configuration is only replaced when the operation succeeds.
    pub fn mutate<T, E, F>(&self, diag: &mut E, operation: F) -> Result<T, CliError>
    where
        E: Write,
        F: FnOnce(&Engine, &mut MeshConfig) -> Result<Outcome<T>, ConfigError>,
    {
        let mut config = self.load()?;
        let outcome = operation(&self.engine, &mut config)?;
        self.backend.save(&config)?;
        write_notices(diag, &outcome.notices)?;
        Ok(outcome.value)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::path::Path;

    use super::Session;
    use wgmgr_config::MeshConfig;
    use wgmgr_keys::NativeKeyProvider;
    use wgmgr_persist::{Backend, FileBackend};

    /// A session over `path`, seeded with `config`.
    pub(crate) fn session_with(path: &Path, config: &MeshConfig) -> Session {
        let backend = FileBackend::new(path);
        backend.save(config).expect("seed config");
        Session::new(Box::new(backend), Box::new(NativeKeyProvider::new()))
    }

    pub(crate) fn text(buf: Vec<u8>) -> String {
        String::from_utf8(buf).expect("utf-8 output")
    }
}
