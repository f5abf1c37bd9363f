//! Peer management command implementation.

use std::io::Write;

use wgmgr_config::NewPeer;

use crate::cli::PeerCommands;
use crate::commands::Session;
use crate::error::CliError;
use crate::output::{ActionResult, LinkInfo, OutputFormat, PeerDetail, PeerInfo, PeerList};

/// Handler for peer subcommands.
pub struct PeerCommand<'a> {
    session: &'a Session,
}

impl<'a> PeerCommand<'a> {
    /// Creates a new peer command handler.
    #[must_use]
    pub const fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Executes the peer subcommand.
    ///
    /// # Errors
    ///
    /// Returns error if the command fails.
    pub fn execute<W: Write, E: Write>(
        &self,
        out: &mut W,
        diag: &mut E,
        format: &OutputFormat,
        command: &PeerCommands,
    ) -> Result<(), CliError> {
        match command {
            PeerCommands::Add {
                name,
                port,
                ipv4,
                ipv6,
            } => {
                let request = NewPeer {
                    name: name.clone(),
                    ipv4: *ipv4,
                    ipv6: *ipv6,
                    port: *port,
                };
                let peer = self
                    .session
                    .mutate(diag, |engine, config| engine.add_peer(config, request))?;
                format.write(out, &PeerInfo::from(&peer))
            }
            PeerCommands::Remove { name } => {
                let peer = self
                    .session
                    .mutate(diag, |engine, config| engine.remove_peer(config, name))?;
                format.write(out, &ActionResult::done(format!("Removed peer {}", peer.name())))
            }
            PeerCommands::List => {
                let config = self.session.load()?;
                format.write(out, &PeerList::new(&config))
            }
            PeerCommands::Show { name } => {
                let config = self.session.load()?;
                let peer = config.get_peer(name)?;
                let links = config
                    .links_for_peer(name)?
                    .into_iter()
                    .map(|link| LinkInfo::new(&config, link))
                    .collect();
                format.write(
                    out,
                    &PeerDetail {
                        peer: PeerInfo::from(peer),
                        links,
                    },
                )
            }
            PeerCommands::RegenerateKeys { name: Some(name) } => {
                let key = self.session.mutate(diag, |engine, config| {
                    engine.regenerate_keys_for_peer(config, name)
                })?;
                format.write(
                    out,
                    &ActionResult::done(format!("New public key of {name}: {key}")),
                )
            }
            PeerCommands::RegenerateKeys { name: None } => {
                let count = self
                    .session
                    .mutate(diag, |engine, config| engine.regenerate_all_keys(config))?;
                format.write(
                    out,
                    &ActionResult::done(format!("Regenerated keys of {count} peer(s)")),
                )
            }
        }
    }
}
