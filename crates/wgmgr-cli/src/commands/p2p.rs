//! Point-to-point link command implementation.

use std::io::Write;

use wgmgr_config::NewLink;

use crate::cli::P2pCommands;
use crate::commands::Session;
use crate::error::CliError;
use crate::output::{ActionResult, LinkList, OutputFormat};

/// Handler for p2p subcommands.
pub struct P2pCommand<'a> {
    session: &'a Session,
}

impl<'a> P2pCommand<'a> {
    /// Creates a new p2p command handler.
    #[must_use]
    pub const fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Executes the p2p subcommand.
    ///
    /// # Errors
    ///
    /// Returns error if the command fails.
    pub fn execute<W: Write, E: Write>(
        &self,
        out: &mut W,
        diag: &mut E,
        format: &OutputFormat,
        command: &P2pCommands,
    ) -> Result<(), CliError> {
        match command {
            P2pCommands::Add {
                peer1,
                peer2,
                endpoint1,
                endpoint2,
            } => {
                let request = NewLink {
                    peer1: peer1.clone(),
                    peer2: peer2.clone(),
                    endpoint1: endpoint1.clone(),
                    endpoint2: endpoint2.clone(),
                };
                self.session
                    .mutate(diag, |engine, config| engine.add_link(config, request))?;
                format.write(out, &ActionResult::done(format!("Linked {peer1} and {peer2}")))
            }
            P2pCommands::Remove { peer1, peer2 } => {
                self.session
                    .mutate(diag, |engine, config| engine.remove_link(config, peer1, peer2))?;
                format.write(
                    out,
                    &ActionResult::done(format!("Removed link between {peer1} and {peer2}")),
                )
            }
            P2pCommands::List => {
                let config = self.session.load()?;
                format.write(out, &LinkList::new(&config))
            }
            P2pCommands::Prune => {
                let removed = self.session.mutate(diag, |engine, config| {
                    Ok(engine.prune_dangling_links(config))
                })?;
                format.write(
                    out,
                    &ActionResult::done(format!("Removed {removed} dangling link(s)")),
                )
            }
        }
    }
}
