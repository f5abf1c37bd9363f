//! Global settings command implementation.

use std::io::Write;

use tracing::info;
use wgmgr_config::{parse_ipv4_network, parse_ipv6_network, MeshConfig};

use crate::cli::{ConfigCommands, NewConfigArgs, SetCommands};
use crate::commands::Session;
use crate::error::CliError;
use crate::output::{ActionResult, ConfigSummary, OutputFormat};

/// Handler for config subcommands.
pub struct ConfigCommand<'a> {
    session: &'a Session,
}

impl<'a> ConfigCommand<'a> {
    /// Creates a new config command handler.
    #[must_use]
    pub const fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Executes the config subcommand.
    ///
    /// # Errors
    ///
    /// Returns error if the command fails.
    pub fn execute<W: Write, E: Write>(
        &self,
        out: &mut W,
        diag: &mut E,
        format: &OutputFormat,
        command: &ConfigCommands,
    ) -> Result<(), CliError> {
        match command {
            ConfigCommands::New(args) => self.new_config(out, format, args),
            ConfigCommands::Show => self.show(out, format),
            ConfigCommands::Set { setting } => self.set(out, diag, format, setting),
        }
    }

    fn new_config<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        args: &NewConfigArgs,
    ) -> Result<(), CliError> {
        let backend = self.session.backend();
        if backend.exists() && !args.force {
            return Err(CliError::AlreadyExists(backend.describe()));
        }

        let ipv4 = match args.ipv4.trim() {
            "" => None,
            cidr => Some(parse_ipv4_network(cidr)?),
        };
        let ipv6 = match args.ipv6.trim() {
            "" => None,
            cidr => Some(parse_ipv6_network(cidr)?),
        };

        let config = MeshConfig::new(args.port, ipv4, ipv6);
        backend.save(&config)?;
        info!(location = %backend.describe(), "created configuration");

        format.write(
            out,
            &ActionResult::done(format!("Created configuration at {}", backend.describe())),
        )
    }

    fn show<W: Write>(&self, out: &mut W, format: &OutputFormat) -> Result<(), CliError> {
        let config = self.session.load()?;
        format.write(out, &ConfigSummary::new(self.session.backend().describe(), &config))
    }

    fn set<W: Write, E: Write>(
        &self,
        out: &mut W,
        diag: &mut E,
        format: &OutputFormat,
        setting: &SetCommands,
    ) -> Result<(), CliError> {
        let message = match setting {
            SetCommands::DefaultPort { port } => {
                let updated = self
                    .session
                    .mutate(diag, |engine, config| engine.set_default_port(config, *port))?;
                format!("Default port is {port}; {updated} peer(s) updated")
            }
            SetCommands::Ipv4Subnet { network } => {
                let moved = self
                    .session
                    .mutate(diag, |engine, config| engine.set_ipv4_subnet(config, *network))?;
                format!("IPv4 subnet is {network}; {moved} peer(s) readdressed")
            }
            SetCommands::Ipv6Subnet { network } => {
                let moved = self
                    .session
                    .mutate(diag, |engine, config| engine.set_ipv6_subnet(config, *network))?;
                format!("IPv6 subnet is {network}; {moved} peer(s) readdressed")
            }
        };
        format.write(out, &ActionResult::done(message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{session_with, text};
    use tempfile::TempDir;
    use wgmgr_config::{NewPeer, DEFAULT_PORT};

    fn new_args(ipv4: &str, ipv6: &str, force: bool) -> NewConfigArgs {
        NewConfigArgs {
            ipv4: ipv4.to_string(),
            ipv6: ipv6.to_string(),
            port: DEFAULT_PORT,
            force,
        }
    }

    #[test]
    fn new_refuses_to_overwrite_without_force() {
        let dir = TempDir::new().expect("temp dir");
        let session = session_with(&dir.path().join("wgmgr.conf"), &MeshConfig::default());
        let (mut out, mut diag) = (Vec::<u8>::new(), Vec::<u8>::new());
        let cmd = ConfigCommand::new(&session);

        let result = cmd.execute(
            &mut out,
            &mut diag,
            &OutputFormat::default(),
            &ConfigCommands::New(new_args("10.0.0.0/24", "", false)),
        );
        assert!(matches!(result, Err(CliError::AlreadyExists(_))));

        cmd.execute(
            &mut out,
            &mut diag,
            &OutputFormat::default(),
            &ConfigCommands::New(new_args("10.1.0.0/24", "", true)),
        )
        .expect("forced");
        let config = session.load().expect("load");
        assert_eq!(config.ipv4_network().map(ToString::to_string).as_deref(), Some("10.1.0.0/24"));
        assert!(config.ipv6_network().is_none());
    }

    #[test]
    fn new_rejects_tiny_subnet() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("wgmgr.conf");
        let session = session_with(&path, &MeshConfig::default());
        std::fs::remove_file(&path).expect("remove seed");

        let result = ConfigCommand::new(&session).execute(
            &mut Vec::<u8>::new(),
            &mut Vec::<u8>::new(),
            &OutputFormat::default(),
            &ConfigCommands::New(new_args("10.0.0.0/32", "", false)),
        );
        assert!(matches!(result, Err(CliError::Config(_))));
        assert!(!path.exists());
    }

    #[test]
    fn set_default_port_reports_notices() {
        let dir = TempDir::new().expect("temp dir");
        let session = session_with(&dir.path().join("wgmgr.conf"), &MeshConfig::default());
        session
            .mutate(&mut Vec::<u8>::new(), |engine, config| {
                engine.add_peer(config, NewPeer::named("alpha"))
            })
            .expect("add peer");

        let (mut out, mut diag) = (Vec::new(), Vec::new());
        ConfigCommand::new(&session)
            .execute(
                &mut out,
                &mut diag,
                &OutputFormat::default(),
                &ConfigCommands::Set {
                    setting: SetCommands::DefaultPort { port: 4242 },
                },
            )
            .expect("set port");

        assert!(text(out).contains("1 peer(s) updated"));
        assert!(text(diag).contains("note: alpha: port set to 4242"));
        assert_eq!(session.load().expect("load").peers()[0].port().value, 4242);
    }

    #[test]
    fn set_same_port_warns() {
        let dir = TempDir::new().expect("temp dir");
        let session = session_with(&dir.path().join("wgmgr.conf"), &MeshConfig::default());
        let mut diag = Vec::new();
        ConfigCommand::new(&session)
            .execute(
                &mut Vec::<u8>::new(),
                &mut diag,
                &OutputFormat::default(),
                &ConfigCommands::Set {
                    setting: SetCommands::DefaultPort { port: DEFAULT_PORT },
                },
            )
            .expect("no-op");
        assert!(text(diag).starts_with("warning: default-port:"));
    }
}
