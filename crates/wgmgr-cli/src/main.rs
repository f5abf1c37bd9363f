//! wgmgr CLI binary entrypoint.

use std::io;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use wgmgr_cli::cli::{Cli, Commands};
use wgmgr_cli::commands::{ConfigCommand, P2pCommand, PeerCommand, Session};
use wgmgr_cli::output::OutputFormat;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), wgmgr_cli::CliError> {
    let format = OutputFormat::new(cli.format);
    let session = Session::from_cli(cli);
    let mut stdout = io::stdout().lock();
    let mut stderr = io::stderr().lock();

    match &cli.command {
        Commands::Config { command } => {
            ConfigCommand::new(&session).execute(&mut stdout, &mut stderr, &format, command)
        }
        Commands::Peer { command } => {
            PeerCommand::new(&session).execute(&mut stdout, &mut stderr, &format, command)
        }
        Commands::P2p { command } => {
            P2pCommand::new(&session).execute(&mut stdout, &mut stderr, &format, command)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use wgmgr_cli::cli::{ConfigCommands, Format, Keygen, PeerCommands, SetCommands};

    #[test]
    fn cli_parses_peer_add() {
        let cli = Cli::parse_from(["wgmgr", "peer", "add", "gw", "-p", "4000", "-4", "10.0.0.9"]);
        match cli.command {
            Commands::Peer {
                command: PeerCommands::Add { name, port, ipv4, ipv6 },
            } => {
                assert_eq!(name, "gw");
                assert_eq!(port, Some(4000));
                assert_eq!(ipv4.map(|a| a.to_string()).as_deref(), Some("10.0.0.9"));
                assert!(ipv6.is_none());
            }
            _ => panic!("expected peer add command"),
        }
    }

    #[test]
    fn cli_config_new_defaults() {
        let cli = Cli::parse_from(["wgmgr", "config", "new"]);
        match cli.command {
            Commands::Config {
                command: ConfigCommands::New(args),
            } => {
                assert_eq!(args.ipv4, "10.0.0.0/24");
                assert_eq!(args.ipv6, "fd00:641:c767:bc00::/64");
                assert_eq!(args.port, 51820);
                assert!(!args.force);
            }
            _ => panic!("expected config new command"),
        }
    }

    #[test]
    fn cli_global_options_after_subcommand() {
        let cli = Cli::parse_from([
            "wgmgr", "peer", "list", "-c", "/tmp/mesh.json", "--format", "json", "-k", "wgmgr",
            "--keygen", "wg-tool",
        ]);
        assert_eq!(cli.config, Path::new("/tmp/mesh.json"));
        assert_eq!(cli.format, Format::Json);
        assert_eq!(cli.key.as_deref(), Some("wgmgr"));
        assert_eq!(cli.keygen, Keygen::WgTool);
    }

    #[test]
    fn cli_parses_set_subnet() {
        let cli = Cli::parse_from(["wgmgr", "config", "set", "ipv4-subnet", "172.16.0.0/16"]);
        assert!(matches!(
            cli.command,
            Commands::Config {
                command: ConfigCommands::Set {
                    setting: SetCommands::Ipv4Subnet { .. }
                }
            }
        ));
    }

    #[test]
    fn cli_rejects_out_of_range_ports() {
        for port in ["0", "-1", "90000"] {
            let result = Cli::try_parse_from(["wgmgr", "config", "set", "default-port", port]);
            assert!(result.is_err(), "port {port} accepted");
        }
    }

    #[test]
    fn cli_rejects_subnet_with_single_host() {
        let result = Cli::try_parse_from(["wgmgr", "config", "set", "ipv6-subnet", "fd00::/128"]);
        assert!(result.is_err());
    }

    #[test]
    fn run_without_config_fails() {
        let dir = tempfile::TempDir::new().expect("temp dir");
        let path = dir.path().join("absent.conf");
        let cli = Cli::parse_from(["wgmgr", "-c", path.to_str().expect("utf-8 path"), "peer", "list"]);
        assert!(matches!(
            run(&cli),
            Err(wgmgr_cli::CliError::Store(_))
        ));
    }
}
