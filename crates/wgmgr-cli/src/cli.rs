//! Command-line argument parsing with clap.

use std::net::{Ipv4Addr, Ipv6Addr};
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use ipnet::{Ipv4Net, Ipv6Net};
use wgmgr_config::{parse_ipv4_network, parse_ipv6_network, parse_port};

/// Configuration file used when neither `--config` nor `WGMGR_CONFIG` is set.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/wgmgr.conf";

/// IPv4 subnet of a new configuration.
pub const DEFAULT_IPV4_NETWORK: &str = "10.0.0.0/24";

/// IPv6 subnet of a new configuration.
pub const DEFAULT_IPV6_NETWORK: &str = "fd00:641:c767:bc00::/64";

/// wgmgr - manage the configuration of a `WireGuard` peer mesh.
#[derive(Parser, Debug, Clone)]
#[command(name = "wgmgr")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path of the configuration file.
    #[arg(
        short,
        long,
        global = true,
        env = "WGMGR_CONFIG",
        default_value = DEFAULT_CONFIG_PATH
    )]
    pub config: PathBuf,

    /// Store the configuration under this key of a larger JSON document.
    #[arg(short, long, global = true)]
    pub key: Option<String>,

    /// Output format.
    #[arg(long, global = true, value_enum, default_value_t = Format::Table)]
    pub format: Format,

    /// Where fresh keys come from.
    #[arg(long, global = true, value_enum, default_value_t = Keygen::Native)]
    pub keygen: Keygen,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Format {
    /// Human-readable table format.
    #[default]
    Table,
    /// JSON output for scripting.
    Json,
}

/// Key generation backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Keygen {
    /// Generate keys in-process.
    #[default]
    Native,
    /// Run the `wg` tool (`wg genkey`, `wg pubkey`, `wg genpsk`).
    WgTool,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Create, inspect and change the global settings.
    Config {
        /// Config subcommand to execute.
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Manage peers.
    Peer {
        /// Peer subcommand to execute.
        #[command(subcommand)]
        command: PeerCommands,
    },

    /// Manage direct point-to-point links between peers.
    P2p {
        /// Link subcommand to execute.
        #[command(subcommand)]
        command: P2pCommands,
    },
}

/// Config subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommands {
    /// Create a new, empty configuration.
    New(NewConfigArgs),

    /// Show the global settings.
    Show,

    /// Change a global setting.
    Set {
        /// Setting to change.
        #[command(subcommand)]
        setting: SetCommands,
    },
}

/// Arguments for `config new`.
#[derive(Args, Debug, Clone)]
pub struct NewConfigArgs {
    /// IPv4 network in CIDR notation, or an empty string to disable IPv4.
    #[arg(short = '4', long = "ipv4", default_value = DEFAULT_IPV4_NETWORK)]
    pub ipv4: String,

    /// IPv6 network in CIDR notation, or an empty string to disable IPv6.
    #[arg(short = '6', long = "ipv6", default_value = DEFAULT_IPV6_NETWORK)]
    pub ipv6: String,

    /// Default port for peers.
    #[arg(
        short,
        long,
        default_value = "51820",
        value_parser = parse_port,
        allow_hyphen_values = true
    )]
    pub port: u16,

    /// Overwrite an existing configuration.
    #[arg(short, long)]
    pub force: bool,
}

/// Global settings that can be changed.
#[derive(Subcommand, Debug, Clone)]
pub enum SetCommands {
    /// Change the default port; peers without a pinned port follow it.
    DefaultPort {
        /// New default port.
        #[arg(value_parser = parse_port, allow_hyphen_values = true)]
        port: u16,
    },

    /// Change the IPv4 subnet; peers outside it get new addresses.
    Ipv4Subnet {
        /// Network in CIDR notation.
        #[arg(value_parser = parse_ipv4_network)]
        network: Ipv4Net,
    },

    /// Change the IPv6 subnet; peers outside it get new addresses.
    Ipv6Subnet {
        /// Network in CIDR notation.
        #[arg(value_parser = parse_ipv6_network)]
        network: Ipv6Net,
    },
}

/// Peer subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum PeerCommands {
    /// Add a peer with a fresh key pair.
    Add {
        /// Unique peer name.
        name: String,

        /// Pin the listening port instead of following the default.
        #[arg(short, long, value_parser = parse_port, allow_hyphen_values = true)]
        port: Option<u16>,

        /// Pin the IPv4 address instead of drawing one from the subnet.
        #[arg(short = '4', long = "ipv4")]
        ipv4: Option<Ipv4Addr>,

        /// Pin the IPv6 address instead of drawing one from the subnet.
        #[arg(short = '6', long = "ipv6")]
        ipv6: Option<Ipv6Addr>,
    },

    /// Remove a peer. Links to it are kept until `p2p prune`.
    Remove {
        /// Peer name.
        name: String,
    },

    /// List all peers.
    List,

    /// Show one peer and its links.
    Show {
        /// Peer name.
        name: String,
    },

    /// Generate new keys for one peer, or for every peer.
    ///
    /// Links of a rekeyed peer follow the new key and get a new preshared key.
    RegenerateKeys {
        /// Peer name; all peers when omitted.
        name: Option<String>,
    },
}

/// Point-to-point link subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum P2pCommands {
    /// Link two peers directly.
    Add {
        /// Name of one peer.
        peer1: String,

        /// Name of the other peer.
        peer2: String,

        /// Endpoint address for peer2 to reach peer1.
        #[arg(long)]
        endpoint1: Option<String>,

        /// Endpoint address for peer1 to reach peer2.
        #[arg(long)]
        endpoint2: Option<String>,
    },

    /// Remove the link between two peers.
    Remove {
        /// Name of one peer.
        peer1: String,

        /// Name of the other peer.
        peer2: String,
    },

    /// List all links.
    List,

    /// Remove links that refer to peers which no longer exist.
    Prune,
}
