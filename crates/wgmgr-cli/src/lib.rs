//! # wgmgr-cli
//!
//! Command-line interface for managing a `WireGuard` mesh configuration.
//!
//! Provides commands for:
//! - Creating a configuration and changing its global settings
//! - Peer management and key rotation
//! - Point-to-point links between peers
//!
//! # Architecture
//!
//! Every command loads the stored configuration through a
//! [`wgmgr_persist::Backend`], runs one [`wgmgr_config::MutationEngine`]
//! operation and saves the result.
//!
//! ```text
//! ┌───────────┐  load / save   ┌──────────────┐
//! │ wgmgr-cli │◄──────────────►│ wgmgr.conf   │
//! └─────┬─────┘                └──────────────┘
//!       │ one operation
//!       ▼
//! ┌──────────────┐   keys    ┌──────────────┐
//! │ wgmgr-config │◄──────────│ wgmgr-keys   │
//! └──────────────┘           └──────────────┘
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod commands;
pub mod error;
pub mod output;

pub use cli::{Cli, Commands, ConfigCommands, Format, Keygen, P2pCommands, PeerCommands};
pub use commands::Session;
pub use error::CliError;
pub use output::OutputFormat;
