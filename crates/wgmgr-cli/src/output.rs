//! Output formatting for CLI commands.
//!
//! Supports table (human-readable) and JSON output formats. Views never
//! carry private or preshared keys.

use std::io::Write;

use serde::Serialize;
use wgmgr_config::{Assignable, LinkRecord, MeshConfig, Notice, PeerRecord, Severity};
use wgmgr_keys::PublicKey;

use crate::cli::Format;
use crate::error::CliError;

/// Output formatter that handles both table and JSON output.
#[derive(Debug, Clone)]
pub struct OutputFormat {
    format: Format,
}

impl OutputFormat {
    /// Create a new output formatter.
    #[must_use]
    pub const fn new(format: Format) -> Self {
        Self { format }
    }

    /// Get the current format.
    #[must_use]
    pub const fn format(&self) -> Format {
        self.format
    }

    /// Check if JSON format is selected.
    #[must_use]
    pub const fn is_json(&self) -> bool {
        matches!(self.format, Format::Json)
    }

    /// Write a serializable value to the output.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write<W, T>(&self, writer: &mut W, value: &T) -> Result<(), CliError>
    where
        W: Write,
        T: Serialize + TableDisplay,
    {
        match self.format {
            Format::Json => {
                serde_json::to_writer_pretty(&mut *writer, value)
                    .map_err(|e| CliError::Format(format!("JSON serialization failed: {e}")))?;
                writeln!(writer)?;
            }
            Format::Table => {
                value.write_table(writer)?;
            }
        }
        Ok(())
    }

    /// Write a serializable value to a string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_string<T>(&self, value: &T) -> Result<String, CliError>
    where
        T: Serialize + TableDisplay,
    {
        let mut buf = Vec::new();
        self.write(&mut buf, value)?;
        String::from_utf8(buf).map_err(|e| CliError::Format(format!("UTF-8 error: {e}")))
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::new(Format::Table)
    }
}

/// Trait for types that can be displayed as a table.
pub trait TableDisplay {
    /// Write the value as a human-readable table.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError>;
}

/// Writes notices as `warning:` and `note:` lines.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_notices<W: Write>(writer: &mut W, notices: &[Notice]) -> Result<(), CliError> {
    for notice in notices {
        let label = match notice.severity() {
            Severity::Warning => "warning",
            Severity::Info => "note",
        };
        writeln!(writer, "{label}: {notice}")?;
    }
    Ok(())
}

/// Result of a mutating command.
#[derive(Debug, Clone, Serialize)]
pub struct ActionResult {
    /// Whether the change was saved.
    pub success: bool,
    /// What was done.
    pub message: String,
}

impl ActionResult {
    /// A successful action.
    #[must_use]
    pub fn done(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

impl TableDisplay for ActionResult {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "{}", self.message)?;
        Ok(())
    }
}

/// Global settings of a configuration.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigSummary {
    /// Storage location.
    pub location: String,
    /// IPv4 subnet, if enabled.
    pub ipv4_network: Option<String>,
    /// IPv6 subnet, if enabled.
    pub ipv6_network: Option<String>,
    /// Default listening port.
    pub default_port: u16,
    /// Number of peers.
    pub peers: usize,
    /// Number of point-to-point links.
    pub links: usize,
    /// Links referring to removed peers.
    pub dangling_links: usize,
}

impl ConfigSummary {
    /// Summarizes `config` stored at `location`.
    #[must_use]
    pub fn new(location: impl Into<String>, config: &MeshConfig) -> Self {
        Self {
            location: location.into(),
            ipv4_network: config.ipv4_network().map(ToString::to_string),
            ipv6_network: config.ipv6_network().map(ToString::to_string),
            default_port: config.default_port(),
            peers: config.peers().len(),
            links: config.links().len(),
            dangling_links: config.dangling_links().len(),
        }
    }
}

impl TableDisplay for ConfigSummary {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "Mesh Configuration")?;
        writeln!(writer, "══════════════════════════════════")?;
        writeln!(writer, "Location:         {}", self.location)?;
        writeln!(writer, "IPv4 Subnet:      {}", self.ipv4_network.as_deref().unwrap_or("disabled"))?;
        writeln!(writer, "IPv6 Subnet:      {}", self.ipv6_network.as_deref().unwrap_or("disabled"))?;
        writeln!(writer, "Default Port:     {}", self.default_port)?;
        writeln!(writer)?;
        writeln!(writer, "Peers:            {}", self.peers)?;
        writeln!(writer, "Links:            {}", self.links)?;
        if self.dangling_links > 0 {
            writeln!(writer, "  Dangling:       {} (run `wgmgr p2p prune`)", self.dangling_links)?;
        }
        Ok(())
    }
}

/// A value and whether it was assigned automatically.
#[derive(Debug, Clone, Serialize)]
pub struct AssignedValue {
    /// The value, rendered as text.
    pub value: String,
    /// Whether it follows the global defaults.
    pub auto: bool,
}

impl<T: ToString> From<&Assignable<T>> for AssignedValue {
    fn from(assigned: &Assignable<T>) -> Self {
        Self {
            value: assigned.value.to_string(),
            auto: assigned.is_auto(),
        }
    }
}

impl AssignedValue {
    fn cell(&self) -> String {
        if self.auto {
            self.value.clone()
        } else {
            format!("{}*", self.value)
        }
    }
}

fn optional_cell(value: Option<&AssignedValue>) -> String {
    value.map_or_else(|| "-".to_string(), AssignedValue::cell)
}

/// Public information about a peer.
#[derive(Debug, Clone, Serialize)]
pub struct PeerInfo {
    /// Peer name.
    pub name: String,
    /// Public key, base64.
    pub public_key: String,
    /// IPv4 address.
    pub ipv4: Option<AssignedValue>,
    /// IPv6 address.
    pub ipv6: Option<AssignedValue>,
    /// Listening port.
    pub port: AssignedValue,
}

impl From<&PeerRecord> for PeerInfo {
    fn from(peer: &PeerRecord) -> Self {
        Self {
            name: peer.name().to_string(),
            public_key: peer.public_key().to_string(),
            ipv4: peer.ipv4().map(AssignedValue::from),
            ipv6: peer.ipv6().map(AssignedValue::from),
            port: peer.port().into(),
        }
    }
}

/// List of peers for display.
#[derive(Debug, Clone, Serialize)]
pub struct PeerList {
    /// Peers in insertion order.
    pub peers: Vec<PeerInfo>,
}

impl PeerList {
    /// Lists every peer of `config`.
    #[must_use]
    pub fn new(config: &MeshConfig) -> Self {
        Self {
            peers: config.peers().iter().map(PeerInfo::from).collect(),
        }
    }
}

impl TableDisplay for PeerList {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        if self.peers.is_empty() {
            writeln!(writer, "No peers configured")?;
            return Ok(());
        }

        writeln!(
            writer,
            "{:<16}  {:<16}  {:<28}  {:<6}  {:<44}",
            "NAME", "IPV4", "IPV6", "PORT", "PUBLIC KEY"
        )?;
        writeln!(writer, "{}", "─".repeat(118))?;

        for peer in &self.peers {
            writeln!(
                writer,
                "{:<16}  {:<16}  {:<28}  {:<6}  {:<44}",
                truncate(&peer.name, 16),
                optional_cell(peer.ipv4.as_ref()),
                truncate(&optional_cell(peer.ipv6.as_ref()), 28),
                peer.port.cell(),
                peer.public_key
            )?;
        }

        writeln!(writer)?;
        writeln!(writer, "Total: {} peer(s); * marks pinned values", self.peers.len())?;
        Ok(())
    }
}

/// One peer with its links.
#[derive(Debug, Clone, Serialize)]
pub struct PeerDetail {
    /// The peer.
    #[serde(flatten)]
    pub peer: PeerInfo,
    /// Links with this peer at either end.
    pub links: Vec<LinkInfo>,
}

impl TableDisplay for PeerDetail {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        let peer = &self.peer;
        writeln!(writer, "Peer: {}", peer.name)?;
        writeln!(writer, "══════════════════════════════════")?;
        writeln!(writer, "Public Key:       {}", peer.public_key)?;
        writeln!(writer, "IPv4 Address:     {}", describe(peer.ipv4.as_ref()))?;
        writeln!(writer, "IPv6 Address:     {}", describe(peer.ipv6.as_ref()))?;
        writeln!(writer, "Port:             {}", describe(Some(&peer.port)))?;

        if !self.links.is_empty() {
            writeln!(writer)?;
            writeln!(writer, "Links")?;
            for link in &self.links {
                let (other, endpoint) = if link.peer1 == peer.name {
                    (&link.peer2, &link.endpoint2)
                } else {
                    (&link.peer1, &link.endpoint1)
                };
                match endpoint {
                    Some(endpoint) => writeln!(writer, "  {other} via {endpoint}")?,
                    None => writeln!(writer, "  {other}")?,
                }
            }
        }
        Ok(())
    }
}

fn describe(value: Option<&AssignedValue>) -> String {
    match value {
        Some(v) if v.auto => format!("{} (auto)", v.value),
        Some(v) => format!("{} (pinned)", v.value),
        None => "none".to_string(),
    }
}

/// A point-to-point link by peer name.
#[derive(Debug, Clone, Serialize)]
pub struct LinkInfo {
    /// Name of the first peer, or its public key if it no longer exists.
    pub peer1: String,
    /// Name of the second peer, or its public key if it no longer exists.
    pub peer2: String,
    /// Endpoint of the first peer.
    pub endpoint1: Option<String>,
    /// Endpoint of the second peer.
    pub endpoint2: Option<String>,
    /// Whether an end refers to a removed peer.
    pub dangling: bool,
}

impl LinkInfo {
    /// Describes `link` using the peer names of `config`.
    #[must_use]
    pub fn new(config: &MeshConfig, link: &LinkRecord) -> Self {
        let name = |key: &PublicKey| {
            config
                .peer_by_public_key(key)
                .map(|p| p.name().to_string())
        };
        let peer1 = name(&link.host1().public_key);
        let peer2 = name(&link.host2().public_key);
        Self {
            dangling: peer1.is_none() || peer2.is_none(),
            peer1: peer1.unwrap_or_else(|| link.host1().public_key.to_string()),
            peer2: peer2.unwrap_or_else(|| link.host2().public_key.to_string()),
            endpoint1: link.host1().endpoint.clone(),
            endpoint2: link.host2().endpoint.clone(),
        }
    }
}

/// List of links for display.
#[derive(Debug, Clone, Serialize)]
pub struct LinkList {
    /// Links in insertion order.
    pub links: Vec<LinkInfo>,
}

impl LinkList {
    /// Lists every link of `config`.
    #[must_use]
    pub fn new(config: &MeshConfig) -> Self {
        Self {
            links: config
                .links()
                .iter()
                .map(|link| LinkInfo::new(config, link))
                .collect(),
        }
    }
}

impl TableDisplay for LinkList {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        if self.links.is_empty() {
            writeln!(writer, "No point-to-point links")?;
            return Ok(());
        }

        writeln!(
            writer,
            "{:<16}  {:<24}  {:<16}  {:<24}",
            "PEER1", "ENDPOINT1", "PEER2", "ENDPOINT2"
        )?;
        writeln!(writer, "{}", "─".repeat(86))?;

        for link in &self.links {
            writeln!(
                writer,
                "{:<16}  {:<24}  {:<16}  {:<24}{}",
                truncate(&link.peer1, 16),
                truncate(link.endpoint1.as_deref().unwrap_or("-"), 24),
                truncate(&link.peer2, 16),
                truncate(link.endpoint2.as_deref().unwrap_or("-"), 24),
                if link.dangling { "  (dangling)" } else { "" }
            )?;
        }

        writeln!(writer)?;
        writeln!(writer, "Total: {} link(s)", self.links.len())?;
        Ok(())
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len > 3 {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{head}...")
    } else {
        s.chars().take(max_len).collect()
    }
}
