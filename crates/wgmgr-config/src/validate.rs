//! Parsing of operator-supplied ports and subnets.

use std::str::FromStr;

use ipnet::{Ipv4Net, Ipv6Net};

use crate::allocation::Subnet;
use crate::error::{ConfigError, Result};

/// Parses a listening port, accepting 1..=65535.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidPort`] carrying the raw input otherwise.
pub fn parse_port(value: &str) -> Result<u16> {
    let invalid = || ConfigError::InvalidPort {
        value: value.to_string(),
    };
    match value.trim().parse::<i64>() {
        Ok(port) => u16::try_from(port)
            .ok()
            .filter(|p| *p != 0)
            .ok_or_else(invalid),
        Err(_) => Err(invalid()),
    }
}

/// Parses an IPv4 subnet in CIDR notation.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidSubnet`] if the text is not a network
/// address with a prefix or leaves fewer than two usable hosts.
pub fn parse_ipv4_network(value: &str) -> Result<Ipv4Net> {
    parse_network(value)
}

/// Parses an IPv6 subnet in CIDR notation.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidSubnet`] if the text is not a network
/// address with a prefix or leaves fewer than two usable hosts.
pub fn parse_ipv6_network(value: &str) -> Result<Ipv6Net> {
    parse_network(value)
}

trait Network: Subnet + FromStr {
    fn has_host_bits(&self) -> bool;
}

impl Network for Ipv4Net {
    fn has_host_bits(&self) -> bool {
        *self != self.trunc()
    }
}

impl Network for Ipv6Net {
    fn has_host_bits(&self) -> bool {
        *self != self.trunc()
    }
}

fn parse_network<N: Network>(value: &str) -> Result<N> {
    let invalid = |reason: &str| ConfigError::InvalidSubnet {
        family: N::FAMILY,
        subnet: value.to_string(),
        reason: reason.to_string(),
    };

    let network: N = value
        .trim()
        .parse()
        .map_err(|_| invalid("expected an address with a prefix length"))?;
    if network.has_host_bits() {
        return Err(invalid("host bits set"));
    }
    if network.host_count() < 2 {
        return Err(invalid("subnet must contain at least two hosts"));
    }
    Ok(network)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocation::AddressFamily;
    use test_case::test_case;

    #[test_case("51820", 51820 ; "default")]
    #[test_case("1", 1 ; "lowest")]
    #[test_case("65535", 65535 ; "highest")]
    #[test_case(" 4000 ", 4000 ; "surrounding whitespace")]
    fn parse_port_accepts(input: &str, expected: u16) {
        assert_eq!(parse_port(input).expect("valid port"), expected);
    }

    #[test_case("0" ; "zero")]
    #[test_case("-1" ; "negative")]
    #[test_case("90000" ; "too large")]
    #[test_case("http" ; "not a number")]
    #[test_case("" ; "empty")]
    fn parse_port_rejects(input: &str) {
        assert!(matches!(
            parse_port(input),
            Err(ConfigError::InvalidPort { value }) if value == input
        ));
    }

    #[test_case("10.0.0.0/24" ; "slash 24")]
    #[test_case("10.0.0.0/30" ; "slash 30")]
    #[test_case("10.0.0.0/31" ; "slash 31")]
    fn parse_ipv4_network_accepts(input: &str) {
        let net = parse_ipv4_network(input).expect("valid subnet");
        assert_eq!(net.to_string(), input);
    }

    #[test_case("10.0.0.1/24" ; "host bits set")]
    #[test_case("10.0.0.1/32" ; "single host")]
    #[test_case("10.0.0.0" ; "missing prefix")]
    #[test_case("fd00::/64" ; "wrong family")]
    #[test_case("ipv4" ; "garbage")]
    fn parse_ipv4_network_rejects(input: &str) {
        assert!(matches!(
            parse_ipv4_network(input),
            Err(ConfigError::InvalidSubnet { family: AddressFamily::Ipv4, .. })
        ));
    }

    #[test_case("fd00:641:c767:bc00::/64" ; "slash 64")]
    #[test_case("fd00::/127" ; "slash 127")]
    fn parse_ipv6_network_accepts(input: &str) {
        let net = parse_ipv6_network(input).expect("valid subnet");
        assert_eq!(net.to_string(), input);
    }

    #[test_case("fd00::1/64" ; "host bits set")]
    #[test_case("fd00::/128" ; "single host")]
    #[test_case("10.0.0.0/24" ; "wrong family")]
    fn parse_ipv6_network_rejects(input: &str) {
        assert!(matches!(
            parse_ipv6_network(input),
            Err(ConfigError::InvalidSubnet { family: AddressFamily::Ipv6, .. })
        ));
    }
}
