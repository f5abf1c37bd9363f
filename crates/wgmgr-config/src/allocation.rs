//! Host address allocation inside a subnet.
//!
//! Addresses are handed out in ascending order starting from the first
//! usable host of the subnet. The allocator never remembers anything between
//! runs: the set of used addresses is rebuilt from the peers of a
//! configuration each time an operation needs it.
//!
//! # Usable hosts
//!
//! ```text
//! IPv4  prefix < 31   network + 1 ..= broadcast - 1
//! IPv4  /31, /32      every address
//! IPv6  prefix < 127  network + 1 ..= last        (skips subnet-router anycast)
//! IPv6  /127, /128    every address
//! ```

use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::ops::RangeInclusive;

use ipnet::{Ipv4Net, Ipv6Net};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// IP address family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressFamily {
    /// IPv4.
    Ipv4,
    /// IPv6.
    Ipv6,
}

impl fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ipv4 => write!(f, "IPv4"),
            Self::Ipv6 => write!(f, "IPv6"),
        }
    }
}

/// A network whose host addresses can be enumerated.
pub trait Subnet: Copy + fmt::Display {
    /// Address type of this family.
    type Addr: Copy + Eq + Hash + fmt::Display + fmt::Debug;

    /// The family this network belongs to.
    const FAMILY: AddressFamily;

    /// Numeric range of the usable host addresses, inclusive.
    fn host_range(&self) -> RangeInclusive<u128>;

    /// Converts a number from [`Subnet::host_range`] back into an address.
    fn addr_from_bits(bits: u128) -> Self::Addr;

    /// Returns true if `addr` lies inside this network.
    fn contains_addr(&self, addr: &Self::Addr) -> bool;

    /// Number of usable host addresses.
    fn host_count(&self) -> u128 {
        let range = self.host_range();
        (range.end() - range.start()).saturating_add(1)
    }
}

impl Subnet for Ipv4Net {
    type Addr = Ipv4Addr;
    const FAMILY: AddressFamily = AddressFamily::Ipv4;

    fn host_range(&self) -> RangeInclusive<u128> {
        let network = u32::from(self.network());
        let broadcast = u32::from(self.broadcast());
        if self.prefix_len() < 31 {
            u128::from(network + 1)..=u128::from(broadcast - 1)
        } else {
            u128::from(network)..=u128::from(broadcast)
        }
    }

    fn addr_from_bits(bits: u128) -> Ipv4Addr {
        Ipv4Addr::from(bits as u32)
    }

    fn contains_addr(&self, addr: &Ipv4Addr) -> bool {
        self.contains(addr)
    }
}

impl Subnet for Ipv6Net {
    type Addr = Ipv6Addr;
    const FAMILY: AddressFamily = AddressFamily::Ipv6;

    fn host_range(&self) -> RangeInclusive<u128> {
        let network = u128::from(self.network());
        let last = u128::from(self.broadcast());
        if self.prefix_len() < 127 {
            (network + 1)..=last
        } else {
            network..=last
        }
    }

    fn addr_from_bits(bits: u128) -> Ipv6Addr {
        Ipv6Addr::from(bits)
    }

    fn contains_addr(&self, addr: &Ipv6Addr) -> bool {
        self.contains(addr)
    }
}

/// Returns the lowest usable host address of `subnet` not present in `used`.
///
/// # Errors
///
/// Returns [`ConfigError::AddressExhausted`] if every host address is used.
pub fn next_free<N: Subnet>(subnet: &N, used: &HashSet<N::Addr>) -> Result<N::Addr> {
    subnet
        .host_range()
        .map(N::addr_from_bits)
        .find(|addr| !used.contains(addr))
        .ok_or(ConfigError::AddressExhausted { family: N::FAMILY })
}

/// Allocator over one subnet with a growing set of used addresses.
///
/// Used by operations that hand out several addresses in one pass, so that
/// each allocation sees the ones committed before it.
#[derive(Debug, Clone)]
pub struct SubnetAllocator<N: Subnet> {
    subnet: N,
    used: HashSet<N::Addr>,
}

impl<N: Subnet> SubnetAllocator<N> {
    /// Creates an allocator that treats `used` as already taken.
    pub fn new(subnet: N, used: impl IntoIterator<Item = N::Addr>) -> Self {
        Self {
            subnet,
            used: used.into_iter().collect(),
        }
    }

    /// Returns the subnet being allocated from.
    pub const fn subnet(&self) -> &N {
        &self.subnet
    }

    /// Returns true if `addr` is already taken.
    pub fn is_used(&self, addr: &N::Addr) -> bool {
        self.used.contains(addr)
    }

    /// Marks an address as taken without allocating it.
    pub fn reserve(&mut self, addr: N::Addr) {
        self.used.insert(addr);
    }

    /// Returns the next free address without taking it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::AddressExhausted`] if the subnet is full.
    pub fn peek(&self) -> Result<N::Addr> {
        next_free(&self.subnet, &self.used)
    }

    /// Takes the next free address.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::AddressExhausted`] if the subnet is full.
    pub fn allocate(&mut self) -> Result<N::Addr> {
        let addr = self.peek()?;
        self.used.insert(addr);
        Ok(addr)
    }

    /// Number of host addresses still free.
    pub fn available(&self) -> u128 {
        let taken = self
            .used
            .iter()
            .filter(|addr| self.subnet.contains_addr(addr))
            .count();
        self.subnet.host_count().saturating_sub(taken as u128)
    }
}
