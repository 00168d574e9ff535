// Copyright (c) 2025 - Cowboy AI, Inc.
//! Network Value Objects with Validation Invariants

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;
use thiserror::Error;

/// Network validation error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NetworkError {
    #[error("Invalid IPv4 address format: {0}")]
    InvalidIpAddress(String),

    #[error("Invalid CIDR notation: {0}")]
    InvalidCidr(String),

    #[error("Invalid prefix length: {0} (must be 16-28 for a VPC or subnet)")]
    InvalidPrefixLength(u8),

    #[error("Address {address} is not aligned to /{prefix_length}")]
    Unaligned { address: Ipv4Addr, prefix_length: u8 },

    #[error("Subnet mask /{mask} does not fit inside {network}")]
    MaskDoesNotFit { network: String, mask: u8 },

    #[error("Address range {0} exhausted")]
    Exhausted(String),

    #[error("Invalid port range: {from}-{to}")]
    InvalidPortRange { from: u16, to: u16 },
}

/// IPv4 network block in CIDR notation
///
/// Invariants:
/// - Valid IPv4 address
/// - Prefix length within the 16-28 range the provider accepts
/// - Address aligned to the prefix (no host bits set)
///
/// # Examples
///
/// ```rust
/// use neptune_stack::domain::Cidr;
///
/// let vpc = Cidr::new("10.0.0.0/16").unwrap();
/// let first = vpc.subnet(24, 0).unwrap();
/// assert_eq!(first.to_string(), "10.0.0.0/24");
/// assert!(Cidr::new("10.0.0.1/16").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Cidr {
    address: Ipv4Addr,
    prefix_length: u8,
}

impl Cidr {
    /// Smallest block the provider accepts
    pub const MAX_PREFIX: u8 = 28;

    /// Largest block the provider accepts
    pub const MIN_PREFIX: u8 = 16;

    /// Parse a CIDR block (e.g. `"10.0.0.0/16"`)
    pub fn new(cidr: impl AsRef<str>) -> Result<Self, NetworkError> {
        let cidr = cidr.as_ref();
        let (addr_str, prefix_str) = cidr
            .split_once('/')
            .ok_or_else(|| NetworkError::InvalidCidr(cidr.to_string()))?;

        let address = Ipv4Addr::from_str(addr_str)
            .map_err(|_| NetworkError::InvalidIpAddress(addr_str.to_string()))?;

        let prefix_length = prefix_str
            .parse::<u8>()
            .map_err(|_| NetworkError::InvalidCidr(cidr.to_string()))?;

        Self::from_parts(address, prefix_length)
    }

    /// Create from separate address and prefix
    pub fn from_parts(address: Ipv4Addr, prefix_length: u8) -> Result<Self, NetworkError> {
        if !(Self::MIN_PREFIX..=Self::MAX_PREFIX).contains(&prefix_length) {
            return Err(NetworkError::InvalidPrefixLength(prefix_length));
        }

        if u32::from(address) & !Self::mask_bits(prefix_length) != 0 {
            return Err(NetworkError::Unaligned {
                address,
                prefix_length,
            });
        }

        Ok(Self {
            address,
            prefix_length,
        })
    }

    fn mask_bits(prefix_length: u8) -> u32 {
        // prefix_length is at least MIN_PREFIX, so the shift never overflows
        u32::MAX << (32 - u32::from(prefix_length))
    }

    /// Network address
    pub fn address(&self) -> Ipv4Addr {
        self.address
    }

    /// Prefix length
    pub fn prefix_length(&self) -> u8 {
        self.prefix_length
    }

    /// Number of `/mask` blocks that fit inside this network
    pub fn subnet_capacity(&self, mask: u8) -> Result<u32, NetworkError> {
        if mask < self.prefix_length || mask > Self::MAX_PREFIX {
            return Err(NetworkError::MaskDoesNotFit {
                network: self.to_string(),
                mask,
            });
        }
        Ok(1u32 << (mask - self.prefix_length))
    }

    /// The `index`-th `/mask` block inside this network
    pub fn subnet(&self, mask: u8, index: u32) -> Result<Cidr, NetworkError> {
        if index >= self.subnet_capacity(mask)? {
            return Err(NetworkError::Exhausted(self.to_string()));
        }
        let size = 1u32 << (32 - u32::from(mask));
        let base = u32::from(self.address) + index * size;
        Cidr::from_parts(Ipv4Addr::from(base), mask)
    }

    /// Check whether `other` lies entirely inside this network
    pub fn contains(&self, other: &Cidr) -> bool {
        other.prefix_length >= self.prefix_length
            && u32::from(other.address) & Self::mask_bits(self.prefix_length)
                == u32::from(self.address)
    }
}

impl Default for Cidr {
    /// `10.0.0.0/16`
    fn default() -> Self {
        Self {
            address: Ipv4Addr::new(10, 0, 0, 0),
            prefix_length: 16,
        }
    }
}

impl fmt::Display for Cidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.address, self.prefix_length)
    }
}

impl FromStr for Cidr {
    type Err = NetworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Cidr {
    type Error = NetworkError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Cidr> for String {
    fn from(cidr: Cidr) -> Self {
        cidr.to_string()
    }
}

/// Subnet tier placement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubnetType {
    /// Routes to an internet gateway
    Public,
    /// Routes outbound through a NAT gateway in the public tier
    PrivateWithEgress,
    /// No route to or from a public network
    PrivateIsolated,
}

impl SubnetType {
    /// Canonical name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "Public",
            Self::PrivateWithEgress => "Private",
            Self::PrivateIsolated => "Isolated",
        }
    }

    /// Whether subnets of this tier have any path to a public network
    pub fn is_isolated(&self) -> bool {
        matches!(self, Self::PrivateIsolated)
    }
}

impl fmt::Display for SubnetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// IP protocol of a traffic rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Tcp,
    Udp,
    /// Every protocol (`-1`)
    All,
}

impl Protocol {
    /// Value of the `IpProtocol` property
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tcp => "tcp",
            Self::Udp => "udp",
            Self::All => "-1",
        }
    }
}

/// Port range admitted by a traffic rule
///
/// # Examples
///
/// ```rust
/// use neptune_stack::domain::{Port, Protocol};
///
/// let gremlin = Port::tcp(8182);
/// assert_eq!(gremlin.protocol(), Protocol::Tcp);
/// assert_eq!(gremlin.range(), (8182, 8182));
/// assert!(gremlin.is_single());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Port {
    protocol: Protocol,
    from: u16,
    to: u16,
}

impl Port {
    /// A single TCP port
    pub fn tcp(port: u16) -> Self {
        Self {
            protocol: Protocol::Tcp,
            from: port,
            to: port,
        }
    }

    /// A TCP port range
    pub fn tcp_range(from: u16, to: u16) -> Result<Self, NetworkError> {
        if from > to {
            return Err(NetworkError::InvalidPortRange { from, to });
        }
        Ok(Self {
            protocol: Protocol::Tcp,
            from,
            to,
        })
    }

    /// Every protocol and port
    pub fn all_traffic() -> Self {
        Self {
            protocol: Protocol::All,
            from: 0,
            to: u16::MAX,
        }
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    pub fn range(&self) -> (u16, u16) {
        (self.from, self.to)
    }

    /// Whether the rule admits exactly one port
    pub fn is_single(&self) -> bool {
        self.protocol != Protocol::All && self.from == self.to
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.protocol {
            Protocol::All => f.write_str("ALL TRAFFIC"),
            p if self.from == self.to => write!(f, "{} {}", p.as_str().to_uppercase(), self.from),
            p => write!(f, "{} {}-{}", p.as_str().to_uppercase(), self.from, self.to),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_cidr() {
        let cidr = Cidr::new("10.0.0.0/16").unwrap();
        assert_eq!(cidr.address(), Ipv4Addr::new(10, 0, 0, 0));
        assert_eq!(cidr.prefix_length(), 16);
        assert_eq!(cidr.to_string(), "10.0.0.0/16");
    }

    #[test]
    fn test_invalid_cidr() {
        assert!(matches!(
            Cidr::new("10.0.0.0"),
            Err(NetworkError::InvalidCidr(_))
        ));
        assert!(matches!(
            Cidr::new("10.0.0.300/16"),
            Err(NetworkError::InvalidIpAddress(_))
        ));
        assert_eq!(
            Cidr::new("10.0.0.0/8").unwrap_err(),
            NetworkError::InvalidPrefixLength(8)
        );
        assert!(matches!(
            Cidr::new("10.0.1.0/16"),
            Err(NetworkError::Unaligned { .. })
        ));
    }

    #[test]
    fn test_subnet_carving() {
        let vpc = Cidr::new("10.0.0.0/16").unwrap();
        assert_eq!(vpc.subnet(24, 0).unwrap().to_string(), "10.0.0.0/24");
        assert_eq!(vpc.subnet(24, 1).unwrap().to_string(), "10.0.1.0/24");
        assert_eq!(vpc.subnet_capacity(24).unwrap(), 256);
        assert!(matches!(
            vpc.subnet(24, 256),
            Err(NetworkError::Exhausted(_))
        ));
        assert!(matches!(
            vpc.subnet(12, 0),
            Err(NetworkError::MaskDoesNotFit { .. })
        ));
    }

    #[test]
    fn test_port_display() {
        assert_eq!(Port::tcp(8182).to_string(), "TCP 8182");
        assert_eq!(Port::tcp_range(80, 443).unwrap().to_string(), "TCP 80-443");
        assert_eq!(Port::all_traffic().to_string(), "ALL TRAFFIC");
        assert!(!Port::all_traffic().is_single());
        assert!(Port::tcp_range(443, 80).is_err());
    }

    proptest! {
        #[test]
        fn prop_carved_subnets_stay_inside_network(index in 0u32..256) {
            let vpc = Cidr::new("10.0.0.0/16").unwrap();
            let subnet = vpc.subnet(24, index).unwrap();
            prop_assert!(vpc.contains(&subnet));
            prop_assert_eq!(subnet.prefix_length(), 24);
        }

        #[test]
        fn prop_distinct_indices_do_not_overlap(a in 0u32..64, b in 0u32..64) {
            prop_assume!(a != b);
            let vpc = Cidr::new("10.0.0.0/16").unwrap();
            let first = vpc.subnet(22, a).unwrap();
            let second = vpc.subnet(22, b).unwrap();
            prop_assert!(!first.contains(&second));
            prop_assert!(!second.contains(&first));
        }
    }
}
