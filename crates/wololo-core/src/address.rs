//! Network and hardware address types

use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;
use thiserror::Error;

/// A 4-byte IPv4 address. Stored as its dotted-quad text.
pub type NetworkAddress = Ipv4Addr;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("Invalid network address: {0:?}")]
    InvalidNetworkAddress(String),
    #[error("Invalid hardware address: {0:?}")]
    InvalidHardwareAddress(String),
}

/// Parse a dotted-quad IPv4 address, ignoring surrounding whitespace
pub fn parse_network_address(text: &str) -> Result<NetworkAddress, AddressError> {
    Ipv4Addr::from_str(text.trim())
        .map_err(|_| AddressError::InvalidNetworkAddress(text.to_string()))
}

/// A 6-byte link-layer (MAC) address.
///
/// The canonical text form is uppercase hex octets joined by dashes,
/// e.g. `AA-BB-CC-DD-EE-FF`. Parsing also accepts colon-delimited input
/// and either letter case, but the delimiter must be consistent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HardwareAddress([u8; 6]);

impl HardwareAddress {
    pub const fn new(octets: [u8; 6]) -> Self {
        Self(octets)
    }

    pub fn octets(&self) -> [u8; 6] {
        self.0
    }

    pub fn as_bytes(&self) -> &[u8; 6] {
        &self.0
    }
}

impl From<[u8; 6]> for HardwareAddress {
    fn from(octets: [u8; 6]) -> Self {
        Self(octets)
    }
}

impl fmt::Display for HardwareAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02X}-{b:02X}-{c:02X}-{d:02X}-{e:02X}-{g:02X}")
    }
}

impl FromStr for HardwareAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || AddressError::InvalidHardwareAddress(s.to_string());
        let trimmed = s.trim();

        let delimiter = if trimmed.contains('-') { '-' } else { ':' };
        let groups: Vec<&str> = trimmed.split(delimiter).collect();
        if groups.len() != 6 {
            return Err(invalid());
        }

        let mut octets = [0u8; 6];
        for (octet, group) in octets.iter_mut().zip(groups) {
            if group.len() != 2 || !group.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(invalid());
            }
            *octet = u8::from_str_radix(group, 16).map_err(|_| invalid())?;
        }

        Ok(Self(octets))
    }
}
