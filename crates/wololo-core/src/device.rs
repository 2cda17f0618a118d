//! Device and interface types

use std::fmt;

use crate::address::{HardwareAddress, NetworkAddress};

/// A discovered (network address, hardware address) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DevicePair {
    pub address: NetworkAddress,
    pub hardware: HardwareAddress,
}

impl DevicePair {
    pub fn new(address: NetworkAddress, hardware: HardwareAddress) -> Self {
        Self { address, hardware }
    }
}

impl fmt::Display for DevicePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.address, self.hardware)
    }
}

/// A local IPv4 address and the state of the interface carrying it.
///
/// Only used to decide broadcast eligibility; never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceDescriptor {
    /// OS interface name (e.g. "eth0")
    pub name: String,
    pub address: NetworkAddress,
    pub operationally_up: bool,
    pub supports_multicast: bool,
    pub is_loopback: bool,
}

impl InterfaceDescriptor {
    /// Whether a wake packet may be sent out of this interface
    pub fn is_eligible(&self) -> bool {
        self.operationally_up && self.supports_multicast && !self.is_loopback
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn iface(up: bool, multicast: bool, loopback: bool) -> InterfaceDescriptor {
        InterfaceDescriptor {
            name: "eth0".to_string(),
            address: Ipv4Addr::new(192, 168, 1, 10),
            operationally_up: up,
            supports_multicast: multicast,
            is_loopback: loopback,
        }
    }

    #[test]
    fn test_eligibility() {
        assert!(iface(true, true, false).is_eligible());
        assert!(!iface(false, true, false).is_eligible());
        assert!(!iface(true, false, false).is_eligible());
        assert!(!iface(true, true, true).is_eligible());
    }

    #[test]
    fn test_pair_display() {
        let pair = DevicePair::new(
            Ipv4Addr::new(10, 0, 0, 7),
            HardwareAddress::new([0, 0x11, 0x22, 0x33, 0x44, 0x55]),
        );
        assert_eq!(pair.to_string(), "10.0.0.7 (00-11-22-33-44-55)");
    }
}
