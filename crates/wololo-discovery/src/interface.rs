//! Local interface enumeration for broadcast

use std::net::IpAddr;
use std::sync::Arc;
use tracing::{debug, trace};
use wololo_core::InterfaceDescriptor;

use crate::error::DiscoveryError;

/// An interface as reported by the OS, before eligibility filtering
#[derive(Debug, Clone)]
pub struct RawInterface {
    pub name: String,
    pub addresses: Vec<IpAddr>,
    pub up: bool,
    pub multicast: bool,
    pub loopback: bool,
}

/// Source of the OS interface list
pub trait InterfaceSource: Send + Sync {
    fn interfaces(&self) -> Result<Vec<RawInterface>, DiscoveryError>;
}

/// Interfaces reported by the operating system via pnet's datalink layer
#[derive(Debug, Clone, Copy, Default)]
pub struct OsInterfaces;

impl InterfaceSource for OsInterfaces {
    fn interfaces(&self) -> Result<Vec<RawInterface>, DiscoveryError> {
        Ok(pnet::datalink::interfaces()
            .into_iter()
            .map(|iface| RawInterface {
                addresses: iface.ips.iter().map(|net| net.ip()).collect(),
                up: iface.is_up(),
                multicast: iface.is_multicast(),
                loopback: iface.is_loopback(),
                name: iface.name,
            })
            .collect())
    }
}

/// Lists local IPv4 addresses eligible for broadcast
#[derive(Clone)]
pub struct InterfaceEnumerator {
    source: Arc<dyn InterfaceSource>,
}

impl Default for InterfaceEnumerator {
    fn default() -> Self {
        Self::new(Arc::new(OsInterfaces))
    }
}

impl InterfaceEnumerator {
    pub fn new(source: Arc<dyn InterfaceSource>) -> Self {
        Self { source }
    }

    /// IPv4 addresses on interfaces that are up, multicast-capable, and not loopback.
    /// Order follows OS enumeration order.
    pub fn list_eligible_interfaces(&self) -> Result<Vec<InterfaceDescriptor>, DiscoveryError> {
        let raw = self.source.interfaces()?;
        let eligible = eligible_interfaces(&raw);
        debug!(
            reported = raw.len(),
            eligible = eligible.len(),
            "Enumerated local interfaces"
        );
        Ok(eligible)
    }
}

/// Expand interfaces into one descriptor per IPv4 address and keep the eligible ones
pub fn eligible_interfaces(raw: &[RawInterface]) -> Vec<InterfaceDescriptor> {
    raw.iter()
        .flat_map(|iface| {
            iface.addresses.iter().filter_map(move |addr| match addr {
                IpAddr::V4(v4) => Some(InterfaceDescriptor {
                    name: iface.name.clone(),
                    address: *v4,
                    operationally_up: iface.up,
                    supports_multicast: iface.multicast,
                    is_loopback: iface.loopback,
                }),
                IpAddr::V6(_) => None,
            })
        })
        .filter(|descriptor| {
            let eligible = descriptor.is_eligible();
            if !eligible {
                trace!(interface = %descriptor.name, ip = %descriptor.address, "Skipping ineligible interface");
            }
            eligible
        })
        .collect()
}
