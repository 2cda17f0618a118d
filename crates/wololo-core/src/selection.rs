//! Selection over an immutable snapshot of known pairs
//!
//! A collaborator that lets the user pick a device holds one of these instead
//! of the pair itself. The snapshot never changes; refreshing the cache means
//! building a new selection.

use std::sync::Arc;

use crate::address::{HardwareAddress, NetworkAddress};
use crate::device::DevicePair;

#[derive(Debug, Clone)]
pub struct DeviceSelection {
    snapshot: Arc<[DevicePair]>,
    index: Option<usize>,
}

impl DeviceSelection {
    /// Wrap a snapshot, selecting the first entry if there is one
    pub fn new(pairs: Vec<DevicePair>) -> Self {
        let index = if pairs.is_empty() { None } else { Some(0) };
        Self {
            snapshot: pairs.into(),
            index,
        }
    }

    pub fn pairs(&self) -> &[DevicePair] {
        &self.snapshot
    }

    pub fn index(&self) -> Option<usize> {
        self.index
    }

    pub fn selected(&self) -> Option<&DevicePair> {
        self.index.and_then(|i| self.snapshot.get(i))
    }

    /// Select by position. Out-of-range indices leave the selection unchanged.
    pub fn select(&mut self, index: usize) -> Option<&DevicePair> {
        if index < self.snapshot.len() {
            self.index = Some(index);
        }
        self.snapshot.get(index)
    }

    /// Select the first pair with the given network address
    pub fn select_address(&mut self, address: NetworkAddress) -> Option<&DevicePair> {
        let index = self.snapshot.iter().position(|p| p.address == address)?;
        self.select(index)
    }

    /// Select the first pair with the given hardware address
    pub fn select_hardware(&mut self, hardware: HardwareAddress) -> Option<&DevicePair> {
        let index = self.snapshot.iter().position(|p| p.hardware == hardware)?;
        self.select(index)
    }
}
