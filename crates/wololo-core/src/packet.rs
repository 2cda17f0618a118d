//! Wake-on-LAN magic packet construction

use crate::address::HardwareAddress;

const SYNC_BYTE: u8 = 0xFF;
const REPETITIONS: usize = 16;

/// Length of a magic packet: 6 sync bytes plus 16 copies of a 6-byte address
pub const MAGIC_PACKET_LEN: usize = 6 + REPETITIONS * 6;

/// A 102-byte Wake-on-LAN payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MagicPacket([u8; MAGIC_PACKET_LEN]);

impl MagicPacket {
    /// Build the payload for a target hardware address
    pub fn build(hardware: &HardwareAddress) -> Self {
        let mut bytes = [SYNC_BYTE; MAGIC_PACKET_LEN];
        for chunk in bytes[6..].chunks_exact_mut(6) {
            chunk.copy_from_slice(hardware.as_bytes());
        }
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl AsRef<[u8]> for MagicPacket {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}
