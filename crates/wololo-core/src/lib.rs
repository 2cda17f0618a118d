//! Wololo Core - Core types, magic packets, and the device cache
//!
//! This crate provides the foundational types for the Wololo system:
//! - Network and hardware address types with their canonical text forms
//! - Wake-on-LAN magic packet construction
//! - An embedded, file-backed document store
//! - The device cache of discovered address pairs
//! - A selection model over an immutable snapshot of pairs

pub mod address;
pub mod cache;
pub mod device;
pub mod packet;
pub mod selection;
pub mod store;

pub use address::{parse_network_address, AddressError, HardwareAddress, NetworkAddress};
pub use cache::{CacheError, DeviceCache, PAIRS_COLLECTION};
pub use device::{DevicePair, InterfaceDescriptor};
pub use packet::{MagicPacket, MAGIC_PACKET_LEN};
pub use selection::DeviceSelection;
pub use store::{Document, DocumentStore};
