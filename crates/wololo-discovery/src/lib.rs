//! Wololo Discovery - Device discovery and wake-up
//!
//! This crate provides:
//! - Eligible local interface enumeration
//! - Address-resolution (ARP) table reading with pluggable line matchers
//! - ICMP reachability probing
//! - Magic packet broadcast over every eligible interface
//! - `DiscoveryService`, which ties the above to the device cache

pub mod arp;
pub mod broadcast;
pub mod error;
pub mod interface;
pub mod probe;
pub mod service;

pub use arp::{ArpCommand, HardwareMatcher, ResolutionTableReader, TableParser, TableSource};
pub use broadcast::{BroadcastReport, Broadcaster, WAKE_PORT};
pub use error::{DiscoveryError, ErrorCategory};
pub use interface::{InterfaceEnumerator, InterfaceSource, OsInterfaces, RawInterface};
pub use probe::{PingProber, Prober, ReachabilityChecker, DEFAULT_PROBE_TIMEOUT_MS};
pub use service::{DiscoveryService, Operation, ServiceConfig, ServiceEvent};
