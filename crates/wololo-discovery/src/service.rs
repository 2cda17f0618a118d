//! Discovery service: the API surface a front end calls
//!
//! The service owns the device cache and guards it with an async mutex, so
//! overlapping `refresh` and `add_by_address` calls are serialized and readers
//! never see the cache half-replaced. Long operations publish start/finish
//! events so a caller can drive a busy indicator without shared UI state.

use chrono::{DateTime, Utc};
use std::future::Future;
use std::net::Ipv4Addr;
use tokio::sync::{broadcast, Mutex, RwLock};
use tracing::{debug, info, warn};
use wololo_core::{
    parse_network_address, DeviceCache, DevicePair, HardwareAddress, InterfaceDescriptor,
    MagicPacket,
};

use crate::arp::ResolutionTableReader;
use crate::broadcast::{BroadcastReport, Broadcaster};
use crate::error::DiscoveryError;
use crate::interface::InterfaceEnumerator;
use crate::probe::ReachabilityChecker;

/// Service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// UDP destination port for wake packets
    pub wake_port: u16,
    /// Reachability probe timeout in milliseconds
    pub probe_timeout_ms: u64,
    /// Re-enumerate interfaces on every wake instead of using the startup snapshot
    pub rescan_interfaces: bool,
}

/// Long-running service operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Refresh,
    AddByAddress,
    Wake,
}

/// Progress events for busy indicators
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceEvent {
    Started(Operation),
    Finished { operation: Operation, success: bool },
}

pub struct DiscoveryService {
    cache: Mutex<DeviceCache>,
    reader: ResolutionTableReader,
    checker: ReachabilityChecker,
    enumerator: InterfaceEnumerator,
    broadcaster: Broadcaster,
    interfaces: RwLock<Vec<InterfaceDescriptor>>,
    rescan_interfaces: bool,
    event_tx: broadcast::Sender<ServiceEvent>,
}

impl DiscoveryService {
    /// Assemble a service from explicit components. Interfaces are enumerated
    /// here, once; enumeration failure is fatal.
    pub fn from_parts(
        cache: DeviceCache,
        reader: ResolutionTableReader,
        checker: ReachabilityChecker,
        enumerator: InterfaceEnumerator,
        broadcaster: Broadcaster,
        rescan_interfaces: bool,
    ) -> Result<Self, DiscoveryError> {
        let interfaces = enumerator.list_eligible_interfaces()?;
        info!(count = interfaces.len(), "Captured eligible interface snapshot");

        let (event_tx, _) = broadcast::channel(16);
        Ok(Self {
            cache: Mutex::new(cache),
            reader,
            checker,
            enumerator,
            broadcaster,
            interfaces: RwLock::new(interfaces),
            rescan_interfaces,
            event_tx,
        })
    }

    /// Subscribe to operation start/finish events
    pub fn subscribe(&self) -> broadcast::Receiver<ServiceEvent> {
        self.event_tx.subscribe()
    }

    pub async fn is_empty(&self) -> bool {
        self.cache.lock().await.is_empty()
    }

    pub async fn list_known_pairs(&self) -> Result<Vec<DevicePair>, DiscoveryError> {
        Ok(self.cache.lock().await.list_all()?)
    }

    /// When the cache was last written
    pub async fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.cache.lock().await.updated_at()
    }

    /// The interface snapshot wake packets are sent over
    pub async fn interfaces(&self) -> Vec<InterfaceDescriptor> {
        self.interfaces.read().await.clone()
    }

    /// Replace the cache with the current resolution table. Returns the number of pairs stored.
    pub async fn refresh(&self) -> Result<usize, DiscoveryError> {
        self.tracked(Operation::Refresh, async {
            let pairs = self.reader.read_table().await?;
            self.cache.lock().await.replace_all(&pairs)?;
            info!(count = pairs.len(), "Refreshed device cache from resolution table");
            Ok(pairs.len())
        })
        .await
    }

    /// Parse user-entered text, then resolve and add it.
    ///
    /// Malformed text fails with `DiscoveryError::Parse` before anything runs;
    /// a well-formed but unresolvable address fails with `NotFound`.
    pub async fn add_by_input(&self, input: &str) -> Result<DevicePair, DiscoveryError> {
        let address = parse_network_address(input)?;
        self.add_by_address(address).await
    }

    /// Probe `address`, look it up in a fresh resolution table, and append the match.
    ///
    /// The probe result is logged but does not gate the lookup.
    pub async fn add_by_address(&self, address: Ipv4Addr) -> Result<DevicePair, DiscoveryError> {
        self.tracked(Operation::AddByAddress, async {
            let reachable = self.checker.probe(address).await?;
            if !reachable {
                debug!(ip = %address, "Host did not answer probe, checking table anyway");
            }

            let pair = self
                .reader
                .read_table()
                .await?
                .into_iter()
                .find(|p| p.address == address)
                .ok_or(DiscoveryError::NotFound(address))?;

            self.cache.lock().await.append(&pair)?;
            info!(ip = %pair.address, mac = %pair.hardware, reachable, "Added device");
            Ok(pair)
        })
        .await
    }

    /// Broadcast a wake packet for `pair`
    pub async fn wake(&self, pair: &DevicePair) -> Result<BroadcastReport, DiscoveryError> {
        self.wake_hardware(pair.hardware).await
    }

    /// Broadcast a wake packet for a hardware address over every eligible interface
    pub async fn wake_hardware(
        &self,
        hardware: HardwareAddress,
    ) -> Result<BroadcastReport, DiscoveryError> {
        let _ = self.event_tx.send(ServiceEvent::Started(Operation::Wake));

        let interfaces = match self.current_interfaces().await {
            Ok(interfaces) => interfaces,
            Err(e) => {
                self.finish(Operation::Wake, false);
                return Err(e);
            }
        };

        if interfaces.is_empty() {
            warn!(mac = %hardware, "No eligible interfaces to send wake packet on");
        }

        let packet = MagicPacket::build(&hardware);
        let report = self.broadcaster.send(packet.as_bytes(), &interfaces).await;

        info!(
            mac = %hardware,
            sent = report.sent.len(),
            failed = report.failures.len(),
            "Wake packet broadcast"
        );

        self.finish(Operation::Wake, report.is_complete());
        Ok(report)
    }

    async fn current_interfaces(&self) -> Result<Vec<InterfaceDescriptor>, DiscoveryError> {
        if self.rescan_interfaces {
            let fresh = self.enumerator.list_eligible_interfaces()?;
            *self.interfaces.write().await = fresh.clone();
            Ok(fresh)
        } else {
            Ok(self.interfaces.read().await.clone())
        }
    }

    async fn tracked<T, F>(&self, operation: Operation, work: F) -> Result<T, DiscoveryError>
    where
        F: Future<Output = Result<T, DiscoveryError>>,
    {
        let _ = self.event_tx.send(ServiceEvent::Started(operation));
        let result = work.await;
        if let Err(e) = &result {
            debug!(?operation, error = %e, "Operation failed");
        }
        self.finish(operation, result.is_ok());
        result
    }

    fn finish(&self, operation: Operation, success: bool) {
        let _ = self
            .event_tx
            .send(ServiceEvent::Finished { operation, success });
    }
}
