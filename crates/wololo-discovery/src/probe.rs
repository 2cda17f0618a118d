//! ICMP reachability probing

use async_trait::async_trait;
use std::net::Ipv4Addr;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};

use crate::error::DiscoveryError;

/// Default probe timeout in milliseconds
pub const DEFAULT_PROBE_TIMEOUT_MS: u64 = 1000;

/// Extra time allowed for the ping process itself to start and exit
const PROCESS_GRACE: Duration = Duration::from_millis(1500);

/// Sends a single echo request and reports whether a reply arrived in time
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, address: Ipv4Addr, timeout: Duration) -> Result<bool, DiscoveryError>;
}

/// Probes with the system `ping` utility (no raw-socket privileges needed)
#[derive(Debug, Clone)]
pub struct PingProber {
    program: String,
}

impl Default for PingProber {
    fn default() -> Self {
        Self::new("ping")
    }
}

impl PingProber {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

/// One echo request with a reply deadline, in the platform's ping dialect
fn ping_args(address: Ipv4Addr, timeout: Duration) -> Vec<String> {
    let millis = timeout.as_millis().max(1);

    let mut args: Vec<String> = if cfg!(windows) {
        vec!["-n".into(), "1".into(), "-w".into(), millis.to_string()]
    } else if cfg!(any(target_os = "macos", target_os = "freebsd")) {
        vec!["-c".into(), "1".into(), "-W".into(), millis.to_string()]
    } else {
        // Linux iputils takes whole seconds
        let secs = millis.div_ceil(1000);
        vec!["-c".into(), "1".into(), "-W".into(), secs.to_string()]
    };
    args.push(address.to_string());
    args
}

#[async_trait]
impl Prober for PingProber {
    async fn probe(&self, address: Ipv4Addr, timeout: Duration) -> Result<bool, DiscoveryError> {
        let child = tokio::process::Command::new(&self.program)
            .args(ping_args(address, timeout))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .status();

        match tokio::time::timeout(timeout + PROCESS_GRACE, child).await {
            Ok(Ok(status)) => Ok(status.success()),
            Ok(Err(source)) => Err(DiscoveryError::Network { address, source }),
            Err(_) => {
                trace!(ip = %address, "Ping process overran its deadline");
                Ok(false)
            }
        }
    }
}

/// Liveness check for a single address
#[derive(Clone)]
pub struct ReachabilityChecker {
    prober: Arc<dyn Prober>,
    timeout: Duration,
}

impl Default for ReachabilityChecker {
    fn default() -> Self {
        Self::new(
            Arc::new(PingProber::default()),
            Duration::from_millis(DEFAULT_PROBE_TIMEOUT_MS),
        )
    }
}

impl ReachabilityChecker {
    pub fn new(prober: Arc<dyn Prober>, timeout: Duration) -> Self {
        Self { prober, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub async fn probe(&self, address: Ipv4Addr) -> Result<bool, DiscoveryError> {
        self.probe_with_timeout(address, self.timeout).await
    }

    pub async fn probe_with_timeout(
        &self,
        address: Ipv4Addr,
        timeout: Duration,
    ) -> Result<bool, DiscoveryError> {
        let reachable = self.prober.probe(address, timeout).await?;
        debug!(ip = %address, reachable, timeout_ms = timeout.as_millis() as u64, "Probed host");
        Ok(reachable)
    }
}
