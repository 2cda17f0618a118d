//! Discovery error types

use std::net::Ipv4Addr;
use thiserror::Error;
use wololo_core::{AddressError, CacheError};

#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("Malformed address: {0}")]
    Parse(#[from] AddressError),
    #[error("Failed to run {program}: {source}")]
    Process {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Unreadable address in resolution table line {line:?}: {source}")]
    TableParse {
        line: String,
        #[source]
        source: AddressError,
    },
    #[error("Address {0} not found in address resolution table")]
    NotFound(Ipv4Addr),
    #[error("Network error on {address}: {source}")]
    Network {
        address: Ipv4Addr,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to enumerate network interfaces: {0}")]
    Enumeration(String),
    #[error("Device cache error: {0}")]
    Cache(#[from] CacheError),
}

/// Coarse failure classes a collaborator can react to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Malformed address or hardware text, supplied or stored
    Parse,
    /// The resolution-table command couldn't be launched, or its output couldn't be read
    Process,
    /// The address is not currently resolvable
    NotFound,
    /// Socket or ICMP layer failure
    Network,
    /// Persisted store couldn't be read or written
    Storage,
}

impl DiscoveryError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Parse(_) | Self::Cache(CacheError::Parse(_) | CacheError::MissingField(_)) => {
                ErrorCategory::Parse
            }
            Self::Process { .. } | Self::TableParse { .. } => ErrorCategory::Process,
            Self::NotFound(_) => ErrorCategory::NotFound,
            Self::Network { .. } | Self::Enumeration(_) => ErrorCategory::Network,
            Self::Cache(_) => ErrorCategory::Storage,
        }
    }
}
