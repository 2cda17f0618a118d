//! Address-resolution table reading
//!
//! The OS table is dumped by an external command (`arp -a` by default) and
//! parsed line by line. A line yields a pair only when it carries both a
//! hardware address and a dotted-quad address. Output formats vary by OS and
//! locale, so hardware-address recognition is delegated to a list of
//! matchers tried in order:
//!
//! - Linux: `? (192.168.1.1) at aa:bb:cc:dd:ee:ff [ether] on eth0`
//! - Windows: `  192.168.1.1           aa-bb-cc-dd-ee-ff     dynamic`
//! - BSD/macOS: `? (192.168.1.1) at a:b:c:d:e:f on en0 ifscope [ethernet]`

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::process::Stdio;
use std::sync::Arc;
use tracing::{debug, trace, warn};
use wololo_core::{parse_network_address, DevicePair, HardwareAddress};

use crate::error::DiscoveryError;

static COLON_MAC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[0-9A-Fa-f]{2}(?::[0-9A-Fa-f]{2}){5}").expect("constant pattern"));
static DASH_MAC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[0-9A-Fa-f]{2}(?:-[0-9A-Fa-f]{2}){5}").expect("constant pattern"));
static SHORT_COLON_MAC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[0-9A-Fa-f]{1,2}(?::[0-9A-Fa-f]{1,2}){5}\b").expect("constant pattern"));
static DOTTED_QUAD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}").expect("constant pattern"));

/// Recognizes one textual hardware-address format within a line
pub trait HardwareMatcher: Send + Sync {
    fn name(&self) -> &'static str;

    /// First hardware address in `line`, if this format occurs
    fn find(&self, line: &str) -> Option<HardwareAddress>;
}

/// Six zero-padded hex octets separated by colons
#[derive(Debug, Clone, Copy, Default)]
pub struct ColonMatcher;

impl HardwareMatcher for ColonMatcher {
    fn name(&self) -> &'static str {
        "colon"
    }

    fn find(&self, line: &str) -> Option<HardwareAddress> {
        COLON_MAC.find(line)?.as_str().parse().ok()
    }
}

/// Six zero-padded hex octets separated by dashes
#[derive(Debug, Clone, Copy, Default)]
pub struct DashMatcher;

impl HardwareMatcher for DashMatcher {
    fn name(&self) -> &'static str {
        "dash"
    }

    fn find(&self, line: &str) -> Option<HardwareAddress> {
        DASH_MAC.find(line)?.as_str().parse().ok()
    }
}

/// Colon-separated octets with leading zeros dropped, as BSD `arp` prints them
#[derive(Debug, Clone, Copy, Default)]
pub struct ShortColonMatcher;

impl HardwareMatcher for ShortColonMatcher {
    fn name(&self) -> &'static str {
        "short-colon"
    }

    fn find(&self, line: &str) -> Option<HardwareAddress> {
        let found = SHORT_COLON_MAC.find(line)?;
        let mut octets = [0u8; 6];
        for (octet, group) in octets.iter_mut().zip(found.as_str().split(':')) {
            *octet = u8::from_str_radix(group, 16).ok()?;
        }
        Some(HardwareAddress::new(octets))
    }
}

/// Look up a built-in matcher by its configuration name
pub fn matcher_by_name(name: &str) -> Option<Arc<dyn HardwareMatcher>> {
    match name {
        "colon" => Some(Arc::new(ColonMatcher)),
        "dash" => Some(Arc::new(DashMatcher)),
        "short-colon" => Some(Arc::new(ShortColonMatcher)),
        _ => None,
    }
}

/// Turns resolution-table text into address pairs
#[derive(Clone)]
pub struct TableParser {
    matchers: Vec<Arc<dyn HardwareMatcher>>,
}

impl Default for TableParser {
    fn default() -> Self {
        Self::new(vec![
            Arc::new(ColonMatcher),
            Arc::new(DashMatcher),
            Arc::new(ShortColonMatcher),
        ])
    }
}

impl TableParser {
    pub fn new(matchers: Vec<Arc<dyn HardwareMatcher>>) -> Self {
        Self { matchers }
    }

    pub fn matcher_names(&self) -> Vec<&'static str> {
        self.matchers.iter().map(|m| m.name()).collect()
    }

    /// Parse a full table dump. Pairs come out in line order, duplicates kept.
    pub fn parse(&self, text: &str) -> Result<Vec<DevicePair>, DiscoveryError> {
        let mut pairs = Vec::new();

        for line in text.lines().filter(|l| !l.trim().is_empty()) {
            if let Some(pair) = self.parse_line(line)? {
                pairs.push(pair);
            }
        }

        Ok(pairs)
    }

    /// Parse one line. Lines missing either address are skipped, but a dotted
    /// quad that isn't a valid IPv4 address is an error.
    pub fn parse_line(&self, line: &str) -> Result<Option<DevicePair>, DiscoveryError> {
        let Some(hardware) = self.matchers.iter().find_map(|m| m.find(line)) else {
            trace!(line = line.trim(), "No hardware address on line");
            return Ok(None);
        };

        let Some(address) = DOTTED_QUAD.find(line) else {
            trace!(line = line.trim(), "No network address on line");
            return Ok(None);
        };

        let address =
            parse_network_address(address.as_str()).map_err(|source| DiscoveryError::TableParse {
                line: line.trim().to_string(),
                source,
            })?;
        Ok(Some(DevicePair::new(address, hardware)))
    }
}

/// Produces the raw text of the OS resolution table
#[async_trait]
pub trait TableSource: Send + Sync {
    async fn dump(&self) -> Result<String, DiscoveryError>;
}

/// Runs an external command and captures its standard output
#[derive(Debug, Clone)]
pub struct ArpCommand {
    program: String,
    args: Vec<String>,
}

impl Default for ArpCommand {
    fn default() -> Self {
        Self::new("arp", ["-a"])
    }
}

impl ArpCommand {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl TableSource for ArpCommand {
    async fn dump(&self) -> Result<String, DiscoveryError> {
        let output = tokio::process::Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| DiscoveryError::Process {
                program: self.program.clone(),
                source,
            })?;

        // Some platforms exit non-zero for an empty table; stdout is still authoritative
        if !output.status.success() {
            warn!(
                program = %self.program,
                status = %output.status,
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "Resolution table command exited unsuccessfully"
            );
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Reads the OS resolution table into address pairs
#[derive(Clone)]
pub struct ResolutionTableReader {
    source: Arc<dyn TableSource>,
    parser: TableParser,
}

impl Default for ResolutionTableReader {
    fn default() -> Self {
        Self::new(Arc::new(ArpCommand::default()), TableParser::default())
    }
}

impl ResolutionTableReader {
    pub fn new(source: Arc<dyn TableSource>, parser: TableParser) -> Self {
        Self { source, parser }
    }

    pub async fn read_table(&self) -> Result<Vec<DevicePair>, DiscoveryError> {
        let text = self.source.dump().await?;
        let pairs = self.parser.parse(&text)?;
        debug!("Found {} resolution table entries", pairs.len());
        Ok(pairs)
    }
}
