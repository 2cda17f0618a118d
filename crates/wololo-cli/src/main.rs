//! Wololo - Wake devices on the local network
//!
//! Command-line front end over the discovery service: keeps a cache of
//! address pairs learned from the OS resolution table and broadcasts
//! Wake-on-LAN packets to them.

mod busy;
mod config;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::net::Ipv4Addr;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;
use wololo_core::{DevicePair, DeviceSelection, HardwareAddress};
use wololo_discovery::{DiscoveryError, DiscoveryService};

#[derive(Parser, Debug)]
#[command(name = "wololo")]
#[command(about = "Discover LAN devices from the ARP table and wake them up")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "wololo.toml")]
    config: PathBuf,

    /// Path to the device cache (overrides the configuration file)
    #[arg(short, long)]
    store: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List known devices, populating the cache on first use
    List,
    /// Replace the device cache with the current ARP table
    Refresh,
    /// Resolve a device by IP address and add it to the cache
    Add {
        /// IPv4 address of the device (it should be online)
        ip: String,
    },
    /// Wake a device by list index, IP address, or hardware address
    Wake {
        /// Defaults to the first known device
        target: Option<String>,
    },
    /// Show the interfaces wake packets are sent from
    Interfaces,
    /// Write a default configuration file to the --config path
    InitConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Wololo v{}", env!("CARGO_PKG_VERSION"));

    if let Command::InitConfig = args.command {
        config::save_default_config(&args.config)?;
        println!("Wrote default configuration to {}", args.config.display());
        return Ok(());
    }

    let mut config = config::load_config(&args.config)?;
    if let Some(store) = args.store {
        config.store.path = store;
    }

    let service = config.build_service()?;
    let indicator = busy::spawn_indicator(service.subscribe());

    let result = run(&service, args.command).await;

    // Closing the event channel stops the indicator
    drop(service);
    let _ = indicator.await;

    result
}

async fn run(service: &DiscoveryService, command: Command) -> Result<()> {
    match command {
        Command::List => {
            if service.is_empty().await {
                service.refresh().await?;
            }
            print_pairs(&service.list_known_pairs().await?);
            if let Some(updated) = service.last_updated().await {
                println!("Last updated {}", updated.to_rfc3339());
            }
        }
        Command::Refresh => {
            let count = service.refresh().await?;
            println!("Found {} devices", count);
        }
        Command::Add { ip } => match service.add_by_input(&ip).await {
            Ok(pair) => println!("Added {}", pair),
            Err(e) => return Err(explain_add_failure(&ip, e)),
        },
        Command::Wake { target } => {
            if service.is_empty().await {
                service.refresh().await?;
            }
            let mut selection = DeviceSelection::new(service.list_known_pairs().await?);
            let hardware = match resolve_target(&mut selection, target.as_deref())? {
                WakeTarget::Pair(pair) => {
                    println!("Waking {}", pair);
                    pair.hardware
                }
                WakeTarget::Hardware(hardware) => {
                    println!("Waking {}", hardware);
                    hardware
                }
            };

            let report = service.wake_hardware(hardware).await?;
            for local in &report.sent {
                println!("  sent from {}", local);
            }
            for failure in &report.failures {
                println!("  failed: {}", failure);
            }
            if report.attempted() == 0 {
                bail!("No eligible network interfaces to send the wake packet from");
            }
            if !report.failures.is_empty() {
                bail!(
                    "Wake packet failed on {} of {} interfaces",
                    report.failures.len(),
                    report.attempted()
                );
            }
        }
        Command::Interfaces => {
            let interfaces = service.interfaces().await;
            if interfaces.is_empty() {
                println!("No eligible interfaces");
            }
            for iface in interfaces {
                println!("{:<12} {}", iface.name, iface.address);
            }
        }
        // Handled before the service is built
        Command::InitConfig => {}
    }

    Ok(())
}

fn print_pairs(pairs: &[DevicePair]) {
    if pairs.is_empty() {
        println!("No devices known. Try `wololo add <ip>` with the device online.");
        return;
    }
    for (index, pair) in pairs.iter().enumerate() {
        println!("{:>3}  {:<15}  {}", index, pair.address, pair.hardware);
    }
}

/// Only a failure to parse the entered text itself blames the input
fn explain_add_failure(input: &str, error: DiscoveryError) -> anyhow::Error {
    match error {
        DiscoveryError::Parse(_) => anyhow::anyhow!("{input:?} is not a valid IPv4 address"),
        DiscoveryError::NotFound(address) => anyhow::anyhow!(
            "{}. Make sure the device is online and on this network, then try again.",
            DiscoveryError::NotFound(address)
        ),
        other => other.into(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WakeTarget {
    Pair(DevicePair),
    Hardware(HardwareAddress),
}

/// Interpret a wake target as an index into the selection, a cached IP,
/// or a hardware address (which need not be cached)
fn resolve_target(selection: &mut DeviceSelection, target: Option<&str>) -> Result<WakeTarget> {
    let Some(target) = target.map(str::trim) else {
        return match selection.selected() {
            Some(pair) => Ok(WakeTarget::Pair(*pair)),
            None => bail!("No devices known. Add one with `wololo add <ip>`."),
        };
    };

    if let Ok(index) = target.parse::<usize>() {
        let known = selection.pairs().len();
        return match selection.select(index) {
            Some(pair) => Ok(WakeTarget::Pair(*pair)),
            None => bail!("No device at index {} ({} known)", index, known),
        };
    }

    if let Ok(address) = target.parse::<Ipv4Addr>() {
        return match selection.select_address(address) {
            Some(pair) => Ok(WakeTarget::Pair(*pair)),
            None => bail!("{address} is not a known device. Add it with `wololo add {address}`."),
        };
    }

    match target.parse::<HardwareAddress>() {
        Ok(hardware) => Ok(match selection.select_hardware(hardware) {
            Some(pair) => WakeTarget::Pair(*pair),
            None => WakeTarget::Hardware(hardware),
        }),
        Err(_) => bail!("{target:?} is not a device index, IPv4 address, or hardware address"),
    }
}
