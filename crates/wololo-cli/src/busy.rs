//! Busy indicator driven by service events

use std::io::Write;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use wololo_discovery::{Operation, ServiceEvent};

/// Tracks operations in flight. Owned by the front end, fed by service events.
#[derive(Debug, Default)]
pub struct BusyState {
    in_flight: usize,
}

impl BusyState {
    pub fn is_busy(&self) -> bool {
        self.in_flight > 0
    }

    /// Apply an event, returning the line to show for it (if any)
    pub fn apply(&mut self, event: &ServiceEvent) -> Option<String> {
        match event {
            ServiceEvent::Started(operation) => {
                self.in_flight += 1;
                Some(format!("{}...", label(*operation)))
            }
            ServiceEvent::Finished { operation, success } => {
                self.in_flight = self.in_flight.saturating_sub(1);
                // Wake reports its own per-interface outcome
                if *operation == Operation::Wake || *success {
                    None
                } else {
                    Some(format!("{} failed", label(*operation)))
                }
            }
        }
    }
}

fn label(operation: Operation) -> &'static str {
    match operation {
        Operation::Refresh => "Refreshing device list",
        Operation::AddByAddress => "Resolving device address",
        Operation::Wake => "Sending wake packet",
    }
}

/// Print indicator lines to stderr until the service is dropped
pub fn spawn_indicator(mut events: broadcast::Receiver<ServiceEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut state = BusyState::default();
        loop {
            match events.recv().await {
                Ok(event) => {
                    if let Some(line) = state.apply(&event) {
                        let mut stderr = std::io::stderr().lock();
                        let _ = writeln!(stderr, "{line}");
                    }
                }
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_busy_tracks_nesting() {
        let mut state = BusyState::default();
        assert!(!state.is_busy());

        assert_eq!(
            state.apply(&ServiceEvent::Started(Operation::Refresh)).as_deref(),
            Some("Refreshing device list...")
        );
        assert!(state.is_busy());

        let line = state.apply(&ServiceEvent::Finished {
            operation: Operation::Refresh,
            success: true,
        });
        assert!(line.is_none());
        assert!(!state.is_busy());
    }

    #[test]
    fn test_failure_is_reported() {
        let mut state = BusyState::default();
        state.apply(&ServiceEvent::Started(Operation::AddByAddress));
        let line = state.apply(&ServiceEvent::Finished {
            operation: Operation::AddByAddress,
            success: false,
        });
        assert_eq!(line.as_deref(), Some("Resolving device address failed"));
    }

    #[test]
    fn test_unbalanced_finish_does_not_underflow() {
        let mut state = BusyState::default();
        state.apply(&ServiceEvent::Finished {
            operation: Operation::Wake,
            success: false,
        });
        assert!(!state.is_busy());
    }
}
