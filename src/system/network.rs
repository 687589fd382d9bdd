use std::time::{Duration, Instant};

use sysinfo::Networks;

use crate::error::{Error, Result};

/// Bytes per megabit (1024² / 8)
pub const BYTES_PER_MEGABIT: f64 = 131_072.0;

/// One reading of an interface's monotonic byte counters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceSample {
    pub interface: String,
    pub rx_bytes: u64,
    pub tx_bytes: u64,
    pub timestamp: Instant,
}

/// Throughput over one sampling window, in megabits per second
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateSample {
    pub download_mbps: f64,
    pub upload_mbps: f64,
    pub window_seconds: f64,
}

impl RateSample {
    /// Rate between two consecutive readings of the same interface.
    ///
    /// Returns `None` when the window is empty or either counter went
    /// backwards (wrap or interface reset); such a window has no valid rate.
    pub fn between(prev: &InterfaceSample, next: &InterfaceSample) -> Option<Self> {
        let window = next.timestamp.checked_duration_since(prev.timestamp)?;
        Self::from_counters(
            (prev.rx_bytes, prev.tx_bytes),
            (next.rx_bytes, next.tx_bytes),
            window,
        )
    }

    /// Rate from raw `(rx, tx)` counter pairs taken `window` apart.
    pub fn from_counters(start: (u64, u64), end: (u64, u64), window: Duration) -> Option<Self> {
        let secs = window.as_secs_f64();
        if secs <= 0.0 {
            return None;
        }
        let delta_rx = end.0.checked_sub(start.0)?;
        let delta_tx = end.1.checked_sub(start.1)?;

        Some(Self {
            download_mbps: to_mbps(delta_rx, secs),
            upload_mbps: to_mbps(delta_tx, secs),
            window_seconds: secs,
        })
    }
}

fn to_mbps(delta_bytes: u64, secs: f64) -> f64 {
    round2(delta_bytes as f64 / secs / BYTES_PER_MEGABIT)
}

/// Round to 2 decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Something that can read an interface's byte counters.
pub trait CounterSource: Send {
    fn read(&mut self, interface: &str) -> Result<InterfaceSample>;
}

/// Counter source backed by the `sysinfo` crate
pub struct SysinfoCounters {
    networks: Networks,
}

impl SysinfoCounters {
    pub fn new() -> Self {
        Self {
            networks: Networks::new_with_refreshed_list(),
        }
    }
}

impl Default for SysinfoCounters {
    fn default() -> Self {
        Self::new()
    }
}

impl CounterSource for SysinfoCounters {
    fn read(&mut self, interface: &str) -> Result<InterfaceSample> {
        // true = drop interfaces that disappeared, so a vanished interface fails the lookup
        self.networks.refresh(true);

        let data = self
            .networks
            .list()
            .get(interface)
            .ok_or_else(|| Error::CounterRead {
                interface: interface.to_string(),
            })?;

        Ok(InterfaceSample {
            interface: interface.to_string(),
            rx_bytes: data.total_received(),
            tx_bytes: data.total_transmitted(),
            timestamp: Instant::now(),
        })
    }
}
