//! Runtime tunables
//!
//! Fixed per build rather than pushed by the host.

/// Device tunables
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RuntimeConfig {
    /// Relay acknowledges hotkey presses once the HID report is out
    pub ack_hotkeys: bool,
    /// Metrics older than this are shown as unavailable
    pub stats_stale_ms: u64,
    /// Fuel-gauge sampling interval
    pub battery_poll_ms: u64,
    /// Silence after which the peer link counts as lost
    pub link_timeout_ms: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            ack_hotkeys: true,
            stats_stale_ms: 10_000,
            battery_poll_ms: 30_000,
            link_timeout_ms: 15_000,
        }
    }
}
