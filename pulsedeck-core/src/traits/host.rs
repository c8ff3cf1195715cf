//! Host-side input output (relay only)

use pulsedeck_protocol::{KeyCombo, MediaKey};

/// Errors that can occur when emitting input to the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HostOutputError {
    /// USB not enumerated or suspended
    NotReady,
    /// Previous report still queued
    Busy,
}

/// Trait for emitting keyboard and consumer-control input to the host
///
/// Implementations send a press report followed by a release report.
pub trait HostOutput {
    /// Type a keyboard shortcut
    fn send_hotkey(&mut self, combo: KeyCombo) -> Result<(), HostOutputError>;

    /// Tap a media key
    fn send_media(&mut self, key: MediaKey) -> Result<(), HostOutputError>;
}
