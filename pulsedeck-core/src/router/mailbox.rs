//! Single-slot outbound mailbox
//!
//! Telemetry is self-superseding: a newer stats or power frame makes any
//! unsent older one worthless. Each direction therefore holds at most one
//! frame, and a new arrival overwrites it.

use pulsedeck_protocol::Frame;

#[derive(Debug, Clone, Default)]
pub struct Mailbox {
    slot: Option<Frame>,
    superseded: u32,
}

impl Mailbox {
    pub const fn new() -> Self {
        Self {
            slot: None,
            superseded: 0,
        }
    }

    /// Store a frame, returning `true` if it replaced an unsent one
    pub fn post(&mut self, frame: Frame) -> bool {
        let replaced = self.slot.replace(frame).is_some();
        if replaced {
            self.superseded = self.superseded.saturating_add(1);
        }
        replaced
    }

    /// Take the pending frame, leaving the slot empty
    pub fn take(&mut self) -> Option<Frame> {
        self.slot.take()
    }

    pub fn is_empty(&self) -> bool {
        self.slot.is_none()
    }

    /// Frames overwritten before they could be sent
    pub fn superseded(&self) -> u32 {
        self.superseded
    }
}
