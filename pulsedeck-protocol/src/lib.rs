//! PulseDeck link protocol
//!
//! This crate defines the framed byte protocol spoken on both links of a
//! PulseDeck: host producer ↔ relay over USB serial, and relay ↔ display
//! over the wireless link. Every hop uses the same frame format:
//! ```text
//! ┌───────┬────────┬──────┬─────────────┬──────────┐
//! │ START │ LENGTH │ TYPE │ PAYLOAD     │ CRC-8    │
//! │ 1B    │ 1B     │ 1B   │ 0–250B      │ 1B       │
//! └───────┴────────┴──────┴─────────────┴──────────┘
//! ```
//!
//! The parser resynchronizes on noise and checksum failures without ever
//! blocking on a partial frame, so a glitch on the link costs at most the
//! frames it touched.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod crc;
pub mod events;
pub mod frame;
pub mod messages;
pub mod stats;

pub use events::{modifiers, KeyCombo, MediaKey};
pub use frame::{Frame, FrameError, FrameParser, ParserStats, FRAME_START, MAX_PAYLOAD_SIZE};
pub use messages::{
    Message, MessageClass, MessageError, MessageType, NotificationLevel, PowerSignal, StatsPayload,
};
pub use stats::{StatTag, StatsError};
