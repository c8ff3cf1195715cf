//! Board-agnostic core logic for the PulseDeck display and relay
//!
//! This crate contains all application logic that does not depend on
//! specific hardware implementations:
//!
//! - Host output and GUI toolkit traits
//! - Power state machine (active, dimmed, standby clock)
//! - Deck configuration types, persistence and UI lifecycle
//! - Telemetry board with staleness tracking
//! - Relay message router
//! - Display controller tying link, UI, power and shared bus together

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

#[macro_use]
mod fmt;

pub mod config;
pub mod controller;
pub mod power;
pub mod router;
pub mod telemetry;
pub mod traits;
pub mod transport;

#[cfg(test)]
mod testing;

pub use controller::{Board, ControllerStats, DeckController, Notice, WallClock};
pub use router::{Router, RouterStats};
