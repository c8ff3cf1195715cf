//! PulseDeck Hardware Abstraction Layer
//!
//! This crate defines the narrow traits device logic consumes, so the same
//! relay and display logic runs against real radios and buses on target and
//! against in-memory fakes on the host.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  pulsedeck-core (router, controller)    │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  pulsedeck-hal (this crate - traits)    │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │  USB serial / │       │  shared I2C   │
//! │  radio link   │       │  peripherals  │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`link::LinkRx`], [`link::LinkTx`] - Non-blocking byte links
//! - [`i2c::I2cBus`] - I2C bus operations
//! - [`peripheral::Peripheral`] - Init/read/set devices on a bus
//! - [`bus::SharedBus`] - Try-acquire access to a bus shared between tasks

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod bus;
pub mod i2c;
pub mod link;
pub mod peripheral;

// Re-export key traits at crate root for convenience
pub use bus::{BusError, SharedBus};
pub use i2c::I2cBus;
pub use link::{Link, LinkError, LinkRx, LinkTx};
pub use peripheral::Peripheral;
