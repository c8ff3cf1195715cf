//! Collaborator traits
//!
//! These traits define the interface between device logic and the pieces
//! it does not own: the GUI toolkit on the display and the USB HID output
//! on the relay.

pub mod host;
pub mod ui;

pub use host::{HostOutput, HostOutputError};
pub use ui::{Element, GuiToolkit, ResourceMeter, ResourceUsage, UiError};
