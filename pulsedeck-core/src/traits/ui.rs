//! GUI toolkit traits (display only)

use crate::config::ButtonAddr;

/// Errors reported by the GUI toolkit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UiError {
    /// Toolkit heap exhausted
    OutOfMemory,
    /// Handle does not name a live element
    InvalidHandle,
}

/// Something the toolkit can draw
///
/// Elements borrow their text for the duration of the call only. A button
/// carries its [`ButtonAddr`], which is all the toolkit may keep; touches
/// are reported back by address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Element<'a> {
    /// Title bar for the visible page
    Header {
        page_label: &'a str,
        profile_label: &'a str,
        page: u8,
        page_count: u8,
    },
    /// A touchable button
    Button { addr: ButtonAddr, label: &'a str },
}

/// Toolkit memory snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ResourceUsage {
    /// Bytes in use
    pub used_bytes: u32,
    /// Largest `used_bytes` seen since boot
    pub high_water_bytes: u32,
    /// Live elements
    pub elements: u16,
}

/// Trait for sampling toolkit memory
pub trait ResourceMeter {
    fn usage(&self) -> ResourceUsage;
}

/// Trait for the GUI toolkit
///
/// Rendering itself (layout, fonts, drawing) is the toolkit's business;
/// device logic only creates, updates and destroys elements.
pub trait GuiToolkit: ResourceMeter {
    /// Opaque element handle
    type Handle: Copy;

    /// Create an element
    fn create(&mut self, element: Element<'_>) -> Result<Self::Handle, UiError>;

    /// Redraw an existing element with new content
    fn update(&mut self, handle: Self::Handle, element: Element<'_>) -> Result<(), UiError>;

    /// Destroy an element and release its memory
    fn destroy(&mut self, handle: Self::Handle);
}
