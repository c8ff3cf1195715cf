//! Byte link abstractions
//!
//! Both hops of a PulseDeck (USB serial to the host, radio to the peer) are
//! plain byte pipes. Device logic runs a cooperative tick, so neither
//! direction may block: reads return what is already buffered and writes
//! make exactly one attempt.

/// Link failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkError {
    /// Transmit queue full; the frame was not accepted
    Busy,
    /// Peer absent or link down
    Disconnected,
    /// Receive buffer overflowed; bytes were lost
    Overrun,
    /// Any other driver error
    Io,
}

/// Link transmitter
pub trait LinkTx {
    /// Hand one complete encoded frame to the link
    ///
    /// Single attempt. The caller drops the frame on error.
    fn try_write(&mut self, data: &[u8]) -> Result<(), LinkError>;
}

/// Link receiver
pub trait LinkRx {
    /// Copy already-received bytes into `buf`
    ///
    /// Returns `Ok(0)` when nothing is pending; never waits.
    fn poll_read(&mut self, buf: &mut [u8]) -> Result<usize, LinkError>;
}

/// Combined link interface
///
/// For links that provide both directions on a single peripheral.
pub trait Link: LinkTx + LinkRx {}

// Blanket implementation
impl<T: LinkTx + LinkRx> Link for T {}

impl<T: LinkTx + ?Sized> LinkTx for &mut T {
    fn try_write(&mut self, data: &[u8]) -> Result<(), LinkError> {
        (**self).try_write(data)
    }
}

impl<T: LinkRx + ?Sized> LinkRx for &mut T {
    fn poll_read(&mut self, buf: &mut [u8]) -> Result<usize, LinkError> {
        (**self).poll_read(buf)
    }
}
