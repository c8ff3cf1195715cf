//! Events that trigger power state transitions

/// Events that can trigger power state transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerEvent {
    /// No activity or inbound message for the idle timeout
    IdleTimeout,
    /// User touched the screen
    LocalActivity,
    /// Any valid frame arrived from the peer, other than a shutdown intent
    InboundMessage,
    /// Host announced it is shutting down or suspending
    ShutdownSignal,
}
