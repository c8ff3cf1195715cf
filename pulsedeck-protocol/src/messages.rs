//! Message types for the PulseDeck link protocol
//!
//! Every frame TYPE maps to one [`MessageType`]; every payload decodes into
//! one strongly-typed [`Message`] variant. Message types fall into three
//! classes that decide how the relay treats them:
//! - Telemetry (host → display): forwarded fire-and-forget, newest wins
//! - Event (display → host): turned into host-side input actions
//! - Control: keepalive, configuration mode, acknowledgements

use heapless::Vec;

use crate::events::{KeyCombo, MediaKey};
use crate::frame::{Frame, FrameError, MAX_PAYLOAD_SIZE};
use crate::stats::{self, StatTag, StatsError};

// Message type IDs
pub const MSG_HOTKEY_PRESS: u8 = 0x01;
pub const MSG_HOTKEY_ACK: u8 = 0x02;
pub const MSG_STATS: u8 = 0x03;
pub const MSG_MEDIA_KEY: u8 = 0x04;
pub const MSG_POWER_STATE: u8 = 0x05;
pub const MSG_TIME_SYNC: u8 = 0x06;
pub const MSG_PING: u8 = 0x07;
pub const MSG_NOTIFICATION: u8 = 0x08;
pub const MSG_ENTER_CONFIG_MODE: u8 = 0x09;
pub const MSG_EXIT_CONFIG_MODE: u8 = 0x0A;
pub const MSG_BUTTON_IDENTITY: u8 = 0x0B;

/// Maximum notification text length in bytes
pub const MAX_NOTIFICATION_LEN: usize = 64;

/// Closed set of frame types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MessageType {
    HotkeyPress,
    HotkeyAck,
    Stats,
    MediaKey,
    PowerState,
    TimeSync,
    Ping,
    Notification,
    EnterConfigMode,
    ExitConfigMode,
    ButtonIdentity,
}

/// Relay handling class of a message type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MessageClass {
    /// Periodic, self-superseding host → display updates
    Telemetry,
    /// Human-triggered display → host actions
    Event,
    /// Keepalive, mode switches and acknowledgements
    Control,
}

impl MessageType {
    /// Parse a message type from its wire format byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            MSG_HOTKEY_PRESS => Some(MessageType::HotkeyPress),
            MSG_HOTKEY_ACK => Some(MessageType::HotkeyAck),
            MSG_STATS => Some(MessageType::Stats),
            MSG_MEDIA_KEY => Some(MessageType::MediaKey),
            MSG_POWER_STATE => Some(MessageType::PowerState),
            MSG_TIME_SYNC => Some(MessageType::TimeSync),
            MSG_PING => Some(MessageType::Ping),
            MSG_NOTIFICATION => Some(MessageType::Notification),
            MSG_ENTER_CONFIG_MODE => Some(MessageType::EnterConfigMode),
            MSG_EXIT_CONFIG_MODE => Some(MessageType::ExitConfigMode),
            MSG_BUTTON_IDENTITY => Some(MessageType::ButtonIdentity),
            _ => None,
        }
    }

    /// Convert to wire format byte
    pub fn to_byte(self) -> u8 {
        match self {
            MessageType::HotkeyPress => MSG_HOTKEY_PRESS,
            MessageType::HotkeyAck => MSG_HOTKEY_ACK,
            MessageType::Stats => MSG_STATS,
            MessageType::MediaKey => MSG_MEDIA_KEY,
            MessageType::PowerState => MSG_POWER_STATE,
            MessageType::TimeSync => MSG_TIME_SYNC,
            MessageType::Ping => MSG_PING,
            MessageType::Notification => MSG_NOTIFICATION,
            MessageType::EnterConfigMode => MSG_ENTER_CONFIG_MODE,
            MessageType::ExitConfigMode => MSG_EXIT_CONFIG_MODE,
            MessageType::ButtonIdentity => MSG_BUTTON_IDENTITY,
        }
    }

    /// How the relay treats this type
    pub fn class(self) -> MessageClass {
        match self {
            MessageType::Stats
            | MessageType::PowerState
            | MessageType::TimeSync
            | MessageType::Notification => MessageClass::Telemetry,
            MessageType::HotkeyPress | MessageType::MediaKey | MessageType::ButtonIdentity => {
                MessageClass::Event
            }
            MessageType::HotkeyAck
            | MessageType::Ping
            | MessageType::EnterConfigMode
            | MessageType::ExitConfigMode => MessageClass::Control,
        }
    }
}

/// Host lifecycle signal carried by power-state frames
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerSignal {
    /// Host is shutting down or suspending
    Shutdown,
    /// Host is up (sent after boot and resume)
    Wake,
}

impl PowerSignal {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(PowerSignal::Shutdown),
            1 => Some(PowerSignal::Wake),
            _ => None,
        }
    }

    pub fn to_byte(self) -> u8 {
        match self {
            PowerSignal::Shutdown => 0,
            PowerSignal::Wake => 1,
        }
    }
}

/// Severity of a host notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NotificationLevel {
    Info,
    Warning,
    Alert,
}

impl NotificationLevel {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(NotificationLevel::Info),
            1 => Some(NotificationLevel::Warning),
            2 => Some(NotificationLevel::Alert),
            _ => None,
        }
    }

    pub fn to_byte(self) -> u8 {
        self as u8
    }
}

/// A validated stats payload
///
/// Only constructed after the whole payload has passed validation, so
/// visiting it cannot fail half-way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatsPayload<'a> {
    bytes: &'a [u8],
}

impl<'a> StatsPayload<'a> {
    /// Validate raw payload bytes
    pub fn parse(bytes: &'a [u8]) -> Result<Self, StatsError> {
        stats::decode(bytes, |_, _| {})?;
        Ok(Self { bytes })
    }

    /// Visit every known metric in encoded order
    pub fn for_each<F: FnMut(StatTag, u16)>(&self, visitor: F) {
        // Validated in `parse`
        let _ = stats::decode(self.bytes, visitor);
    }

    /// Raw payload bytes
    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }
}

/// Errors when interpreting a frame as a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MessageError {
    /// TYPE byte outside the known set
    UnknownType(u8),
    /// Payload length does not fit the type's fixed shape
    BadLength,
    /// A field holds a value outside its enumeration
    InvalidValue,
    /// Notification text is not UTF-8
    InvalidUtf8,
    /// Stats payload rejected
    Stats(StatsError),
    /// Frame construction failed
    Frame(FrameError),
}

impl From<StatsError> for MessageError {
    fn from(e: StatsError) -> Self {
        MessageError::Stats(e)
    }
}

impl From<FrameError> for MessageError {
    fn from(e: FrameError) -> Self {
        MessageError::Frame(e)
    }
}

/// A decoded message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Message<'a> {
    /// Display asks the host to type a shortcut
    HotkeyPress { seq: u8, combo: KeyCombo },
    /// Relay confirms a hotkey was sent to the host
    HotkeyAck { seq: u8 },
    /// Host metrics
    Stats(StatsPayload<'a>),
    /// Display asks the host to press a media key
    MediaKey(MediaKey),
    /// Host lifecycle change
    PowerState(PowerSignal),
    /// Host wall clock
    TimeSync { epoch_s: u32, utc_offset_min: i16 },
    /// Keepalive
    Ping,
    /// Short host notification
    Notification {
        level: NotificationLevel,
        text: &'a str,
    },
    /// Host starts pushing configuration
    EnterConfigMode,
    /// Host finished pushing configuration
    ExitConfigMode,
    /// Display reports which button was pressed
    ButtonIdentity { page: u8, index: u8 },
}

impl<'a> Message<'a> {
    /// Parse a message from a frame's TYPE and PAYLOAD
    pub fn parse(msg_type: u8, payload: &'a [u8]) -> Result<Self, MessageError> {
        let kind = MessageType::from_byte(msg_type).ok_or(MessageError::UnknownType(msg_type))?;

        match kind {
            MessageType::HotkeyPress => {
                let [seq, modifiers, keycode] = fixed::<3>(payload)?;
                Ok(Message::HotkeyPress {
                    seq,
                    combo: KeyCombo::new(modifiers, keycode),
                })
            }
            MessageType::HotkeyAck => {
                let [seq] = fixed::<1>(payload)?;
                Ok(Message::HotkeyAck { seq })
            }
            MessageType::Stats => Ok(Message::Stats(StatsPayload::parse(payload)?)),
            MessageType::MediaKey => {
                let [key] = fixed::<1>(payload)?;
                MediaKey::from_byte(key)
                    .map(Message::MediaKey)
                    .ok_or(MessageError::InvalidValue)
            }
            MessageType::PowerState => {
                let [signal] = fixed::<1>(payload)?;
                PowerSignal::from_byte(signal)
                    .map(Message::PowerState)
                    .ok_or(MessageError::InvalidValue)
            }
            MessageType::TimeSync => {
                let [a, b, c, d, e, f] = fixed::<6>(payload)?;
                Ok(Message::TimeSync {
                    epoch_s: u32::from_le_bytes([a, b, c, d]),
                    utc_offset_min: i16::from_le_bytes([e, f]),
                })
            }
            MessageType::Ping => {
                fixed::<0>(payload)?;
                Ok(Message::Ping)
            }
            MessageType::Notification => {
                let (&level, text) = payload.split_first().ok_or(MessageError::BadLength)?;
                if text.len() > MAX_NOTIFICATION_LEN {
                    return Err(MessageError::BadLength);
                }
                let level = NotificationLevel::from_byte(level).ok_or(MessageError::InvalidValue)?;
                let text = core::str::from_utf8(text).map_err(|_| MessageError::InvalidUtf8)?;
                Ok(Message::Notification { level, text })
            }
            MessageType::EnterConfigMode => {
                fixed::<0>(payload)?;
                Ok(Message::EnterConfigMode)
            }
            MessageType::ExitConfigMode => {
                fixed::<0>(payload)?;
                Ok(Message::ExitConfigMode)
            }
            MessageType::ButtonIdentity => {
                let [page, index] = fixed::<2>(payload)?;
                Ok(Message::ButtonIdentity { page, index })
            }
        }
    }

    /// Parse a message from a frame
    pub fn from_frame(frame: &'a Frame) -> Result<Self, MessageError> {
        Self::parse(frame.msg_type, &frame.payload)
    }

    /// The message's type tag
    pub fn message_type(&self) -> MessageType {
        match self {
            Message::HotkeyPress { .. } => MessageType::HotkeyPress,
            Message::HotkeyAck { .. } => MessageType::HotkeyAck,
            Message::Stats(_) => MessageType::Stats,
            Message::MediaKey(_) => MessageType::MediaKey,
            Message::PowerState(_) => MessageType::PowerState,
            Message::TimeSync { .. } => MessageType::TimeSync,
            Message::Ping => MessageType::Ping,
            Message::Notification { .. } => MessageType::Notification,
            Message::EnterConfigMode => MessageType::EnterConfigMode,
            Message::ExitConfigMode => MessageType::ExitConfigMode,
            Message::ButtonIdentity { .. } => MessageType::ButtonIdentity,
        }
    }

    /// Encode this message into a frame
    ///
    /// Notification text longer than [`MAX_NOTIFICATION_LEN`] is truncated
    /// at a character boundary.
    pub fn to_frame(&self) -> Result<Frame, MessageError> {
        let msg_type = self.message_type().to_byte();

        let frame = match *self {
            Message::HotkeyPress { seq, combo } => {
                Frame::new(msg_type, &[seq, combo.modifiers, combo.keycode])?
            }
            Message::HotkeyAck { seq } => Frame::new(msg_type, &[seq])?,
            Message::Stats(payload) => Frame::new(msg_type, payload.as_bytes())?,
            Message::MediaKey(key) => Frame::new(msg_type, &[key.to_byte()])?,
            Message::PowerState(signal) => Frame::new(msg_type, &[signal.to_byte()])?,
            Message::TimeSync {
                epoch_s,
                utc_offset_min,
            } => {
                let mut payload = [0u8; 6];
                payload[..4].copy_from_slice(&epoch_s.to_le_bytes());
                payload[4..].copy_from_slice(&utc_offset_min.to_le_bytes());
                Frame::new(msg_type, &payload)?
            }
            Message::Notification { level, text } => {
                let text = truncate_utf8(text, MAX_NOTIFICATION_LEN);
                let mut payload = Vec::<u8, MAX_PAYLOAD_SIZE>::new();
                payload
                    .push(level.to_byte())
                    .map_err(|_| FrameError::PayloadTooLarge)?;
                payload
                    .extend_from_slice(text.as_bytes())
                    .map_err(|_| FrameError::PayloadTooLarge)?;
                Frame::new(msg_type, &payload)?
            }
            Message::ButtonIdentity { page, index } => Frame::new(msg_type, &[page, index])?,
            Message::Ping | Message::EnterConfigMode | Message::ExitConfigMode => {
                Frame::empty(msg_type)
            }
        };

        Ok(frame)
    }
}

/// Build a stats frame straight from samples
pub fn stats_frame<T: Into<u8> + Copy>(samples: &[(T, u16)]) -> Result<Frame, MessageError> {
    let payload = stats::encode(samples)?;
    Ok(Frame::new(MSG_STATS, &payload)?)
}

fn fixed<const N: usize>(payload: &[u8]) -> Result<[u8; N], MessageError> {
    payload.try_into().map_err(|_| MessageError::BadLength)
}

fn truncate_utf8(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
