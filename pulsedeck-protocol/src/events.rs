//! Input actions carried by event-class messages
//!
//! These are the payload shapes of hotkey-press and media-key frames. The
//! relay translates them into USB HID reports on the host side.

/// Media (consumer control) keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MediaKey {
    PlayPause,
    NextTrack,
    PreviousTrack,
    Stop,
    VolumeUp,
    VolumeDown,
    Mute,
}

// Wire format values
const MEDIA_PLAY_PAUSE: u8 = 0x01;
const MEDIA_NEXT: u8 = 0x02;
const MEDIA_PREVIOUS: u8 = 0x03;
const MEDIA_STOP: u8 = 0x04;
const MEDIA_VOLUME_UP: u8 = 0x10;
const MEDIA_VOLUME_DOWN: u8 = 0x11;
const MEDIA_MUTE: u8 = 0x12;

impl MediaKey {
    /// Parse a media key from its wire format byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            MEDIA_PLAY_PAUSE => Some(MediaKey::PlayPause),
            MEDIA_NEXT => Some(MediaKey::NextTrack),
            MEDIA_PREVIOUS => Some(MediaKey::PreviousTrack),
            MEDIA_STOP => Some(MediaKey::Stop),
            MEDIA_VOLUME_UP => Some(MediaKey::VolumeUp),
            MEDIA_VOLUME_DOWN => Some(MediaKey::VolumeDown),
            MEDIA_MUTE => Some(MediaKey::Mute),
            _ => None,
        }
    }

    /// Convert to wire format byte
    pub fn to_byte(self) -> u8 {
        match self {
            MediaKey::PlayPause => MEDIA_PLAY_PAUSE,
            MediaKey::NextTrack => MEDIA_NEXT,
            MediaKey::PreviousTrack => MEDIA_PREVIOUS,
            MediaKey::Stop => MEDIA_STOP,
            MediaKey::VolumeUp => MEDIA_VOLUME_UP,
            MediaKey::VolumeDown => MEDIA_VOLUME_DOWN,
            MediaKey::Mute => MEDIA_MUTE,
        }
    }

    /// HID consumer page (0x0C) usage ID for this key
    pub fn consumer_usage(self) -> u16 {
        match self {
            MediaKey::PlayPause => 0x00CD,
            MediaKey::NextTrack => 0x00B5,
            MediaKey::PreviousTrack => 0x00B6,
            MediaKey::Stop => 0x00B7,
            MediaKey::VolumeUp => 0x00E9,
            MediaKey::VolumeDown => 0x00EA,
            MediaKey::Mute => 0x00E2,
        }
    }
}

/// HID keyboard modifier bits (byte 0 of a boot keyboard report)
pub mod modifiers {
    pub const LEFT_CTRL: u8 = 0x01;
    pub const LEFT_SHIFT: u8 = 0x02;
    pub const LEFT_ALT: u8 = 0x04;
    pub const LEFT_GUI: u8 = 0x08;
    pub const RIGHT_CTRL: u8 = 0x10;
    pub const RIGHT_SHIFT: u8 = 0x20;
    pub const RIGHT_ALT: u8 = 0x40;
    pub const RIGHT_GUI: u8 = 0x80;
}

/// A keyboard shortcut: modifier bitmask plus one HID usage code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KeyCombo {
    /// Modifier bits, see [`modifiers`]
    pub modifiers: u8,
    /// HID keyboard page usage (0 = modifiers only)
    pub keycode: u8,
}

impl KeyCombo {
    pub const fn new(modifiers: u8, keycode: u8) -> Self {
        Self { modifiers, keycode }
    }

    /// True if the combo would produce no key events
    pub fn is_empty(&self) -> bool {
        self.modifiers == 0 && self.keycode == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [MediaKey; 7] = [
        MediaKey::PlayPause,
        MediaKey::NextTrack,
        MediaKey::PreviousTrack,
        MediaKey::Stop,
        MediaKey::VolumeUp,
        MediaKey::VolumeDown,
        MediaKey::Mute,
    ];

    #[test]
    fn test_media_key_wire_values() {
        for key in ALL {
            assert_eq!(MediaKey::from_byte(key.to_byte()), Some(key));
        }
    }

    #[test]
    fn test_unknown_media_key() {
        assert!(MediaKey::from_byte(0x00).is_none());
        assert!(MediaKey::from_byte(0xFF).is_none());
    }

    #[test]
    fn test_consumer_usages_are_distinct() {
        for (i, a) in ALL.iter().enumerate() {
            for b in &ALL[i + 1..] {
                assert_ne!(a.consumer_usage(), b.consumer_usage());
            }
        }
        assert_eq!(MediaKey::PlayPause.consumer_usage(), 0x00CD);
    }

    #[test]
    fn test_empty_combo() {
        assert!(KeyCombo::default().is_empty());
        assert!(!KeyCombo::new(modifiers::LEFT_CTRL, 0).is_empty());
    }
}
