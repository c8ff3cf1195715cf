//! Configuration type definitions
//!
//! These types describe the deck layout: pages of buttons plus profiles.
//! Configuration is stored in flash as postcard-serialized binary data and
//! replaced wholesale by the host.

use heapless::{String, Vec};

use pulsedeck_protocol::{modifiers, KeyCombo, MediaKey};

use crate::power::BrightnessPreset;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Current configuration layout version
pub const CONFIG_VERSION: u8 = 1;

/// Maximum label length
pub const MAX_LABEL_LEN: usize = 16;

/// Maximum pages per config
pub const MAX_PAGES: usize = 8;

/// Maximum buttons per page (4 x 3 grid)
pub const MAX_BUTTONS_PER_PAGE: usize = 12;

/// Maximum profiles per config
pub const MAX_PROFILES: usize = 4;

/// Label string
pub type Label = String<MAX_LABEL_LEN>;

/// What a button does when pressed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ButtonAction {
    /// Decorative button
    #[default]
    None,
    /// Ask the host to type a shortcut
    Hotkey(KeyCombo),
    /// Ask the host to tap a media key
    Media(MediaKey),
    /// Switch the visible page
    GoToPage(u8),
    /// Report this button's page and index to the host producer
    SendIdentity,
}

/// Button descriptor
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ButtonConfig {
    /// Display label
    pub label: Label,
    /// Action on press
    pub action: ButtonAction,
}

/// Page of buttons
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PageConfig {
    /// Display label
    pub label: Label,
    /// Buttons in grid order
    pub buttons: Vec<ButtonConfig, MAX_BUTTONS_PER_PAGE>,
}

/// Profile configuration
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ProfileConfig {
    /// Display label
    pub label: Label,
    /// Page shown when the profile is selected
    pub home_page: u8,
    /// Backlight preset while active
    pub brightness: BrightnessPreset,
    /// Seconds without activity before dimming
    pub idle_timeout_s: u16,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            label: label("Default"),
            home_page: 0,
            brightness: BrightnessPreset::Medium,
            idle_timeout_s: 60,
        }
    }
}

impl ProfileConfig {
    pub fn idle_timeout_ms(&self) -> u64 {
        u64::from(self.idle_timeout_s) * 1000
    }
}

/// Complete deck configuration
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DeckConfig {
    /// Configuration version for compatibility checks
    pub version: u8,
    /// Pages in swipe order
    pub pages: Vec<PageConfig, MAX_PAGES>,
    /// Profiles
    pub profiles: Vec<ProfileConfig, MAX_PROFILES>,
    /// Profile selected at startup
    pub default_profile: u8,
}

/// Reasons a configuration is rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ValidationError {
    /// Layout version this build does not understand
    UnsupportedVersion(u8),
    /// No pages
    NoPages,
    /// No profiles
    NoProfiles,
    /// `default_profile` does not name a profile
    DefaultProfileOutOfRange,
    /// A profile's home page does not exist
    HomePageOutOfRange { profile: u8 },
    /// A profile would dim the display immediately after every wake
    ZeroIdleTimeout { profile: u8 },
    /// A go-to-page button points at a missing page
    DanglingPageLink { page: u8, index: u8 },
}

impl DeckConfig {
    /// Create an empty configuration (fails validation until populated)
    pub fn empty() -> Self {
        Self {
            version: CONFIG_VERSION,
            pages: Vec::new(),
            profiles: Vec::new(),
            default_profile: 0,
        }
    }

    /// Check every structural invariant
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.version != CONFIG_VERSION {
            return Err(ValidationError::UnsupportedVersion(self.version));
        }
        if self.pages.is_empty() {
            return Err(ValidationError::NoPages);
        }
        if self.profiles.is_empty() {
            return Err(ValidationError::NoProfiles);
        }
        if self.default_profile as usize >= self.profiles.len() {
            return Err(ValidationError::DefaultProfileOutOfRange);
        }

        for (i, profile) in self.profiles.iter().enumerate() {
            if profile.home_page as usize >= self.pages.len() {
                return Err(ValidationError::HomePageOutOfRange { profile: i as u8 });
            }
            if profile.idle_timeout_s == 0 {
                return Err(ValidationError::ZeroIdleTimeout { profile: i as u8 });
            }
        }

        for (page, config) in self.pages.iter().enumerate() {
            for (index, button) in config.buttons.iter().enumerate() {
                if let ButtonAction::GoToPage(target) = button.action {
                    if target as usize >= self.pages.len() {
                        return Err(ValidationError::DanglingPageLink {
                            page: page as u8,
                            index: index as u8,
                        });
                    }
                }
            }
        }

        Ok(())
    }

    /// Profile selected at startup
    pub fn default_profile(&self) -> Option<&ProfileConfig> {
        self.profiles.get(self.default_profile as usize)
    }

    /// Total number of buttons across all pages
    pub fn button_count(&self) -> usize {
        self.pages.iter().map(|p| p.buttons.len()).sum()
    }
}

impl Default for DeckConfig {
    /// Built-in layout used on first boot and when flash holds nothing usable
    fn default() -> Self {
        use ButtonAction::*;

        let media = page(
            "Media",
            &[
                ("Prev", Media(MediaKey::PreviousTrack)),
                ("Play", Media(MediaKey::PlayPause)),
                ("Next", Media(MediaKey::NextTrack)),
                ("Vol -", Media(MediaKey::VolumeDown)),
                ("Mute", Media(MediaKey::Mute)),
                ("Vol +", Media(MediaKey::VolumeUp)),
                ("Keys", GoToPage(1)),
            ],
        );
        let shortcuts = page(
            "Shortcuts",
            &[
                ("Copy", Hotkey(KeyCombo::new(modifiers::LEFT_CTRL, 0x06))),
                ("Paste", Hotkey(KeyCombo::new(modifiers::LEFT_CTRL, 0x19))),
                ("Lock", Hotkey(KeyCombo::new(modifiers::LEFT_GUI, 0x0F))),
                ("Media", GoToPage(0)),
            ],
        );

        let mut config = Self::empty();
        let _ = config.pages.push(media);
        let _ = config.pages.push(shortcuts);
        let _ = config.profiles.push(ProfileConfig::default());
        config
    }
}

/// Build a label, truncating at a character boundary if too long
pub fn label(text: &str) -> Label {
    let mut out = Label::new();
    for c in text.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}

fn page(title: &str, buttons: &[(&str, ButtonAction)]) -> PageConfig {
    let mut page = PageConfig {
        label: label(title),
        buttons: Vec::new(),
    };
    for &(text, action) in buttons.iter().take(MAX_BUTTONS_PER_PAGE) {
        let _ = page.buttons.push(ButtonConfig {
            label: label(text),
            action,
        });
    }
    page
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = DeckConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.pages.len(), 2);
        assert_eq!(config.button_count(), 11);
        assert_eq!(config.default_profile().unwrap().idle_timeout_ms(), 60_000);
    }

    #[test]
    fn test_empty_config_rejected() {
        assert_eq!(DeckConfig::empty().validate(), Err(ValidationError::NoPages));

        let mut config = DeckConfig::default();
        config.profiles.clear();
        assert_eq!(config.validate(), Err(ValidationError::NoProfiles));
    }

    #[test]
    fn test_default_profile_out_of_range() {
        let mut config = DeckConfig::default();
        config.default_profile = 1;
        assert_eq!(
            config.validate(),
            Err(ValidationError::DefaultProfileOutOfRange)
        );
    }

    #[test]
    fn test_home_page_out_of_range() {
        let mut config = DeckConfig::default();
        config.profiles[0].home_page = 2;
        assert_eq!(
            config.validate(),
            Err(ValidationError::HomePageOutOfRange { profile: 0 })
        );
    }

    #[test]
    fn test_zero_idle_timeout_rejected() {
        let mut config = DeckConfig::default();
        let mut second = config.profiles[0].clone();
        second.idle_timeout_s = 0;
        let _ = config.profiles.push(second);
        assert_eq!(
            config.validate(),
            Err(ValidationError::ZeroIdleTimeout { profile: 1 })
        );
    }

    #[test]
    fn test_dangling_page_link() {
        let mut config = DeckConfig::default();
        config.pages.truncate(1);
        assert_eq!(
            config.validate(),
            Err(ValidationError::DanglingPageLink { page: 0, index: 6 })
        );
    }

    #[test]
    fn test_version_mismatch() {
        let mut config = DeckConfig::default();
        config.version = 9;
        assert_eq!(
            config.validate(),
            Err(ValidationError::UnsupportedVersion(9))
        );
    }

    #[test]
    fn test_empty_page_allowed() {
        let mut config = DeckConfig::default();
        let _ = config.pages.push(PageConfig::default());
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_label_truncates() {
        assert_eq!(label("A very long button label").as_str(), "A very long butt");
        assert_eq!(label("Play").as_str(), "Play");
    }
}
