//! Live configuration ownership
//!
//! The manager owns the one canonical [`DeckConfig`] and every UI element
//! rendered from it. UI elements and touch handlers hold nothing but a
//! [`ButtonAddr`]; actions are always looked up through the canonical
//! structure at press time.
//!
//! Replacing the configuration is a two-phase commit:
//! 1. destroy every element bound to the old configuration
//! 2. overwrite the canonical structure
//! 3. render the new page, minting fresh addresses
//!
//! A configuration that fails validation never reaches step 1.

use heapless::Vec;

use super::types::{
    ButtonAction, ButtonConfig, DeckConfig, ProfileConfig, ValidationError, MAX_BUTTONS_PER_PAGE,
};
use crate::traits::{Element, GuiToolkit, ResourceUsage, UiError};

/// Stable address of a button descriptor
///
/// Only the manager can mint one. An address from before the latest
/// [`ConfigLifecycleManager::apply`] resolves to nothing.
///
/// The generation is a wrapping `u16`, so an address held across exactly
/// 65,536 applies would match again. Every element is destroyed on apply,
/// so only a caller that stores addresses outside the toolkit can see this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ButtonAddr {
    page: u8,
    index: u8,
    generation: u16,
}

impl ButtonAddr {
    pub fn page(&self) -> u8 {
        self.page
    }

    pub fn index(&self) -> u8 {
        self.index
    }

    pub fn generation(&self) -> u16 {
        self.generation
    }
}

/// Errors from configuration changes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// New configuration failed validation; nothing changed
    Rejected(ValidationError),
    /// Page index out of range
    NoSuchPage(u8),
    /// Profile index out of range
    NoSuchProfile(u8),
    /// Toolkit ran out of memory while rendering; the screen is empty
    Allocation,
}

/// Outcome of one [`ConfigLifecycleManager::apply`] call
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApplyReport {
    pub result: Result<(), ConfigError>,
    /// Toolkit memory before teardown
    pub before: ResourceUsage,
    /// Toolkit memory after rebuild
    pub after: ResourceUsage,
}

impl ApplyReport {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Owner of the canonical configuration and its rendered elements
pub struct ConfigLifecycleManager<G: GuiToolkit> {
    toolkit: G,
    config: DeckConfig,
    generation: u16,
    page: u8,
    profile: u8,
    header: Option<G::Handle>,
    buttons: Vec<G::Handle, MAX_BUTTONS_PER_PAGE>,
    suspended: bool,
}

impl<G: GuiToolkit> ConfigLifecycleManager<G> {
    /// Take ownership of the startup configuration and render its home page
    ///
    /// An invalid startup configuration is replaced by the built-in default.
    pub fn new(toolkit: G, config: DeckConfig) -> Result<Self, ConfigError> {
        let config = match config.validate() {
            Ok(()) => config,
            Err(e) => {
                warn!("Startup config invalid ({:?}), using built-in default", e);
                DeckConfig::default()
            }
        };

        let profile = config.default_profile;
        let page = config.default_profile().map(|p| p.home_page).unwrap_or(0);

        let mut manager = Self {
            toolkit,
            config,
            generation: 0,
            page,
            profile,
            header: None,
            buttons: Vec::new(),
            suspended: false,
        };
        manager.render()?;
        Ok(manager)
    }

    /// Replace the configuration wholesale
    ///
    /// On validation failure the previous configuration and every live
    /// element are untouched. Toolkit memory is sampled on every call.
    pub fn apply(&mut self, new: DeckConfig) -> ApplyReport {
        let before = self.toolkit.usage();
        let result = self.replace(new);
        let after = self.toolkit.usage();

        debug!(
            "Config apply: {} -> {} bytes (high water {})",
            before.used_bytes,
            after.used_bytes,
            after.high_water_bytes
        );

        ApplyReport {
            result,
            before,
            after,
        }
    }

    fn replace(&mut self, new: DeckConfig) -> Result<(), ConfigError> {
        if let Err(e) = new.validate() {
            warn!("Config rejected: {:?}", e);
            return Err(ConfigError::Rejected(e));
        }

        self.teardown();

        self.config = new;
        self.generation = self.generation.wrapping_add(1);
        self.profile = self.config.default_profile;
        self.page = self.active_profile().home_page;

        info!(
            "Config applied: {} pages, {} buttons",
            self.config.pages.len(),
            self.config.button_count()
        );
        self.render()
    }

    /// Switch the visible page
    pub fn show_page(&mut self, page: u8) -> Result<(), ConfigError> {
        if page as usize >= self.config.pages.len() {
            return Err(ConfigError::NoSuchPage(page));
        }

        self.teardown();
        self.page = page;
        self.render()
    }

    /// Switch the active profile without leaving the current page
    pub fn select_profile(&mut self, profile: u8) -> Result<&ProfileConfig, ConfigError> {
        if profile as usize >= self.config.profiles.len() {
            return Err(ConfigError::NoSuchProfile(profile));
        }
        self.profile = profile;

        if let (Some(handle), Some(element)) = (
            self.header,
            header_element(&self.config, self.page, self.profile),
        ) {
            if let Err(e) = self.toolkit.update(handle, element) {
                warn!("Header update failed: {:?}", e);
            }
        }

        Ok(self.active_profile())
    }

    /// Destroy every element and stop rendering (host is editing the layout)
    pub fn suspend(&mut self) {
        self.teardown();
        self.suspended = true;
    }

    /// Render the current page again after [`suspend`](Self::suspend)
    pub fn resume(&mut self) -> Result<(), ConfigError> {
        self.suspended = false;
        self.teardown();
        self.render()
    }

    /// Resolve a pressed button to its action
    ///
    /// Go-to-page actions are carried out here; the rest are returned for
    /// the caller to send. A stale address yields `None`.
    pub fn press(&mut self, addr: ButtonAddr) -> Result<Option<ButtonAction>, ConfigError> {
        if self.suspended {
            return Ok(None);
        }

        let Some(action) = self.resolve(addr).map(|b| b.action) else {
            debug!("Press on stale address {:?}", addr);
            return Ok(None);
        };

        if let ButtonAction::GoToPage(page) = action {
            self.show_page(page)?;
        }
        Ok(Some(action))
    }

    /// Look up a descriptor through the canonical structure
    pub fn resolve(&self, addr: ButtonAddr) -> Option<&ButtonConfig> {
        if addr.generation != self.generation {
            return None;
        }
        self.config
            .pages
            .get(addr.page as usize)?
            .buttons
            .get(addr.index as usize)
    }

    pub fn config(&self) -> &DeckConfig {
        &self.config
    }

    pub fn current_page(&self) -> u8 {
        self.page
    }

    pub fn active_profile(&self) -> &ProfileConfig {
        // Validation guarantees at least one profile and an in-range index
        &self.config.profiles[self.profile as usize]
    }

    pub fn generation(&self) -> u16 {
        self.generation
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    /// Elements currently bound to the configuration
    pub fn live_elements(&self) -> usize {
        self.buttons.len() + usize::from(self.header.is_some())
    }

    pub fn usage(&self) -> ResourceUsage {
        self.toolkit.usage()
    }

    pub fn toolkit(&self) -> &G {
        &self.toolkit
    }

    fn teardown(&mut self) {
        while let Some(handle) = self.buttons.pop() {
            self.toolkit.destroy(handle);
        }
        if let Some(handle) = self.header.take() {
            self.toolkit.destroy(handle);
        }
    }

    fn render(&mut self) -> Result<(), ConfigError> {
        if self.suspended {
            return Ok(());
        }

        if let Err(e) = self.try_render() {
            self.teardown();
            error!("UI rebuild failed on page {}: {:?}", self.page, e);
            return Err(ConfigError::Allocation);
        }
        Ok(())
    }

    fn try_render(&mut self) -> Result<(), UiError> {
        if let Some(element) = header_element(&self.config, self.page, self.profile) {
            self.header = Some(self.toolkit.create(element)?);
        }

        let Some(page) = self.config.pages.get(self.page as usize) else {
            return Ok(());
        };

        for (index, button) in page.buttons.iter().enumerate() {
            let addr = ButtonAddr {
                page: self.page,
                index: index as u8,
                generation: self.generation,
            };
            let handle = self.toolkit.create(Element::Button {
                addr,
                label: &button.label,
            })?;
            if let Err(handle) = self.buttons.push(handle) {
                self.toolkit.destroy(handle);
                return Err(UiError::OutOfMemory);
            }
        }
        Ok(())
    }
}

fn header_element(config: &DeckConfig, page: u8, profile: u8) -> Option<Element<'_>> {
    let page_config = config.pages.get(page as usize)?;
    let profile_config = config.profiles.get(profile as usize)?;
    Some(Element::Header {
        page_label: &page_config.label,
        profile_label: &profile_config.label,
        page,
        page_count: config.pages.len() as u8,
    })
}
