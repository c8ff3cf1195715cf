//! Power state machine definition
//!
//! The backlight level is a function of the current state and the user's
//! brightness preset. Time is local monotonic milliseconds.

use super::events::PowerEvent;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Backlight level while dimmed
pub const DIM_LEVEL_PERCENT: u8 = 10;

/// Backlight level while showing the standby clock
pub const CLOCK_LEVEL_PERCENT: u8 = 3;

/// Power states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerState {
    /// Full brightness, controls live
    #[default]
    Active,
    /// Idle; backlight lowered until the next touch or message
    Dimmed,
    /// Host is down; minimal backlight, wireless listener stays live
    Clock,
}

/// User-selectable backlight levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum BrightnessPreset {
    Low,
    #[default]
    Medium,
    High,
}

impl BrightnessPreset {
    /// Backlight duty in percent
    pub fn percent(self) -> u8 {
        match self {
            BrightnessPreset::Low => 25,
            BrightnessPreset::Medium => 55,
            BrightnessPreset::High => 100,
        }
    }
}

impl PowerState {
    /// Process an event and return the next state
    ///
    /// Pairs not listed leave the state unchanged.
    pub fn transition(self, event: PowerEvent) -> Self {
        use PowerEvent::*;
        use PowerState::*;

        match (self, event) {
            (Active, IdleTimeout) => Dimmed,

            (Dimmed, LocalActivity) => Active,
            (Dimmed, InboundMessage) => Active,

            (Active, ShutdownSignal) => Clock,
            (Dimmed, ShutdownSignal) => Clock,

            (Clock, InboundMessage) => Active,

            _ => self,
        }
    }

    /// Check if touch input should trigger button actions
    pub fn controls_live(&self) -> bool {
        matches!(self, PowerState::Active)
    }
}

/// A state change reported by [`PowerStateMachine`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PowerTransition {
    pub from: PowerState,
    pub to: PowerState,
    pub event: PowerEvent,
}

/// Power state plus the idle timer and brightness preset
#[derive(Debug, Clone)]
pub struct PowerStateMachine {
    state: PowerState,
    preset: BrightnessPreset,
    idle_timeout_ms: u64,
    last_activity_ms: u64,
}

impl PowerStateMachine {
    /// Start in [`PowerState::Active`] with the idle timer running from `now_ms`
    pub fn new(idle_timeout_ms: u64, preset: BrightnessPreset, now_ms: u64) -> Self {
        Self {
            state: PowerState::Active,
            preset,
            idle_timeout_ms,
            last_activity_ms: now_ms,
        }
    }

    pub fn state(&self) -> PowerState {
        self.state
    }

    pub fn preset(&self) -> BrightnessPreset {
        self.preset
    }

    pub fn idle_timeout_ms(&self) -> u64 {
        self.idle_timeout_ms
    }

    /// Record the user's brightness choice
    ///
    /// Takes effect immediately while active, and is what a dimmed display
    /// returns to.
    pub fn set_preset(&mut self, preset: BrightnessPreset) {
        self.preset = preset;
    }

    pub fn set_idle_timeout(&mut self, idle_timeout_ms: u64) {
        self.idle_timeout_ms = idle_timeout_ms;
    }

    /// Apply an event at `now_ms`
    ///
    /// Activity and inbound messages restart the idle timer whether or not
    /// the state changes.
    pub fn handle(&mut self, event: PowerEvent, now_ms: u64) -> Option<PowerTransition> {
        if matches!(event, PowerEvent::LocalActivity | PowerEvent::InboundMessage) {
            self.last_activity_ms = now_ms;
        }

        let from = self.state;
        let to = from.transition(event);
        if to == from {
            return None;
        }

        self.state = to;
        if to == PowerState::Active {
            self.last_activity_ms = now_ms;
        }
        Some(PowerTransition { from, to, event })
    }

    pub fn on_activity(&mut self, now_ms: u64) -> Option<PowerTransition> {
        self.handle(PowerEvent::LocalActivity, now_ms)
    }

    pub fn on_inbound(&mut self, now_ms: u64) -> Option<PowerTransition> {
        self.handle(PowerEvent::InboundMessage, now_ms)
    }

    pub fn on_shutdown(&mut self, now_ms: u64) -> Option<PowerTransition> {
        self.handle(PowerEvent::ShutdownSignal, now_ms)
    }

    /// Advance the idle timer
    ///
    /// Fires [`PowerEvent::IdleTimeout`] once the timer expires; the event is
    /// a no-op outside [`PowerState::Active`], so dimming happens once.
    pub fn tick(&mut self, now_ms: u64) -> Option<PowerTransition> {
        let idle_ms = now_ms.saturating_sub(self.last_activity_ms);
        if idle_ms < self.idle_timeout_ms {
            return None;
        }
        self.handle(PowerEvent::IdleTimeout, now_ms)
    }

    /// Backlight level for the current state, in percent
    pub fn backlight_percent(&self) -> u8 {
        match self.state {
            PowerState::Active => self.preset.percent(),
            PowerState::Dimmed => DIM_LEVEL_PERCENT,
            PowerState::Clock => CLOCK_LEVEL_PERCENT,
        }
    }
}
