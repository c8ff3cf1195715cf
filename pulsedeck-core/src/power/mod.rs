//! Display power management
//!
//! The display runs from a battery, so the backlight follows a small state
//! machine driven by touch activity, inbound traffic and the host's
//! lifecycle signals.

pub mod events;
pub mod machine;

pub use events::PowerEvent;
pub use machine::{
    BrightnessPreset, PowerState, PowerStateMachine, PowerTransition, CLOCK_LEVEL_PERCENT,
    DIM_LEVEL_PERCENT,
};
