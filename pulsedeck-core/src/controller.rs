//! Display-side controller
//!
//! One cooperative [`DeckController::tick`] per display loop iteration:
//! 1. drain the wireless link and dispatch every valid frame
//! 2. advance the power state machine
//! 3. drive the backlight and sample the fuel gauge over the shared bus
//!
//! Touches arrive separately through [`DeckController::press`] with the
//! [`ButtonAddr`] the toolkit was given at render time.

use heapless::String;

use pulsedeck_hal::{BusError, I2cBus, Link, Peripheral, SharedBus};
use pulsedeck_protocol::messages::MAX_NOTIFICATION_LEN;
use pulsedeck_protocol::{
    Frame, FrameParser, Message, NotificationLevel, ParserStats, PowerSignal, StatTag,
};

use crate::config::{
    ApplyReport, ButtonAction, ButtonAddr, ConfigError, ConfigLifecycleManager, DeckConfig,
    RuntimeConfig,
};
use crate::power::{BrightnessPreset, PowerState, PowerStateMachine, PowerTransition};
use crate::telemetry::{Reading, StatsBoard};
use crate::traits::GuiToolkit;
use crate::transport::{self, SendError};

/// Peripherals on the display's shared bus
pub struct Board<S, B, F> {
    /// Shared bus handle
    pub bus: S,
    /// Backlight driver, duty in percent
    pub backlight: B,
    /// Fuel gauge, state of charge in percent
    pub gauge: F,
}

/// Host wall clock, anchored to local monotonic time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WallClock {
    pub epoch_s: u32,
    pub utc_offset_min: i16,
    pub synced_at_ms: u64,
}

impl WallClock {
    /// UTC seconds since the epoch at `now_ms`
    pub fn epoch_at(&self, now_ms: u64) -> u32 {
        let elapsed_s = now_ms.saturating_sub(self.synced_at_ms) / 1000;
        self.epoch_s.saturating_add(elapsed_s as u32)
    }

    /// Local time of day at `now_ms` as (hours, minutes)
    pub fn local_hm(&self, now_ms: u64) -> (u8, u8) {
        let local = i64::from(self.epoch_at(now_ms)) + i64::from(self.utc_offset_min) * 60;
        let day_s = local.rem_euclid(86_400);
        ((day_s / 3600) as u8, ((day_s % 3600) / 60) as u8)
    }
}

/// Latest host notification
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Notice {
    pub level: NotificationLevel,
    pub text: String<MAX_NOTIFICATION_LEN>,
    pub received_ms: u64,
}

/// Controller counters since boot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ControllerStats {
    /// Frames that passed CRC but not payload checks
    pub invalid_frames: u32,
    /// Relay-bound messages seen on the display side
    pub wrong_side: u32,
    /// Outbound frames dropped
    pub send_failures: u32,
    /// Bus transactions skipped because the bus was held
    pub bus_busy: u32,
    /// Link read errors
    pub link_errors: u32,
}

/// Display device logic
pub struct DeckController<L, G, S, B, F>
where
    L: Link,
    G: GuiToolkit,
    S: SharedBus,
    S::Bus: I2cBus,
    B: Peripheral<S::Bus, Value = u8>,
    F: Peripheral<S::Bus, Value = u8>,
{
    link: L,
    parser: FrameParser,
    ui: ConfigLifecycleManager<G>,
    power: PowerStateMachine,
    stats: StatsBoard,
    board: Board<S, B, F>,
    backlight_ok: bool,
    gauge_ok: bool,
    backlight_level: Option<u8>,
    battery: Reading<u8>,
    next_battery_poll_ms: u64,
    clock: Option<WallClock>,
    notice: Option<Notice>,
    config_mode: bool,
    last_rx_ms: Option<u64>,
    next_seq: u8,
    pending_ack: Option<u8>,
    runtime: RuntimeConfig,
    counters: ControllerStats,
}

impl<L, G, S, B, F> DeckController<L, G, S, B, F>
where
    L: Link,
    G: GuiToolkit,
    S: SharedBus,
    S::Bus: I2cBus,
    B: Peripheral<S::Bus, Value = u8>,
    F: Peripheral<S::Bus, Value = u8>,
{
    /// Bring up peripherals and render the startup configuration
    pub fn new(
        link: L,
        toolkit: G,
        mut board: Board<S, B, F>,
        config: DeckConfig,
        runtime: RuntimeConfig,
        now_ms: u64,
    ) -> Result<Self, ConfigError> {
        let ui = ConfigLifecycleManager::new(toolkit, config)?;
        let profile = ui.active_profile();
        let power = PowerStateMachine::new(profile.idle_timeout_ms(), profile.brightness, now_ms);

        let backlight_ok = board.bus.try_init(&mut board.backlight);
        if !backlight_ok {
            warn!("Backlight did not respond");
        }
        let gauge_ok = board.bus.try_init(&mut board.gauge);
        if !gauge_ok {
            warn!("Fuel gauge did not respond, battery unavailable");
        }

        let mut controller = Self {
            link,
            parser: FrameParser::new(),
            ui,
            power,
            stats: StatsBoard::new(runtime.stats_stale_ms),
            board,
            backlight_ok,
            gauge_ok,
            backlight_level: None,
            battery: Reading::Unavailable,
            next_battery_poll_ms: now_ms,
            clock: None,
            notice: None,
            config_mode: false,
            last_rx_ms: None,
            next_seq: 0,
            pending_ack: None,
            runtime,
            counters: ControllerStats::default(),
        };
        controller.apply_backlight();

        info!("Display controller started");
        Ok(controller)
    }

    /// Run one cooperative cycle
    ///
    /// Only [`ConfigError::Allocation`] is returned; the caller resets.
    pub fn tick(&mut self, now_ms: u64) -> Result<(), ConfigError> {
        let received = self.receive(now_ms);

        if let Some(t) = self.power.tick(now_ms) {
            log_transition(&t);
        }
        self.apply_backlight();
        self.poll_battery(now_ms);

        received
    }

    /// Handle a touch on a rendered button
    ///
    /// A touch that wakes a dimmed display is consumed by the wake. Touches
    /// are ignored on the standby clock and while the host edits the layout.
    pub fn press(&mut self, addr: ButtonAddr, now_ms: u64) -> Result<(), ConfigError> {
        let live = self.power.state().controls_live();
        if let Some(t) = self.power.on_activity(now_ms) {
            log_transition(&t);
            self.apply_backlight();
        }
        if !live || self.config_mode {
            return Ok(());
        }

        let message = match self.ui.press(addr)? {
            Some(ButtonAction::Hotkey(combo)) => {
                let seq = self.next_seq;
                self.next_seq = self.next_seq.wrapping_add(1);
                Message::HotkeyPress { seq, combo }
            }
            Some(ButtonAction::Media(key)) => Message::MediaKey(key),
            Some(ButtonAction::SendIdentity) => Message::ButtonIdentity {
                page: addr.page(),
                index: addr.index(),
            },
            Some(ButtonAction::GoToPage(_)) | Some(ButtonAction::None) | None => return Ok(()),
        };

        if self.submit(&message).is_ok() {
            if let Message::HotkeyPress { seq, .. } = message {
                self.pending_ack = Some(seq);
            }
        }
        Ok(())
    }

    /// Register a touch that hit no button (swipe, background)
    pub fn on_activity(&mut self, now_ms: u64) {
        if let Some(t) = self.power.on_activity(now_ms) {
            log_transition(&t);
            self.apply_backlight();
        }
    }

    /// Send a message to the relay, single attempt
    pub fn submit(&mut self, message: &Message<'_>) -> Result<(), SendError> {
        let result = transport::send_message(&mut self.link, message);
        if let Err(e) = result {
            warn!("Send of {:?} dropped: {:?}", message.message_type(), e);
            self.counters.send_failures = self.counters.send_failures.saturating_add(1);
        }
        result
    }

    /// Replace the deck configuration
    ///
    /// Brightness and idle timeout follow the new default profile whenever
    /// the configuration was swapped, including a swap whose rebuild failed.
    pub fn apply_config(&mut self, config: DeckConfig) -> ApplyReport {
        let report = self.ui.apply(config);
        if matches!(report.result, Ok(()) | Err(ConfigError::Allocation)) {
            self.sync_profile();
        }
        report
    }

    pub fn show_page(&mut self, page: u8) -> Result<(), ConfigError> {
        self.ui.show_page(page)
    }

    /// Switch profile; brightness and idle timeout follow it
    pub fn select_profile(&mut self, profile: u8) -> Result<(), ConfigError> {
        self.ui.select_profile(profile)?;
        self.sync_profile();
        Ok(())
    }

    /// Record the user's brightness choice
    pub fn set_brightness(&mut self, preset: BrightnessPreset) {
        self.power.set_preset(preset);
        self.apply_backlight();
    }

    pub fn power_state(&self) -> PowerState {
        self.power.state()
    }

    /// Last level written to the backlight
    pub fn backlight_level(&self) -> Option<u8> {
        self.backlight_level
    }

    pub fn stat(&self, tag: StatTag, now_ms: u64) -> Reading<u16> {
        self.stats.get(tag, now_ms)
    }

    pub fn stats_board(&self) -> &StatsBoard {
        &self.stats
    }

    pub fn battery(&self) -> Reading<u8> {
        self.battery
    }

    pub fn clock(&self) -> Option<WallClock> {
        self.clock
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    pub fn is_config_mode(&self) -> bool {
        self.config_mode
    }

    /// True if the relay has been heard from recently
    pub fn link_alive(&self, now_ms: u64) -> bool {
        self.last_rx_ms
            .is_some_and(|at| now_ms.saturating_sub(at) <= self.runtime.link_timeout_ms)
    }

    /// Sequence number of a hotkey the relay has not confirmed yet
    pub fn pending_ack(&self) -> Option<u8> {
        self.pending_ack
    }

    pub fn counters(&self) -> ControllerStats {
        self.counters
    }

    pub fn parser_stats(&self) -> ParserStats {
        self.parser.stats()
    }

    pub fn ui(&self) -> &ConfigLifecycleManager<G> {
        &self.ui
    }

    fn receive(&mut self, now_ms: u64) -> Result<(), ConfigError> {
        if let Err(e) = transport::fill(&mut self.link, &mut self.parser) {
            warn!("Wireless read failed: {:?}", e);
            self.counters.link_errors = self.counters.link_errors.saturating_add(1);
        }

        while let Some(result) = self.parser.poll() {
            match result {
                Ok(frame) => self.dispatch(&frame, now_ms)?,
                Err(e) => trace!("Wireless: discarded candidate ({:?})", e),
            }
        }
        Ok(())
    }

    fn dispatch(&mut self, frame: &Frame, now_ms: u64) -> Result<(), ConfigError> {
        let message = match Message::from_frame(frame) {
            Ok(message) => message,
            Err(e) => {
                debug!("Dropping malformed frame: {:?}", e);
                self.counters.invalid_frames = self.counters.invalid_frames.saturating_add(1);
                return Ok(());
            }
        };
        self.last_rx_ms = Some(now_ms);

        let transition = match message {
            Message::PowerState(PowerSignal::Shutdown) => self.power.on_shutdown(now_ms),
            _ => self.power.on_inbound(now_ms),
        };
        if let Some(t) = transition {
            log_transition(&t);
        }

        match message {
            Message::Stats(payload) => {
                let stored = self.stats.apply(&payload, now_ms);
                trace!("Stats: {} metrics", stored);
            }
            Message::PowerState(signal) => debug!("Host power signal: {:?}", signal),
            Message::TimeSync {
                epoch_s,
                utc_offset_min,
            } => {
                self.clock = Some(WallClock {
                    epoch_s,
                    utc_offset_min,
                    synced_at_ms: now_ms,
                });
            }
            Message::Notification { level, text } => {
                let mut stored = String::new();
                // Decoding bounds text to the capacity
                let _ = stored.push_str(text);
                self.notice = Some(Notice {
                    level,
                    text: stored,
                    received_ms: now_ms,
                });
            }
            Message::Ping => trace!("Ping"),
            Message::EnterConfigMode => {
                if !self.config_mode {
                    info!("Entering config mode");
                    self.config_mode = true;
                    self.ui.suspend();
                }
            }
            Message::ExitConfigMode => {
                if self.config_mode {
                    info!("Leaving config mode");
                    self.config_mode = false;
                    self.ui.resume()?;
                }
            }
            Message::HotkeyAck { seq } => {
                if self.pending_ack == Some(seq) {
                    self.pending_ack = None;
                } else {
                    debug!("Unexpected ack {}", seq);
                }
            }
            Message::HotkeyPress { .. } | Message::MediaKey(_) | Message::ButtonIdentity { .. } => {
                self.counters.wrong_side = self.counters.wrong_side.saturating_add(1);
            }
        }
        Ok(())
    }

    fn sync_profile(&mut self) {
        let profile = self.ui.active_profile();
        self.power.set_preset(profile.brightness);
        self.power.set_idle_timeout(profile.idle_timeout_ms());
        self.apply_backlight();
    }

    fn apply_backlight(&mut self) {
        if !self.backlight_ok {
            return;
        }
        let target = self.power.backlight_percent();
        if self.backlight_level == Some(target) {
            return;
        }

        match self.board.bus.try_set(&mut self.board.backlight, target) {
            Ok(()) => {
                trace!("Backlight {}%", target);
                self.backlight_level = Some(target);
            }
            Err(BusError::Busy) => {
                trace!("Bus busy, backlight deferred");
                self.counters.bus_busy = self.counters.bus_busy.saturating_add(1);
            }
            Err(BusError::Device) => warn!("Backlight write failed"),
        }
    }

    fn poll_battery(&mut self, now_ms: u64) {
        if now_ms < self.next_battery_poll_ms {
            return;
        }
        self.next_battery_poll_ms = now_ms.saturating_add(self.runtime.battery_poll_ms);

        if !self.gauge_ok {
            self.battery = Reading::Unavailable;
            return;
        }

        self.battery = match self.board.bus.try_read(&mut self.board.gauge) {
            Ok(percent) => Reading::Value(percent),
            Err(BusError::Busy) => {
                self.counters.bus_busy = self.counters.bus_busy.saturating_add(1);
                Reading::Unavailable
            }
            Err(BusError::Device) => {
                warn!("Fuel gauge read failed");
                Reading::Unavailable
            }
        };
    }
}

fn log_transition(t: &PowerTransition) {
    info!("Power: {:?} -> {:?} on {:?}", t.from, t.to, t.event);
}
