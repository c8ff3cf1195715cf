//! Relay message router
//!
//! Bridges the wired host channel and the wireless display link. Each
//! direction is pumped independently every tick:
//!
//! ```text
//!  host ──wired──▶ parse ─▶ telemetry/control ─▶ [mailbox] ─▶ wireless ──▶ display
//!  host ◀─wired─── [mailbox] ◀─ button identity ◀─ parse ◀──── wireless ── display
//!                                hotkey / media ─▶ HID output ─▶ ack ─▶ wireless
//! ```
//!
//! Sends are single attempts. A failed send is logged and the frame is
//! dropped; the next telemetry frame replaces it anyway.

mod mailbox;

pub use mailbox::Mailbox;

use pulsedeck_hal::Link;
use pulsedeck_protocol::{Frame, FrameParser, Message, MessageType, ParserStats};

use crate::config::RuntimeConfig;
use crate::traits::HostOutput;
use crate::transport;

/// Router counters since boot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RouterStats {
    /// Frames delivered to the display
    pub to_display: u32,
    /// Frames delivered to the host
    pub to_host: u32,
    /// Frames overwritten in a mailbox before sending
    pub superseded: u32,
    /// Sends that failed and were dropped
    pub send_failures: u32,
    /// Frames dropped as malformed or arriving from the wrong side
    pub dropped: u32,
    /// HID actions performed
    pub host_actions: u32,
    /// HID actions the host side refused
    pub host_failures: u32,
    /// Hotkey acknowledgements sent
    pub acks_sent: u32,
    /// Link read errors
    pub link_errors: u32,
}

/// Relay between the wired host channel `W` and the wireless link `R`
pub struct Router<W: Link, R: Link, H: HostOutput> {
    wired: W,
    wireless: R,
    host: H,
    wired_rx: FrameParser,
    wireless_rx: FrameParser,
    to_display: Mailbox,
    to_host: Mailbox,
    ack_hotkeys: bool,
    stats: RouterStats,
}

impl<W: Link, R: Link, H: HostOutput> Router<W, R, H> {
    pub fn new(wired: W, wireless: R, host: H, runtime: &RuntimeConfig) -> Self {
        Self {
            wired,
            wireless,
            host,
            wired_rx: FrameParser::new(),
            wireless_rx: FrameParser::new(),
            to_display: Mailbox::new(),
            to_host: Mailbox::new(),
            ack_hotkeys: runtime.ack_hotkeys,
            stats: RouterStats::default(),
        }
    }

    /// Run one cooperative cycle: pump both directions, then flush
    pub fn tick(&mut self) {
        self.receive_from_host();
        self.receive_from_display();
        self.flush();
    }

    /// Router counters
    pub fn stats(&self) -> RouterStats {
        RouterStats {
            superseded: self
                .to_display
                .superseded()
                .saturating_add(self.to_host.superseded()),
            ..self.stats
        }
    }

    /// Parser counters for the wired and wireless sides
    pub fn parser_stats(&self) -> (ParserStats, ParserStats) {
        (self.wired_rx.stats(), self.wireless_rx.stats())
    }

    fn receive_from_host(&mut self) {
        if let Err(e) = transport::fill(&mut self.wired, &mut self.wired_rx) {
            warn!("Host link read failed: {:?}", e);
            self.stats.link_errors = self.stats.link_errors.saturating_add(1);
        }

        while let Some(result) = self.wired_rx.poll() {
            match result {
                Ok(frame) => self.route_from_host(frame),
                Err(e) => trace!("Host link: discarded candidate ({:?})", e),
            }
        }
    }

    fn receive_from_display(&mut self) {
        if let Err(e) = transport::fill(&mut self.wireless, &mut self.wireless_rx) {
            warn!("Wireless read failed: {:?}", e);
            self.stats.link_errors = self.stats.link_errors.saturating_add(1);
        }

        while let Some(result) = self.wireless_rx.poll() {
            match result {
                Ok(frame) => self.route_from_display(frame),
                Err(e) => trace!("Wireless: discarded candidate ({:?})", e),
            }
        }
    }

    fn route_from_host(&mut self, frame: Frame) {
        let kind = match Message::from_frame(&frame) {
            Ok(message) => message.message_type(),
            Err(e) => {
                debug!("Dropping malformed host frame: {:?}", e);
                self.stats.dropped = self.stats.dropped.saturating_add(1);
                return;
            }
        };

        match kind {
            MessageType::Stats
            | MessageType::PowerState
            | MessageType::TimeSync
            | MessageType::Notification
            | MessageType::Ping
            | MessageType::EnterConfigMode
            | MessageType::ExitConfigMode => {
                if self.to_display.post(frame) {
                    trace!("Unsent display frame superseded");
                }
            }
            MessageType::HotkeyPress
            | MessageType::HotkeyAck
            | MessageType::MediaKey
            | MessageType::ButtonIdentity => {
                debug!("Dropping {:?} from host", kind);
                self.stats.dropped = self.stats.dropped.saturating_add(1);
            }
        }
    }

    fn route_from_display(&mut self, frame: Frame) {
        let message = Message::from_frame(&frame);

        match message {
            Ok(Message::HotkeyPress { seq, combo }) => match self.host.send_hotkey(combo) {
                Ok(()) => {
                    self.stats.host_actions = self.stats.host_actions.saturating_add(1);
                    if self.ack_hotkeys {
                        self.send_ack(seq);
                    }
                }
                Err(e) => {
                    warn!("Hotkey {} not sent to host: {:?}", seq, e);
                    self.stats.host_failures = self.stats.host_failures.saturating_add(1);
                }
            },
            Ok(Message::MediaKey(key)) => match self.host.send_media(key) {
                Ok(()) => self.stats.host_actions = self.stats.host_actions.saturating_add(1),
                Err(e) => {
                    warn!("Media key {:?} not sent to host: {:?}", key, e);
                    self.stats.host_failures = self.stats.host_failures.saturating_add(1);
                }
            },
            Ok(Message::ButtonIdentity { .. }) => {
                if self.to_host.post(frame) {
                    trace!("Unsent host frame superseded");
                }
            }
            Ok(other) => {
                debug!("Dropping {:?} from display", other.message_type());
                self.stats.dropped = self.stats.dropped.saturating_add(1);
            }
            Err(e) => {
                debug!("Dropping malformed display frame: {:?}", e);
                self.stats.dropped = self.stats.dropped.saturating_add(1);
            }
        }
    }

    fn send_ack(&mut self, seq: u8) {
        match transport::send_message(&mut self.wireless, &Message::HotkeyAck { seq }) {
            Ok(()) => self.stats.acks_sent = self.stats.acks_sent.saturating_add(1),
            Err(e) => {
                warn!("Ack {} dropped: {:?}", seq, e);
                self.stats.send_failures = self.stats.send_failures.saturating_add(1);
            }
        }
    }

    fn flush(&mut self) {
        if let Some(frame) = self.to_display.take() {
            match transport::send(&mut self.wireless, &frame) {
                Ok(()) => self.stats.to_display = self.stats.to_display.saturating_add(1),
                Err(e) => {
                    warn!("Wireless send of type {} dropped: {:?}", frame.msg_type, e);
                    self.stats.send_failures = self.stats.send_failures.saturating_add(1);
                }
            }
        }

        if let Some(frame) = self.to_host.take() {
            match transport::send(&mut self.wired, &frame) {
                Ok(()) => self.stats.to_host = self.stats.to_host.saturating_add(1),
                Err(e) => {
                    warn!("Host send of type {} dropped: {:?}", frame.msg_type, e);
                    self.stats.send_failures = self.stats.send_failures.saturating_add(1);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeHost, FakeLink};
    use pulsedeck_protocol::messages::{stats_frame, MSG_HOTKEY_ACK, MSG_POWER_STATE};
    use pulsedeck_protocol::{modifiers, KeyCombo, MediaKey, PowerSignal, StatTag};

    struct Rig {
        router: Router<FakeLink, FakeLink, FakeHost>,
        host_link: FakeLink,
        display_link: FakeLink,
        host: FakeHost,
    }

    fn rig(runtime: RuntimeConfig) -> Rig {
        let host_link = FakeLink::default();
        let display_link = FakeLink::default();
        let host = FakeHost::default();
        let router = Router::new(
            host_link.clone(),
            display_link.clone(),
            host.clone(),
            &runtime,
        );
        Rig {
            router,
            host_link,
            display_link,
            host,
        }
    }

    const COPY: KeyCombo = KeyCombo::new(modifiers::LEFT_CTRL, 0x06);

    #[test]
    fn test_stats_forwarded_unchanged() {
        let mut rig = rig(RuntimeConfig::default());
        let frame = stats_frame(&[(StatTag::CpuPercent, 42), (StatTag::RamPercent, 67)]).unwrap();
        rig.host_link.inject_frame(&frame);

        rig.router.tick();

        assert_eq!(rig.display_link.take_sent(), std::vec![frame]);
        assert!(rig.host_link.take_sent().is_empty());
        assert_eq!(rig.router.stats().to_display, 1);
    }

    #[test]
    fn test_newest_telemetry_wins_within_a_tick() {
        let mut rig = rig(RuntimeConfig::default());
        let old = stats_frame(&[(StatTag::CpuPercent, 10)]).unwrap();
        let new = stats_frame(&[(StatTag::CpuPercent, 90)]).unwrap();
        rig.host_link.inject_frame(&old);
        rig.host_link.inject_frame(&new);

        rig.router.tick();

        assert_eq!(rig.display_link.take_sent(), std::vec![new]);
        assert_eq!(rig.router.stats().superseded, 1);
    }

    #[test]
    fn test_control_frames_forwarded_to_display() {
        let mut rig = rig(RuntimeConfig::default());
        for message in [
            Message::Ping,
            Message::EnterConfigMode,
            Message::PowerState(PowerSignal::Shutdown),
        ] {
            rig.host_link.inject_message(message);
            rig.router.tick();
            let sent = rig.display_link.take_sent();
            assert_eq!(sent.len(), 1);
            assert_eq!(sent[0].msg_type, message.message_type().to_byte());
        }
    }

    #[test]
    fn test_hotkey_performed_then_acked() {
        let mut rig = rig(RuntimeConfig::default());
        rig.display_link.inject_message(Message::HotkeyPress {
            seq: 9,
            combo: COPY,
        });

        rig.router.tick();

        assert_eq!(rig.host.0.borrow().hotkeys, std::vec![COPY]);
        let sent = rig.display_link.take_sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].msg_type, MSG_HOTKEY_ACK);
        assert_eq!(sent[0].payload[..], [9]);
        assert_eq!(rig.router.stats().acks_sent, 1);
    }

    #[test]
    fn test_ack_disabled() {
        let mut rig = rig(RuntimeConfig {
            ack_hotkeys: false,
            ..Default::default()
        });
        rig.display_link.inject_message(Message::HotkeyPress {
            seq: 1,
            combo: COPY,
        });

        rig.router.tick();

        assert_eq!(rig.host.0.borrow().hotkeys.len(), 1);
        assert!(rig.display_link.take_sent().is_empty());
    }

    #[test]
    fn test_host_refusal_is_not_acked() {
        let mut rig = rig(RuntimeConfig::default());
        rig.host.0.borrow_mut().fail = true;
        rig.display_link.inject_message(Message::HotkeyPress {
            seq: 1,
            combo: COPY,
        });

        rig.router.tick();

        assert!(rig.display_link.take_sent().is_empty());
        assert_eq!(rig.router.stats().host_failures, 1);
    }

    #[test]
    fn test_media_key_to_host() {
        let mut rig = rig(RuntimeConfig::default());
        rig.display_link
            .inject_message(Message::MediaKey(MediaKey::VolumeUp));

        rig.router.tick();

        assert_eq!(rig.host.0.borrow().media, std::vec![MediaKey::VolumeUp]);
        assert!(rig.display_link.take_sent().is_empty());
    }

    #[test]
    fn test_button_identity_forwarded_to_host() {
        let mut rig = rig(RuntimeConfig::default());
        let message = Message::ButtonIdentity { page: 1, index: 4 };
        rig.display_link.inject_message(message);

        rig.router.tick();

        assert_eq!(
            rig.host_link.take_sent(),
            std::vec![message.to_frame().unwrap()]
        );
        assert_eq!(rig.router.stats().to_host, 1);
    }

    #[test]
    fn test_failed_send_is_dropped_not_retried() {
        let mut rig = rig(RuntimeConfig::default());
        rig.display_link.fail_writes(true);
        rig.host_link
            .inject_frame(&stats_frame(&[(StatTag::CpuPercent, 1)]).unwrap());

        rig.router.tick();
        assert_eq!(rig.display_link.write_attempts(), 1);
        assert_eq!(rig.router.stats().send_failures, 1);

        rig.display_link.fail_writes(false);
        rig.router.tick();
        assert_eq!(rig.display_link.write_attempts(), 1);
        assert!(rig.display_link.take_sent().is_empty());
    }

    #[test]
    fn test_wrong_side_frames_dropped() {
        let mut rig = rig(RuntimeConfig::default());
        rig.display_link
            .inject_frame(&stats_frame(&[(StatTag::CpuPercent, 1)]).unwrap());
        rig.host_link.inject_message(Message::HotkeyPress {
            seq: 1,
            combo: COPY,
        });

        rig.router.tick();

        assert!(rig.host_link.take_sent().is_empty());
        assert!(rig.display_link.take_sent().is_empty());
        assert!(rig.host.0.borrow().hotkeys.is_empty());
        assert_eq!(rig.router.stats().dropped, 2);
    }

    #[test]
    fn test_malformed_payload_dropped() {
        let mut rig = rig(RuntimeConfig::default());
        rig.host_link
            .inject_frame(&Frame::new(MSG_POWER_STATE, &[9]).unwrap());

        rig.router.tick();

        assert!(rig.display_link.take_sent().is_empty());
        assert_eq!(rig.router.stats().dropped, 1);
    }

    #[test]
    fn test_corrupt_host_stream_does_not_block_display_side() {
        let mut rig = rig(RuntimeConfig::default());
        let mut corrupt = Message::Ping.to_frame().unwrap().encode_to_vec().unwrap();
        corrupt[3] ^= 0xFF;
        rig.host_link.inject(&[0x00, 0x13]);
        rig.host_link.inject(&corrupt);
        rig.display_link
            .inject_message(Message::MediaKey(MediaKey::Mute));

        rig.router.tick();

        assert_eq!(rig.host.0.borrow().media, std::vec![MediaKey::Mute]);
        let (wired, _) = rig.router.parser_stats();
        assert_eq!(wired.crc_errors, 1);
        assert_eq!(wired.frames, 0);
    }
}
