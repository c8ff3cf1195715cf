//! Frame I/O over non-blocking links
//!
//! Receiving is split in two so callers can dispatch each frame with full
//! access to their own state: [`fill`] moves whatever the link has ready
//! into the parser, then the caller drains [`FrameParser::poll`].

use pulsedeck_hal::{LinkError, LinkRx, LinkTx};
use pulsedeck_protocol::frame::RX_BUFFER_SIZE;
use pulsedeck_protocol::{Frame, FrameError, FrameParser, Message, MessageError};

/// Bytes requested per link read
pub const READ_CHUNK: usize = 64;

/// Errors that can occur when sending a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SendError {
    /// Message does not fit its wire shape
    Invalid(MessageError),
    Encode(FrameError),
    Link(LinkError),
}

/// Move pending link bytes into the parser without waiting
///
/// Stops when the link has nothing more or the parser buffer is full, so a
/// flooding peer cannot hold the tick. Returns the number of bytes moved.
pub fn fill<L: LinkRx + ?Sized>(link: &mut L, parser: &mut FrameParser) -> Result<usize, LinkError> {
    let mut chunk = [0u8; READ_CHUNK];
    let mut moved = 0;

    loop {
        let room = RX_BUFFER_SIZE - parser.buffered();
        if room == 0 {
            break;
        }

        let want = room.min(READ_CHUNK);
        let n = match link.poll_read(&mut chunk[..want]) {
            Ok(n) => n,
            Err(LinkError::Overrun) => {
                // Bytes were lost mid-stream; whatever is buffered is suspect
                parser.reset();
                return Err(LinkError::Overrun);
            }
            Err(e) => return Err(e),
        };
        if n == 0 {
            break;
        }

        parser.push(&chunk[..n]);
        moved += n;
    }

    Ok(moved)
}

/// Encode and hand a frame to the link in a single attempt
pub fn send<L: LinkTx + ?Sized>(link: &mut L, frame: &Frame) -> Result<(), SendError> {
    let bytes = frame.encode_to_vec().map_err(SendError::Encode)?;
    link.try_write(&bytes).map_err(SendError::Link)
}

/// Encode a message and send it in a single attempt
pub fn send_message<L: LinkTx + ?Sized>(link: &mut L, message: &Message<'_>) -> Result<(), SendError> {
    let frame = message.to_frame().map_err(SendError::Invalid)?;
    send(link, &frame)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeLink;

    #[test]
    fn test_fill_then_poll() {
        let mut link = FakeLink::default();
        let mut parser = FrameParser::new();
        link.inject_message(Message::Ping);
        link.inject_message(Message::HotkeyAck { seq: 3 });

        assert_eq!(fill(&mut link, &mut parser), Ok(5 + 4));
        assert_eq!(parser.poll().unwrap().unwrap().msg_type, 0x07);
        assert_eq!(parser.poll().unwrap().unwrap().payload[..], [3]);
        assert!(parser.poll().is_none());
    }

    #[test]
    fn test_fill_stops_when_parser_full() {
        let mut link = FakeLink::default();
        let mut parser = FrameParser::new();
        link.inject(&[0x55; RX_BUFFER_SIZE + 100]);

        assert_eq!(fill(&mut link, &mut parser), Ok(RX_BUFFER_SIZE));
        assert_eq!(parser.buffered(), RX_BUFFER_SIZE);

        // Noise drains on poll, freeing room for the rest
        assert!(parser.poll().is_none());
        assert_eq!(fill(&mut link, &mut parser), Ok(100));
    }

    #[test]
    fn test_overrun_resets_parser() {
        let mut link = FakeLink::default();
        let mut parser = FrameParser::new();
        link.inject(&[0xAA, 0x05, 0x07]);
        fill(&mut link, &mut parser).unwrap();
        assert_eq!(parser.buffered(), 3);

        link.fail_next_read(LinkError::Overrun);
        assert_eq!(fill(&mut link, &mut parser), Err(LinkError::Overrun));
        assert_eq!(parser.buffered(), 0);
    }

    #[test]
    fn test_send() {
        let mut link = FakeLink::default();
        let frame = Message::Ping.to_frame().unwrap();

        assert_eq!(send(&mut link, &frame), Ok(()));
        assert_eq!(link.take_sent(), std::vec![frame.clone()]);

        link.fail_writes(true);
        assert_eq!(
            send(&mut link, &frame),
            Err(SendError::Link(LinkError::Busy))
        );
    }
}
