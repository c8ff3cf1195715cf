//! Frame encoding and decoding for the PulseDeck link protocol.
//!
//! Frame format:
//! - START (1 byte): 0xAA synchronization byte
//! - LENGTH (1 byte): payload length (0-250)
//! - TYPE (1 byte): message type identifier
//! - PAYLOAD (0-250 bytes): type-specific data
//! - CRC (1 byte): CRC-8 (poly 0x07, init 0x00) of LENGTH, TYPE and PAYLOAD
//!
//! [`decode`] parses one frame from the front of a buffer. [`FrameParser`]
//! wraps it in a resynchronizing scanner for continuous byte streams: bad
//! candidates are dropped one byte at a time and scanning resumes at the
//! next START byte, while a candidate that is merely short is kept until
//! more bytes arrive.

use heapless::Vec;

use crate::crc::frame_crc;

/// Frame synchronization byte
pub const FRAME_START: u8 = 0xAA;

/// Maximum payload size in bytes
pub const MAX_PAYLOAD_SIZE: usize = 250;

/// Bytes surrounding the payload (START + LENGTH + TYPE + CRC)
pub const FRAME_OVERHEAD: usize = 4;

/// Maximum complete frame size (START + LENGTH + TYPE + MAX_PAYLOAD + CRC)
pub const MAX_FRAME_SIZE: usize = FRAME_OVERHEAD + MAX_PAYLOAD_SIZE;

/// Receive buffer capacity of [`FrameParser`]
pub const RX_BUFFER_SIZE: usize = 2 * MAX_FRAME_SIZE;

/// Errors that can occur during frame parsing or encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Payload exceeds maximum allowed size (encode side)
    PayloadTooLarge,
    /// Buffer too small for encoding
    BufferTooSmall,
    /// Fewer bytes than the header declares; wait for more
    Incomplete,
    /// First byte is not the START byte
    InvalidStart,
    /// LENGTH field exceeds the maximum payload size
    Oversized,
    /// Trailing CRC does not match LENGTH, TYPE and PAYLOAD
    CrcMismatch,
}

impl FrameError {
    /// True for outcomes that mean "hold the bytes and retry later"
    pub fn is_incomplete(&self) -> bool {
        matches!(self, FrameError::Incomplete)
    }
}

/// A parsed or constructed frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Message type identifier
    pub msg_type: u8,
    /// Payload data
    pub payload: Vec<u8, MAX_PAYLOAD_SIZE>,
}

impl Frame {
    /// Create a new frame with the given message type and payload
    pub fn new(msg_type: u8, payload: &[u8]) -> Result<Self, FrameError> {
        if payload.len() > MAX_PAYLOAD_SIZE {
            return Err(FrameError::PayloadTooLarge);
        }

        let payload = Vec::from_slice(payload).map_err(|_| FrameError::PayloadTooLarge)?;
        Ok(Self { msg_type, payload })
    }

    /// Create a frame with no payload
    pub fn empty(msg_type: u8) -> Self {
        Self {
            msg_type,
            payload: Vec::new(),
        }
    }

    /// Number of bytes this frame occupies on the wire
    pub fn encoded_len(&self) -> usize {
        FRAME_OVERHEAD + self.payload.len()
    }

    /// Encode this frame into a byte buffer
    ///
    /// Returns the number of bytes written
    pub fn encode(&self, buffer: &mut [u8]) -> Result<usize, FrameError> {
        let frame_len = self.encoded_len();
        if buffer.len() < frame_len {
            return Err(FrameError::BufferTooSmall);
        }

        let length = self.payload.len() as u8;
        let end = 3 + self.payload.len();

        buffer[0] = FRAME_START;
        buffer[1] = length;
        buffer[2] = self.msg_type;
        buffer[3..end].copy_from_slice(&self.payload);
        buffer[end] = frame_crc(length, self.msg_type, &self.payload);

        Ok(frame_len)
    }

    /// Encode this frame into a heapless Vec
    pub fn encode_to_vec(&self) -> Result<Vec<u8, MAX_FRAME_SIZE>, FrameError> {
        let mut buffer = [0u8; MAX_FRAME_SIZE];
        let len = self.encode(&mut buffer)?;
        Vec::from_slice(&buffer[..len]).map_err(|_| FrameError::BufferTooSmall)
    }
}

/// Decode one frame from the front of `bytes`
///
/// On success returns the frame and the number of bytes it consumed.
/// `Incomplete` means the bytes seen so far are a valid prefix; every other
/// error means the candidate starting at `bytes[0]` is not a frame.
pub fn decode(bytes: &[u8]) -> Result<(Frame, usize), FrameError> {
    match bytes.first() {
        None => return Err(FrameError::Incomplete),
        Some(&FRAME_START) => {}
        Some(_) => return Err(FrameError::InvalidStart),
    }

    let Some(&length) = bytes.get(1) else {
        return Err(FrameError::Incomplete);
    };
    if length as usize > MAX_PAYLOAD_SIZE {
        return Err(FrameError::Oversized);
    }

    let total = FRAME_OVERHEAD + length as usize;
    if bytes.len() < total {
        return Err(FrameError::Incomplete);
    }

    let msg_type = bytes[2];
    let payload = &bytes[3..total - 1];
    if bytes[total - 1] != frame_crc(length, msg_type, payload) {
        return Err(FrameError::CrcMismatch);
    }

    let frame = Frame::new(msg_type, payload)?;
    Ok((frame, total))
}

/// Counters kept by [`FrameParser`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ParserStats {
    /// Valid frames delivered
    pub frames: u32,
    /// Candidates rejected by CRC
    pub crc_errors: u32,
    /// Candidates whose LENGTH exceeded the maximum
    pub oversized: u32,
    /// Bytes skipped while hunting for a START byte
    pub noise_bytes: u32,
}

/// Resynchronizing frame scanner over a continuous byte stream
///
/// The transport may deliver partial reads, several frames per read, and
/// line noise between frames. Bytes are buffered until they form a valid
/// frame or are proven not to.
#[derive(Debug, Clone)]
pub struct FrameParser {
    buffer: Vec<u8, RX_BUFFER_SIZE>,
    stats: ParserStats,
}

impl Default for FrameParser {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameParser {
    /// Create a new frame parser
    pub const fn new() -> Self {
        Self {
            buffer: Vec::new(),
            stats: ParserStats {
                frames: 0,
                crc_errors: 0,
                oversized: 0,
                noise_bytes: 0,
            },
        }
    }

    /// Drop any buffered bytes
    pub fn reset(&mut self) {
        self.buffer.clear();
    }

    /// Number of bytes waiting for completion
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Parser counters since creation
    pub fn stats(&self) -> ParserStats {
        self.stats
    }

    /// Append received bytes, returning how many were accepted
    ///
    /// Accepts fewer than `bytes.len()` only when the buffer is full; call
    /// [`poll`](Self::poll) to drain it and push the rest.
    pub fn push(&mut self, bytes: &[u8]) -> usize {
        let room = RX_BUFFER_SIZE - self.buffer.len();
        let n = room.min(bytes.len());
        // Cannot fail: n is bounded by the remaining capacity
        let _ = self.buffer.extend_from_slice(&bytes[..n]);
        n
    }

    /// Scan the buffered bytes for the next frame
    ///
    /// Returns `Some(Ok(frame))` for a valid frame, `Some(Err(e))` when a
    /// candidate was discarded (scanning can continue with the next call),
    /// and `None` when more bytes are needed.
    pub fn poll(&mut self) -> Option<Result<Frame, FrameError>> {
        match self.buffer.iter().position(|&b| b == FRAME_START) {
            None => {
                self.stats.noise_bytes = self
                    .stats
                    .noise_bytes
                    .saturating_add(self.buffer.len() as u32);
                self.buffer.clear();
                return None;
            }
            Some(0) => {}
            Some(skip) => {
                self.stats.noise_bytes = self.stats.noise_bytes.saturating_add(skip as u32);
                self.discard(skip);
            }
        }

        match decode(&self.buffer) {
            Ok((frame, used)) => {
                self.discard(used);
                self.stats.frames = self.stats.frames.saturating_add(1);
                Some(Ok(frame))
            }
            Err(FrameError::Incomplete) => None,
            Err(e) => {
                match e {
                    FrameError::CrcMismatch => {
                        self.stats.crc_errors = self.stats.crc_errors.saturating_add(1)
                    }
                    FrameError::Oversized => {
                        self.stats.oversized = self.stats.oversized.saturating_add(1)
                    }
                    _ => {}
                }
                // Drop only the START byte; a real frame may begin inside
                // the rejected candidate.
                self.discard(1);
                Some(Err(e))
            }
        }
    }

    /// Feed received bytes, invoking `on_frame(type, payload)` once per
    /// valid frame in stream order
    ///
    /// Rejected candidates are counted in [`stats`](Self::stats) and
    /// skipped. Returns the number of frames delivered.
    pub fn feed<F>(&mut self, mut bytes: &[u8], mut on_frame: F) -> usize
    where
        F: FnMut(u8, &[u8]),
    {
        let mut delivered = 0;

        loop {
            let accepted = self.push(bytes);
            bytes = &bytes[accepted..];

            while let Some(result) = self.poll() {
                if let Ok(frame) = result {
                    on_frame(frame.msg_type, &frame.payload);
                    delivered += 1;
                }
            }

            if bytes.is_empty() {
                break;
            }
            if accepted == 0 && self.buffer.len() == RX_BUFFER_SIZE {
                self.discard(1);
            }
        }

        delivered
    }

    fn discard(&mut self, count: usize) {
        let count = count.min(self.buffer.len());
        let remaining = self.buffer.len() - count;
        self.buffer.copy_within(count.., 0);
        self.buffer.truncate(remaining);
    }
}
