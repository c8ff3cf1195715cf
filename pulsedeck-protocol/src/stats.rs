//! Self-describing metric payload for stats frames
//!
//! ```text
//! ┌───────┬─────┬─────┬────────────┬─────┬─────┬────────────┬───
//! │ COUNT │ TAG │ LEN │ VALUE (LE) │ TAG │ LEN │ VALUE (LE) │ ...
//! │ 1B    │ 1B  │ 1B  │ LEN bytes  │ 1B  │ 1B  │ LEN bytes  │
//! └───────┴─────┴─────┴────────────┴─────┴─────┴────────────┴───
//! ```
//!
//! LEN is 1 or 2. Tags this build does not know are skipped, so the host
//! can add metrics without a protocol version bump. A payload is either
//! applied whole or rejected whole: decoding validates every entry before
//! the visitor sees the first one.

use heapless::Vec;

use crate::frame::MAX_PAYLOAD_SIZE;

/// Metrics known to this build
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum StatTag {
    CpuPercent = 0x01,
    RamPercent = 0x02,
    GpuPercent = 0x03,
    CpuTempC = 0x04,
    GpuTempC = 0x05,
    DiskPercent = 0x06,
    NetDownKbps = 0x07,
    NetUpKbps = 0x08,
    FanRpm = 0x09,
}

impl StatTag {
    /// Every known tag, in wire order
    pub const ALL: [StatTag; 9] = [
        StatTag::CpuPercent,
        StatTag::RamPercent,
        StatTag::GpuPercent,
        StatTag::CpuTempC,
        StatTag::GpuTempC,
        StatTag::DiskPercent,
        StatTag::NetDownKbps,
        StatTag::NetUpKbps,
        StatTag::FanRpm,
    ];

    /// Parse a tag from its wire format byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|tag| *tag as u8 == byte)
    }

    /// Convert to wire format byte
    pub fn to_byte(self) -> u8 {
        self as u8
    }

    /// Short label for on-screen display
    pub fn label(self) -> &'static str {
        match self {
            StatTag::CpuPercent => "CPU",
            StatTag::RamPercent => "RAM",
            StatTag::GpuPercent => "GPU",
            StatTag::CpuTempC => "CPU T",
            StatTag::GpuTempC => "GPU T",
            StatTag::DiskPercent => "DISK",
            StatTag::NetDownKbps => "NET DN",
            StatTag::NetUpKbps => "NET UP",
            StatTag::FanRpm => "FAN",
        }
    }

    /// Unit suffix for on-screen display
    pub fn unit(self) -> &'static str {
        match self {
            StatTag::CpuPercent
            | StatTag::RamPercent
            | StatTag::GpuPercent
            | StatTag::DiskPercent => "%",
            StatTag::CpuTempC | StatTag::GpuTempC => "C",
            StatTag::NetDownKbps | StatTag::NetUpKbps => "kb/s",
            StatTag::FanRpm => "rpm",
        }
    }
}

impl From<StatTag> for u8 {
    fn from(tag: StatTag) -> u8 {
        tag.to_byte()
    }
}

/// Errors from encoding or decoding a stats payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StatsError {
    /// COUNT implies more entries than the payload holds
    CountOverflow,
    /// An entry's LEN is neither 1 nor 2
    UnknownLength,
    /// Bytes remain after COUNT entries
    TrailingBytes,
    /// Samples do not fit in one frame payload
    TooManyEntries,
}

/// Encode samples into a stats payload, preserving their order
///
/// Accepts known [`StatTag`]s or raw tag bytes. Values up to 255 use one
/// byte, larger values two.
pub fn encode<T>(samples: &[(T, u16)]) -> Result<Vec<u8, MAX_PAYLOAD_SIZE>, StatsError>
where
    T: Into<u8> + Copy,
{
    let count = u8::try_from(samples.len()).map_err(|_| StatsError::TooManyEntries)?;

    let mut payload = Vec::new();
    payload
        .push(count)
        .map_err(|_| StatsError::TooManyEntries)?;

    for &(tag, value) in samples {
        let bytes = value.to_le_bytes();
        let value_bytes: &[u8] = if value <= u8::MAX as u16 {
            &bytes[..1]
        } else {
            &bytes
        };

        payload
            .extend_from_slice(&[tag.into(), value_bytes.len() as u8])
            .map_err(|_| StatsError::TooManyEntries)?;
        payload
            .extend_from_slice(value_bytes)
            .map_err(|_| StatsError::TooManyEntries)?;
    }

    Ok(payload)
}

/// Decode a stats payload, calling `visitor(tag, value)` for every known
/// tag in encoded order
///
/// Returns the number of entries walked (known and skipped). On error the
/// visitor has not been called.
pub fn decode<F>(payload: &[u8], mut visitor: F) -> Result<usize, StatsError>
where
    F: FnMut(StatTag, u16),
{
    let (&count, entries) = payload.split_first().ok_or(StatsError::CountOverflow)?;

    walk(count, entries, |_, _| {})?;
    walk(count, entries, |tag, value| {
        if let Some(tag) = StatTag::from_byte(tag) {
            visitor(tag, value);
        }
    })?;

    Ok(count as usize)
}

fn walk<F>(count: u8, entries: &[u8], mut on_entry: F) -> Result<(), StatsError>
where
    F: FnMut(u8, u16),
{
    let mut offset = 0;

    for _ in 0..count {
        let header = entries
            .get(offset..offset + 2)
            .ok_or(StatsError::CountOverflow)?;
        let (tag, len) = (header[0], header[1] as usize);
        if len != 1 && len != 2 {
            return Err(StatsError::UnknownLength);
        }

        let start = offset + 2;
        let value = entries
            .get(start..start + len)
            .ok_or(StatsError::CountOverflow)?;
        let value = match *value {
            [lo] => lo as u16,
            [lo, hi] => u16::from_le_bytes([lo, hi]),
            _ => return Err(StatsError::UnknownLength),
        };

        on_entry(tag, value);
        offset = start + len;
    }

    if offset != entries.len() {
        return Err(StatsError::TrailingBytes);
    }
    Ok(())
}
