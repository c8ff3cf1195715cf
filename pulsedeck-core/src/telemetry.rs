//! Latest host metrics on the display
//!
//! Each stats frame overwrites the values it carries; metrics it omits
//! keep their previous value and age. A metric never received, or older
//! than the staleness limit, reads as [`Reading::Unavailable`].

use pulsedeck_protocol::{StatTag, StatsPayload};

/// A value that may be missing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Reading<T> {
    Value(T),
    #[default]
    Unavailable,
}

impl<T> Reading<T> {
    pub fn is_available(&self) -> bool {
        matches!(self, Reading::Value(_))
    }

    pub fn value(self) -> Option<T> {
        match self {
            Reading::Value(v) => Some(v),
            Reading::Unavailable => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Sample {
    value: u16,
    at_ms: u64,
}

/// Latest value per known metric
#[derive(Debug, Clone)]
pub struct StatsBoard {
    samples: [Option<Sample>; StatTag::ALL.len()],
    stale_ms: u64,
    updates: u32,
}

impl StatsBoard {
    pub const fn new(stale_ms: u64) -> Self {
        Self {
            samples: [None; StatTag::ALL.len()],
            stale_ms,
            updates: 0,
        }
    }

    /// Store every metric in a validated payload, returning how many were
    /// stored
    pub fn apply(&mut self, payload: &StatsPayload<'_>, now_ms: u64) -> usize {
        let mut stored = 0;
        payload.for_each(|tag, value| {
            self.samples[slot(tag)] = Some(Sample {
                value,
                at_ms: now_ms,
            });
            stored += 1;
        });
        self.updates = self.updates.wrapping_add(1);
        stored
    }

    /// Current value of a metric
    pub fn get(&self, tag: StatTag, now_ms: u64) -> Reading<u16> {
        match self.samples[slot(tag)] {
            Some(s) if now_ms.saturating_sub(s.at_ms) <= self.stale_ms => Reading::Value(s.value),
            _ => Reading::Unavailable,
        }
    }

    /// Milliseconds since the metric was last received
    pub fn age_ms(&self, tag: StatTag, now_ms: u64) -> Option<u64> {
        self.samples[slot(tag)].map(|s| now_ms.saturating_sub(s.at_ms))
    }

    /// Stats frames applied since boot
    pub fn updates(&self) -> u32 {
        self.updates
    }

    /// Forget every metric
    pub fn clear(&mut self) {
        self.samples = [None; StatTag::ALL.len()];
    }
}

fn slot(tag: StatTag) -> usize {
    tag.to_byte() as usize - 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulsedeck_protocol::stats;

    fn payload(bytes: &[u8]) -> StatsPayload<'_> {
        StatsPayload::parse(bytes).unwrap()
    }

    #[test]
    fn test_slots_cover_every_tag() {
        for (i, tag) in StatTag::ALL.iter().enumerate() {
            assert_eq!(slot(*tag), i);
        }
    }

    #[test]
    fn test_apply_and_read() {
        let mut board = StatsBoard::new(10_000);
        let bytes = stats::encode(&[(StatTag::CpuPercent, 42), (StatTag::RamPercent, 67)]).unwrap();

        assert_eq!(board.apply(&payload(&bytes), 1_000), 2);
        assert_eq!(board.get(StatTag::CpuPercent, 1_500), Reading::Value(42));
        assert_eq!(board.get(StatTag::RamPercent, 1_500), Reading::Value(67));
        assert_eq!(board.get(StatTag::GpuPercent, 1_500), Reading::Unavailable);
        assert_eq!(board.age_ms(StatTag::CpuPercent, 1_500), Some(500));
    }

    #[test]
    fn test_partial_update_keeps_other_metrics() {
        let mut board = StatsBoard::new(10_000);
        let first = stats::encode(&[(StatTag::CpuPercent, 42), (StatTag::FanRpm, 1200)]).unwrap();
        let second = stats::encode(&[(StatTag::CpuPercent, 7)]).unwrap();

        board.apply(&payload(&first), 0);
        board.apply(&payload(&second), 2_000);

        assert_eq!(board.get(StatTag::CpuPercent, 2_000), Reading::Value(7));
        assert_eq!(board.get(StatTag::FanRpm, 2_000), Reading::Value(1200));
        assert_eq!(board.age_ms(StatTag::FanRpm, 2_000), Some(2_000));
        assert_eq!(board.updates(), 2);
    }

    #[test]
    fn test_stale_metric_unavailable() {
        let mut board = StatsBoard::new(10_000);
        let bytes = stats::encode(&[(StatTag::CpuTempC, 55)]).unwrap();
        board.apply(&payload(&bytes), 0);

        assert!(board.get(StatTag::CpuTempC, 10_000).is_available());
        assert_eq!(board.get(StatTag::CpuTempC, 10_001), Reading::Unavailable);
    }

    #[test]
    fn test_unknown_tags_ignored() {
        let mut board = StatsBoard::new(10_000);
        let bytes = stats::encode(&[(0x40u8, 1), (0x02u8, 67)]).unwrap();
        assert_eq!(board.apply(&payload(&bytes), 0), 1);
        assert_eq!(board.get(StatTag::RamPercent, 0), Reading::Value(67));
    }

    #[test]
    fn test_clear() {
        let mut board = StatsBoard::new(10_000);
        let bytes = stats::encode(&[(StatTag::CpuPercent, 1)]).unwrap();
        board.apply(&payload(&bytes), 0);
        board.clear();
        assert_eq!(board.get(StatTag::CpuPercent, 0), Reading::Unavailable);
        assert_eq!(board.age_ms(StatTag::CpuPercent, 0), None);
    }
}
