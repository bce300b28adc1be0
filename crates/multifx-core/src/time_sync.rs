//! Tempo-synced delay time.
//!
//! Time-based effects share three parameters:
//!
//! | Id | Name | Mapping of `v` |
//! |----|------|----------------|
//! | 0 | Free Time | `10 * 200^v` ms (10 ms to 2 s, logarithmic) |
//! | 1 | Division | `round(7v)` into [`DIVISIONS`] |
//! | 2 | Synced | `v >= 0.5` |
//!
//! When synced and a tempo is known, the period follows the beat division;
//! otherwise the free time is used.

use libm::{logf, powf};

/// Shortest free time.
pub const MIN_TIME_MS: f32 = 10.0;
/// Longest free time.
pub const MAX_TIME_MS: f32 = 2000.0;

/// Beat divisions as multiples of a quarter note, in parameter order.
pub const DIVISIONS: [f32; 8] = [1.0, 0.5, 0.25, 0.125, 0.0625, 0.375, 1.0 / 6.0, 1.0 / 3.0];

/// Display labels for [`DIVISIONS`].
pub const DIVISION_LABELS: [&str; 8] = ["1/4", "1/8", "1/16", "1/32", "1/64", "3/16", "1/24", "1/12"];

/// Free-time/division state of a time-based effect.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeSync {
    free_time_ms: f32,
    division: u8,
    synced: bool,
    bpm: Option<f32>,
    sample_rate: f32,
}

impl TimeSync {
    /// 250 ms free time, quarter-note division, synced, no tempo yet.
    pub const fn new() -> Self {
        Self {
            free_time_ms: 250.0,
            division: 0,
            synced: true,
            bpm: None,
            sample_rate: 48000.0,
        }
    }

    /// Restores parameter defaults for a new sample rate. The tempo is kept.
    pub fn init(&mut self, sample_rate: f32) {
        *self = Self {
            bpm: self.bpm,
            sample_rate,
            ..Self::new()
        };
    }

    /// Handles ids 0..=2; returns `false` for other ids.
    pub fn set_param(&mut self, id: u8, value: f32) -> bool {
        let v = value.clamp(0.0, 1.0);
        match id {
            0 => self.free_time_ms = MIN_TIME_MS * powf(MAX_TIME_MS / MIN_TIME_MS, v),
            1 => self.division = ((v * 7.0 + 0.5) as u8).min(7),
            2 => self.synced = v >= 0.5,
            _ => return false,
        }
        true
    }

    /// Normalized values of ids 0..=2.
    pub fn normalized(&self) -> [f32; 3] {
        let time = logf(self.free_time_ms / MIN_TIME_MS) / logf(MAX_TIME_MS / MIN_TIME_MS);
        [
            time.clamp(0.0, 1.0),
            f32::from(self.division) / 7.0,
            if self.synced { 1.0 } else { 0.0 },
        ]
    }

    /// Sets the tempo; non-positive values clear it.
    pub fn set_tempo(&mut self, bpm: f32) {
        self.bpm = (bpm > 1.0).then_some(bpm);
    }

    /// Free time in milliseconds.
    pub fn free_time_ms(&self) -> f32 {
        self.free_time_ms
    }

    /// Index into [`DIVISIONS`].
    pub fn division(&self) -> u8 {
        self.division
    }

    /// Whether the period follows the tempo.
    pub fn is_synced(&self) -> bool {
        self.synced
    }

    /// Current period in samples, at least 1.
    pub fn period_samples(&self) -> usize {
        let seconds = match self.bpm {
            Some(bpm) if self.synced => 60.0 / bpm * DIVISIONS[usize::from(self.division)],
            _ => self.free_time_ms * 0.001,
        };
        ((seconds * self.sample_rate + 0.5) as usize).max(1)
    }
}

impl Default for TimeSync {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_time_used_without_tempo() {
        let mut sync = TimeSync::new();
        sync.init(48000.0);
        assert_eq!(sync.period_samples(), 12000);
    }

    #[test]
    fn synced_division_follows_tempo() {
        let mut sync = TimeSync::new();
        sync.init(48000.0);
        sync.set_tempo(120.0);
        assert_eq!(sync.period_samples(), 24000);
        sync.set_param(1, 1.0 / 7.0);
        assert_eq!(sync.division(), 1);
        assert_eq!(sync.period_samples(), 12000);
        sync.set_param(2, 0.0);
        assert_eq!(sync.period_samples(), 12000);
    }

    #[test]
    fn free_time_mapping_is_logarithmic() {
        let mut sync = TimeSync::new();
        sync.set_param(0, 0.0);
        assert!((sync.free_time_ms() - 10.0).abs() < 1e-3);
        sync.set_param(0, 1.0);
        assert!((sync.free_time_ms() - 2000.0).abs() < 0.1);
        sync.set_param(0, 0.5);
        assert!((sync.normalized()[0] - 0.5).abs() < 1e-4);
    }

    #[test]
    fn init_keeps_tempo() {
        let mut sync = TimeSync::new();
        sync.set_tempo(100.0);
        sync.init(44100.0);
        assert_eq!(sync.period_samples(), 26460);
    }

    #[test]
    fn unknown_id_is_not_handled() {
        let mut sync = TimeSync::new();
        assert!(!sync.set_param(3, 0.2));
    }
}
