//! DC blocking filter for inter-stage drift.
//!
//! First-order highpass (Julius O. Smith's DC blocker):
//!
//! ```text
//! y[n] = x[n] - x[n-1] + R * y[n-1]
//! ```
//!
//! With the default `R = 0.995` the -3 dB point is `(1 - R) / 2π · fs`,
//! about 7.6 Hz at 48 kHz, well below the low E of a guitar (82 Hz).
//! Each slot owns one blocker per channel. While inter-stage blocking is on,
//! it runs on the processed signal of every bound effect that ran this
//! frame, before the channel policy and the dry/wet mix.

/// Single-channel DC blocker.
///
/// ## Example
///
/// ```rust
/// use multifx_core::DcBlocker;
///
/// let mut blocker = DcBlocker::new();
/// let mut y = 0.0;
/// for _ in 0..4800 {
///     y = blocker.process(0.25);
/// }
/// assert!(y.abs() < 0.01);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DcBlocker {
    /// Pole radius R.
    coeff: f32,
    x_prev: f32,
    y_prev: f32,
}

impl DcBlocker {
    /// Pole radius used by slots.
    pub const DEFAULT_COEFF: f32 = 0.995;

    /// Blocker with `R = 0.995`.
    pub const fn new() -> Self {
        Self {
            coeff: Self::DEFAULT_COEFF,
            x_prev: 0.0,
            y_prev: 0.0,
        }
    }

    /// Blocker with a custom pole radius, clamped to `[0.9, 0.9999]`.
    pub fn with_coeff(coeff: f32) -> Self {
        Self {
            coeff: coeff.clamp(0.9, 0.9999),
            ..Self::new()
        }
    }

    /// Filters one sample.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let output = input - self.x_prev + self.coeff * self.y_prev;
        self.x_prev = input;
        self.y_prev = output;
        output
    }

    /// Clears the filter history.
    pub fn reset(&mut self) {
        self.x_prev = 0.0;
        self.y_prev = 0.0;
    }

    /// Pole radius R.
    pub fn coeff(&self) -> f32 {
        self.coeff
    }
}

impl Default for DcBlocker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::f32::consts::PI;

    #[test]
    fn test_dc_blocker_removes_dc() {
        let mut blocker = DcBlocker::new();
        let mut output = 0.0;
        for _ in 0..48000 {
            output = blocker.process(1.0);
        }
        assert!(output.abs() < 0.01, "DC should be removed, got {}", output);
    }

    #[test]
    fn test_dc_blocker_first_sample_passes() {
        let mut blocker = DcBlocker::new();
        assert_eq!(blocker.process(1.6), 1.6);
    }

    #[test]
    fn test_dc_blocker_passes_guitar_band() {
        let mut blocker = DcBlocker::new();
        let sample_rate = 48000.0;
        let freq = 110.0;

        for i in 0..48000 {
            let t = i as f32 / sample_rate;
            blocker.process(libm::sinf(2.0 * PI * freq * t));
        }

        let mut peak = 0.0f32;
        for i in 48000..48000 + 437 {
            let t = i as f32 / sample_rate;
            peak = peak.max(blocker.process(libm::sinf(2.0 * PI * freq * t)).abs());
        }
        assert!(peak > 0.95, "110 Hz should pass, peak was {}", peak);
    }

    #[test]
    fn test_dc_blocker_reset() {
        let mut blocker = DcBlocker::new();
        for _ in 0..100 {
            blocker.process(1.0);
        }
        blocker.reset();
        assert_eq!(blocker, DcBlocker::new());
    }

    #[test]
    fn test_dc_blocker_coeff_clamping() {
        assert!((DcBlocker::with_coeff(0.5).coeff() - 0.9).abs() < 1e-6);
        assert!((DcBlocker::with_coeff(1.0).coeff() - 0.9999).abs() < 1e-6);
        assert_eq!(DcBlocker::default().coeff(), 0.995);
    }
}
