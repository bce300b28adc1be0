//! Second-order IIR section with RBJ cookbook peaking coefficients.

use core::f32::consts::TAU;
use libm::{cosf, sinf};

use crate::math::db_to_linear;

/// Normalized biquad coefficients (`a0 == 1`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiquadCoeffs {
    /// Feedforward.
    pub b0: f32,
    /// Feedforward.
    pub b1: f32,
    /// Feedforward.
    pub b2: f32,
    /// Feedback.
    pub a1: f32,
    /// Feedback.
    pub a2: f32,
}

impl BiquadCoeffs {
    /// Passthrough.
    pub const IDENTITY: Self = Self {
        b0: 1.0,
        b1: 0.0,
        b2: 0.0,
        a1: 0.0,
        a2: 0.0,
    };

    /// Peaking EQ centred on `frequency` with boost/cut `gain_db`.
    ///
    /// ```rust
    /// use multifx_core::BiquadCoeffs;
    ///
    /// // 0 dB gain is an identity filter.
    /// let c = BiquadCoeffs::peaking(1000.0, 1.0, 0.0, 48000.0);
    /// assert!((c.b0 - 1.0).abs() < 1e-6);
    /// assert!((c.b2 - c.a2).abs() < 1e-6);
    /// ```
    pub fn peaking(frequency: f32, q: f32, gain_db: f32, sample_rate: f32) -> Self {
        let a = db_to_linear(gain_db * 0.5);
        let w0 = TAU * frequency / sample_rate;
        let cos_w0 = cosf(w0);
        let alpha = sinf(w0) / (2.0 * q);

        let a0_inv = 1.0 / (1.0 + alpha / a);
        let b1 = -2.0 * cos_w0 * a0_inv;
        Self {
            b0: (1.0 + alpha * a) * a0_inv,
            b1,
            b2: (1.0 - alpha * a) * a0_inv,
            a1: b1,
            a2: (1.0 - alpha / a) * a0_inv,
        }
    }
}

impl Default for BiquadCoeffs {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Transposed Direct Form II biquad.
#[derive(Debug, Clone, Copy, Default)]
pub struct Biquad {
    coeffs: BiquadCoeffs,
    z1: f32,
    z2: f32,
}

impl Biquad {
    /// Passthrough filter with cleared state.
    pub const fn new() -> Self {
        Self {
            coeffs: BiquadCoeffs::IDENTITY,
            z1: 0.0,
            z2: 0.0,
        }
    }

    /// Replaces coefficients, keeping state.
    pub fn set_coeffs(&mut self, coeffs: BiquadCoeffs) {
        self.coeffs = coeffs;
    }

    /// Current coefficients.
    pub fn coeffs(&self) -> BiquadCoeffs {
        self.coeffs
    }

    /// Filters one sample.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let c = &self.coeffs;
        let output = c.b0 * input + self.z1;
        self.z1 = c.b1 * input - c.a1 * output + self.z2;
        self.z2 = c.b2 * input - c.a2 * output;
        output
    }

    /// Clears filter state.
    pub fn clear(&mut self) {
        self.z1 = 0.0;
        self.z2 = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passthrough_by_default() {
        let mut bq = Biquad::new();
        for x in [0.5, -0.25, 1.0, 0.0] {
            assert_eq!(bq.process(x), x);
        }
    }

    #[test]
    fn peaking_boosts_at_centre() {
        let sr = 48000.0;
        let freq = 1000.0;
        let mut bq = Biquad::new();
        bq.set_coeffs(BiquadCoeffs::peaking(freq, 1.0, 12.0, sr));
        let mut peak = 0.0f32;
        for n in 0..48000 {
            let x = sinf(TAU * freq * n as f32 / sr);
            let y = bq.process(x);
            if n > 24000 {
                peak = peak.max(y.abs());
            }
        }
        assert!((peak - db_to_linear(12.0)).abs() < 0.05, "peak {peak}");
    }

    #[test]
    fn clear_resets_state() {
        let mut bq = Biquad::new();
        bq.set_coeffs(BiquadCoeffs::peaking(200.0, 1.0, 6.0, 48000.0));
        bq.process(1.0);
        bq.clear();
        let mut fresh = Biquad::new();
        fresh.set_coeffs(bq.coeffs());
        assert_eq!(bq.process(0.3), fresh.process(0.3));
    }
}
