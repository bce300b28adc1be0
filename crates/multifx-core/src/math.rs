//! Small DSP math helpers shared by effects and the engine.
//!
//! All functions are allocation-free and `no_std` (transcendentals via `libm`).

use libm::{expf, logf};

/// Convert decibels to linear gain.
///
/// ```rust
/// use multifx_core::db_to_linear;
///
/// assert!((db_to_linear(0.0) - 1.0).abs() < 1e-6);
/// assert!((db_to_linear(-20.0) - 0.1).abs() < 1e-6);
/// ```
#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    const FACTOR: f32 = core::f32::consts::LN_10 / 20.0;
    expf(db * FACTOR)
}

/// Convert linear gain to decibels (floored at -200 dB).
#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    const FACTOR: f32 = 20.0 / core::f32::consts::LN_10;
    logf(linear.max(1e-10)) * FACTOR
}

/// Rational soft limiter `x(27 + x²) / (27 + 9x²)`.
///
/// Matches `tanh` closely for `|x| <= 3` and reaches exactly ±1 at ±3.
#[inline]
pub fn soft_limit(x: f32) -> f32 {
    let x2 = x * x;
    x * (27.0 + x2) / (27.0 + 9.0 * x2)
}

/// [`soft_limit`] with hard saturation outside ±3.
#[inline]
pub fn soft_clip(x: f32) -> f32 {
    if x <= -3.0 {
        -1.0
    } else if x >= 3.0 {
        1.0
    } else {
        soft_limit(x)
    }
}

/// One-pole envelope coefficient for a time constant in seconds.
///
/// Returns 0 (instant) for non-positive times.
#[inline]
pub fn envelope_coeff(time_seconds: f32, sample_rate: f32) -> f32 {
    let samples = time_seconds * sample_rate;
    if samples > 0.0 { expf(-1.0 / samples) } else { 0.0 }
}

/// Average of two channels.
#[inline]
pub fn mono_average(left: f32, right: f32) -> f32 {
    0.5 * (left + right)
}
