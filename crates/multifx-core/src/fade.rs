//! Click-free bypass crossfade.
//!
//! A [`BypassFade`] is the slot's `enabledFade`: a scalar in `[0, 1]` that
//! blends the dry tap (0) with the processed signal (1). It moves toward its
//! target by a fixed step per frame, so toggling a slot never produces an
//! instantaneous jump regardless of what toggled it.
//!
//! The ramp counts frames rather than accumulating a step, so it reaches the
//! target from the opposite end in exactly `ceil(FADE_SECONDS * sample_rate)`
//! frames (240 at 48 kHz, 221 at 44.1 kHz) with no rounding drift.

use libm::ceilf;

/// Duration of a full bypass transition.
pub const FADE_SECONDS: f32 = 0.005;

/// Largest blend value short of fully engaged.
const BELOW_ONE: f32 = 1.0 - f32::EPSILON / 2.0;

/// Per-frame increment for a sample rate; 1.0 when the rate is not positive.
#[inline]
pub fn fade_step(sample_rate: f32) -> f32 {
    let frames = FADE_SECONDS * sample_rate;
    if frames > 0.0 { 1.0 / frames } else { 1.0 }
}

/// Frames a full transition takes at `sample_rate`.
pub fn frames_to_settle(sample_rate: f32) -> u32 {
    let frames = FADE_SECONDS * sample_rate;
    if frames > 0.0 { ceilf(frames) as u32 } else { 1 }
}

/// Shape of a bypass transition at one sample rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FadeRamp {
    step: f32,
    frames: u32,
}

impl FadeRamp {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            step: fade_step(sample_rate),
            frames: frames_to_settle(sample_rate).max(1),
        }
    }

    /// Blend increment per frame.
    #[inline]
    pub fn step(&self) -> f32 {
        self.step
    }

    /// Frames from one end to the other.
    #[inline]
    pub fn frames(&self) -> u32 {
        self.frames
    }

    #[inline]
    fn value_at(&self, position: u32) -> f32 {
        if position >= self.frames {
            1.0
        } else {
            (position as f32 * self.step).min(BELOW_ONE)
        }
    }
}

/// Smoothed enable state of one slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BypassFade {
    /// Frames into the ramp; saturates at the ramp length.
    position: u32,
    value: f32,
}

impl BypassFade {
    /// Fully engaged.
    pub const ON: Self = Self {
        position: u32::MAX,
        value: 1.0,
    };
    /// Fully bypassed.
    pub const OFF: Self = Self {
        position: 0,
        value: 0.0,
    };

    /// Starts at the settled state for `enabled`.
    pub const fn settled(enabled: bool) -> Self {
        if enabled { Self::ON } else { Self::OFF }
    }

    /// Current blend factor.
    #[inline]
    pub fn value(&self) -> f32 {
        self.value
    }

    /// Moves one frame along `ramp` toward 1.0 (enabled) or 0.0 (disabled).
    ///
    /// Returns the new value, always in `[0, 1]`.
    #[inline]
    pub fn advance(&mut self, enabled: bool, ramp: &FadeRamp) -> f32 {
        let position = self.position.min(ramp.frames);
        self.position = if enabled {
            position.saturating_add(1).min(ramp.frames)
        } else {
            position.saturating_sub(1)
        };
        self.value = ramp.value_at(self.position);
        self.value
    }

    /// Whether the processed signal contributes at all.
    #[inline]
    pub fn is_audible(&self) -> bool {
        self.value > 0.0
    }
}

impl Default for BypassFade {
    fn default() -> Self {
        Self::ON
    }
}
