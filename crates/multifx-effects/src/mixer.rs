//! Two-input stereo mixer.
//!
//! The mixer treats its left input as source A and its right input as
//! source B, which the router fills from two different taps. Crossfeed blends
//! each source into the opposite side; the result is normalized rather than
//! clipped when it exceeds full scale.

use multifx_core::{ChannelMode, EffectMeta, EffectUnit, NumberRange, ParamInfo, ParamValue};

use crate::ids;

const UNIT: NumberRange = NumberRange::new(0.0, 1.0, 0.01);

const PARAMS: &[ParamInfo] = &[
    ParamInfo::number(0, "Mix A", "Level of input A (left)", UNIT),
    ParamInfo::number(1, "Mix B", "Level of input B (right)", UNIT),
    ParamInfo::number(2, "Cross", "Crossfeed between sides", UNIT),
];

/// Metadata for [`Mixer`].
pub const META: EffectMeta = EffectMeta::new("Mixer", "MIX", "Two-source stereo mixer.", PARAMS);

/// Stereo mixer for merging two branches.
///
/// ## Parameters
///
/// | Id | Name | Mapping | Default |
/// |----|------|---------|---------|
/// | 0 | Mix A | 0–1 | 0.5 |
/// | 1 | Mix B | 0–1 | 0.5 |
/// | 2 | Cross | 0 separate – 1 swapped | 0 |
///
/// # Example
///
/// ```rust
/// use multifx_core::EffectUnit;
/// use multifx_effects::Mixer;
///
/// let mut mixer = Mixer::new();
/// mixer.set_param(2, 0.5);
///
/// let (mut l, mut r) = (1.0, 0.0);
/// mixer.process_stereo(&mut l, &mut r);
/// assert_eq!((l, r), (0.25, 0.25));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mixer {
    mix_a: f32,
    mix_b: f32,
    cross: f32,
}

impl Mixer {
    /// Creates a mixer at half level with no crossfeed.
    pub const fn new() -> Self {
        Self {
            mix_a: 0.5,
            mix_b: 0.5,
            cross: 0.0,
        }
    }
}

impl Default for Mixer {
    fn default() -> Self {
        Self::new()
    }
}

impl EffectUnit for Mixer {
    fn type_id(&self) -> u8 {
        ids::MIXER
    }

    fn supported_modes(&self) -> ChannelMode {
        ChannelMode::Stereo
    }

    fn metadata(&self) -> &'static EffectMeta {
        &META
    }

    fn init(&mut self, _sample_rate: f32) {}

    fn set_param(&mut self, id: u8, value: f32) {
        let v = value.clamp(0.0, 1.0);
        match id {
            0 => self.mix_a = v,
            1 => self.mix_b = v,
            2 => self.cross = v,
            _ => {}
        }
    }

    #[inline]
    fn process_stereo(&mut self, left: &mut f32, right: &mut f32) {
        let a = *left * self.mix_a;
        let b = *right * self.mix_b;
        let mut out_left = (1.0 - self.cross) * a + self.cross * b;
        let mut out_right = (1.0 - self.cross) * b + self.cross * a;

        let peak = out_left.abs().max(out_right.abs());
        if peak > 1.0 {
            out_left /= peak;
            out_right /= peak;
        }

        *left = out_left;
        *right = out_right;
    }

    fn params_snapshot(&self, out: &mut [ParamValue]) -> usize {
        if out.len() < PARAMS.len() {
            return 0;
        }
        out[0] = ParamValue::from_normalized(0, self.mix_a);
        out[1] = ParamValue::from_normalized(1, self.mix_b);
        out[2] = ParamValue::from_normalized(2, self.cross);
        PARAMS.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sources_stay_on_their_side_without_cross() {
        let mut mixer = Mixer::new();
        mixer.set_param(0, 1.0);
        mixer.set_param(1, 1.0);
        let (mut l, mut r) = (0.3, -0.6);
        mixer.process_stereo(&mut l, &mut r);
        assert_eq!((l, r), (0.3, -0.6));
    }

    #[test]
    fn full_cross_swaps() {
        let mut mixer = Mixer::new();
        mixer.set_param(0, 1.0);
        mixer.set_param(1, 1.0);
        mixer.set_param(2, 1.0);
        let (mut l, mut r) = (0.3, -0.6);
        mixer.process_stereo(&mut l, &mut r);
        assert_eq!((l, r), (-0.6, 0.3));
    }

    #[test]
    fn overload_is_normalized() {
        let mut mixer = Mixer::new();
        mixer.set_param(0, 1.0);
        mixer.set_param(1, 1.0);
        let (mut l, mut r) = (4.0, 2.0);
        mixer.process_stereo(&mut l, &mut r);
        assert_eq!((l, r), (1.0, 0.5));
    }

    #[test]
    fn declares_stereo_and_reports_params() {
        let mixer = Mixer::new();
        assert_eq!(mixer.supported_modes(), ChannelMode::Stereo);
        let mut out = [ParamValue::default(); 3];
        assert_eq!(mixer.params_snapshot(&mut out), 3);
        assert_eq!(out[2], ParamValue::new(2, 0));
    }
}
