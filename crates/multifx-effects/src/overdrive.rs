//! Overdrive with automatic output leveling.
//!
//! Gain staging follows the Mutable Instruments / DaisySP overdrive: a
//! polynomial pre-gain curve driven into a rational soft clipper, followed by
//! a post-gain chosen so perceived loudness stays roughly constant as drive
//! increases. A one-pole lowpass blended by the tone control darkens the
//! result.

use multifx_core::{
    ChannelMode, EffectMeta, EffectUnit, NumberRange, ParamInfo, ParamValue, soft_clip,
};

use crate::ids;

const UNIT: NumberRange = NumberRange::new(0.0, 1.0, 0.01);

const PARAMS: &[ParamInfo] = &[
    ParamInfo::number(0, "Drive", "Overdrive amount", UNIT),
    ParamInfo::number(1, "Tone", "Dark to bright", UNIT),
];

/// Metadata for [`Overdrive`].
pub const META: EffectMeta = EffectMeta::new(
    "Overdrive",
    "ODR",
    "Musical overdrive with auto-leveling.",
    PARAMS,
);

/// Overdrive effect.
///
/// ## Parameters
///
/// | Id | Name | Mapping | Default |
/// |----|------|---------|---------|
/// | 0 | Drive | 0–1 | 0.5 |
/// | 1 | Tone | 0 dark – 1 bright | 0.5 |
///
/// # Example
///
/// ```rust
/// use multifx_core::EffectUnit;
/// use multifx_effects::Overdrive;
///
/// let mut od = Overdrive::new();
/// od.init(48000.0);
/// od.set_param(0, 0.8);
///
/// let (mut l, mut r) = (0.2, -0.2);
/// od.process_stereo(&mut l, &mut r);
/// assert!(l.abs() <= 1.5);
/// ```
#[derive(Debug, Clone)]
pub struct Overdrive {
    drive: f32,
    tone: f32,
    pre_gain: f32,
    post_gain: f32,
    lp_left: f32,
    lp_right: f32,
}

impl Overdrive {
    /// Creates an overdrive with drive and tone at 0.5.
    pub fn new() -> Self {
        let mut od = Self {
            drive: 0.5,
            tone: 0.5,
            pre_gain: 1.0,
            post_gain: 1.0,
            lp_left: 0.0,
            lp_right: 0.0,
        };
        od.set_drive(0.5);
        od
    }

    /// Sets drive (0–1) and recomputes the gain pair.
    pub fn set_drive(&mut self, drive: f32) {
        self.drive = drive.clamp(0.0, 1.0);
        let d = 2.0 * self.drive;
        let d2 = d * d;
        let pre_a = d * 0.5;
        let pre_b = d2 * d2 * d * 24.0;
        self.pre_gain = pre_a + (pre_b - pre_a) * d2;

        let squashed = d * (2.0 - d);
        let reference = soft_clip(0.33 + squashed * (self.pre_gain - 0.33));
        self.post_gain = if reference.abs() > f32::EPSILON {
            1.0 / reference
        } else {
            1.0
        };
    }

    /// Current drive.
    pub fn drive(&self) -> f32 {
        self.drive
    }

    /// Current tone.
    pub fn tone(&self) -> f32 {
        self.tone
    }

    #[inline]
    fn shape(&self, x: f32, lp: &mut f32) -> f32 {
        let driven = soft_clip(x * self.pre_gain) * self.post_gain;
        let coeff = 0.05 + 0.4 * (1.0 - self.tone);
        *lp += coeff * (driven - *lp);
        self.tone * driven + (1.0 - self.tone) * *lp
    }
}

impl Default for Overdrive {
    fn default() -> Self {
        Self::new()
    }
}

impl EffectUnit for Overdrive {
    fn type_id(&self) -> u8 {
        ids::OVERDRIVE
    }

    fn supported_modes(&self) -> ChannelMode {
        ChannelMode::MonoOrStereo
    }

    fn metadata(&self) -> &'static EffectMeta {
        &META
    }

    fn init(&mut self, _sample_rate: f32) {
        self.set_drive(self.drive);
        self.lp_left = 0.0;
        self.lp_right = 0.0;
    }

    fn set_param(&mut self, id: u8, value: f32) {
        match id {
            0 => self.set_drive(value),
            1 => self.tone = value.clamp(0.0, 1.0),
            _ => {}
        }
    }

    #[inline]
    fn process_stereo(&mut self, left: &mut f32, right: &mut f32) {
        let mut lp_left = self.lp_left;
        let mut lp_right = self.lp_right;
        *left = self.shape(*left, &mut lp_left);
        *right = self.shape(*right, &mut lp_right);
        self.lp_left = lp_left;
        self.lp_right = lp_right;
    }

    fn params_snapshot(&self, out: &mut [ParamValue]) -> usize {
        if out.len() < 2 {
            return 0;
        }
        out[0] = ParamValue::from_normalized(0, self.drive);
        out[1] = ParamValue::from_normalized(1, self.tone);
        2
    }
}
