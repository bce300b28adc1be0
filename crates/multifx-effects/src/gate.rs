//! Noise gate for cutting hum and buzz between phrases.
//!
//! The detector is the louder of the two channels; once it crosses the
//! threshold the gate opens with the attack time constant, stays open for the
//! hold time after the level drops, then closes with the release time
//! constant. Range sets the floor the gate closes to.

use multifx_core::{
    ChannelMode, EffectMeta, EffectUnit, NumberRange, ParamInfo, ParamUnit, ParamValue,
    db_to_linear, envelope_coeff,
};

use crate::ids;

const PARAMS: &[ParamInfo] = &[
    ParamInfo::number(0, "Threshold", "Gate threshold", NumberRange::new(-80.0, -20.0, 0.5))
        .with_unit(ParamUnit::Decibels),
    ParamInfo::number(1, "Attack", "Open time", NumberRange::new(0.1, 50.0, 0.1))
        .with_unit(ParamUnit::Milliseconds),
    ParamInfo::number(2, "Hold", "Hold open time", NumberRange::new(10.0, 500.0, 1.0))
        .with_unit(ParamUnit::Milliseconds),
    ParamInfo::number(3, "Release", "Close time", NumberRange::new(10.0, 500.0, 1.0))
        .with_unit(ParamUnit::Milliseconds),
    ParamInfo::number(4, "Range", "Closed floor (0 = full cut)", NumberRange::new(0.0, 1.0, 0.01)),
];

/// Metadata for [`NoiseGate`].
pub const META: EffectMeta = EffectMeta::new("Noise Gate", "GTE", "Noise gate.", PARAMS);

/// Noise gate.
///
/// ## Parameters
///
/// | Id | Name | Mapping | Default |
/// |----|------|---------|---------|
/// | 0 | Threshold | -80 to -20 dB | 0.3 (-62 dB) |
/// | 1 | Attack | 0.1–50 ms | 1 ms |
/// | 2 | Hold | 10–500 ms | 100 ms |
/// | 3 | Release | 10–500 ms | 100 ms |
/// | 4 | Range | floor gain 0–1 | 0 |
#[derive(Debug, Clone)]
pub struct NoiseGate {
    threshold: f32,
    attack_s: f32,
    hold_s: f32,
    release_s: f32,
    range: f32,

    threshold_lin: f32,
    attack_coeff: f32,
    release_coeff: f32,

    gain: f32,
    hold_counter: f32,
    sample_rate: f32,
}

impl NoiseGate {
    /// Creates a closed gate with default settings.
    pub fn new() -> Self {
        let mut gate = Self {
            threshold: 0.3,
            attack_s: 0.001,
            hold_s: 0.1,
            release_s: 0.1,
            range: 0.0,
            threshold_lin: 0.0,
            attack_coeff: 0.0,
            release_coeff: 0.0,
            gain: 0.0,
            hold_counter: 0.0,
            sample_rate: 48000.0,
        };
        gate.update_coefficients();
        gate
    }

    /// Current gate gain, 0 closed to 1 open, before the range floor.
    pub fn gain(&self) -> f32 {
        self.gain
    }

    /// Threshold as linear amplitude.
    pub fn threshold_linear(&self) -> f32 {
        self.threshold_lin
    }

    fn update_coefficients(&mut self) {
        self.threshold_lin = db_to_linear(-80.0 + 60.0 * self.threshold);
        self.attack_coeff = envelope_coeff(self.attack_s, self.sample_rate);
        self.release_coeff = envelope_coeff(self.release_s, self.sample_rate);
    }
}

impl Default for NoiseGate {
    fn default() -> Self {
        Self::new()
    }
}

impl EffectUnit for NoiseGate {
    fn type_id(&self) -> u8 {
        ids::NOISE_GATE
    }

    fn supported_modes(&self) -> ChannelMode {
        ChannelMode::MonoOrStereo
    }

    fn metadata(&self) -> &'static EffectMeta {
        &META
    }

    fn init(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.gain = 0.0;
        self.hold_counter = 0.0;
        self.update_coefficients();
    }

    fn set_param(&mut self, id: u8, value: f32) {
        let v = value.clamp(0.0, 1.0);
        match id {
            0 => {
                self.threshold = v;
                self.threshold_lin = db_to_linear(-80.0 + 60.0 * v);
            }
            1 => {
                self.attack_s = 0.0001 + 0.0499 * v;
                self.attack_coeff = envelope_coeff(self.attack_s, self.sample_rate);
            }
            2 => self.hold_s = 0.01 + 0.49 * v,
            3 => {
                self.release_s = 0.01 + 0.49 * v;
                self.release_coeff = envelope_coeff(self.release_s, self.sample_rate);
            }
            4 => self.range = v,
            _ => {}
        }
    }

    #[inline]
    fn process_stereo(&mut self, left: &mut f32, right: &mut f32) {
        let level = left.abs().max(right.abs());

        if level > self.threshold_lin {
            self.hold_counter = self.hold_s * self.sample_rate;
            self.gain = self.attack_coeff * self.gain + (1.0 - self.attack_coeff);
        } else if self.hold_counter > 0.0 {
            self.hold_counter -= 1.0;
        } else {
            self.gain *= self.release_coeff;
        }

        let effective = self.range + (1.0 - self.range) * self.gain;
        *left *= effective;
        *right *= effective;
    }

    fn params_snapshot(&self, out: &mut [ParamValue]) -> usize {
        if out.len() < PARAMS.len() {
            return 0;
        }
        out[0] = ParamValue::from_normalized(0, self.threshold);
        out[1] = ParamValue::from_normalized(1, (self.attack_s - 0.0001) / 0.0499);
        out[2] = ParamValue::from_normalized(2, (self.hold_s - 0.01) / 0.49);
        out[3] = ParamValue::from_normalized(3, (self.release_s - 0.01) / 0.49);
        out[4] = ParamValue::from_normalized(4, self.range);
        PARAMS.len()
    }
}
