//! Feed-forward peak compressor.
//!
//! Each channel runs its own peak envelope follower and gain computer, so a
//! stereo source is compressed per side. Gain above threshold follows the
//! hard-knee static curve `thr + (env - thr) / ratio`.

use multifx_core::{
    ChannelMode, EffectMeta, EffectUnit, NumberRange, ParamInfo, ParamUnit, ParamValue,
    db_to_linear, envelope_coeff, linear_to_db,
};

use crate::ids;

const PARAMS: &[ParamInfo] = &[
    ParamInfo::number(0, "Threshold", "Compression threshold", NumberRange::new(-40.0, 0.0, 0.5))
        .with_unit(ParamUnit::Decibels),
    ParamInfo::number(1, "Ratio", "Compression ratio", NumberRange::new(1.0, 20.0, 0.1))
        .with_unit(ParamUnit::Ratio),
    ParamInfo::number(2, "Attack", "Attack time", NumberRange::new(0.1, 100.0, 0.1))
        .with_unit(ParamUnit::Milliseconds),
    ParamInfo::number(3, "Release", "Release time", NumberRange::new(10.0, 1000.0, 1.0))
        .with_unit(ParamUnit::Milliseconds),
    ParamInfo::number(4, "Makeup", "Makeup gain", NumberRange::new(0.0, 24.0, 0.5))
        .with_unit(ParamUnit::Decibels),
];

/// Metadata for [`Compressor`].
pub const META: EffectMeta = EffectMeta::new("Compressor", "CMP", "Dynamics compressor.", PARAMS);

/// Dynamics compressor.
///
/// ## Parameters
///
/// | Id | Name | Mapping | Default |
/// |----|------|---------|---------|
/// | 0 | Threshold | -40 to 0 dB | 0.5 (-20 dB) |
/// | 1 | Ratio | 1:1 to 20:1 | 4:1 |
/// | 2 | Attack | 0.1–100 ms | 10 ms |
/// | 3 | Release | 10–1000 ms | 100 ms |
/// | 4 | Makeup | 0 to +24 dB | 0 dB |
///
/// # Example
///
/// ```rust
/// use multifx_core::EffectUnit;
/// use multifx_effects::Compressor;
///
/// let mut comp = Compressor::new();
/// comp.init(48000.0);
/// comp.set_param(0, 0.0); // -40 dB
/// comp.set_param(1, 1.0); // 20:1
///
/// let (mut l, mut r) = (0.9, 0.9);
/// for _ in 0..4800 {
///     l = 0.9;
///     r = 0.9;
///     comp.process_stereo(&mut l, &mut r);
/// }
/// assert!(l < 0.9);
/// ```
#[derive(Debug, Clone)]
pub struct Compressor {
    threshold: f32,
    ratio: f32,
    attack_s: f32,
    release_s: f32,
    makeup: f32,

    threshold_db: f32,
    threshold_lin: f32,
    attack_coeff: f32,
    release_coeff: f32,

    env_left: f32,
    env_right: f32,
    sample_rate: f32,
}

impl Compressor {
    /// Creates a compressor with default settings.
    pub fn new() -> Self {
        let mut comp = Self {
            threshold: 0.5,
            ratio: 4.0,
            attack_s: 0.01,
            release_s: 0.1,
            makeup: 1.0,
            threshold_db: 0.0,
            threshold_lin: 1.0,
            attack_coeff: 0.0,
            release_coeff: 0.0,
            env_left: 0.0,
            env_right: 0.0,
            sample_rate: 48000.0,
        };
        comp.update_coefficients();
        comp
    }

    /// Threshold in dB.
    pub fn threshold_db(&self) -> f32 {
        self.threshold_db
    }

    /// Ratio (n:1).
    pub fn ratio(&self) -> f32 {
        self.ratio
    }

    fn update_coefficients(&mut self) {
        self.threshold_db = -40.0 + 40.0 * self.threshold;
        self.threshold_lin = db_to_linear(self.threshold_db);
        self.attack_coeff = envelope_coeff(self.attack_s, self.sample_rate);
        self.release_coeff = envelope_coeff(self.release_s, self.sample_rate);
    }

    #[inline]
    fn follow(&self, env: f32, input: f32) -> f32 {
        let coeff = if input > env {
            self.attack_coeff
        } else {
            self.release_coeff
        };
        coeff * env + (1.0 - coeff) * input
    }

    #[inline]
    fn gain_for(&self, env: f32) -> f32 {
        if env <= self.threshold_lin || env < 1e-10 {
            return 1.0;
        }
        let env_db = linear_to_db(env);
        let compressed_db = self.threshold_db + (env_db - self.threshold_db) / self.ratio;
        db_to_linear(compressed_db - env_db)
    }
}

impl Default for Compressor {
    fn default() -> Self {
        Self::new()
    }
}

impl EffectUnit for Compressor {
    fn type_id(&self) -> u8 {
        ids::COMPRESSOR
    }

    fn supported_modes(&self) -> ChannelMode {
        ChannelMode::MonoOrStereo
    }

    fn metadata(&self) -> &'static EffectMeta {
        &META
    }

    fn init(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.env_left = 0.0;
        self.env_right = 0.0;
        self.update_coefficients();
    }

    fn set_param(&mut self, id: u8, value: f32) {
        let v = value.clamp(0.0, 1.0);
        match id {
            0 => self.threshold = v,
            1 => self.ratio = 1.0 + 19.0 * v,
            2 => self.attack_s = 0.0001 + 0.0999 * v,
            3 => self.release_s = 0.01 + 0.99 * v,
            4 => self.makeup = db_to_linear(24.0 * v),
            _ => return,
        }
        self.update_coefficients();
    }

    #[inline]
    fn process_stereo(&mut self, left: &mut f32, right: &mut f32) {
        self.env_left = self.follow(self.env_left, left.abs());
        self.env_right = self.follow(self.env_right, right.abs());

        *left *= self.gain_for(self.env_left) * self.makeup;
        *right *= self.gain_for(self.env_right) * self.makeup;
    }

    fn params_snapshot(&self, out: &mut [ParamValue]) -> usize {
        if out.len() < PARAMS.len() {
            return 0;
        }
        out[0] = ParamValue::from_normalized(0, self.threshold);
        out[1] = ParamValue::from_normalized(1, (self.ratio - 1.0) / 19.0);
        out[2] = ParamValue::from_normalized(2, (self.attack_s - 0.0001) / 0.0999);
        out[3] = ParamValue::from_normalized(3, (self.release_s - 0.01) / 0.99);
        out[4] = ParamValue::from_normalized(4, linear_to_db(self.makeup) / 24.0);
        PARAMS.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settle(comp: &mut Compressor, level: f32, frames: usize) -> f32 {
        let mut out = 0.0;
        for _ in 0..frames {
            let (mut l, mut r) = (level, level);
            comp.process_stereo(&mut l, &mut r);
            out = l;
        }
        out
    }

    #[test]
    fn below_threshold_is_unity() {
        let mut comp = Compressor::new();
        comp.init(48000.0);
        let out = settle(&mut comp, 0.01, 4800);
        assert!((out - 0.01).abs() < 1e-6);
    }

    #[test]
    fn static_curve_matches_ratio() {
        let mut comp = Compressor::new();
        comp.init(48000.0);
        comp.set_param(0, 0.5); // -20 dB
        comp.set_param(1, 3.0 / 19.0); // 4:1
        comp.set_param(2, 0.0);
        let out = settle(&mut comp, 1.0, 48000);
        // 0 dB in, 20 dB over, 5 dB over after compression
        assert!((linear_to_db(out) - -15.0).abs() < 0.1, "{}", linear_to_db(out));
    }

    #[test]
    fn makeup_gain_applies() {
        let mut comp = Compressor::new();
        comp.init(48000.0);
        comp.set_param(4, 0.25); // +6 dB
        let out = settle(&mut comp, 0.001, 100);
        assert!((out / 0.001 - db_to_linear(6.0)).abs() < 1e-3);
    }

    #[test]
    fn channels_compress_independently() {
        let mut comp = Compressor::new();
        comp.init(48000.0);
        comp.set_param(0, 0.0);
        let mut last = (0.0, 0.0);
        for _ in 0..4800 {
            let (mut l, mut r) = (0.9, 0.001);
            comp.process_stereo(&mut l, &mut r);
            last = (l, r);
        }
        assert!(last.0 < 0.9);
        assert!((last.1 - 0.001).abs() < 1e-6);
    }

    #[test]
    fn snapshot_round_trips_wire_values() {
        let mut comp = Compressor::new();
        for (id, wire) in [(0u8, 80u8), (1, 16), (2, 40), (3, 50), (4, 20)] {
            comp.set_param(id, f32::from(wire) / 127.0);
        }
        let mut out = [ParamValue::default(); 8];
        assert_eq!(comp.params_snapshot(&mut out), 5);
        let values: Vec<u8> = out[..5].iter().map(|p| p.value).collect();
        assert_eq!(values, vec![80, 16, 40, 50, 20]);
    }
}
