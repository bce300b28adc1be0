//! Seven-band graphic equalizer voiced for guitar.
//!
//! Octave-spaced peaking bands from 100 Hz to 6.4 kHz, each ±12 dB. Band
//! coefficients are recomputed lazily on the next processed frame after a
//! gain change.

use multifx_core::{
    Biquad, BiquadCoeffs, ChannelMode, EffectMeta, EffectUnit, NumberRange, ParamInfo, ParamUnit,
    ParamValue,
};

use crate::ids;

/// Number of bands.
pub const NUM_BANDS: usize = 7;

/// Band centre frequencies in Hz.
pub const BAND_FREQUENCIES: [f32; NUM_BANDS] = [100.0, 200.0, 400.0, 800.0, 1600.0, 3200.0, 6400.0];

/// Band Q; the outer bands are wider.
const BAND_Q: [f32; NUM_BANDS] = [1.0, 1.2, 1.4, 1.4, 1.4, 1.2, 1.0];

const GAIN: NumberRange = NumberRange::new(-12.0, 12.0, 0.5);

const fn band(id: u8, name: &'static str) -> ParamInfo {
    ParamInfo::number(id, name, "Band gain", GAIN).with_unit(ParamUnit::Decibels)
}

const PARAMS: &[ParamInfo] = &[
    band(0, "100 Hz"),
    band(1, "200 Hz"),
    band(2, "400 Hz"),
    band(3, "800 Hz"),
    band(4, "1.6 kHz"),
    band(5, "3.2 kHz"),
    band(6, "6.4 kHz"),
];

/// Metadata for [`GraphicEq`].
pub const META: EffectMeta = EffectMeta::new("Graphic EQ", "GEQ", "7-band graphic EQ.", PARAMS);

/// Seven-band graphic EQ. Every band defaults to 0.5 (0 dB).
#[derive(Debug, Clone)]
pub struct GraphicEq {
    gains: [f32; NUM_BANDS],
    left: [Biquad; NUM_BANDS],
    right: [Biquad; NUM_BANDS],
    dirty: bool,
    sample_rate: f32,
}

impl GraphicEq {
    /// Creates a flat EQ.
    pub fn new() -> Self {
        Self {
            gains: [0.5; NUM_BANDS],
            left: [Biquad::new(); NUM_BANDS],
            right: [Biquad::new(); NUM_BANDS],
            dirty: true,
            sample_rate: 48000.0,
        }
    }

    /// Gain of `band` in dB.
    pub fn band_gain_db(&self, band: usize) -> Option<f32> {
        self.gains.get(band).map(|&g| (g - 0.5) * 24.0)
    }

    fn update_filters(&mut self) {
        for band in 0..NUM_BANDS {
            let gain_db = (self.gains[band] - 0.5) * 24.0;
            let coeffs = if gain_db == 0.0 {
                BiquadCoeffs::IDENTITY
            } else {
                BiquadCoeffs::peaking(BAND_FREQUENCIES[band], BAND_Q[band], gain_db, self.sample_rate)
            };
            self.left[band].set_coeffs(coeffs);
            self.right[band].set_coeffs(coeffs);
        }
        self.dirty = false;
    }
}

impl Default for GraphicEq {
    fn default() -> Self {
        Self::new()
    }
}

impl EffectUnit for GraphicEq {
    fn type_id(&self) -> u8 {
        ids::GRAPHIC_EQ
    }

    fn supported_modes(&self) -> ChannelMode {
        ChannelMode::MonoOrStereo
    }

    fn metadata(&self) -> &'static EffectMeta {
        &META
    }

    fn init(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        for bq in self.left.iter_mut().chain(self.right.iter_mut()) {
            bq.clear();
        }
        self.update_filters();
    }

    fn set_param(&mut self, id: u8, value: f32) {
        if let Some(gain) = self.gains.get_mut(usize::from(id)) {
            *gain = value.clamp(0.0, 1.0);
            self.dirty = true;
        }
    }

    #[inline]
    fn process_stereo(&mut self, left: &mut f32, right: &mut f32) {
        if self.dirty {
            self.update_filters();
        }
        for (bl, br) in self.left.iter_mut().zip(self.right.iter_mut()) {
            *left = bl.process(*left);
            *right = br.process(*right);
        }
    }

    fn params_snapshot(&self, out: &mut [ParamValue]) -> usize {
        if out.len() < NUM_BANDS {
            return 0;
        }
        for (i, &gain) in self.gains.iter().enumerate() {
            out[i] = ParamValue::from_normalized(i as u8, gain);
        }
        NUM_BANDS
    }
}
