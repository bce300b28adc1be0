//! Stereo chorus.
//!
//! One modulated delay line per channel; the right LFO runs a quarter cycle
//! ahead of the left for width. Delay lines are fixed inline arrays, so the
//! chorus needs no bound memory.

use core::f32::consts::TAU;

use libm::sinf;
use multifx_core::{
    ChannelMode, EffectMeta, EffectUnit, NumberRange, ParamInfo, ParamUnit, ParamValue,
};

use crate::ids;

const PARAMS: &[ParamInfo] = &[
    ParamInfo::number(0, "Rate", "LFO rate", NumberRange::new(0.1, 2.0, 0.01))
        .with_unit(ParamUnit::Hertz),
    ParamInfo::number(1, "Depth", "Modulation depth", NumberRange::new(0.0, 3.0, 0.05))
        .with_unit(ParamUnit::Milliseconds),
    ParamInfo::number(2, "Feedback", "Delay feedback", NumberRange::new(0.0, 0.7, 0.01)),
    ParamInfo::number(3, "Delay", "Base delay", NumberRange::new(5.0, 25.0, 0.1))
        .with_unit(ParamUnit::Milliseconds),
    ParamInfo::number(4, "Mix", "Wet/dry mix", NumberRange::new(0.0, 1.0, 0.01)),
];

/// Metadata for [`Chorus`].
pub const META: EffectMeta = EffectMeta::new("Chorus", "CHR", "Stereo chorus.", PARAMS);

/// Stereo chorus.
///
/// ## Parameters
///
/// | Id | Name | Mapping | Default |
/// |----|------|---------|---------|
/// | 0 | Rate | 0.1–2 Hz | 0.3 |
/// | 1 | Depth | ±0–3 ms | 0.4 |
/// | 2 | Feedback | `0.7 * v` | 0 |
/// | 3 | Delay | 5–25 ms | 0.4 |
/// | 4 | Mix | 0–1 | 0.5 |
#[derive(Debug, Clone)]
pub struct Chorus {
    buf_left: [f32; Self::MAX_DELAY],
    buf_right: [f32; Self::MAX_DELAY],
    write_pos: usize,
    phase_left: f32,
    phase_right: f32,

    rate: f32,
    depth: f32,
    feedback: f32,
    delay: f32,
    mix: f32,

    sample_rate: f32,
}

impl Chorus {
    /// Delay line length per channel (100 ms at 48 kHz).
    pub const MAX_DELAY: usize = 4800;

    /// Creates a chorus with default settings.
    pub fn new() -> Self {
        Self {
            buf_left: [0.0; Self::MAX_DELAY],
            buf_right: [0.0; Self::MAX_DELAY],
            write_pos: 0,
            phase_left: 0.0,
            phase_right: 0.25,
            rate: 0.3,
            depth: 0.4,
            feedback: 0.0,
            delay: 0.4,
            mix: 0.5,
            sample_rate: 48000.0,
        }
    }

    #[inline]
    fn read(buf: &[f32; Self::MAX_DELAY], write_pos: usize, delay: f32) -> f32 {
        let mut pos = write_pos as f32 - delay;
        if pos < 0.0 {
            pos += Self::MAX_DELAY as f32;
        }
        let i0 = (pos as usize).min(Self::MAX_DELAY - 1);
        let i1 = (i0 + 1) % Self::MAX_DELAY;
        let frac = pos - i0 as f32;
        buf[i0] * (1.0 - frac) + buf[i1] * frac
    }

    #[inline]
    fn advance(phase: &mut f32, inc: f32) {
        *phase += inc;
        if *phase >= 1.0 {
            *phase -= 1.0;
        }
    }
}

impl Default for Chorus {
    fn default() -> Self {
        Self::new()
    }
}

impl EffectUnit for Chorus {
    fn type_id(&self) -> u8 {
        ids::CHORUS
    }

    fn supported_modes(&self) -> ChannelMode {
        ChannelMode::Stereo
    }

    fn metadata(&self) -> &'static EffectMeta {
        &META
    }

    fn init(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.write_pos = 0;
        self.phase_left = 0.0;
        self.phase_right = 0.25;
        self.buf_left.fill(0.0);
        self.buf_right.fill(0.0);
    }

    fn set_param(&mut self, id: u8, value: f32) {
        let v = value.clamp(0.0, 1.0);
        match id {
            0 => self.rate = v,
            1 => self.depth = v,
            2 => self.feedback = v,
            3 => self.delay = v,
            4 => self.mix = v,
            _ => {}
        }
    }

    #[inline]
    fn process_stereo(&mut self, left: &mut f32, right: &mut f32) {
        let inc = (0.1 + 1.9 * self.rate) / self.sample_rate;
        Self::advance(&mut self.phase_left, inc);
        Self::advance(&mut self.phase_right, inc);

        let base = (5.0 + 20.0 * self.delay) * 0.001 * self.sample_rate;
        let swing = self.depth * 0.003 * self.sample_rate;
        let max = (Self::MAX_DELAY - 2) as f32;
        let delay_left = (base + sinf(TAU * self.phase_left) * swing).clamp(1.0, max);
        let delay_right = (base + sinf(TAU * self.phase_right) * swing).clamp(1.0, max);

        let wet_left = Self::read(&self.buf_left, self.write_pos, delay_left);
        let wet_right = Self::read(&self.buf_right, self.write_pos, delay_right);

        let fb = self.feedback * 0.7;
        self.buf_left[self.write_pos] = *left + wet_left * fb;
        self.buf_right[self.write_pos] = *right + wet_right * fb;
        self.write_pos = (self.write_pos + 1) % Self::MAX_DELAY;

        let dry = 1.0 - self.mix;
        *left = *left * dry + wet_left * self.mix;
        *right = *right * dry + wet_right * self.mix;
    }

    fn params_snapshot(&self, out: &mut [ParamValue]) -> usize {
        if out.len() < PARAMS.len() {
            return 0;
        }
        for (id, v) in [self.rate, self.depth, self.feedback, self.delay, self.mix]
            .into_iter()
            .enumerate()
        {
            out[id] = ParamValue::from_normalized(id as u8, v);
        }
        PARAMS.len()
    }
}
