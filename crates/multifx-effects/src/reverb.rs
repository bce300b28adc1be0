//! Freeverb-style stereo reverb.
//!
//! A mono sum feeds a pre-delay, then four damped comb filters per side in
//! parallel and two allpass diffusers per side in series. The right tank is
//! detuned by a fixed number of samples for stereo width. All delay memory is
//! bound from a [`BufferSource`]; an unbound reverb passes audio through.

use multifx_core::{
    BufferSource, ChannelMode, EffectMeta, EffectUnit, NumberRange, ParamInfo, ParamUnit,
    ParamValue, SampleBuffer, acquire_array, acquire_exact, mono_average,
};

use crate::ids;

/// Comb delay times in seconds at size 1/3 (scale factor 1.0).
const COMB_TUNINGS: [f32; 4] = [0.0297, 0.0371, 0.0411, 0.0437];

/// Allpass delay times in seconds at scale factor 1.0.
const ALLPASS_TUNINGS: [f32; 2] = [0.005, 0.0017];

/// Right-tank detune in samples.
const STEREO_SPREAD: usize = 23;

const ALLPASS_GAIN: f32 = 0.7;

const PARAMS: &[ParamInfo] = &[
    ParamInfo::number(0, "Mix", "Wet/dry mix", NumberRange::new(0.0, 1.0, 0.01)),
    ParamInfo::number(1, "Decay", "Comb feedback", NumberRange::new(0.2, 0.95, 0.01)),
    ParamInfo::number(2, "Damping", "High-frequency damping", NumberRange::new(0.0, 0.8, 0.01)),
    ParamInfo::number(3, "Pre-Delay", "Pre-delay", NumberRange::new(0.0, 200.0, 1.0))
        .with_unit(ParamUnit::Milliseconds),
    ParamInfo::number(4, "Size", "Room size", NumberRange::new(0.0, 1.0, 0.01)),
];

/// Metadata for [`Reverb`].
pub const META: EffectMeta = EffectMeta::new("Reverb", "REV", "Stereo room reverb.", PARAMS);

/// Lowpass-feedback comb filter.
#[derive(Debug)]
struct Comb {
    buf: SampleBuffer,
    size: usize,
    idx: usize,
    feedback: f32,
    damp: f32,
    lp: f32,
}

impl Comb {
    fn new(buf: SampleBuffer) -> Self {
        Self {
            buf,
            size: 1,
            idx: 0,
            feedback: 0.7,
            damp: 0.2,
            lp: 0.0,
        }
    }

    fn configure(&mut self, size: usize, feedback: f32, damp: f32) {
        self.size = size.clamp(1, self.buf.len());
        self.idx = 0;
        self.feedback = feedback;
        self.damp = damp;
        self.lp = 0.0;
        self.buf[..self.size].fill(0.0);
    }

    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let y = self.buf[self.idx];
        self.lp += self.damp * (y - self.lp);
        self.buf[self.idx] = input + self.lp * self.feedback;
        self.idx += 1;
        if self.idx >= self.size {
            self.idx = 0;
        }
        y
    }
}

/// Schroeder allpass diffuser.
#[derive(Debug)]
struct Allpass {
    buf: SampleBuffer,
    size: usize,
    idx: usize,
}

impl Allpass {
    fn new(buf: SampleBuffer) -> Self {
        Self { buf, size: 1, idx: 0 }
    }

    fn configure(&mut self, size: usize) {
        self.size = size.clamp(1, self.buf.len());
        self.idx = 0;
        self.buf[..self.size].fill(0.0);
    }

    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let y = self.buf[self.idx];
        let x = input - ALLPASS_GAIN * y;
        self.buf[self.idx] = x;
        self.idx += 1;
        if self.idx >= self.size {
            self.idx = 0;
        }
        y + ALLPASS_GAIN * x
    }
}

/// Bound delay memory: pre-delay plus both tanks.
#[derive(Debug)]
struct Tank {
    pre: SampleBuffer,
    pre_size: usize,
    pre_idx: usize,
    combs_left: [Comb; 4],
    combs_right: [Comb; 4],
    allpasses_left: [Allpass; 2],
    allpasses_right: [Allpass; 2],
}

impl Tank {
    fn acquire(source: &mut dyn BufferSource) -> Option<Self> {
        let pre = acquire_exact(source, Reverb::MAX_PRE_DELAY)?;
        let combs_left = acquire_array::<4>(source, Reverb::MAX_COMB)?.map(Comb::new);
        let combs_right = acquire_array::<4>(source, Reverb::MAX_COMB)?.map(Comb::new);
        let allpasses_left = acquire_array::<2>(source, Reverb::MAX_ALLPASS)?.map(Allpass::new);
        let allpasses_right = acquire_array::<2>(source, Reverb::MAX_ALLPASS)?.map(Allpass::new);
        Some(Self {
            pre,
            pre_size: 1,
            pre_idx: 0,
            combs_left,
            combs_right,
            allpasses_left,
            allpasses_right,
        })
    }

    #[inline]
    fn pre_delay(&mut self, x: f32) -> f32 {
        let y = self.pre[self.pre_idx];
        self.pre[self.pre_idx] = x;
        self.pre_idx += 1;
        if self.pre_idx >= self.pre_size {
            self.pre_idx = 0;
        }
        y
    }

    #[inline]
    fn process(&mut self, input: f32) -> (f32, f32) {
        let mut left = 0.0;
        let mut right = 0.0;
        for (cl, cr) in self.combs_left.iter_mut().zip(self.combs_right.iter_mut()) {
            left += cl.process(input);
            right += cr.process(input);
        }
        left *= 0.25;
        right *= 0.25;
        for ap in &mut self.allpasses_left {
            left = ap.process(left);
        }
        for ap in &mut self.allpasses_right {
            right = ap.process(right);
        }
        (left.clamp(-1.0, 1.0), right.clamp(-1.0, 1.0))
    }
}

/// Stereo reverb.
///
/// ## Parameters
///
/// | Id | Name | Mapping | Default |
/// |----|------|---------|---------|
/// | 0 | Mix | 0–1 | 0.3 |
/// | 1 | Decay | comb feedback `0.2 + 0.75 v` | 0.7 |
/// | 2 | Damping | `0.8 v` | 0.3 |
/// | 3 | Pre-Delay | 0–200 ms | 20 ms |
/// | 4 | Size | delay scale `0.5 + 1.5 v` | 0.7 |
///
/// # Example
///
/// ```rust
/// use multifx_core::{EffectUnit, HeapBuffers};
/// use multifx_effects::Reverb;
///
/// let mut reverb = Reverb::new();
/// assert!(reverb.bind_buffers(&mut HeapBuffers::new()));
/// reverb.init(48000.0);
///
/// let (mut l, mut r) = (0.5, 0.5);
/// reverb.process_stereo(&mut l, &mut r);
/// assert!(l.is_finite() && r.is_finite());
/// ```
#[derive(Debug)]
pub struct Reverb {
    tank: Option<Tank>,
    mix: f32,
    decay: f32,
    damp: f32,
    pre_ms: f32,
    size: f32,
    sample_rate: f32,
}

impl Reverb {
    /// Pre-delay capacity in samples (200 ms at 48 kHz).
    pub const MAX_PRE_DELAY: usize = 9600;
    /// Comb capacity in samples.
    pub const MAX_COMB: usize = 48000;
    /// Allpass capacity in samples.
    pub const MAX_ALLPASS: usize = 2400;

    /// Creates an unbound reverb with default settings.
    pub fn new() -> Self {
        Self {
            tank: None,
            mix: 0.3,
            decay: 0.7,
            damp: 0.3,
            pre_ms: 20.0,
            size: 0.7,
            sample_rate: 48000.0,
        }
    }

    /// Takes pre-delay, comb and allpass memory from `source`.
    ///
    /// Either all of it is bound or none; returns whether the reverb is bound.
    pub fn bind_buffers(&mut self, source: &mut dyn BufferSource) -> bool {
        if self.tank.is_none() {
            self.tank = Tank::acquire(source);
            self.update_pre_delay();
            self.update_tank();
        }
        self.tank.is_some()
    }

    /// Whether delay memory has been bound.
    pub fn is_bound(&self) -> bool {
        self.tank.is_some()
    }

    fn update_pre_delay(&mut self) {
        let Some(tank) = &mut self.tank else {
            return;
        };
        let samples = (self.pre_ms * 0.001 * self.sample_rate + 0.5) as usize;
        tank.pre_size = samples.clamp(1, Self::MAX_PRE_DELAY);
        tank.pre_idx = 0;
        tank.pre[..tank.pre_size].fill(0.0);
    }

    fn update_tank(&mut self) {
        let Some(tank) = &mut self.tank else {
            return;
        };
        let scale = 0.5 + 1.5 * self.size;
        let to_samples = |seconds: f32| (seconds * scale * self.sample_rate + 0.5) as usize;

        for (i, &t) in COMB_TUNINGS.iter().enumerate() {
            let len = to_samples(t);
            tank.combs_left[i].configure(len, self.decay, self.damp);
            tank.combs_right[i].configure(len + STEREO_SPREAD, self.decay, self.damp);
        }
        for (i, &t) in ALLPASS_TUNINGS.iter().enumerate() {
            let len = to_samples(t);
            tank.allpasses_left[i].configure(len);
            tank.allpasses_right[i].configure(len + STEREO_SPREAD);
        }
    }
}

impl Default for Reverb {
    fn default() -> Self {
        Self::new()
    }
}

impl EffectUnit for Reverb {
    fn type_id(&self) -> u8 {
        ids::REVERB
    }

    fn supported_modes(&self) -> ChannelMode {
        ChannelMode::MonoOrStereo
    }

    fn metadata(&self) -> &'static EffectMeta {
        &META
    }

    fn init(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.update_pre_delay();
        self.update_tank();
    }

    fn set_param(&mut self, id: u8, value: f32) {
        let v = value.clamp(0.0, 1.0);
        match id {
            0 => self.mix = v,
            1 => {
                self.decay = 0.2 + 0.75 * v;
                self.update_tank();
            }
            2 => {
                self.damp = 0.8 * v;
                self.update_tank();
            }
            3 => {
                self.pre_ms = 200.0 * v;
                self.update_pre_delay();
            }
            4 => {
                self.size = v;
                self.update_tank();
            }
            _ => {}
        }
    }

    #[inline]
    fn process_stereo(&mut self, left: &mut f32, right: &mut f32) {
        let Some(tank) = &mut self.tank else {
            return;
        };
        let pre = tank.pre_delay(mono_average(*left, *right));
        let (wet_left, wet_right) = tank.process(pre);

        let dry = 1.0 - self.mix;
        *left = *left * dry + wet_left * self.mix;
        *right = *right * dry + wet_right * self.mix;
    }

    fn params_snapshot(&self, out: &mut [ParamValue]) -> usize {
        if out.len() < PARAMS.len() {
            return 0;
        }
        out[0] = ParamValue::from_normalized(0, self.mix);
        out[1] = ParamValue::from_normalized(1, (self.decay - 0.2) / 0.75);
        out[2] = ParamValue::from_normalized(2, self.damp / 0.8);
        out[3] = ParamValue::from_normalized(3, self.pre_ms / 200.0);
        out[4] = ParamValue::from_normalized(4, self.size);
        PARAMS.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use multifx_core::{HeapBuffers, NoBuffers};

    fn bound() -> Reverb {
        let mut reverb = Reverb::new();
        assert!(reverb.bind_buffers(&mut HeapBuffers::new()));
        reverb.init(48000.0);
        reverb
    }

    /// Source whose buffers are always 16 samples long.
    struct ShortBuffers;

    impl BufferSource for ShortBuffers {
        fn acquire(&mut self, _len: usize) -> Option<SampleBuffer> {
            Some(vec![0.0; 16].into_boxed_slice())
        }
    }

    #[test]
    fn short_buffers_leave_reverb_unbound() {
        let mut reverb = Reverb::new();
        assert!(!reverb.bind_buffers(&mut ShortBuffers));
        assert!(!reverb.is_bound());
        reverb.init(48000.0);
        for _ in 0..2048 {
            let (mut l, mut r) = (0.4, -0.2);
            reverb.process_stereo(&mut l, &mut r);
            assert_eq!((l, r), (0.4, -0.2));
        }
    }

    #[test]
    fn unbound_passes_through() {
        let mut reverb = Reverb::new();
        assert!(!reverb.bind_buffers(&mut NoBuffers));
        reverb.init(48000.0);
        let (mut l, mut r) = (0.4, -0.2);
        reverb.process_stereo(&mut l, &mut r);
        assert_eq!((l, r), (0.4, -0.2));
    }

    #[test]
    fn binding_takes_all_memory() {
        let mut heap = HeapBuffers::new();
        let mut reverb = Reverb::new();
        assert!(reverb.bind_buffers(&mut heap));
        let expected = Reverb::MAX_PRE_DELAY + 8 * Reverb::MAX_COMB + 4 * Reverb::MAX_ALLPASS;
        assert_eq!(heap.allocated_samples(), expected);
        // Rebinding is a no-op.
        assert!(reverb.bind_buffers(&mut heap));
        assert_eq!(heap.allocated_samples(), expected);
    }

    #[test]
    fn impulse_produces_tail() {
        let mut reverb = bound();
        reverb.set_param(0, 1.0);
        reverb.set_param(3, 0.0);
        let mut energy = 0.0;
        for n in 0..48000 {
            let x = if n == 0 { 1.0 } else { 0.0 };
            let (mut l, mut r) = (x, x);
            reverb.process_stereo(&mut l, &mut r);
            assert!(l.abs() <= 1.0 && r.abs() <= 1.0);
            if n > 4800 {
                energy += l * l + r * r;
            }
        }
        assert!(energy > 0.0);
    }

    #[test]
    fn pre_delay_holds_back_tail() {
        let mut reverb = bound();
        reverb.set_param(0, 1.0);
        reverb.set_param(3, 0.5); // 100 ms
        for n in 0..4800 {
            let x = if n == 0 { 1.0 } else { 0.0 };
            let (mut l, mut r) = (x, x);
            reverb.process_stereo(&mut l, &mut r);
            assert_eq!((l, r), (0.0, 0.0));
        }
    }

    #[test]
    fn snapshot_inverts_mappings() {
        let mut reverb = Reverb::new();
        for (id, wire) in [(0u8, 40u8), (1, 50), (2, 60), (3, 25), (4, 50)] {
            reverb.set_param(id, f32::from(wire) / 127.0);
        }
        let mut out = [ParamValue::default(); 8];
        assert_eq!(reverb.params_snapshot(&mut out), 5);
        let values: Vec<u8> = out[..5].iter().map(|p| p.value).collect();
        assert_eq!(values, vec![40, 50, 60, 25, 50]);
    }
}
