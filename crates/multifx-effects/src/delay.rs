//! Tempo-synced stereo feedback delay.
//!
//! The delay line memory (two channels of [`Delay::BUFFER_LEN`] samples) is
//! supplied by the host through [`Delay::bind_buffers`]; an unbound delay
//! passes audio through untouched.

use multifx_core::{
    BufferSource, ChannelMode, EffectMeta, EffectUnit, NumberRange, ParamInfo, ParamValue,
    SampleBuffer, TimeSync, acquire_array,
};

use crate::ids;

const PARAMS: &[ParamInfo] = &[
    ParamInfo::free(0, "Free Time", "Delay time ms if not synced"),
    ParamInfo::free(1, "Division", "Beat division index"),
    ParamInfo::free(2, "Synced", "0/1 tempo synced"),
    ParamInfo::number(3, "Feedback", "Delay feedback", NumberRange::new(0.0, 0.95, 0.01)),
    ParamInfo::number(4, "Mix", "Wet/dry mix", NumberRange::new(0.0, 1.0, 0.01)),
];

/// Metadata for [`Delay`].
pub const META: EffectMeta = EffectMeta::new("Delay", "DLY", "Tempo-synced delay.", PARAMS);

/// Stereo feedback delay.
///
/// ## Parameters
///
/// | Id | Name | Mapping | Default |
/// |----|------|---------|---------|
/// | 0 | Free Time | 10–2000 ms, logarithmic | 250 ms |
/// | 1 | Division | 8 beat divisions | 1/4 |
/// | 2 | Synced | off < 0.5 ≤ on | on |
/// | 3 | Feedback | `0.95 * v` | 0.4 |
/// | 4 | Mix | 0–1 | 0.5 |
///
/// # Example
///
/// ```rust
/// use multifx_core::{EffectUnit, HeapBuffers};
/// use multifx_effects::Delay;
///
/// let mut delay = Delay::new();
/// assert!(delay.bind_buffers(&mut HeapBuffers::new()));
/// delay.init(48000.0);
/// delay.set_param(2, 0.0); // free-running
/// delay.set_param(0, 0.0); // 10 ms
///
/// let (mut l, mut r) = (1.0, 1.0);
/// delay.process_stereo(&mut l, &mut r);
/// assert_eq!(l, 0.5); // dry half, echo not yet due
/// ```
pub struct Delay {
    buffers: Option<[SampleBuffer; 2]>,
    write_pos: usize,
    time: TimeSync,
    feedback: f32,
    mix: f32,
}

impl Delay {
    /// Samples per channel: two seconds at 48 kHz.
    pub const BUFFER_LEN: usize = 48000 * 2;

    /// Creates an unbound delay.
    pub fn new() -> Self {
        Self {
            buffers: None,
            write_pos: 0,
            time: TimeSync::new(),
            feedback: 0.4,
            mix: 0.5,
        }
    }

    /// Takes both channel buffers from `source`. Returns whether it is bound.
    pub fn bind_buffers(&mut self, source: &mut dyn BufferSource) -> bool {
        if self.buffers.is_none() {
            self.buffers = acquire_array(source, Self::BUFFER_LEN);
        }
        self.buffers.is_some()
    }

    /// Whether delay memory has been bound.
    pub fn is_bound(&self) -> bool {
        self.buffers.is_some()
    }

    /// Current delay period in samples.
    pub fn period_samples(&self) -> usize {
        self.time.period_samples().min(Self::BUFFER_LEN - 1)
    }
}

impl Default for Delay {
    fn default() -> Self {
        Self::new()
    }
}

impl EffectUnit for Delay {
    fn type_id(&self) -> u8 {
        ids::DELAY
    }

    fn supported_modes(&self) -> ChannelMode {
        ChannelMode::MonoOrStereo
    }

    fn metadata(&self) -> &'static EffectMeta {
        &META
    }

    fn init(&mut self, sample_rate: f32) {
        self.time.init(sample_rate);
        self.write_pos = 0;
        if let Some(buffers) = &mut self.buffers {
            for buf in buffers.iter_mut() {
                buf.fill(0.0);
            }
        }
    }

    fn set_param(&mut self, id: u8, value: f32) {
        let v = value.clamp(0.0, 1.0);
        match id {
            0..=2 => {
                self.time.set_param(id, v);
            }
            3 => self.feedback = 0.95 * v,
            4 => self.mix = v,
            _ => {}
        }
    }

    #[inline]
    fn process_stereo(&mut self, left: &mut f32, right: &mut f32) {
        let period = self.period_samples();
        let Some([buf_l, buf_r]) = &mut self.buffers else {
            return;
        };
        let len = buf_l.len();
        let read_pos = (self.write_pos + len - period) % len;

        let (dl, dr) = (buf_l[read_pos], buf_r[read_pos]);
        buf_l[self.write_pos] = *left + dl * self.feedback;
        buf_r[self.write_pos] = *right + dr * self.feedback;
        self.write_pos = (self.write_pos + 1) % len;

        let dry = 1.0 - self.mix;
        *left = *left * dry + dl * self.mix;
        *right = *right * dry + dr * self.mix;
    }

    fn params_snapshot(&self, out: &mut [ParamValue]) -> usize {
        if out.len() < PARAMS.len() {
            return 0;
        }
        let [time, division, synced] = self.time.normalized();
        out[0] = ParamValue::from_normalized(0, time);
        out[1] = ParamValue::from_normalized(1, division);
        out[2] = ParamValue::from_normalized(2, synced);
        out[3] = ParamValue::from_normalized(3, self.feedback / 0.95);
        out[4] = ParamValue::from_normalized(4, self.mix);
        PARAMS.len()
    }

    fn set_tempo(&mut self, bpm: f32) {
        self.time.set_tempo(bpm);
    }
}
