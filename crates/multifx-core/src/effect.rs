//! The effect unit contract.
//!
//! [`EffectUnit`] is what the engine's pools hand out and what each slot
//! drives once per frame. It is object safe: pools store concrete types,
//! slots see `&mut dyn EffectUnit`.
//!
//! ## Design Decisions
//!
//! - **Stereo in place**: `process_stereo` mutates one `(l, r)` frame. Mono
//!   effects still implement it; the slot decides whether to collapse the
//!   result (see `ChannelPolicy`).
//!
//! - **Normalized parameters**: `set_param` always receives `[0, 1]`. How a
//!   value maps to plain units is private to the effect and documented in
//!   its [`EffectMeta`].
//!
//! - **No allocations**: every method may be called from the audio thread.
//!   Effects that need large buffers receive them before `init` through
//!   [`BufferSource`](crate::BufferSource) binding.

use crate::meta::{ChannelMode, EffectMeta};
use crate::patch::ParamValue;

/// Contract implemented by every pluggable effect.
///
/// # Example
///
/// ```rust
/// use multifx_core::{ChannelMode, EffectMeta, EffectUnit, ParamInfo, ParamValue};
///
/// const META: EffectMeta = EffectMeta::new(
///     "Gain", "GAN", "Plain gain.",
///     &[ParamInfo::free(0, "Level", "Output level")],
/// );
///
/// struct Gain {
///     level: f32,
/// }
///
/// impl EffectUnit for Gain {
///     fn type_id(&self) -> u8 { 99 }
///     fn supported_modes(&self) -> ChannelMode { ChannelMode::MonoOrStereo }
///     fn metadata(&self) -> &'static EffectMeta { &META }
///     fn init(&mut self, _sample_rate: f32) {}
///     fn set_param(&mut self, id: u8, value: f32) {
///         if id == 0 {
///             self.level = value.clamp(0.0, 1.0);
///         }
///     }
///     fn process_stereo(&mut self, left: &mut f32, right: &mut f32) {
///         *left *= self.level;
///         *right *= self.level;
///     }
///     fn params_snapshot(&self, out: &mut [ParamValue]) -> usize {
///         let Some(slot) = out.first_mut() else { return 0 };
///         *slot = ParamValue::from_normalized(0, self.level);
///         1
///     }
/// }
///
/// let mut gain = Gain { level: 1.0 };
/// gain.set_param(0, 0.5);
/// let (mut l, mut r) = (1.0, -1.0);
/// gain.process_stereo(&mut l, &mut r);
/// assert_eq!((l, r), (0.5, -0.5));
/// ```
pub trait EffectUnit: Send {
    /// Effect type identifier (stable across releases; used on the wire).
    fn type_id(&self) -> u8;

    /// Channel layouts this effect is designed for.
    fn supported_modes(&self) -> ChannelMode;

    /// Static description of this effect type.
    fn metadata(&self) -> &'static EffectMeta;

    /// Resets all DSP state for `sample_rate`. Must not allocate.
    fn init(&mut self, sample_rate: f32);

    /// Updates one parameter from a normalized `[0, 1]` value.
    ///
    /// Values outside the range are clamped; unknown ids are ignored.
    fn set_param(&mut self, id: u8, value: f32);

    /// Processes one stereo frame in place.
    fn process_stereo(&mut self, left: &mut f32, right: &mut f32);

    /// Processes one mono sample in place.
    ///
    /// The default runs the stereo path on `(m, m)` and averages the result.
    fn process_mono(&mut self, sample: &mut f32) {
        let (mut l, mut r) = (*sample, *sample);
        self.process_stereo(&mut l, &mut r);
        *sample = 0.5 * (l + r);
    }

    /// Writes the current `(id, 0..=127)` values into `out`.
    ///
    /// Returns the number of entries written, or 0 when `out` cannot hold
    /// every parameter.
    fn params_snapshot(&self, out: &mut [ParamValue]) -> usize;

    /// Informs time-synced effects of the current tempo. Default: ignored.
    fn set_tempo(&mut self, _bpm: f32) {}
}
