//! Slot and board runtime: the per-frame evaluation of the slot graph.
//!
//! Slots are evaluated in ascending index order, which is the topological
//! order of any patch whose taps only point at lower-indexed slots. Each slot
//! resolves its taps from the current frame's scratch outputs (or the
//! hardware input), optionally sums to mono, runs its effect, applies the
//! channel policy, blends through its bypass fade and finally mixes dry and
//! wet. Empty slots forward the running signal untouched.
//!
//! The scratch outputs are cleared at the start of every frame, so a tap
//! pointing at the same or a later slot reads silence for that frame.

use multifx_core::{
    BypassFade, ChannelPolicy, DcBlocker, FadeRamp, MAX_SLOTS, SlotDescriptor, TYPE_OFF, Tap,
    VALUE_MAX, mono_average,
};

use crate::pool::{EffectHandle, EffectPools};

/// Runtime state of one slot.
#[derive(Debug, Clone, Copy)]
pub struct SlotRuntime {
    pub(crate) effect: Option<EffectHandle>,
    pub(crate) type_id: u8,
    pub(crate) enabled: bool,
    pub(crate) fade: BypassFade,
    pub(crate) input_left: Tap,
    pub(crate) input_right: Tap,
    pub(crate) sum_to_mono: bool,
    pub(crate) dry: f32,
    pub(crate) wet: f32,
    pub(crate) policy: ChannelPolicy,
    dc_left: DcBlocker,
    dc_right: DcBlocker,
}

impl SlotRuntime {
    /// An empty, enabled, fully faded-in slot.
    pub const fn cleared() -> Self {
        Self {
            effect: None,
            type_id: TYPE_OFF,
            enabled: true,
            fade: BypassFade::ON,
            input_left: Tap::Input,
            input_right: Tap::Input,
            sum_to_mono: false,
            dry: 0.0,
            wet: 1.0,
            policy: ChannelPolicy::Auto,
            dc_left: DcBlocker::new(),
            dc_right: DcBlocker::new(),
        }
    }

    /// Copies routing, mix and policy from a descriptor.
    ///
    /// The fade starts settled at the enabled state, so a slot that arrives
    /// disabled never runs its effect.
    pub(crate) fn configure(&mut self, desc: &SlotDescriptor) {
        let level = f32::from(VALUE_MAX);
        self.type_id = desc.type_id;
        self.enabled = desc.enabled;
        self.fade = BypassFade::settled(desc.enabled);
        self.input_left = desc.input_left;
        self.input_right = desc.input_right;
        self.sum_to_mono = desc.sum_to_mono;
        self.dry = f32::from(desc.dry.min(VALUE_MAX)) / level;
        self.wet = f32::from(desc.wet.min(VALUE_MAX)) / level;
        self.policy = desc.channel_policy;
        self.dc_left.reset();
        self.dc_right.reset();
    }

    /// Bound pool instance, if any.
    pub fn effect(&self) -> Option<EffectHandle> {
        self.effect
    }

    /// Effect type id requested for this slot.
    pub fn type_id(&self) -> u8 {
        self.type_id
    }

    /// Enabled flag (the fade may still be moving toward it).
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Current bypass fade value.
    pub fn fade(&self) -> f32 {
        self.fade.value()
    }

    /// Left and right taps.
    pub fn taps(&self) -> (Tap, Tap) {
        (self.input_left, self.input_right)
    }

    /// Dry and wet levels in `[0, 1]`.
    pub fn mix(&self) -> (f32, f32) {
        (self.dry, self.wet)
    }

    /// Whether the input is summed to mono.
    pub fn sums_to_mono(&self) -> bool {
        self.sum_to_mono
    }

    /// Channel policy.
    pub fn channel_policy(&self) -> ChannelPolicy {
        self.policy
    }
}

impl Default for SlotRuntime {
    fn default() -> Self {
        Self::cleared()
    }
}

/// The twelve slots plus the current frame's scratch outputs.
#[derive(Debug, Clone)]
pub struct BoardRuntime {
    pub(crate) slots: [SlotRuntime; MAX_SLOTS],
    sample_rate: f32,
    ramp: FadeRamp,
    dc_blocking: bool,
    out_left: [f32; MAX_SLOTS],
    out_right: [f32; MAX_SLOTS],
}

impl BoardRuntime {
    /// A board of cleared slots.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            slots: [SlotRuntime::cleared(); MAX_SLOTS],
            sample_rate,
            ramp: FadeRamp::new(sample_rate),
            dc_blocking: true,
            out_left: [0.0; MAX_SLOTS],
            out_right: [0.0; MAX_SLOTS],
        }
    }

    /// Sample rate the board fades at.
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub(crate) fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.ramp = FadeRamp::new(sample_rate);
    }

    /// Bypass fade shape at the current sample rate.
    pub fn fade_ramp(&self) -> &FadeRamp {
        &self.ramp
    }

    /// Enables or disables inter-stage DC blocking.
    pub fn set_dc_blocking(&mut self, enabled: bool) {
        self.dc_blocking = enabled;
    }

    /// Whether inter-stage DC blocking is applied.
    pub fn dc_blocking(&self) -> bool {
        self.dc_blocking
    }

    /// Resets every slot to [`SlotRuntime::cleared`].
    pub(crate) fn clear(&mut self) {
        self.slots = [SlotRuntime::cleared(); MAX_SLOTS];
    }

    /// Slot `index`.
    pub fn slot(&self, index: usize) -> Option<&SlotRuntime> {
        self.slots.get(index)
    }

    /// All slots.
    pub fn slots(&self) -> &[SlotRuntime; MAX_SLOTS] {
        &self.slots
    }

    /// Outputs of the most recent frame, per slot.
    pub fn frame_outputs(&self) -> (&[f32; MAX_SLOTS], &[f32; MAX_SLOTS]) {
        (&self.out_left, &self.out_right)
    }

    #[inline]
    fn resolve(&self, tap: Tap, input: f32, right: bool) -> f32 {
        match tap {
            Tap::Input => input,
            Tap::Slot(k) => {
                let outs = if right { &self.out_right } else { &self.out_left };
                outs.get(usize::from(k)).copied().unwrap_or(0.0)
            }
        }
    }

    /// Evaluates one frame of already gain-staged input.
    ///
    /// Returns the output of the last slot, before output gain.
    pub fn process_frame(&mut self, pools: &mut EffectPools, in_left: f32, in_right: f32) -> (f32, f32) {
        self.out_left = [0.0; MAX_SLOTS];
        self.out_right = [0.0; MAX_SLOTS];

        let ramp = self.ramp;
        let mut cur = (in_left, in_right);

        for i in 0..MAX_SLOTS {
            let Some(handle) = self.slots[i].effect else {
                self.out_left[i] = cur.0;
                self.out_right[i] = cur.1;
                continue;
            };

            let slot = self.slots[i];
            let g = self.slots[i].fade.advance(slot.enabled, &ramp);

            let mut src_l = self.resolve(slot.input_left, in_left, false);
            let mut src_r = self.resolve(slot.input_right, in_right, true);
            if slot.sum_to_mono {
                let m = mono_average(src_l, src_r);
                src_l = m;
                src_r = m;
            }

            let (mut proc_l, mut proc_r) = (src_l, src_r);
            if g > 0.0 {
                if let Some(unit) = pools.get_mut(handle) {
                    unit.process_stereo(&mut proc_l, &mut proc_r);
                }
                if self.dc_blocking {
                    let state = &mut self.slots[i];
                    proc_l = state.dc_left.process(proc_l);
                    proc_r = state.dc_right.process(proc_r);
                }
                if slot.policy.collapses(slot.sum_to_mono) {
                    let m = mono_average(proc_l, proc_r);
                    proc_l = m;
                    proc_r = m;
                }
            }

            let wet_l = src_l * (1.0 - g) + proc_l * g;
            let wet_r = src_r * (1.0 - g) + proc_r * g;

            let (y_l, y_r) = if slot.dry > 0.0 {
                (src_l * slot.dry + wet_l * slot.wet, src_r * slot.dry + wet_r * slot.wet)
            } else {
                (
                    src_l * (1.0 - slot.wet) + wet_l * slot.wet,
                    src_r * (1.0 - slot.wet) + wet_r * slot.wet,
                )
            };

            self.out_left[i] = y_l;
            self.out_right[i] = y_r;
            cur = (y_l, y_r);
        }

        cur
    }
}
