//! The engine: patch application, frame evaluation and gain staging.
//!
//! [`Engine`] owns the effect pools, the board and the current patch. It is
//! driven from a single thread, normally the audio callback; the control
//! plane talks to it through a [`CommandReceiver`] drained at block
//! boundaries (see [`crate::command`]).
//!
//! # Example
//!
//! ```rust
//! use multifx_core::{NoBuffers, PatchDescriptor, SlotDescriptor};
//! use multifx_engine::Engine;
//!
//! let mut engine = Engine::new(48000.0, &mut NoBuffers);
//! let mut patch = PatchDescriptor::empty();
//! patch.push(SlotDescriptor::chained(0, 13)).unwrap(); // mixer
//! engine.apply_patch(&patch);
//!
//! let (l, r) = engine.process_frame(0.01, 0.01);
//! assert!(l.is_finite() && r.is_finite());
//! ```

use multifx_core::{BufferSource, MAX_PARAMS, MAX_SLOTS, ParamValue, PatchDescriptor, VALUE_MAX};

#[cfg(feature = "std")]
use multifx_core::HeapBuffers;

use crate::board::{BoardRuntime, SlotRuntime};
use crate::command::{CommandReceiver, EngineCommand};
use crate::pool::EffectPools;

/// Default input boost, compensating instrument-level input.
pub const DEFAULT_INPUT_GAIN: f32 = 8.0;

/// Default output gain.
pub const DEFAULT_OUTPUT_GAIN: f32 = 1.0;

/// Multi-effect engine for one board.
pub struct Engine {
    board: BoardRuntime,
    pools: EffectPools,
    patch: PatchDescriptor,
    input_gain: f32,
    output_gain: f32,
    input_peak: f32,
    output_peak: f32,
    tempo: Option<f32>,
}

impl Engine {
    /// Creates an engine with an empty patch.
    ///
    /// Delay and reverb memory is taken from `buffers` once, here.
    pub fn new(sample_rate: f32, buffers: &mut dyn BufferSource) -> Self {
        Self {
            board: BoardRuntime::new(sample_rate),
            pools: EffectPools::new(buffers),
            patch: PatchDescriptor::empty(),
            input_gain: DEFAULT_INPUT_GAIN,
            output_gain: DEFAULT_OUTPUT_GAIN,
            input_peak: 0.0,
            output_peak: 0.0,
            tempo: None,
        }
    }

    /// Creates an engine whose buffered effects draw memory from the heap.
    #[cfg(feature = "std")]
    pub fn with_heap_buffers(sample_rate: f32) -> Self {
        Self::new(sample_rate, &mut HeapBuffers::new())
    }

    /// Sample rate.
    pub fn sample_rate(&self) -> f32 {
        self.board.sample_rate()
    }

    /// Changes the sample rate and re-applies the current patch.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.board.set_sample_rate(sample_rate);
        let patch = self.patch;
        self.apply_patch(&patch);
    }

    /// Replaces the board configuration.
    ///
    /// Pool cursors are rewound, every slot is cleared, and each described
    /// slot takes the next free instance of its type. A slot whose type is
    /// unknown or whose pool is exhausted is left empty and passes audio
    /// through. Taps are not checked; a tap at or after its own slot reads
    /// silence.
    pub fn apply_patch(&mut self, patch: &PatchDescriptor) {
        self.pools.reset();
        self.board.clear();
        let sample_rate = self.board.sample_rate();

        for (i, desc) in patch.slots().iter().enumerate() {
            let slot = &mut self.board.slots[i];
            slot.configure(desc);
            slot.effect = self.pools.instantiate(desc.type_id);

            match slot.effect.and_then(|h| self.pools.get_mut(h)) {
                Some(unit) => {
                    unit.init(sample_rate);
                    for p in desc.params() {
                        unit.set_param(p.id, p.normalized());
                    }
                }
                None if !desc.is_off() => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(slot = i, type_id = desc.type_id, "no instance available, slot passes through");
                }
                None => {}
            }
        }

        if let Some(bpm) = self.tempo {
            self.broadcast_tempo(bpm);
        }
        self.patch = *patch;

        #[cfg(feature = "tracing")]
        tracing::debug!(slots = patch.slot_count(), "patch applied");
    }

    /// The most recently applied patch, including edits made through commands.
    pub fn current_patch(&self) -> &PatchDescriptor {
        &self.patch
    }

    /// Processes one stereo frame.
    pub fn process_frame(&mut self, in_left: f32, in_right: f32) -> (f32, f32) {
        let in_left = in_left * self.input_gain;
        let in_right = in_right * self.input_gain;
        self.input_peak = self.input_peak.max(in_left.abs()).max(in_right.abs());

        let (l, r) = self.board.process_frame(&mut self.pools, in_left, in_right);

        let out = (l * self.output_gain, r * self.output_gain);
        self.output_peak = self.output_peak.max(out.0.abs()).max(out.1.abs());
        out
    }

    /// Processes planar stereo blocks, frame by frame.
    ///
    /// Only the common length of all four slices is processed.
    pub fn process_block(
        &mut self,
        in_left: &[f32],
        in_right: &[f32],
        out_left: &mut [f32],
        out_right: &mut [f32],
    ) {
        let frames = in_left
            .len()
            .min(in_right.len())
            .min(out_left.len())
            .min(out_right.len());
        for n in 0..frames {
            let (l, r) = self.process_frame(in_left[n], in_right[n]);
            out_left[n] = l;
            out_right[n] = r;
        }
    }

    /// Processes interleaved stereo (`L R L R ...`).
    pub fn process_block_interleaved(&mut self, input: &[f32], output: &mut [f32]) {
        for (frame_in, frame_out) in input.chunks_exact(2).zip(output.chunks_exact_mut(2)) {
            let (l, r) = self.process_frame(frame_in[0], frame_in[1]);
            frame_out[0] = l;
            frame_out[1] = r;
        }
    }

    /// Drains pending commands, then processes a planar block.
    pub fn process_block_with_commands(
        &mut self,
        commands: &mut CommandReceiver,
        in_left: &[f32],
        in_right: &[f32],
        out_left: &mut [f32],
        out_right: &mut [f32],
    ) {
        self.drain_commands(commands);
        self.process_block(in_left, in_right, out_left, out_right);
    }

    /// Applies every queued command. Returns how many were applied.
    pub fn drain_commands(&mut self, commands: &mut CommandReceiver) -> usize {
        let mut applied = 0;
        while let Some(command) = commands.pop() {
            self.apply_command(command);
            applied += 1;
        }
        applied
    }

    /// Applies one command immediately.
    pub fn apply_command(&mut self, command: EngineCommand) {
        match command {
            EngineCommand::ApplyPatch(patch) => self.apply_patch(&patch),
            EngineCommand::SetTempo(bpm) => self.set_tempo(bpm),
            EngineCommand::SetInputGain(gain) => self.set_input_gain(gain),
            EngineCommand::SetOutputGain(gain) => self.set_output_gain(gain),
            EngineCommand::SetParam { slot, id, value } => self.set_param(slot, id, value),
            EngineCommand::SetEnabled { slot, enabled } => self.set_enabled(slot, enabled),
            EngineCommand::SetType { slot, type_id } => self.set_type(slot, type_id),
            other => self.edit_structure(other),
        }
    }

    /// Updates one parameter of a slot's unit and of the current patch.
    pub fn set_param(&mut self, slot: u8, id: u8, value: u8) {
        let index = usize::from(slot);
        if index >= MAX_SLOTS {
            return;
        }
        let value = value.min(VALUE_MAX);
        self.patch.set_param(index, id, value);
        if let Some(unit) = self.board.slots[index].effect.and_then(|h| self.pools.get_mut(h)) {
            unit.set_param(id, ParamValue::new(id, value).normalized());
        }
    }

    /// Enables or bypasses a slot; the bypass fade smooths the transition.
    pub fn set_enabled(&mut self, slot: u8, enabled: bool) {
        let index = usize::from(slot);
        if index >= MAX_SLOTS {
            return;
        }
        self.board.slots[index].enabled = enabled;
        if index < self.patch.slot_count() {
            if let Some(desc) = self.patch.slot_mut(index) {
                desc.enabled = enabled;
            }
        }
    }

    /// Changes a slot's effect type, re-applying the patch.
    ///
    /// The slot's stored params are replaced by the new unit's defaults.
    pub fn set_type(&mut self, slot: u8, type_id: u8) {
        let index = usize::from(slot);
        let Some(desc) = self.patch.slot_mut(index) else {
            return;
        };
        desc.type_id = type_id;
        desc.replace_params(&[]);
        self.reapply();

        let mut snapshot = [ParamValue::default(); MAX_PARAMS];
        let count = self.params_snapshot(index, &mut snapshot);
        if let Some(desc) = self.patch.slot_mut(index) {
            desc.replace_params(&snapshot[..count]);
        }
    }

    fn edit_structure(&mut self, command: EngineCommand) {
        let index = match command {
            EngineCommand::SetRouting { slot, .. }
            | EngineCommand::SetSumToMono { slot, .. }
            | EngineCommand::SetMix { slot, .. }
            | EngineCommand::SetChannelPolicy { slot, .. } => usize::from(slot),
            _ => return,
        };
        let Some(desc) = self.patch.slot_mut(index) else {
            #[cfg(feature = "tracing")]
            tracing::debug!(slot = index, "ignoring command for slot out of range");
            return;
        };
        match command {
            EngineCommand::SetRouting { left, right, .. } => {
                desc.input_left = left;
                desc.input_right = right;
            }
            EngineCommand::SetSumToMono { enabled, .. } => desc.sum_to_mono = enabled,
            EngineCommand::SetMix { dry, wet, .. } => {
                desc.dry = dry.min(VALUE_MAX);
                desc.wet = wet.min(VALUE_MAX);
            }
            EngineCommand::SetChannelPolicy { policy, .. } => desc.channel_policy = policy,
            _ => {}
        }
        self.reapply();
    }

    fn reapply(&mut self) {
        let patch = self.patch;
        self.apply_patch(&patch);
    }

    /// Sets the tempo and forwards it to every bound unit.
    pub fn set_tempo(&mut self, bpm: f32) {
        if !(bpm.is_finite() && bpm > 0.0) {
            return;
        }
        self.tempo = Some(bpm);
        self.broadcast_tempo(bpm);
    }

    /// Last tempo set, if any.
    pub fn tempo(&self) -> Option<f32> {
        self.tempo
    }

    fn broadcast_tempo(&mut self, bpm: f32) {
        for slot in &self.board.slots {
            if let Some(unit) = slot.effect.and_then(|h| self.pools.get_mut(h)) {
                unit.set_tempo(bpm);
            }
        }
    }

    /// Input gain applied before the first slot.
    pub fn input_gain(&self) -> f32 {
        self.input_gain
    }

    /// Sets the input gain.
    pub fn set_input_gain(&mut self, gain: f32) {
        if gain.is_finite() {
            self.input_gain = gain;
        }
    }

    /// Output gain applied after the last slot.
    pub fn output_gain(&self) -> f32 {
        self.output_gain
    }

    /// Sets the output gain.
    pub fn set_output_gain(&mut self, gain: f32) {
        if gain.is_finite() {
            self.output_gain = gain;
        }
    }

    /// Largest post-gain input magnitude since the last [`take_peaks`](Self::take_peaks).
    pub fn input_peak(&self) -> f32 {
        self.input_peak
    }

    /// Largest output magnitude since the last [`take_peaks`](Self::take_peaks).
    pub fn output_peak(&self) -> f32 {
        self.output_peak
    }

    /// Returns `(input_peak, output_peak)` and resets both.
    pub fn take_peaks(&mut self) -> (f32, f32) {
        let peaks = (self.input_peak, self.output_peak);
        self.input_peak = 0.0;
        self.output_peak = 0.0;
        peaks
    }

    /// Enables or disables inter-stage DC blocking (on by default).
    ///
    /// While on, a fully wet slot outputs its effect's output after the DC
    /// blocker, so a transparent effect still loses any constant offset.
    /// Turn it off when the slot output must equal the effect output exactly.
    pub fn set_dc_blocking(&mut self, enabled: bool) {
        self.board.set_dc_blocking(enabled);
    }

    /// Whether inter-stage DC blocking is on.
    pub fn dc_blocking(&self) -> bool {
        self.board.dc_blocking()
    }

    /// Runtime state of slot `index`.
    pub fn slot(&self, index: usize) -> Option<&SlotRuntime> {
        self.board.slot(index)
    }

    /// The board.
    pub fn board(&self) -> &BoardRuntime {
        &self.board
    }

    /// Current parameters of the unit in slot `index`; 0 when the slot is empty.
    pub fn params_snapshot(&self, index: usize, out: &mut [ParamValue]) -> usize {
        self.board
            .slot(index)
            .and_then(SlotRuntime::effect)
            .and_then(|h| self.pools.get(h))
            .map_or(0, |unit| unit.params_snapshot(out))
    }

    /// Effect pools, for capacity queries.
    pub fn pools(&self) -> &EffectPools {
        &self.pools
    }
}
