//! Property-based tests for the frame loop.

use multifx_core::{
    ChannelPolicy, MAX_SLOTS, NoBuffers, PatchDescriptor, SlotDescriptor, Tap, frames_to_settle,
};
use multifx_effects::ids;
use multifx_engine::Engine;
use proptest::prelude::*;

/// (type, enabled, left tap, right tap, sum, dry, wet, policy, param)
type SlotSeed = (usize, bool, u8, u8, bool, u8, u8, u8, u8);

fn tap_for(raw: u8, index: usize) -> Tap {
    if index == 0 || raw as usize % (index + 1) == index {
        Tap::Input
    } else {
        Tap::Slot((raw as usize % index) as u8)
    }
}

/// Builds a patch whose taps only reference earlier slots.
fn acyclic_patch(seeds: &[SlotSeed], types: &[u8], with_params: bool) -> PatchDescriptor {
    let mut patch = PatchDescriptor::empty();
    for (i, &(t, enabled, tl, tr, sum, dry, wet, policy, param)) in seeds.iter().enumerate() {
        let mut slot = SlotDescriptor::chained(i, types[t % types.len()]);
        slot.enabled = enabled;
        slot.input_left = tap_for(tl, i);
        slot.input_right = tap_for(tr, i);
        slot.sum_to_mono = sum;
        slot.dry = dry;
        slot.wet = wet;
        slot.channel_policy = ChannelPolicy::from_raw(policy);
        if with_params {
            slot.set_param(0, param);
            slot.set_param(1, 127 - param);
        }
        if patch.push(slot).is_err() {
            break;
        }
    }
    patch
}

fn seeds() -> impl Strategy<Value = Vec<SlotSeed>> {
    prop::collection::vec(
        (
            0usize..16,
            any::<bool>(),
            any::<u8>(),
            any::<u8>(),
            any::<bool>(),
            0u8..=127,
            0u8..=127,
            0u8..3,
            0u8..=127,
        ),
        1..=MAX_SLOTS,
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// With stateless units, a frame never depends on what an earlier frame
    /// left in the scratch outputs.
    #[test]
    fn frames_never_read_stale_outputs(
        seeds in seeds(),
        first in (-1.0f32..=1.0, -1.0f32..=1.0),
        second in (-1.0f32..=1.0, -1.0f32..=1.0),
    ) {
        // flat EQs and default mixers hold no state between frames
        let patch = acyclic_patch(&seeds, &[ids::OFF, ids::MIXER, ids::GRAPHIC_EQ], false);

        let mut warmed = Engine::new(48000.0, &mut NoBuffers);
        let mut fresh = Engine::new(48000.0, &mut NoBuffers);
        for engine in [&mut warmed, &mut fresh] {
            engine.set_dc_blocking(false);
            engine.apply_patch(&patch);
        }
        // disabled slots start settled, so fades are already constant
        warmed.process_frame(first.0, first.1);

        let a = warmed.process_frame(second.0, second.1);
        let b = fresh.process_frame(second.0, second.1);
        prop_assert_eq!(a.0.to_bits(), b.0.to_bits());
        prop_assert_eq!(a.1.to_bits(), b.1.to_bits());
        prop_assert_eq!(warmed.board().frame_outputs(), fresh.board().frame_outputs());
    }

    /// Any acyclic patch of any units produces finite output.
    #[test]
    fn random_patches_stay_finite(
        seeds in seeds(),
        input in prop::collection::vec(-1.0f32..=1.0, 64),
    ) {
        let patch = acyclic_patch(&seeds, &ids::ALL, true);
        let mut engine = Engine::with_heap_buffers(48000.0);
        engine.set_input_gain(1.0);
        engine.apply_patch(&patch);
        for &x in &input {
            let (l, r) = engine.process_frame(x, -x);
            prop_assert!(l.is_finite() && r.is_finite());
        }
    }

    /// Full bypass mix returns the resolved tap exactly, whatever the unit does.
    #[test]
    fn full_bypass_mix_returns_tap(
        which in 0usize..ids::ALL.len(),
        input in prop::collection::vec((-1.0f32..=1.0, -1.0f32..=1.0), 32),
    ) {
        let mut slot = SlotDescriptor::chained(0, ids::ALL[which]);
        slot.dry = 127;
        slot.wet = 0;
        let mut patch = PatchDescriptor::empty();
        patch.push(slot).unwrap();

        let mut engine = Engine::with_heap_buffers(48000.0);
        engine.set_input_gain(1.0);
        engine.apply_patch(&patch);
        for &(l, r) in &input {
            prop_assert_eq!(engine.process_frame(l, r), (l, r));
        }
    }

    /// Single-knob full wet returns exactly what the unit produced.
    #[test]
    fn full_wet_returns_processed(
        levels in (0u8..=127, 0u8..=127, 0u8..=127),
        input in prop::collection::vec((-1.0f32..=1.0, -1.0f32..=1.0), 32),
    ) {
        use multifx_core::EffectUnit;

        let mut slot = SlotDescriptor::chained(0, ids::MIXER);
        slot.set_param(0, levels.0);
        slot.set_param(1, levels.1);
        slot.set_param(2, levels.2);
        let mut patch = PatchDescriptor::empty();
        patch.push(slot).unwrap();

        let mut engine = Engine::new(48000.0, &mut NoBuffers);
        engine.set_dc_blocking(false);
        engine.set_input_gain(1.0);
        engine.apply_patch(&patch);

        let mut reference = multifx_effects::Mixer::new();
        for p in slot.params() {
            reference.set_param(p.id, p.normalized());
        }

        for &(l, r) in &input {
            let (mut el, mut er) = (l, r);
            reference.process_stereo(&mut el, &mut er);
            prop_assert_eq!(engine.process_frame(l, r), (el, er));
        }
    }

    /// Mono-summed input with a forced-mono policy leaves both channels equal.
    #[test]
    fn mono_sum_force_mono_is_mono(which in 0usize..ids::ALL.len(), frames in 1usize..256) {
        let mut slot = SlotDescriptor::chained(0, ids::ALL[which]);
        slot.sum_to_mono = true;
        slot.channel_policy = ChannelPolicy::ForceMono;
        let mut patch = PatchDescriptor::empty();
        patch.push(slot).unwrap();

        let mut engine = Engine::with_heap_buffers(48000.0);
        engine.set_input_gain(1.0);
        engine.apply_patch(&patch);
        for _ in 0..frames {
            let (l, r) = engine.process_frame(1.0, -1.0);
            prop_assert_eq!(l.to_bits(), r.to_bits());
        }
    }

    /// Enabling a slot ramps its fade monotonically to 1 in exactly the
    /// settle time.
    #[test]
    fn bypass_fade_is_monotonic(
        sample_rate in prop::sample::select(vec![
            8000.0f32, 20010.0, 22050.0, 32000.0, 44010.0, 44100.0, 48000.0, 88200.0,
            96000.0, 192000.0,
        ]),
    ) {
        let mut slot = SlotDescriptor::chained(0, ids::OVERDRIVE);
        slot.enabled = false;
        let mut patch = PatchDescriptor::empty();
        patch.push(slot).unwrap();

        let mut engine = Engine::new(sample_rate, &mut NoBuffers);
        engine.apply_patch(&patch);
        engine.set_enabled(0, true);

        let frames = frames_to_settle(sample_rate);
        let mut previous = 0.0f32;
        for n in 1..=frames {
            engine.process_frame(0.0, 0.0);
            let fade = engine.slot(0).unwrap().fade();
            prop_assert!(fade > previous);
            prop_assert!(fade <= 1.0);
            if n < frames {
                prop_assert!(fade < 1.0);
            }
            previous = fade;
        }
        prop_assert_eq!(previous, 1.0);
    }
}
