//! End-to-end engine scenarios.

use multifx_core::{
    BufferSource, ChannelPolicy, NoBuffers, PatchDescriptor, SampleBuffer, SlotDescriptor, Tap,
};
use multifx_effects::ids;
use multifx_engine::{Engine, EngineCommand, Footswitches, command_channel};

fn two_slot_identity_patch() -> PatchDescriptor {
    let mut patch = PatchDescriptor::empty();
    // flat graphic EQs process as the identity
    patch.push(SlotDescriptor::chained(0, ids::GRAPHIC_EQ)).unwrap();
    patch.push(SlotDescriptor::chained(1, ids::GRAPHIC_EQ)).unwrap();
    patch
}

#[test]
fn gain_staged_identity_chain() {
    let mut engine = Engine::new(48000.0, &mut NoBuffers);
    engine.apply_patch(&two_slot_identity_patch());

    let out = engine.process_frame(0.2, 0.2);
    assert_eq!(out, (1.6, 1.6));
    assert_eq!(engine.output_gain(), 1.0);
    assert_eq!(engine.take_peaks(), (1.6, 1.6));

    let (l, r) = engine.board().frame_outputs();
    assert_eq!((l[0], r[0]), (1.6, 1.6));
    assert_eq!((l[1], r[1]), (1.6, 1.6));
}

#[test]
fn exhausted_pool_slot_passes_input_through() {
    let mut engine = Engine::with_heap_buffers(48000.0);
    engine.set_input_gain(1.0);
    let mut patch = PatchDescriptor::empty();
    for i in 0..3 {
        patch.push(SlotDescriptor::chained(i, ids::DELAY)).unwrap();
    }
    engine.apply_patch(&patch);
    assert!(engine.slot(2).unwrap().effect().is_none());

    for n in 0..2048 {
        let x = (n as f32 * 0.01).sin() * 0.5;
        let out = engine.process_frame(x, -x);
        let (l, r) = engine.board().frame_outputs();
        assert_eq!((l[2].to_bits(), r[2].to_bits()), (l[1].to_bits(), r[1].to_bits()));
        assert_eq!(out, (l[11], r[11]));
    }
}

/// Platform memory that only ever has 16-sample blocks to give.
struct ShortBuffers;

impl BufferSource for ShortBuffers {
    fn acquire(&mut self, _len: usize) -> Option<SampleBuffer> {
        Some(vec![0.0; 16].into_boxed_slice())
    }
}

#[test]
fn undersized_platform_buffers_leave_effects_passing_through() {
    let mut engine = Engine::new(48000.0, &mut ShortBuffers);
    engine.set_input_gain(1.0);
    engine.set_dc_blocking(false);
    let mut patch = PatchDescriptor::empty();
    patch.push(SlotDescriptor::chained(0, ids::DELAY)).unwrap();
    patch.push(SlotDescriptor::chained(1, ids::REVERB)).unwrap();
    engine.apply_patch(&patch);

    let mut reference = Engine::new(48000.0, &mut NoBuffers);
    reference.set_input_gain(1.0);
    reference.set_dc_blocking(false);
    reference.apply_patch(&patch);

    for n in 0..4096 {
        let x = (n as f32 * 0.02).sin() * 0.5;
        let out = engine.process_frame(x, -x);
        assert!(out.0.is_finite() && out.1.is_finite());
        assert_eq!(out, reference.process_frame(x, -x));
    }
}

#[test]
fn forward_tap_reads_zero() {
    let mut engine = Engine::new(48000.0, &mut NoBuffers);
    let mut patch = two_slot_identity_patch();
    let slot = patch.slot_mut(0).unwrap();
    slot.input_left = Tap::Slot(1);
    slot.input_right = Tap::Slot(5);
    engine.apply_patch(&patch);

    assert_eq!(engine.process_frame(0.5, 0.5), (0.0, 0.0));
    assert_eq!(engine.process_frame(0.5, 0.5), (0.0, 0.0));
}

#[test]
fn parallel_branches_merge_through_mixer() {
    let mut engine = Engine::new(48000.0, &mut NoBuffers);
    engine.set_input_gain(1.0);
    engine.set_dc_blocking(false);

    let mut patch = PatchDescriptor::empty();
    // branch A: EQ fed by the input
    patch.push(SlotDescriptor::chained(0, ids::GRAPHIC_EQ)).unwrap();
    // branch B: second EQ, also fed by the input, fully dry
    let mut b = SlotDescriptor::chained(1, ids::GRAPHIC_EQ);
    b.input_left = Tap::Input;
    b.input_right = Tap::Input;
    b.wet = 0;
    b.dry = 0;
    patch.push(b).unwrap();
    // merge: A on the left input, B on the right
    let mut mix = SlotDescriptor::chained(2, ids::MIXER);
    mix.input_left = Tap::Slot(0);
    mix.input_right = Tap::Slot(1);
    mix.set_param(0, 127);
    mix.set_param(1, 127);
    patch.push(mix).unwrap();
    engine.apply_patch(&patch);

    assert_eq!(engine.process_frame(0.25, 0.75), (0.25, 0.75));
}

#[test]
fn footswitch_bypass_round_trip_through_queue() {
    let mut patch = PatchDescriptor::empty();
    let mut od = SlotDescriptor::chained(0, ids::OVERDRIVE);
    od.set_param(0, 120);
    patch.push(od).unwrap();
    patch.buttons[0] = multifx_core::ButtonBinding::new(0, multifx_core::ButtonMode::ToggleBypass);

    let mut engine = Engine::new(48000.0, &mut NoBuffers);
    engine.set_input_gain(1.0);
    let (mut tx, mut rx) = command_channel(8);
    let mut switches = Footswitches::new(&patch);
    tx.send(EngineCommand::ApplyPatch(patch)).unwrap();
    engine.drain_commands(&mut rx);

    let command = switches.press(0, 0).unwrap();
    tx.send(command).unwrap();
    engine.drain_commands(&mut rx);
    assert!(!engine.slot(0).unwrap().is_enabled());
    assert!(!engine.current_patch().slot(0).unwrap().enabled);

    // once faded out, the slot forwards its input
    for _ in 0..480 {
        engine.process_frame(0.3, 0.3);
    }
    assert_eq!(engine.process_frame(0.3, -0.3), (0.3, -0.3));
}

#[test]
fn commands_from_another_thread() {
    let mut engine = Engine::with_heap_buffers(48000.0);
    let (mut tx, mut rx) = command_channel(32);

    let control = std::thread::spawn(move || {
        let mut patch = PatchDescriptor::empty();
        patch.push(SlotDescriptor::chained(0, ids::COMPRESSOR)).unwrap();
        patch.push(SlotDescriptor::chained(1, ids::DELAY)).unwrap();
        tx.send(EngineCommand::ApplyPatch(patch)).unwrap();
        tx.send(EngineCommand::SetTempo(140.0)).unwrap();
        tx.send(EngineCommand::SetChannelPolicy {
            slot: 1,
            policy: ChannelPolicy::ForceMono,
        })
        .unwrap();
        tx.send(EngineCommand::SetParam { slot: 1, id: 3, value: 64 }).unwrap();
    });
    control.join().unwrap();

    let input = vec![0.01f32; 128];
    let mut out_l = vec![0.0f32; 128];
    let mut out_r = vec![0.0f32; 128];
    engine.process_block_with_commands(&mut rx, &input, &input, &mut out_l, &mut out_r);

    assert_eq!(engine.tempo(), Some(140.0));
    let patch = engine.current_patch();
    assert_eq!(patch.slot_count(), 2);
    assert_eq!(patch.slot(1).unwrap().channel_policy, ChannelPolicy::ForceMono);
    assert_eq!(patch.slot(1).unwrap().param(3), Some(64));
    assert!(out_l.iter().zip(&out_r).all(|(l, r)| l == r));
}
