//! Integration tests for multifx-config.
//!
//! These tests follow a patch from file or wire bytes into a running engine.

use multifx_config::sysex::{self, Message, sender};
use multifx_config::{
    PatchDump, PatchFile, SlotConfig, default_patch, factory_patch, factory_patches,
    validate_patch,
};
use multifx_core::{
    ButtonBinding, ButtonMode, ChannelPolicy, MAX_PARAMS, MAX_SLOTS, NoBuffers, ParamValue,
    PatchDescriptor, SlotDescriptor, Tap,
};
use multifx_effects::ids;
use multifx_engine::{Engine, EngineCommand, command_channel};
use proptest::prelude::*;
use tempfile::TempDir;

#[test]
fn saved_patch_drives_the_engine() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("nested/dir/crunch.toml");

    let file = PatchFile::new("Crunch")
        .with_description("Gate into drive")
        .with_slot(SlotConfig::new("gate").with_param("threshold", 10))
        .with_slot(SlotConfig::new("overdrive").with_param("drive", 100))
        .with_button(1, ButtonMode::ToggleBypass);
    file.save(&path).unwrap();

    let loaded = PatchFile::load(&path).unwrap();
    assert_eq!(loaded, file);

    let patch = loaded.to_descriptor().unwrap();
    validate_patch(&patch).unwrap();

    let mut engine = Engine::with_heap_buffers(48000.0);
    engine.apply_patch(&patch);
    assert!(engine.slot(0).unwrap().effect().is_some());
    assert!(engine.slot(1).unwrap().effect().is_some());

    let mut peak = 0.0f32;
    for n in 0..4800 {
        let x = (n as f32 * 0.05).sin() * 0.1;
        let (l, r) = engine.process_frame(x, x);
        assert!(l.is_finite() && r.is_finite());
        peak = peak.max(l.abs());
    }
    assert!(peak > 0.0);
}

#[test]
fn factory_patches_run_in_the_engine() {
    for file in factory_patches() {
        let patch = file.to_descriptor().unwrap();
        let mut engine = Engine::with_heap_buffers(48000.0);
        engine.apply_patch(&patch);
        for (i, slot) in patch.slots().iter().enumerate() {
            let bound = engine.slot(i).unwrap().effect().is_some();
            assert_eq!(bound, !slot.is_off(), "{} slot {i}", file.name);
        }
        for n in 0..1024 {
            let x = (n as f32 * 0.01).sin() * 0.05;
            let (l, r) = engine.process_frame(x, x);
            assert!(l.is_finite() && r.is_finite(), "{}", file.name);
        }
    }
}

#[test]
fn default_patch_over_the_wire() {
    let dump = PatchDump::new(default_patch());
    let bytes = sysex::encode_load_patch(sender::APP, &dump);

    let decoded = sysex::decode(&bytes).unwrap();
    assert_eq!(decoded.sender, sender::APP);
    let Message::LoadPatch(received) = decoded.message else {
        panic!("expected a patch load");
    };
    assert_eq!(received, dump);

    let mut engine = Engine::with_heap_buffers(48000.0);
    let (mut tx, mut rx) = command_channel(8);
    for command in received.commands() {
        tx.send(command).unwrap();
    }
    assert_eq!(engine.drain_commands(&mut rx), 3);
    assert_eq!(engine.current_patch(), &default_patch());
    assert!((engine.input_gain() - 7.943).abs() < 1e-2);
}

#[test]
fn wire_edits_reach_the_patch() {
    let mut engine = Engine::new(48000.0, &mut NoBuffers);
    let mut patch = PatchDescriptor::empty();
    patch.push(SlotDescriptor::chained(0, ids::OVERDRIVE)).unwrap();
    patch.push(SlotDescriptor::chained(1, ids::GRAPHIC_EQ)).unwrap();
    engine.apply_patch(&patch);

    let messages: [&[u8]; 4] = [
        &[0xF0, 0x7D, 0x03, 0x20, 0, 0, 99, 0xF7],
        &[0xF0, 0x7D, 0x03, 0x23, 1, 127, 127, 0xF7],
        &[0xF0, 0x7D, 0x25, 1, 64, 32, 0xF7],
        &[0xF0, 0x7D, 0x01, 0x26, 1, 2, 0xF7],
    ];
    for bytes in messages {
        let Message::Command(command) = sysex::decode(bytes).unwrap().message else {
            panic!("expected an engine command");
        };
        engine.apply_command(command);
    }

    let current = engine.current_patch();
    assert_eq!(current.slot(0).unwrap().param(0), Some(99));
    let eq = current.slot(1).unwrap();
    assert_eq!((eq.input_left, eq.input_right), (Tap::Input, Tap::Input));
    assert_eq!((eq.dry, eq.wet), (64, 32));
    assert_eq!(eq.channel_policy, ChannelPolicy::ForceStereo);
}

#[test]
fn dump_of_a_file_matches_the_file() {
    let file = factory_patch("dual_drive").unwrap();
    let patch = file.to_descriptor().unwrap();
    let bytes = sysex::encode_patch_dump(sender::FIRMWARE, &PatchDump::new(patch));
    let back = sysex::decode_patch(&bytes).unwrap().patch;
    assert_eq!(PatchFile::from_descriptor(&file.name, &back).to_descriptor().unwrap(), patch);
}

#[test]
fn every_engine_command_encodes_or_is_tempo() {
    let (mut tx, mut rx) = command_channel(16);
    let commands = [
        EngineCommand::SetParam { slot: 1, id: 2, value: 3 },
        EngineCommand::SetEnabled { slot: 4, enabled: true },
        EngineCommand::SetType { slot: 5, type_id: ids::REVERB },
        EngineCommand::SetRouting { slot: 6, left: Tap::Slot(2), right: Tap::Input },
        EngineCommand::SetSumToMono { slot: 7, enabled: true },
        EngineCommand::SetMix { slot: 8, dry: 10, wet: 20 },
        EngineCommand::SetChannelPolicy { slot: 9, policy: ChannelPolicy::ForceMono },
    ];
    for command in commands {
        let bytes = sysex::encode_command(sender::APP, &command).unwrap();
        let Message::Command(decoded) = sysex::decode(&bytes).unwrap().message else {
            panic!("expected an engine command");
        };
        assert_eq!(decoded, command);
        tx.send(decoded).unwrap();
    }
    assert_eq!(rx.pending(), commands.len());
}

fn slot_strategy() -> impl Strategy<Value = SlotDescriptor> {
    (
        prop::sample::select(ids::ALL.to_vec()),
        any::<bool>(),
        prop::option::of(0u8..12),
        prop::option::of(0u8..12),
        any::<bool>(),
        0u8..=127,
        0u8..=127,
        0u8..3,
        prop::collection::vec((0u8..=127, 0u8..=127), 0..=MAX_PARAMS),
    )
        .prop_map(|(type_id, enabled, left, right, sum, dry, wet, policy, params)| {
            let mut slot = SlotDescriptor::chained(0, type_id);
            slot.enabled = enabled;
            slot.input_left = left.map_or(Tap::Input, Tap::Slot);
            slot.input_right = right.map_or(Tap::Input, Tap::Slot);
            slot.sum_to_mono = sum;
            slot.dry = dry;
            slot.wet = wet;
            slot.channel_policy = ChannelPolicy::from_raw(policy);
            let params: Vec<ParamValue> =
                params.into_iter().map(|(id, v)| ParamValue::new(id, v)).collect();
            slot.replace_params(&params);
            slot
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Any patch whose fields fit in seven bits survives a dump unchanged.
    #[test]
    fn seven_bit_patches_survive_a_dump(
        slots in prop::collection::vec(slot_strategy(), 0..=MAX_SLOTS),
        button in (prop::option::of(0u8..12), 0u8..3),
        gains in (-24.0f32..24.0, -24.0f32..24.0),
    ) {
        let mut patch = PatchDescriptor::empty();
        for slot in slots {
            patch.push(slot).unwrap();
        }
        patch.buttons[0] = ButtonBinding { slot: button.0, mode: ButtonMode::from_raw(button.1) };

        let mut dump = PatchDump::new(patch);
        dump.input_gain_db = gains.0;
        dump.output_gain_db = gains.1;
        let back = sysex::decode_patch(&sysex::encode_patch_dump(sender::FIRMWARE, &dump)).unwrap();

        prop_assert_eq!(back.patch, patch);
        prop_assert!((back.input_gain_db - gains.0).abs() < 1e-4);
        prop_assert!((back.output_gain_db - gains.1).abs() < 1e-4);
    }

    /// Arbitrary bytes either decode or are rejected; they never panic.
    #[test]
    fn arbitrary_bytes_never_panic(bytes in prop::collection::vec(any::<u8>(), 0..400)) {
        let _ = sysex::decode(&bytes);
        let _ = sysex::decode_patch(&bytes);
    }

    /// Commands built from any slot below the board decode to a slot below the board.
    #[test]
    fn decoded_slots_stay_on_the_board(slot in any::<u8>(), value in any::<u8>()) {
        let bytes = [0xF0, 0x7D, 0x01, 0x20, slot, 0, value, 0xF7];
        match sysex::decode(&bytes) {
            Ok(decoded) => {
                let Message::Command(EngineCommand::SetParam { slot, value, .. }) = decoded.message else {
                    return Err(TestCaseError::fail("expected SetParam"));
                };
                prop_assert!((slot as usize) < MAX_SLOTS);
                prop_assert!(value <= 127);
            }
            Err(e) => prop_assert_eq!(e, multifx_config::SysexError::SlotOutOfRange(slot & 0x7F)),
        }
    }
}
