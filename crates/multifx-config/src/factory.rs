//! Factory patches bundled with the library.
//!
//! [`default_patch`] is the board a pedal boots into when nothing was saved.
//! The named patches are embedded as TOML at compile time and parse through
//! the same [`PatchFile`] path user files do.

use multifx_core::{ButtonBinding, ButtonMode, MAX_SLOTS, PatchDescriptor, SlotDescriptor};

use crate::PatchFile;

/// Factory patch names, in listing order.
pub static FACTORY_PATCH_NAMES: &[&str] = &["default", "passthrough", "dual_drive", "ambient"];

/// TOML for the embedded factory patches ("default" is built in code).
static FACTORY_PATCHES_TOML: &[(&str, &str)] = &[
    ("passthrough", PASSTHROUGH_PATCH),
    ("dual_drive", DUAL_DRIVE_PATCH),
    ("ambient", AMBIENT_PATCH),
];

/// No slots: the board only applies its gains.
const PASSTHROUGH_PATCH: &str = r#"
name = "Passthrough"
description = "Empty board, input straight to output"
"#;

/// Two overdrives with their own delays, merged by a mixer.
const DUAL_DRIVE_PATCH: &str = r#"
name = "Dual Drive"
description = "Two drive and delay paths in parallel, merged in stereo"

[[slot]]
effect = "off"
input_left = "input"
input_right = "input"
sum_to_mono = true
dry = 127
wet = 0
channel_policy = "force_mono"

[[slot]]
effect = "overdrive"
input_left = 0
input_right = 0
sum_to_mono = true
channel_policy = "force_mono"
[slot.params]
drive = 90
tone = 64

[[slot]]
effect = "delay"
input_left = 1
input_right = 1
channel_policy = "force_stereo"

[[slot]]
effect = "overdrive"
input_left = 0
input_right = 0
[slot.params]
drive = 70
tone = 90

[[slot]]
effect = "delay"
input_left = 3
input_right = 3

[[slot]]
effect = "mixer"
input_left = 2
input_right = 4
channel_policy = "force_stereo"
[slot.params]
mix_a = 64
mix_b = 64
cross = 10

[[button]]
slot = 1
mode = "toggle_bypass"

[[button]]
slot = 2
mode = "tap_tempo"
"#;

/// Compressed, chorused and washed in reverb.
const AMBIENT_PATCH: &str = r#"
name = "Ambient"
description = "Soft compression into chorus, long delay and a big room"

[[slot]]
effect = "compressor"
sum_to_mono = true
[slot.params]
threshold = 70
ratio = 20
makeup = 30

[[slot]]
effect = "chorus"
[slot.params]
rate = 20
depth = 70
mix = 60

[[slot]]
effect = "delay"
dry = 127
wet = 80
[slot.params]
division = 90
synced = 127
feedback = 70
mix = 127

[[slot]]
effect = "reverb"
[slot.params]
mix = 70
decay = 110
damping = 40
pre_delay = 20
size = 120

[[button]]
slot = 2
mode = "toggle_bypass"

[[button]]
slot = 2
mode = "tap_tempo"
"#;

/// The boot patch: Gate, Compressor, Overdrive, Graphic EQ, Chorus, Reverb.
///
/// All twelve slots are described; slots 6 to 11 are empty and bypassed.
/// Slot 0 sums the input to mono and every slot reads the one before it,
/// fully wet. Footswitch 0 bypasses slot 0, footswitch 1 taps tempo.
pub fn default_patch() -> PatchDescriptor {
    let chain: [(u8, &[u8]); 6] = [
        (17, &[64, 20, 50, 40, 0]),
        (15, &[80, 16, 40, 50, 20]),
        (10, &[40, 70]),
        (18, &[64; 7]),
        (16, &[30, 50, 20, 40, 50]),
        (14, &[40, 50, 60, 25, 50]),
    ];

    let mut patch = PatchDescriptor::empty();
    for index in 0..MAX_SLOTS {
        let mut slot = match chain.get(index) {
            Some(&(type_id, params)) => {
                let mut slot = SlotDescriptor::chained(index, type_id);
                for (id, &value) in params.iter().enumerate() {
                    slot.set_param(id as u8, value);
                }
                slot
            }
            None => {
                let mut slot = SlotDescriptor::off(index);
                slot.enabled = false;
                slot
            }
        };
        slot.sum_to_mono = index == 0;
        if patch.push(slot).is_err() {
            break;
        }
    }

    patch.buttons = [
        ButtonBinding::new(0, ButtonMode::ToggleBypass),
        ButtonBinding::new(0, ButtonMode::TapTempo),
    ];
    patch
}

/// [`default_patch`] as a file.
pub fn default_patch_file() -> PatchFile {
    PatchFile::from_descriptor("Default", &default_patch())
        .with_description("Gate, compressor, overdrive, EQ, chorus and reverb")
}

/// All factory patches, in listing order.
pub fn factory_patches() -> Vec<PatchFile> {
    FACTORY_PATCH_NAMES
        .iter()
        .filter_map(|name| factory_patch(name))
        .collect()
}

/// Get a factory patch by key or display name (case-insensitive).
pub fn factory_patch(name: &str) -> Option<PatchFile> {
    if name.eq_ignore_ascii_case("default") {
        return Some(default_patch_file());
    }

    for (key, toml) in FACTORY_PATCHES_TOML {
        if key.eq_ignore_ascii_case(name) {
            return PatchFile::from_toml(toml).ok();
        }
    }

    FACTORY_PATCHES_TOML
        .iter()
        .filter_map(|(_, toml)| PatchFile::from_toml(toml).ok())
        .find(|patch| patch.name.eq_ignore_ascii_case(name))
}

/// Whether `name` is a factory patch key.
pub fn is_factory_patch(name: &str) -> bool {
    FACTORY_PATCH_NAMES
        .iter()
        .any(|n| n.eq_ignore_ascii_case(name))
}
