//! Patch file format and operations.

use multifx_core::{
    ButtonBinding, ButtonMode, ChannelPolicy, MAX_SLOTS, NUM_BUTTONS, PatchDescriptor,
    SlotDescriptor, TYPE_OFF, Tap, VALUE_MAX,
};
use multifx_engine::EffectRegistry;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::ConfigError;

/// Effect names that mean an empty slot.
const OFF_NAMES: [&str; 3] = ["off", "none", "empty"];

/// A board patch as stored on disk.
///
/// Slots are listed in evaluation order; the first `[[slot]]` table is slot
/// 0. Fields left out take the values a freshly chained slot has: enabled,
/// reading the previous slot (the input for slot 0), fully wet, `auto`
/// channel policy.
///
/// # TOML Format
///
/// ```toml
/// name = "Crunch"
/// description = "Gate into a pushed overdrive"
/// input_gain_db = 18.0
///
/// [[slot]]
/// effect = "gate"
/// sum_to_mono = true
/// [slot.params]
/// threshold = 64
///
/// [[slot]]
/// effect = "overdrive"
/// input_left = 0
/// input_right = "input"
/// dry = 20
/// wet = 110
/// channel_policy = "force_mono"
/// [slot.params]
/// drive = 100
/// 1 = 70
///
/// [[button]]
/// slot = 1
/// mode = "toggle_bypass"
/// ```
///
/// Parameters are keyed by id or by lowercase name (`"pre_delay"` for
/// "Pre-Delay"); values are 7-bit, `0..=127`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatchFile {
    /// Name of the patch.
    pub name: String,

    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Input gain in dB, when the patch sets one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_gain_db: Option<f32>,

    /// Output gain in dB, when the patch sets one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_gain_db: Option<f32>,

    /// Slots in evaluation order.
    #[serde(default, rename = "slot")]
    pub slots: Vec<SlotConfig>,

    /// Footswitch assignments.
    #[serde(default, rename = "button", skip_serializing_if = "Vec::is_empty")]
    pub buttons: Vec<ButtonConfig>,
}

/// Effect of a slot: a catalogue key or a raw type id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum EffectRef {
    /// Raw type id.
    Id(u8),
    /// Catalogue key, display name or short name; `"off"` for an empty slot.
    Name(String),
}

impl Default for EffectRef {
    fn default() -> Self {
        EffectRef::Name("off".to_string())
    }
}

/// Input of a slot: `"input"` or a slot index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum TapRef {
    /// Output of an earlier slot.
    Slot(u8),
    /// Only `"input"` is meaningful.
    Named(String),
}

impl From<Tap> for TapRef {
    fn from(tap: Tap) -> Self {
        match tap {
            Tap::Input => TapRef::Named("input".to_string()),
            Tap::Slot(k) => TapRef::Slot(k),
        }
    }
}

/// Channel policy as written in files.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PolicyConfig {
    /// Collapse when summing to mono.
    #[default]
    Auto,
    /// Always collapse.
    ForceMono,
    /// Never collapse.
    ForceStereo,
}

impl From<PolicyConfig> for ChannelPolicy {
    fn from(policy: PolicyConfig) -> Self {
        match policy {
            PolicyConfig::Auto => ChannelPolicy::Auto,
            PolicyConfig::ForceMono => ChannelPolicy::ForceMono,
            PolicyConfig::ForceStereo => ChannelPolicy::ForceStereo,
        }
    }
}

impl From<ChannelPolicy> for PolicyConfig {
    fn from(policy: ChannelPolicy) -> Self {
        match policy {
            ChannelPolicy::Auto => PolicyConfig::Auto,
            ChannelPolicy::ForceMono => PolicyConfig::ForceMono,
            ChannelPolicy::ForceStereo => PolicyConfig::ForceStereo,
        }
    }
}

/// Footswitch action as written in files.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ButtonModeConfig {
    /// Not assigned.
    #[default]
    Unused,
    /// Toggle the bound slot.
    ToggleBypass,
    /// Tap tempo.
    TapTempo,
}

impl From<ButtonModeConfig> for ButtonMode {
    fn from(mode: ButtonModeConfig) -> Self {
        match mode {
            ButtonModeConfig::Unused => ButtonMode::Unused,
            ButtonModeConfig::ToggleBypass => ButtonMode::ToggleBypass,
            ButtonModeConfig::TapTempo => ButtonMode::TapTempo,
        }
    }
}

impl From<ButtonMode> for ButtonModeConfig {
    fn from(mode: ButtonMode) -> Self {
        match mode {
            ButtonMode::Unused => ButtonModeConfig::Unused,
            ButtonMode::ToggleBypass => ButtonModeConfig::ToggleBypass,
            ButtonMode::TapTempo => ButtonModeConfig::TapTempo,
        }
    }
}

/// One `[[slot]]` table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SlotConfig {
    /// Effect in the slot.
    #[serde(default)]
    pub effect: EffectRef,

    /// Enabled (not bypassed).
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Left input; the previous slot when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_left: Option<TapRef>,

    /// Right input; the previous slot when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_right: Option<TapRef>,

    /// Average both inputs before processing.
    #[serde(default)]
    pub sum_to_mono: bool,

    /// Dry level, `0..=127`.
    #[serde(default)]
    pub dry: u8,

    /// Wet level, `0..=127`.
    #[serde(default = "default_wet")]
    pub wet: u8,

    /// Channel policy.
    #[serde(default)]
    pub channel_policy: PolicyConfig,

    /// Parameter values keyed by id or name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, u8>,
}

fn default_true() -> bool {
    true
}

fn default_wet() -> u8 {
    VALUE_MAX
}

impl SlotConfig {
    /// A chained slot running `effect`.
    pub fn new(effect: impl Into<String>) -> Self {
        Self {
            effect: EffectRef::Name(effect.into()),
            enabled: true,
            input_left: None,
            input_right: None,
            sum_to_mono: false,
            dry: 0,
            wet: VALUE_MAX,
            channel_policy: PolicyConfig::Auto,
            params: BTreeMap::new(),
        }
    }

    /// Sets one parameter value.
    pub fn with_param(mut self, key: impl Into<String>, value: u8) -> Self {
        self.params.insert(key.into(), value);
        self
    }

    /// Reads both channels from `tap`.
    pub fn with_input(mut self, tap: Tap) -> Self {
        self.input_left = Some(tap.into());
        self.input_right = Some(tap.into());
        self
    }
}

/// One `[[button]]` table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ButtonConfig {
    /// Bound slot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot: Option<u8>,
    /// Action.
    #[serde(default)]
    pub mode: ButtonModeConfig,
}

/// Lookup key for a parameter name: lowercase, runs of other characters
/// replaced by one underscore.
///
/// ```rust
/// use multifx_config::param_key;
///
/// assert_eq!(param_key("Pre-Delay"), "pre_delay");
/// assert_eq!(param_key("1.6 kHz"), "1_6_khz");
/// ```
pub fn param_key(name: &str) -> String {
    let mut key = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            key.push(c.to_ascii_lowercase());
        } else if !key.is_empty() && !key.ends_with('_') {
            key.push('_');
        }
    }
    while key.ends_with('_') {
        key.pop();
    }
    key
}

/// Resolves an effect reference to a type id.
pub fn resolve_effect(effect: &EffectRef) -> Result<u8, ConfigError> {
    match effect {
        EffectRef::Id(id) => Ok(*id),
        EffectRef::Name(name) => {
            if OFF_NAMES.iter().any(|off| off.eq_ignore_ascii_case(name)) {
                return Ok(TYPE_OFF);
            }
            EffectRegistry::new()
                .find(name)
                .map(|d| d.type_id)
                .ok_or_else(|| ConfigError::UnknownEffect(name.clone()))
        }
    }
}

fn effect_label(type_id: u8) -> String {
    EffectRegistry::new()
        .get(type_id)
        .map_or_else(|| format!("type {type_id}"), |d| d.key.to_string())
}

fn resolve_tap(tap: Option<&TapRef>, index: usize, field: &str) -> Result<Tap, ConfigError> {
    match tap {
        None => Ok(Tap::previous(index)),
        Some(TapRef::Slot(k)) => Ok(Tap::Slot(*k)),
        Some(TapRef::Named(name)) if name.eq_ignore_ascii_case("input") => Ok(Tap::Input),
        Some(TapRef::Named(name)) => Err(ConfigError::invalid_parameter(
            format!("slot {index}"),
            field,
            format!("expected \"input\" or a slot index, got \"{name}\""),
        )),
    }
}

fn resolve_param(type_id: u8, key: &str) -> Option<u8> {
    if let Ok(id) = key.parse::<u8>() {
        return Some(id);
    }
    let wanted = param_key(key);
    EffectRegistry::new()
        .get(type_id)?
        .meta
        .params
        .iter()
        .find(|p| param_key(p.name) == wanted)
        .map(|p| p.id)
}

impl PatchFile {
    /// Create a new empty patch.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            input_gain_db: None,
            output_gain_db: None,
            slots: Vec::new(),
            buttons: Vec::new(),
        }
    }

    /// Create a patch with a description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Append a slot.
    pub fn with_slot(mut self, slot: SlotConfig) -> Self {
        self.slots.push(slot);
        self
    }

    /// Append a footswitch assignment.
    pub fn with_button(mut self, slot: u8, mode: ButtonMode) -> Self {
        self.buttons.push(ButtonConfig {
            slot: Some(slot),
            mode: mode.into(),
        });
        self
    }

    /// Load a patch from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        let patch = Self::from_toml(&content)?;
        #[cfg(feature = "tracing")]
        tracing::debug!(path = %path.display(), name = %patch.name, "loaded patch file");
        Ok(patch)
    }

    /// Load a patch from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Save the patch to a TOML file, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }

        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))?;
        Ok(())
    }

    /// Convert the patch to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Builds the engine's patch descriptor.
    ///
    /// Names are resolved here; ranges and routing order are not checked,
    /// see [`crate::validate_patch`].
    pub fn to_descriptor(&self) -> Result<PatchDescriptor, ConfigError> {
        if self.slots.len() > MAX_SLOTS {
            return Err(ConfigError::TooManySlots {
                count: self.slots.len(),
                max: MAX_SLOTS,
            });
        }
        if self.buttons.len() > NUM_BUTTONS {
            return Err(ConfigError::invalid_parameter(
                self.name.clone(),
                "button",
                format!("at most {NUM_BUTTONS} buttons, got {}", self.buttons.len()),
            ));
        }

        let mut patch = PatchDescriptor::empty();
        for (index, config) in self.slots.iter().enumerate() {
            let type_id = resolve_effect(&config.effect)?;
            let mut slot = SlotDescriptor::chained(index, type_id);
            slot.enabled = config.enabled;
            slot.input_left = resolve_tap(config.input_left.as_ref(), index, "input_left")?;
            slot.input_right = resolve_tap(config.input_right.as_ref(), index, "input_right")?;
            slot.sum_to_mono = config.sum_to_mono;
            slot.dry = config.dry;
            slot.wet = config.wet;
            slot.channel_policy = config.channel_policy.into();

            let mut params = Vec::with_capacity(config.params.len());
            for (key, &value) in &config.params {
                let id = resolve_param(type_id, key).ok_or_else(|| {
                    ConfigError::invalid_parameter(effect_label(type_id), key, "unknown parameter")
                })?;
                params.push((id, value, key));
            }
            // id order, so a file and its re-export build identical descriptors
            params.sort_by_key(|&(id, _, _)| id);
            for (id, value, key) in params {
                if !slot.set_param(id, value) {
                    return Err(ConfigError::invalid_parameter(
                        effect_label(type_id),
                        key,
                        "slot already holds the maximum number of parameters",
                    ));
                }
            }

            if patch.push(slot).is_err() {
                return Err(ConfigError::TooManySlots {
                    count: self.slots.len(),
                    max: MAX_SLOTS,
                });
            }
        }

        for (binding, config) in patch.buttons.iter_mut().zip(&self.buttons) {
            *binding = ButtonBinding {
                slot: config.slot,
                mode: config.mode.into(),
            };
        }

        Ok(patch)
    }

    /// Describes an engine patch as a file.
    ///
    /// Effects and parameters are written by name when the catalogue knows
    /// them; taps are only written where they differ from default chaining.
    pub fn from_descriptor(name: impl Into<String>, patch: &PatchDescriptor) -> Self {
        let registry = EffectRegistry::new();
        let mut file = Self::new(name);

        for (index, slot) in patch.slots().iter().enumerate() {
            let descriptor = registry.get(slot.type_id);
            let effect = match descriptor {
                Some(d) => EffectRef::Name(d.key.to_string()),
                None if slot.is_off() => EffectRef::default(),
                None => EffectRef::Id(slot.type_id),
            };
            let tap = |t: Tap| (t != Tap::previous(index)).then(|| TapRef::from(t));
            let params = slot
                .params()
                .iter()
                .map(|p| {
                    let key = descriptor
                        .and_then(|d| d.meta.param(p.id))
                        .map_or_else(|| p.id.to_string(), |info| param_key(info.name));
                    (key, p.value)
                })
                .collect();

            file.slots.push(SlotConfig {
                effect,
                enabled: slot.enabled,
                input_left: tap(slot.input_left),
                input_right: tap(slot.input_right),
                sum_to_mono: slot.sum_to_mono,
                dry: slot.dry,
                wet: slot.wet,
                channel_policy: slot.channel_policy.into(),
                params,
            });
        }

        if patch.buttons.iter().any(|b| b.mode != ButtonMode::Unused) {
            file.buttons = patch
                .buttons
                .iter()
                .map(|b| ButtonConfig {
                    slot: b.slot,
                    mode: b.mode.into(),
                })
                .collect();
        }

        file
    }

    /// Number of slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Check if the patch has no slots.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
