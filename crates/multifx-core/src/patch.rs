//! Patch descriptor: the declarative configuration sent by the control plane.
//!
//! A [`PatchDescriptor`] is a plain `Copy` value. It describes what each of
//! the [`MAX_SLOTS`] slots should contain and how slots are wired together;
//! the engine copies it into its runtime state when the patch is applied.
//!
//! # Routing
//!
//! Each slot reads its left and right input from a [`Tap`]: either the
//! hardware input or the output of another slot. Slots are evaluated in
//! ascending index order, so a tap to slot `k` from slot `i` only reads a
//! value computed in the same frame when `k < i`. The descriptor does not
//! enforce this; see `multifx_config::validate_patch` for the
//! configuration-time check.
//!
//! # Example
//!
//! ```rust
//! use multifx_core::{PatchDescriptor, SlotDescriptor, Tap};
//!
//! let mut patch = PatchDescriptor::empty();
//! patch.push(SlotDescriptor::chained(0, 10)).unwrap();
//! patch.push(SlotDescriptor::chained(1, 14)).unwrap();
//!
//! assert_eq!(patch.slot_count(), 2);
//! assert_eq!(patch.slots()[1].input_left, Tap::Slot(0));
//! ```

/// Number of slots in a board.
pub const MAX_SLOTS: usize = 12;

/// Maximum (id, value) pairs a slot descriptor carries.
pub const MAX_PARAMS: usize = 8;

/// Number of assignable footswitches.
pub const NUM_BUTTONS: usize = 2;

/// Raw tap value meaning "read the hardware input".
pub const ROUTE_INPUT: u8 = 255;

/// 7-bit wire encoding of [`ROUTE_INPUT`].
pub const ROUTE_INPUT_WIRE: u8 = 127;

/// Effect type id reserved for an empty slot.
pub const TYPE_OFF: u8 = 0;

/// Largest value of a 7-bit mix or parameter field.
pub const VALUE_MAX: u8 = 127;

/// Where a slot reads one channel of its input from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Tap {
    /// The (gain-staged) hardware input of the current frame.
    #[default]
    Input,
    /// The output another slot produced in the current frame.
    Slot(u8),
}

impl Tap {
    /// Decodes the raw form, where [`ROUTE_INPUT`] is the hardware input.
    pub const fn from_raw(raw: u8) -> Self {
        if raw == ROUTE_INPUT {
            Tap::Input
        } else {
            Tap::Slot(raw)
        }
    }

    /// Encodes to the raw form.
    pub const fn to_raw(self) -> u8 {
        match self {
            Tap::Input => ROUTE_INPUT,
            Tap::Slot(k) => k,
        }
    }

    /// Default tap for a slot: the input for slot 0, the previous slot otherwise.
    pub const fn previous(index: usize) -> Self {
        if index == 0 {
            Tap::Input
        } else {
            Tap::Slot((index - 1) as u8)
        }
    }
}

/// Whether a slot's processed output is collapsed to mono.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum ChannelPolicy {
    /// Collapse only when the slot sums its input to mono.
    #[default]
    Auto = 0,
    /// Always collapse the processed output to mono.
    ForceMono = 1,
    /// Never collapse.
    ForceStereo = 2,
}

impl ChannelPolicy {
    /// Decodes a raw value; unknown values fall back to `Auto`.
    pub const fn from_raw(raw: u8) -> Self {
        match raw {
            1 => ChannelPolicy::ForceMono,
            2 => ChannelPolicy::ForceStereo,
            _ => ChannelPolicy::Auto,
        }
    }

    /// Whether the processed signal is collapsed to mono for a slot with the
    /// given sum-to-mono flag.
    #[inline]
    pub const fn collapses(self, sum_to_mono: bool) -> bool {
        match self {
            ChannelPolicy::ForceMono => true,
            ChannelPolicy::Auto => sum_to_mono,
            ChannelPolicy::ForceStereo => false,
        }
    }
}

/// Action performed by a footswitch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum ButtonMode {
    /// Not assigned.
    #[default]
    Unused = 0,
    /// Toggle the bound slot's enabled flag.
    ToggleBypass = 1,
    /// Feed the tap-tempo estimator.
    TapTempo = 2,
}

impl ButtonMode {
    /// Decodes a raw value; unknown values fall back to `Unused`.
    pub const fn from_raw(raw: u8) -> Self {
        match raw {
            1 => ButtonMode::ToggleBypass,
            2 => ButtonMode::TapTempo,
            _ => ButtonMode::Unused,
        }
    }
}

/// Footswitch assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ButtonBinding {
    /// Target slot, `None` when unassigned.
    pub slot: Option<u8>,
    /// Action.
    pub mode: ButtonMode,
}

impl ButtonBinding {
    /// Binding with a target slot.
    pub const fn new(slot: u8, mode: ButtonMode) -> Self {
        Self {
            slot: Some(slot),
            mode,
        }
    }
}

/// One parameter assignment, value in `0..=127`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ParamValue {
    /// Parameter id.
    pub id: u8,
    /// 7-bit value.
    pub value: u8,
}

impl ParamValue {
    /// Creates a pair.
    pub const fn new(id: u8, value: u8) -> Self {
        Self { id, value }
    }

    /// Quantizes a normalized value the way effects report snapshots.
    #[inline]
    pub fn from_normalized(id: u8, normalized: f32) -> Self {
        let v = normalized.clamp(0.0, 1.0) * f32::from(VALUE_MAX) + 0.5;
        Self { id, value: v as u8 }
    }

    /// Value mapped to `[0, 1]`.
    #[inline]
    pub fn normalized(self) -> f32 {
        f32::from(self.value) / f32::from(VALUE_MAX)
    }
}

/// Desired contents of one slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlotDescriptor {
    /// Effect type id ([`TYPE_OFF`] for an empty slot).
    pub type_id: u8,
    /// Enabled (not bypassed).
    pub enabled: bool,
    /// Left input.
    pub input_left: Tap,
    /// Right input.
    pub input_right: Tap,
    /// Average both input channels before processing.
    pub sum_to_mono: bool,
    /// Dry level, `0..=127`.
    pub dry: u8,
    /// Wet level, `0..=127`.
    pub wet: u8,
    /// Channel policy for the processed signal.
    pub channel_policy: ChannelPolicy,
    /// Number of valid entries in `params`.
    pub param_count: u8,
    /// Parameter assignments; only the first `param_count` are meaningful.
    pub params: [ParamValue; MAX_PARAMS],
}

impl SlotDescriptor {
    /// An empty slot with default chaining for `index`.
    pub const fn off(index: usize) -> Self {
        Self::chained(index, TYPE_OFF)
    }

    /// A slot of `type_id` reading the previous slot (or the input for slot 0),
    /// fully wet, enabled, with no parameter overrides.
    pub const fn chained(index: usize, type_id: u8) -> Self {
        let tap = Tap::previous(index);
        Self {
            type_id,
            enabled: true,
            input_left: tap,
            input_right: tap,
            sum_to_mono: false,
            dry: 0,
            wet: VALUE_MAX,
            channel_policy: ChannelPolicy::Auto,
            param_count: 0,
            params: [ParamValue::new(0, 0); MAX_PARAMS],
        }
    }

    /// Valid parameter assignments.
    pub fn params(&self) -> &[ParamValue] {
        let n = usize::from(self.param_count).min(MAX_PARAMS);
        &self.params[..n]
    }

    /// Updates an existing assignment or appends a new one.
    ///
    /// Returns `false` when the id is new and all entries are used.
    pub fn set_param(&mut self, id: u8, value: u8) -> bool {
        let n = usize::from(self.param_count).min(MAX_PARAMS);
        if let Some(p) = self.params[..n].iter_mut().find(|p| p.id == id) {
            p.value = value;
            return true;
        }
        if n < MAX_PARAMS {
            self.params[n] = ParamValue::new(id, value);
            self.param_count = (n + 1) as u8;
            return true;
        }
        false
    }

    /// Replaces all assignments with the given list (truncated to [`MAX_PARAMS`]).
    pub fn replace_params(&mut self, params: &[ParamValue]) {
        let n = params.len().min(MAX_PARAMS);
        self.params = [ParamValue::default(); MAX_PARAMS];
        self.params[..n].copy_from_slice(&params[..n]);
        self.param_count = n as u8;
    }

    /// Looks up the stored value for a parameter id.
    pub fn param(&self, id: u8) -> Option<u8> {
        self.params().iter().find(|p| p.id == id).map(|p| p.value)
    }

    /// Whether the slot names an effect type.
    pub const fn is_off(&self) -> bool {
        self.type_id == TYPE_OFF
    }
}

/// Error returned by [`PatchDescriptor::push`] when all slots are used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatchFull;

/// Complete board configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PatchDescriptor {
    slot_count: u8,
    slots: [SlotDescriptor; MAX_SLOTS],
    /// Footswitch assignments.
    pub buttons: [ButtonBinding; NUM_BUTTONS],
}

impl PatchDescriptor {
    /// A patch with no slots and unassigned buttons.
    pub const fn empty() -> Self {
        let mut slots = [SlotDescriptor::off(0); MAX_SLOTS];
        let mut i = 1;
        while i < MAX_SLOTS {
            slots[i] = SlotDescriptor::off(i);
            i += 1;
        }
        Self {
            slot_count: 0,
            slots,
            buttons: [ButtonBinding {
                slot: None,
                mode: ButtonMode::Unused,
            }; NUM_BUTTONS],
        }
    }

    /// Number of slots the patch describes (at most [`MAX_SLOTS`]).
    pub fn slot_count(&self) -> usize {
        usize::from(self.slot_count).min(MAX_SLOTS)
    }

    /// Sets the number of described slots, clamped to [`MAX_SLOTS`].
    pub fn set_slot_count(&mut self, count: usize) {
        self.slot_count = count.min(MAX_SLOTS) as u8;
    }

    /// The described slots.
    pub fn slots(&self) -> &[SlotDescriptor] {
        &self.slots[..self.slot_count()]
    }

    /// All slot records, including those past `slot_count`.
    pub fn all_slots(&self) -> &[SlotDescriptor; MAX_SLOTS] {
        &self.slots
    }

    /// Slot `index`, if described.
    pub fn slot(&self, index: usize) -> Option<&SlotDescriptor> {
        self.slots().get(index)
    }

    /// Mutable access to slot `index`, extending `slot_count` to cover it.
    ///
    /// Slots that become described this way keep whatever record was stored
    /// (an `off` slot with default chaining for a fresh patch).
    pub fn slot_mut(&mut self, index: usize) -> Option<&mut SlotDescriptor> {
        if index >= MAX_SLOTS {
            return None;
        }
        if index >= self.slot_count() {
            self.slot_count = (index + 1) as u8;
        }
        Some(&mut self.slots[index])
    }

    /// Appends a slot.
    pub fn push(&mut self, slot: SlotDescriptor) -> Result<usize, PatchFull> {
        let index = self.slot_count();
        if index >= MAX_SLOTS {
            return Err(PatchFull);
        }
        self.slots[index] = slot;
        self.slot_count += 1;
        Ok(index)
    }

    /// Updates the stored value of one parameter of a described slot.
    pub fn set_param(&mut self, slot: usize, id: u8, value: u8) -> bool {
        if slot >= self.slot_count() {
            return false;
        }
        self.slots[slot].set_param(id, value)
    }
}

impl Default for PatchDescriptor {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tap_raw_round_trip() {
        assert_eq!(Tap::from_raw(ROUTE_INPUT), Tap::Input);
        assert_eq!(Tap::from_raw(3), Tap::Slot(3));
        assert_eq!(Tap::Slot(11).to_raw(), 11);
        assert_eq!(Tap::Input.to_raw(), 255);
        assert_eq!(Tap::previous(0), Tap::Input);
        assert_eq!(Tap::previous(5), Tap::Slot(4));
    }

    #[test]
    fn channel_policy_collapse_rules() {
        assert!(ChannelPolicy::ForceMono.collapses(false));
        assert!(ChannelPolicy::Auto.collapses(true));
        assert!(!ChannelPolicy::Auto.collapses(false));
        assert!(!ChannelPolicy::ForceStereo.collapses(true));
        assert_eq!(ChannelPolicy::from_raw(9), ChannelPolicy::Auto);
    }

    #[test]
    fn snapshot_rounding() {
        assert_eq!(ParamValue::from_normalized(0, 0.5).value, 64);
        assert_eq!(ParamValue::from_normalized(0, 1.0).value, 127);
        assert_eq!(ParamValue::from_normalized(0, -1.0).value, 0);
        assert_eq!(ParamValue::new(0, 127).normalized(), 1.0);
    }

    #[test]
    fn slot_params_update_then_append() {
        let mut slot = SlotDescriptor::chained(2, 10);
        assert!(slot.set_param(0, 40));
        assert!(slot.set_param(1, 70));
        assert!(slot.set_param(0, 41));
        assert_eq!(slot.params(), &[ParamValue::new(0, 41), ParamValue::new(1, 70)]);

        for id in 2..8 {
            assert!(slot.set_param(id, 1));
        }
        assert!(!slot.set_param(8, 1));
        assert!(slot.set_param(7, 99));
        assert_eq!(slot.param(7), Some(99));
    }

    #[test]
    fn replace_params_truncates() {
        let mut slot = SlotDescriptor::off(0);
        let many: [ParamValue; 10] = core::array::from_fn(|i| ParamValue::new(i as u8, 1));
        slot.replace_params(&many);
        assert_eq!(slot.params().len(), MAX_PARAMS);
    }

    #[test]
    fn patch_push_until_full() {
        let mut patch = PatchDescriptor::empty();
        for i in 0..MAX_SLOTS {
            assert_eq!(patch.push(SlotDescriptor::chained(i, 1)), Ok(i));
        }
        assert_eq!(patch.push(SlotDescriptor::off(0)), Err(PatchFull));
    }

    #[test]
    fn slot_mut_extends_count() {
        let mut patch = PatchDescriptor::empty();
        patch.slot_mut(4).unwrap().type_id = 15;
        assert_eq!(patch.slot_count(), 5);
        assert_eq!(patch.slots()[4].input_left, Tap::Slot(3));
        assert!(patch.slot_mut(12).is_none());
    }

    #[test]
    fn slot_count_is_clamped() {
        let mut patch = PatchDescriptor::empty();
        patch.set_slot_count(40);
        assert_eq!(patch.slot_count(), MAX_SLOTS);
    }
}
