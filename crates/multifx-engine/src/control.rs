//! Control-plane helpers: tap tempo and footswitch bindings.
//!
//! These run on the control side of the command queue. They keep their own
//! mirror of what they need (bindings and per-slot enabled flags) and turn
//! physical presses into [`EngineCommand`]s, so the engine itself is never
//! read across threads.

use multifx_core::{ButtonBinding, ButtonMode, MAX_SLOTS, NUM_BUTTONS, PatchDescriptor};

use crate::command::EngineCommand;

/// Shortest accepted tap interval (600 BPM).
pub const MIN_TAP_INTERVAL_US: u64 = 100_000;
/// Longest accepted tap interval (30 BPM).
pub const MAX_TAP_INTERVAL_US: u64 = 2_000_000;
/// Lowest reported tempo.
pub const MIN_BPM: f32 = 40.0;
/// Highest reported tempo.
pub const MAX_BPM: f32 = 240.0;

/// Tap-tempo estimator.
///
/// Feed it monotonic microsecond timestamps. The first tap only arms it;
/// every later tap within the accepted interval range updates a running
/// average `(3 * avg + dt) / 4`. An interval outside the range restarts the
/// average without reporting a tempo.
#[derive(Debug, Clone, Copy, Default)]
pub struct TapTempo {
    last_tap_us: Option<u64>,
    average_us: Option<u64>,
    bpm: Option<f32>,
}

impl TapTempo {
    /// An unarmed estimator.
    pub const fn new() -> Self {
        Self {
            last_tap_us: None,
            average_us: None,
            bpm: None,
        }
    }

    /// Registers a tap and returns the updated tempo, if one is established.
    pub fn tap(&mut self, now_us: u64) -> Option<f32> {
        let Some(last) = self.last_tap_us.replace(now_us) else {
            self.average_us = None;
            return None;
        };

        let dt = now_us.saturating_sub(last);
        if !(MIN_TAP_INTERVAL_US..=MAX_TAP_INTERVAL_US).contains(&dt) {
            self.average_us = None;
            return None;
        }

        let average = self.average_us.map_or(dt, |avg| (avg * 3 + dt) / 4);
        self.average_us = Some(average);

        let seconds = (average as f32 / 1e6).max(1e-6);
        let bpm = (60.0 / seconds).clamp(MIN_BPM, MAX_BPM);
        self.bpm = Some(bpm);
        Some(bpm)
    }

    /// Most recent tempo.
    pub fn bpm(&self) -> Option<f32> {
        self.bpm
    }

    /// Forgets the tap history (the last tempo is kept).
    pub fn reset(&mut self) {
        self.last_tap_us = None;
        self.average_us = None;
    }
}

/// Footswitch bindings for the current patch.
#[derive(Debug, Clone)]
pub struct Footswitches {
    bindings: [ButtonBinding; NUM_BUTTONS],
    enabled: [bool; MAX_SLOTS],
    tap: TapTempo,
}

impl Footswitches {
    /// Bindings taken from `patch`.
    pub fn new(patch: &PatchDescriptor) -> Self {
        let mut switches = Self {
            bindings: patch.buttons,
            enabled: [true; MAX_SLOTS],
            tap: TapTempo::new(),
        };
        switches.set_patch(patch);
        switches
    }

    /// Refreshes bindings and enabled flags after a patch change.
    pub fn set_patch(&mut self, patch: &PatchDescriptor) {
        self.bindings = patch.buttons;
        self.enabled = [true; MAX_SLOTS];
        for (flag, slot) in self.enabled.iter_mut().zip(patch.slots()) {
            *flag = slot.enabled;
        }
    }

    /// Keeps the enabled mirror in sync with changes made elsewhere.
    pub fn note_enabled(&mut self, slot: usize, enabled: bool) {
        if let Some(flag) = self.enabled.get_mut(slot) {
            *flag = enabled;
        }
    }

    /// Binding of `button`.
    pub fn binding(&self, button: usize) -> Option<ButtonBinding> {
        self.bindings.get(button).copied()
    }

    /// The tap-tempo estimator.
    pub fn tap_tempo(&self) -> &TapTempo {
        &self.tap
    }

    /// Handles a press of `button` at `now_us`.
    ///
    /// Returns the command to send, if the press does anything.
    pub fn press(&mut self, button: usize, now_us: u64) -> Option<EngineCommand> {
        let binding = self.bindings.get(button).copied()?;
        match binding.mode {
            ButtonMode::ToggleBypass => {
                let slot = binding.slot.filter(|&s| usize::from(s) < MAX_SLOTS)?;
                let flag = &mut self.enabled[usize::from(slot)];
                *flag = !*flag;
                Some(EngineCommand::SetEnabled {
                    slot,
                    enabled: *flag,
                })
            }
            ButtonMode::TapTempo => self.tap.tap(now_us).map(EngineCommand::SetTempo),
            ButtonMode::Unused => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use multifx_core::SlotDescriptor;

    #[test]
    fn steady_taps_converge() {
        let mut tap = TapTempo::new();
        assert_eq!(tap.tap(1_000_000), None);
        assert_eq!(tap.tap(1_500_000), Some(120.0));
        assert_eq!(tap.tap(2_000_000), Some(120.0));
    }

    #[test]
    fn running_average_weights_history() {
        let mut tap = TapTempo::new();
        tap.tap(0);
        tap.tap(500_000);
        // (3 * 500 ms + 1000 ms) / 4 = 625 ms
        assert_eq!(tap.tap(1_500_000), Some(96.0));
    }

    #[test]
    fn out_of_range_interval_restarts() {
        let mut tap = TapTempo::new();
        tap.tap(0);
        tap.tap(500_000);
        assert_eq!(tap.tap(5_000_000), None);
        assert_eq!(tap.tap(5_050_000), None);
        assert_eq!(tap.tap(6_050_000), Some(60.0));
        assert_eq!(tap.bpm(), Some(60.0));
    }

    #[test]
    fn fast_taps_clamp_to_max() {
        let mut tap = TapTempo::new();
        tap.tap(0);
        assert_eq!(tap.tap(150_000), Some(MAX_BPM));
    }

    #[test]
    fn bypass_switch_toggles() {
        let mut patch = PatchDescriptor::empty();
        patch.push(SlotDescriptor::chained(0, 10)).unwrap();
        patch.buttons = [
            ButtonBinding::new(0, ButtonMode::ToggleBypass),
            ButtonBinding::new(0, ButtonMode::TapTempo),
        ];
        let mut switches = Footswitches::new(&patch);

        assert_eq!(
            switches.press(0, 0),
            Some(EngineCommand::SetEnabled { slot: 0, enabled: false })
        );
        assert_eq!(
            switches.press(0, 0),
            Some(EngineCommand::SetEnabled { slot: 0, enabled: true })
        );
        assert_eq!(switches.press(1, 0), None);
        assert_eq!(switches.press(1, 500_000), Some(EngineCommand::SetTempo(120.0)));
        assert_eq!(switches.press(2, 0), None);
    }

    #[test]
    fn unassigned_switch_does_nothing() {
        let mut switches = Footswitches::new(&PatchDescriptor::empty());
        assert_eq!(switches.press(0, 0), None);
        assert_eq!(switches.press(1, 0), None);
    }
}
