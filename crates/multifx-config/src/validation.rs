//! Configuration-time patch validation.
//!
//! The engine accepts any [`PatchDescriptor`] and never rejects one on the
//! audio thread: a forward tap reads zero, an unknown effect passes audio
//! through. Those outcomes are defined but rarely intended, so editors and
//! tools run [`validate_patch`] before sending a patch and report every
//! finding at once.
//!
//! # Example
//!
//! ```rust
//! use multifx_config::{ValidationError, validate_patch};
//! use multifx_core::{PatchDescriptor, SlotDescriptor, Tap};
//!
//! let mut patch = PatchDescriptor::empty();
//! patch.push(SlotDescriptor::chained(0, 10)).unwrap();
//! assert!(validate_patch(&patch).is_ok());
//!
//! // slot 0 reading slot 0 is a forward tap
//! patch.slot_mut(0).unwrap().input_left = Tap::Slot(0);
//! assert!(matches!(
//!     validate_patch(&patch),
//!     Err(ValidationError::ForwardTap { slot: 0, target: 0, .. })
//! ));
//! ```

use multifx_core::{MAX_SLOTS, PatchDescriptor, SlotDescriptor, Tap, VALUE_MAX};
use multifx_engine::EffectRegistry;
use thiserror::Error;

/// Which input channel a tap finding refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    /// Left input tap.
    Left,
    /// Right input tap.
    Right,
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Channel::Left => "left",
            Channel::Right => "right",
        })
    }
}

/// Validation error types.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// Unknown effect type id.
    #[error("slot {slot}: unknown effect type {type_id}")]
    UnknownEffect {
        /// Slot index.
        slot: usize,
        /// Offending type id.
        type_id: u8,
    },

    /// Tap reads a slot that is evaluated at or after the reader.
    #[error("slot {slot}: {channel} input reads slot {target}, which is not evaluated before it")]
    ForwardTap {
        /// Slot index.
        slot: usize,
        /// Channel of the tap.
        channel: Channel,
        /// Slot the tap reads.
        target: u8,
    },

    /// Tap names a slot index the board does not have.
    #[error("slot {slot}: {channel} input reads nonexistent slot {target}")]
    TapOutOfRange {
        /// Slot index.
        slot: usize,
        /// Channel of the tap.
        channel: Channel,
        /// Raw tap value.
        target: u8,
    },

    /// Dry or wet level above 127.
    #[error("slot {slot}: {field} level {value} out of range [0, 127]")]
    MixOutOfRange {
        /// Slot index.
        slot: usize,
        /// `"dry"` or `"wet"`.
        field: &'static str,
        /// Offending value.
        value: u8,
    },

    /// Parameter id the slot's effect does not declare.
    #[error("slot {slot}: effect '{effect}' has no parameter {id}")]
    UnknownParameter {
        /// Slot index.
        slot: usize,
        /// Effect display name.
        effect: &'static str,
        /// Parameter id.
        id: u8,
    },

    /// Parameter value above 127.
    #[error("slot {slot}: parameter {id} value {value} out of range [0, 127]")]
    ParamOutOfRange {
        /// Slot index.
        slot: usize,
        /// Parameter id.
        id: u8,
        /// Offending value.
        value: u8,
    },

    /// Footswitch bound to a slot the patch does not describe.
    #[error("button {button}: bound to slot {slot}, patch describes {slot_count}")]
    ButtonOutOfRange {
        /// Button index.
        button: usize,
        /// Bound slot.
        slot: u8,
        /// Described slots in the patch.
        slot_count: usize,
    },

    /// Multiple validation errors.
    #[error("multiple validation errors: {}", .0.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; "))]
    Multiple(Vec<ValidationError>),
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Every problem found in `patch`, in slot order then button order.
pub fn patch_findings(patch: &PatchDescriptor) -> Vec<ValidationError> {
    let registry = EffectRegistry::new();
    let mut findings = Vec::new();

    for (index, slot) in patch.slots().iter().enumerate() {
        slot_findings(&registry, index, slot, &mut findings);
    }

    for (button, binding) in patch.buttons.iter().enumerate() {
        let Some(slot) = binding.slot else { continue };
        if binding.mode == multifx_core::ButtonMode::Unused {
            continue;
        }
        if usize::from(slot) >= patch.slot_count() {
            findings.push(ValidationError::ButtonOutOfRange {
                button,
                slot,
                slot_count: patch.slot_count(),
            });
        }
    }

    findings
}

fn slot_findings(
    registry: &EffectRegistry,
    index: usize,
    slot: &SlotDescriptor,
    findings: &mut Vec<ValidationError>,
) {
    for (channel, tap) in [
        (Channel::Left, slot.input_left),
        (Channel::Right, slot.input_right),
    ] {
        if let Tap::Slot(target) = tap {
            if usize::from(target) >= MAX_SLOTS {
                findings.push(ValidationError::TapOutOfRange {
                    slot: index,
                    channel,
                    target,
                });
            } else if usize::from(target) >= index {
                findings.push(ValidationError::ForwardTap {
                    slot: index,
                    channel,
                    target,
                });
            }
        }
    }

    for (field, value) in [("dry", slot.dry), ("wet", slot.wet)] {
        if value > VALUE_MAX {
            findings.push(ValidationError::MixOutOfRange {
                slot: index,
                field,
                value,
            });
        }
    }

    let meta = if slot.is_off() {
        None
    } else if let Some(descriptor) = registry.get(slot.type_id) {
        Some(descriptor.meta)
    } else {
        findings.push(ValidationError::UnknownEffect {
            slot: index,
            type_id: slot.type_id,
        });
        None
    };

    for p in slot.params() {
        if let Some(meta) = meta
            && meta.param(p.id).is_none()
        {
            findings.push(ValidationError::UnknownParameter {
                slot: index,
                effect: meta.name,
                id: p.id,
            });
        }
        if p.value > VALUE_MAX {
            findings.push(ValidationError::ParamOutOfRange {
                slot: index,
                id: p.id,
                value: p.value,
            });
        }
    }
}

/// Checks a patch before it is sent to the engine.
///
/// Reports forward or out-of-range taps, unknown effect types, parameter ids
/// the effect does not declare, 7-bit values above 127 and footswitches bound
/// past the described slots. A single finding is returned as itself; several
/// are wrapped in [`ValidationError::Multiple`].
pub fn validate_patch(patch: &PatchDescriptor) -> ValidationResult<()> {
    let mut findings = patch_findings(patch);
    match findings.len() {
        0 => Ok(()),
        1 => Err(findings.remove(0)),
        _ => Err(ValidationError::Multiple(findings)),
    }
}
