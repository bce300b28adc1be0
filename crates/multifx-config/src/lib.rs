//! Patch configuration for the multifx pedal.
//!
//! Everything the control plane does with a patch before it reaches the
//! engine's intent queue lives here.
//!
//! # Features
//!
//! - **Patch files**: load and save boards as TOML ([`PatchFile`])
//! - **Factory patches**: the boot patch and a few starting points
//! - **Validation**: routing-order and range checks the engine does not make
//! - **SysEx**: the remote-control wire format, including patch dumps
//! - **Paths**: platform-specific patch directories
//!
//! # Example
//!
//! ```rust
//! use multifx_config::{PatchFile, SlotConfig, validate_patch};
//! use multifx_core::Tap;
//!
//! let file = PatchFile::new("Split")
//!     .with_slot(SlotConfig::new("overdrive").with_param("drive", 90))
//!     .with_slot(SlotConfig::new("chorus").with_input(Tap::Input))
//!     .with_slot(SlotConfig::new("mixer"));
//!
//! let patch = file.to_descriptor().unwrap();
//! validate_patch(&patch).unwrap();
//! assert_eq!(patch.slot(1).unwrap().input_left, Tap::Input);
//! ```

mod error;
mod patch_file;

/// Factory patches bundled with the library.
pub mod factory;

/// Platform-specific paths for patch files.
#[cfg(feature = "std")]
pub mod paths;

/// SysEx encoding and decoding.
pub mod sysex;

/// Configuration-time patch validation.
pub mod validation;

pub use error::ConfigError;
pub use factory::{
    FACTORY_PATCH_NAMES, default_patch, default_patch_file, factory_patch, factory_patches,
    is_factory_patch,
};
pub use patch_file::{
    ButtonConfig, ButtonModeConfig, EffectRef, PatchFile, PolicyConfig, SlotConfig, TapRef,
    param_key, resolve_effect,
};
pub use sysex::{PatchDump, SysexError, float_to_q16, pack_q16, unpack_q16};
pub use validation::{
    Channel, ValidationError, ValidationResult, patch_findings, validate_patch,
};

/// Re-export of the effect catalogue used to resolve names.
pub use multifx_engine::{EffectCategory, EffectDescriptor, EffectRegistry};
