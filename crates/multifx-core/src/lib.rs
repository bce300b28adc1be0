//! multifx core - contract and data model for a 12-slot pedal engine
//!
//! This crate holds everything the engine, the effects and the control plane
//! agree on, with no platform dependencies and zero allocation in the audio
//! path.
//!
//! # Core Abstractions
//!
//! ## Effect contract
//!
//! - [`EffectUnit`] - Object-safe trait every pluggable effect implements
//! - [`EffectMeta`] / [`ParamInfo`] - Static metadata for remote discovery
//! - [`ChannelMode`] - Declared mono/stereo support
//!
//! ## Patch model
//!
//! - [`PatchDescriptor`] / [`SlotDescriptor`] - Declarative board configuration
//! - [`Tap`] - Slot input source (hardware input or an earlier slot)
//! - [`ChannelPolicy`], [`ButtonBinding`], [`ParamValue`]
//!
//! ## Per-slot utilities
//!
//! - [`BypassFade`] - 5 ms click-free enable/disable ramp
//! - [`DcBlocker`] - Inter-stage DC removal
//!
//! ## Effect support
//!
//! - [`BufferSource`] - Platform-provided delay memory
//! - [`TimeSync`] - Free-time / tempo-division delay periods
//! - [`Biquad`] - Peaking EQ section
//! - Math: [`db_to_linear`], [`soft_clip`], [`envelope_coeff`], ...
//!
//! # no_std Support
//!
//! Disable the default `std` feature for embedded targets; an allocator is
//! still required for [`HeapBuffers`] and boxed sample buffers.
//!
//! ```toml
//! [dependencies]
//! multifx-core = { version = "0.1", default-features = false }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod biquad;
pub mod buffer;
pub mod dc_blocker;
pub mod effect;
pub mod fade;
pub mod math;
pub mod meta;
pub mod patch;
pub mod time_sync;

pub use biquad::{Biquad, BiquadCoeffs};
pub use buffer::{
    BufferSource, HeapBuffers, NoBuffers, SampleBuffer, acquire_array, acquire_exact,
};
pub use dc_blocker::DcBlocker;
pub use effect::EffectUnit;
pub use fade::{BypassFade, FADE_SECONDS, FadeRamp, fade_step, frames_to_settle};
pub use math::{db_to_linear, envelope_coeff, linear_to_db, mono_average, soft_clip, soft_limit};
pub use meta::{ChannelMode, EffectMeta, EnumOption, NumberRange, ParamInfo, ParamKind, ParamUnit};
pub use patch::{
    ButtonBinding, ButtonMode, ChannelPolicy, MAX_PARAMS, MAX_SLOTS, NUM_BUTTONS, ParamValue,
    PatchDescriptor, PatchFull, ROUTE_INPUT, ROUTE_INPUT_WIRE, SlotDescriptor, TYPE_OFF, Tap,
    VALUE_MAX,
};
pub use time_sync::{DIVISION_LABELS, DIVISIONS, TimeSync};
