//! multifx engine - the 12-slot routing engine
//!
//! This crate turns a [`PatchDescriptor`](multifx_core::PatchDescriptor) into
//! running audio. It owns fixed-capacity effect pools, a board of twelve
//! slots wired as an acyclic graph, and the frame loop that evaluates them.
//! After construction nothing here allocates, locks or blocks.
//!
//! # Components
//!
//! - [`EffectRegistry`] - Catalogue of effect types (names, categories, pool sizes)
//! - [`EffectPools`] - Pre-built instances handed out per patch
//! - [`BoardRuntime`] / [`SlotRuntime`] - Per-slot routing, fade and mix state
//! - [`Engine`] - Patch application, frame/block processing, gain staging
//! - [`command_channel`] - Lock-free intent queue from the control plane
//! - [`TapTempo`] / [`Footswitches`] - Control-plane helpers
//!
//! # Example
//!
//! ```rust
//! use multifx_core::{NoBuffers, PatchDescriptor, SlotDescriptor};
//! use multifx_engine::{Engine, EngineCommand, command_channel};
//!
//! let mut engine = Engine::new(48000.0, &mut NoBuffers);
//! let (mut tx, mut rx) = command_channel(64);
//!
//! // Control plane
//! let mut patch = PatchDescriptor::empty();
//! patch.push(SlotDescriptor::chained(0, 15)).unwrap(); // compressor
//! patch.push(SlotDescriptor::chained(1, 10)).unwrap(); // overdrive
//! tx.send(EngineCommand::ApplyPatch(patch)).unwrap();
//!
//! // Audio thread, once per block
//! let input = [0.01_f32; 64];
//! let (mut out_l, mut out_r) = ([0.0; 64], [0.0; 64]);
//! engine.process_block_with_commands(&mut rx, &input, &input, &mut out_l, &mut out_r);
//! assert!(engine.slot(1).unwrap().effect().is_some());
//! ```
//!
//! # no_std Support
//!
//! Disable the default `std` feature. The command queue still needs an
//! allocator at construction time.
//!
//! ```toml
//! [dependencies]
//! multifx-engine = { version = "0.1", default-features = false }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

pub mod board;
pub mod command;
pub mod control;
pub mod engine;
pub mod pool;
pub mod registry;

pub use board::{BoardRuntime, SlotRuntime};
pub use command::{
    CommandReceiver, CommandSender, DEFAULT_QUEUE_CAPACITY, EngineCommand, command_channel,
};
pub use control::{Footswitches, TapTempo};
pub use engine::{DEFAULT_INPUT_GAIN, DEFAULT_OUTPUT_GAIN, Engine};
pub use pool::{EffectHandle, EffectKind, EffectPools};
pub use registry::{EffectCategory, EffectDescriptor, EffectRegistry};
