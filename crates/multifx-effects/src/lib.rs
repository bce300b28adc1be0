//! multifx effects - the pedal's effect units
//!
//! Every unit implements [`multifx_core::EffectUnit`] and is addressed on the
//! wire by the type id in [`ids`]:
//!
//! - [`Delay`] - Tempo-synced stereo feedback delay (bound memory)
//! - [`Overdrive`] - Auto-leveled overdrive with tone control
//! - [`Mixer`] - Merges two routed branches
//! - [`Reverb`] - Freeverb-style stereo reverb (bound memory)
//! - [`Compressor`] - Per-channel peak compressor
//! - [`Chorus`] - Stereo chorus
//! - [`NoiseGate`] - Noise gate with hold and range
//! - [`GraphicEq`] - Seven-band graphic EQ
//!
//! Units that need large delay lines take them from a
//! [`BufferSource`](multifx_core::BufferSource) through `bind_buffers`; until
//! bound they pass audio through.
//!
//! ## Example
//!
//! ```rust
//! use multifx_core::EffectUnit;
//! use multifx_effects::{Compressor, Overdrive};
//!
//! let mut comp = Compressor::new();
//! let mut od = Overdrive::new();
//! comp.init(48000.0);
//! od.init(48000.0);
//!
//! let (mut l, mut r) = (0.1, 0.1);
//! comp.process_stereo(&mut l, &mut r);
//! od.process_stereo(&mut l, &mut r);
//! assert!(l.is_finite());
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod chorus;
pub mod compressor;
pub mod delay;
pub mod gate;
pub mod graphic_eq;
pub mod mixer;
pub mod overdrive;
pub mod reverb;

pub use chorus::Chorus;
pub use compressor::Compressor;
pub use delay::Delay;
pub use gate::NoiseGate;
pub use graphic_eq::GraphicEq;
pub use mixer::Mixer;
pub use overdrive::Overdrive;
pub use reverb::Reverb;

/// Wire type ids.
pub mod ids {
    /// Empty slot.
    pub const OFF: u8 = multifx_core::TYPE_OFF;
    /// [`Delay`](crate::Delay).
    pub const DELAY: u8 = 1;
    /// [`Overdrive`](crate::Overdrive).
    pub const OVERDRIVE: u8 = 10;
    /// [`Mixer`](crate::Mixer).
    pub const MIXER: u8 = 13;
    /// [`Reverb`](crate::Reverb).
    pub const REVERB: u8 = 14;
    /// [`Compressor`](crate::Compressor).
    pub const COMPRESSOR: u8 = 15;
    /// [`Chorus`](crate::Chorus).
    pub const CHORUS: u8 = 16;
    /// [`NoiseGate`](crate::NoiseGate).
    pub const NOISE_GATE: u8 = 17;
    /// [`GraphicEq`](crate::GraphicEq).
    pub const GRAPHIC_EQ: u8 = 18;

    /// Every instantiable type id, in catalogue order.
    pub const ALL: [u8; 8] = [
        DELAY, OVERDRIVE, MIXER, REVERB, COMPRESSOR, CHORUS, NOISE_GATE, GRAPHIC_EQ,
    ];
}

/// Static metadata for `type_id`, if it names an effect.
pub fn metadata_for(type_id: u8) -> Option<&'static multifx_core::EffectMeta> {
    let meta = match type_id {
        ids::DELAY => &delay::META,
        ids::OVERDRIVE => &overdrive::META,
        ids::MIXER => &mixer::META,
        ids::REVERB => &reverb::META,
        ids::COMPRESSOR => &compressor::META,
        ids::CHORUS => &chorus::META,
        ids::NOISE_GATE => &gate::META,
        ids::GRAPHIC_EQ => &graphic_eq::META,
        _ => return None,
    };
    Some(meta)
}
