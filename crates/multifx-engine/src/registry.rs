//! Effect catalogue: discovery by type id or name.
//!
//! The registry is the one place that maps a wire type id to a display name,
//! a lookup key, a category and the pool capacity the engine reserves for it.
//! It is static data, so it is usable without an allocator; the `std`
//! feature adds [`EffectRegistry::create`] for building standalone units
//! outside the engine (offline rendering, tests, tools).
//!
//! # Example
//!
//! ```rust
//! use multifx_engine::{EffectCategory, EffectRegistry};
//!
//! let registry = EffectRegistry::new();
//!
//! for effect in registry.all_effects() {
//!     println!("{:>3} {}: {}", effect.type_id, effect.meta.name, effect.meta.description);
//! }
//!
//! let reverb = registry.find("reverb").unwrap();
//! assert_eq!(reverb.type_id, 14);
//! assert_eq!(reverb.category, EffectCategory::TimeBased);
//! ```

use multifx_core::{ChannelMode, EffectMeta};
use multifx_effects::{chorus, compressor, delay, gate, graphic_eq, ids, mixer, overdrive, reverb};

#[cfg(feature = "std")]
use multifx_core::{EffectUnit, HeapBuffers};

/// Category of effect for organization and filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectCategory {
    /// Compressors and gates.
    Dynamics,
    /// Overdrive and saturation.
    Drive,
    /// Chorus and other modulated delays.
    Modulation,
    /// Delay and reverb.
    TimeBased,
    /// Equalizers.
    Filter,
    /// Routing helpers such as the mixer.
    Utility,
}

impl EffectCategory {
    /// Human-readable name.
    pub const fn name(&self) -> &'static str {
        match self {
            EffectCategory::Dynamics => "Dynamics",
            EffectCategory::Drive => "Drive",
            EffectCategory::Modulation => "Modulation",
            EffectCategory::TimeBased => "Time-Based",
            EffectCategory::Filter => "Filter",
            EffectCategory::Utility => "Utility",
        }
    }
}

/// Describes one effect type.
#[derive(Debug, Clone, Copy)]
pub struct EffectDescriptor {
    /// Wire type id.
    pub type_id: u8,
    /// Lookup key used in preset files (lowercase, no spaces).
    pub key: &'static str,
    /// Category for organization.
    pub category: EffectCategory,
    /// Channel layouts the unit supports.
    pub channel_mode: ChannelMode,
    /// Instances the engine's pool holds.
    pub pool_capacity: usize,
    /// Static metadata published by the unit.
    pub meta: &'static EffectMeta,
}

const CATALOGUE: [EffectDescriptor; 8] = [
    EffectDescriptor {
        type_id: ids::DELAY,
        key: "delay",
        category: EffectCategory::TimeBased,
        channel_mode: ChannelMode::MonoOrStereo,
        pool_capacity: 2,
        meta: &delay::META,
    },
    EffectDescriptor {
        type_id: ids::OVERDRIVE,
        key: "overdrive",
        category: EffectCategory::Drive,
        channel_mode: ChannelMode::MonoOrStereo,
        pool_capacity: 4,
        meta: &overdrive::META,
    },
    EffectDescriptor {
        type_id: ids::MIXER,
        key: "mixer",
        category: EffectCategory::Utility,
        channel_mode: ChannelMode::Stereo,
        pool_capacity: 2,
        meta: &mixer::META,
    },
    EffectDescriptor {
        type_id: ids::REVERB,
        key: "reverb",
        category: EffectCategory::TimeBased,
        channel_mode: ChannelMode::MonoOrStereo,
        pool_capacity: 2,
        meta: &reverb::META,
    },
    EffectDescriptor {
        type_id: ids::COMPRESSOR,
        key: "compressor",
        category: EffectCategory::Dynamics,
        channel_mode: ChannelMode::MonoOrStereo,
        pool_capacity: 4,
        meta: &compressor::META,
    },
    EffectDescriptor {
        type_id: ids::CHORUS,
        key: "chorus",
        category: EffectCategory::Modulation,
        channel_mode: ChannelMode::Stereo,
        pool_capacity: 4,
        meta: &chorus::META,
    },
    EffectDescriptor {
        type_id: ids::NOISE_GATE,
        key: "gate",
        category: EffectCategory::Dynamics,
        channel_mode: ChannelMode::MonoOrStereo,
        pool_capacity: 4,
        meta: &gate::META,
    },
    EffectDescriptor {
        type_id: ids::GRAPHIC_EQ,
        key: "eq",
        category: EffectCategory::Filter,
        channel_mode: ChannelMode::MonoOrStereo,
        pool_capacity: 4,
        meta: &graphic_eq::META,
    },
];

/// Registry of all effect types the engine can instantiate.
#[derive(Debug, Clone, Copy, Default)]
pub struct EffectRegistry;

impl EffectRegistry {
    /// Creates the registry.
    pub const fn new() -> Self {
        Self
    }

    /// Descriptors for every effect, in type id order.
    pub fn all_effects(&self) -> &'static [EffectDescriptor] {
        &CATALOGUE
    }

    /// Descriptors in one category.
    pub fn effects_in_category(
        &self,
        category: EffectCategory,
    ) -> impl Iterator<Item = &'static EffectDescriptor> {
        CATALOGUE.iter().filter(move |d| d.category == category)
    }

    /// Descriptor for a wire type id.
    pub fn get(&self, type_id: u8) -> Option<&'static EffectDescriptor> {
        CATALOGUE.iter().find(|d| d.type_id == type_id)
    }

    /// Looks up an effect by key, display name or short name (case-insensitive).
    pub fn find(&self, name: &str) -> Option<&'static EffectDescriptor> {
        CATALOGUE.iter().find(|d| {
            d.key.eq_ignore_ascii_case(name)
                || d.meta.name.eq_ignore_ascii_case(name)
                || d.meta.short_name.eq_ignore_ascii_case(name)
        })
    }

    /// Whether `type_id` names an instantiable effect.
    pub fn contains(&self, type_id: u8) -> bool {
        self.get(type_id).is_some()
    }

    /// Builds a standalone, initialized unit with heap-bound buffers.
    ///
    /// The engine never uses this; it draws from its pools.
    #[cfg(feature = "std")]
    pub fn create(&self, type_id: u8, sample_rate: f32) -> Option<Box<dyn EffectUnit>> {
        let mut heap = HeapBuffers::new();
        let mut unit: Box<dyn EffectUnit> = match type_id {
            ids::DELAY => {
                let mut delay = multifx_effects::Delay::new();
                delay.bind_buffers(&mut heap);
                Box::new(delay)
            }
            ids::OVERDRIVE => Box::new(multifx_effects::Overdrive::new()),
            ids::MIXER => Box::new(multifx_effects::Mixer::new()),
            ids::REVERB => {
                let mut reverb = multifx_effects::Reverb::new();
                reverb.bind_buffers(&mut heap);
                Box::new(reverb)
            }
            ids::COMPRESSOR => Box::new(multifx_effects::Compressor::new()),
            ids::CHORUS => Box::new(multifx_effects::Chorus::new()),
            ids::NOISE_GATE => Box::new(multifx_effects::NoiseGate::new()),
            ids::GRAPHIC_EQ => Box::new(multifx_effects::GraphicEq::new()),
            _ => return None,
        };
        unit.init(sample_rate);
        Some(unit)
    }
}
