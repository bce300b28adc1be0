//! Fixed-capacity effect pools.
//!
//! Every effect type has a pre-built array of instances and a cursor. A patch
//! takes instances in slot order with [`EffectPools::instantiate`]; once a
//! type's cursor reaches its capacity further requests return `None` and the
//! slot stays empty. [`EffectPools::reset`] rewinds every cursor without
//! touching the instances, which keep their old state until re-initialized.
//!
//! Nothing here allocates after construction. Delay and reverb memory is
//! bound once, from the [`BufferSource`] passed to [`EffectPools::new`].

use multifx_core::{BufferSource, EffectUnit};
use multifx_effects::{
    Chorus, Compressor, Delay, GraphicEq, Mixer, NoiseGate, Overdrive, Reverb, ids,
};

/// Pooled effect type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectKind {
    /// [`Delay`].
    Delay,
    /// [`Overdrive`].
    Overdrive,
    /// [`Mixer`].
    Mixer,
    /// [`Reverb`].
    Reverb,
    /// [`Compressor`].
    Compressor,
    /// [`Chorus`].
    Chorus,
    /// [`NoiseGate`].
    NoiseGate,
    /// [`GraphicEq`].
    GraphicEq,
}

impl EffectKind {
    /// Every pooled kind.
    pub const ALL: [EffectKind; 8] = [
        EffectKind::Delay,
        EffectKind::Overdrive,
        EffectKind::Mixer,
        EffectKind::Reverb,
        EffectKind::Compressor,
        EffectKind::Chorus,
        EffectKind::NoiseGate,
        EffectKind::GraphicEq,
    ];

    /// Kind for a wire type id.
    pub const fn from_type_id(type_id: u8) -> Option<Self> {
        Some(match type_id {
            ids::DELAY => EffectKind::Delay,
            ids::OVERDRIVE => EffectKind::Overdrive,
            ids::MIXER => EffectKind::Mixer,
            ids::REVERB => EffectKind::Reverb,
            ids::COMPRESSOR => EffectKind::Compressor,
            ids::CHORUS => EffectKind::Chorus,
            ids::NOISE_GATE => EffectKind::NoiseGate,
            ids::GRAPHIC_EQ => EffectKind::GraphicEq,
            _ => return None,
        })
    }

    /// Wire type id.
    pub const fn type_id(self) -> u8 {
        match self {
            EffectKind::Delay => ids::DELAY,
            EffectKind::Overdrive => ids::OVERDRIVE,
            EffectKind::Mixer => ids::MIXER,
            EffectKind::Reverb => ids::REVERB,
            EffectKind::Compressor => ids::COMPRESSOR,
            EffectKind::Chorus => ids::CHORUS,
            EffectKind::NoiseGate => ids::NOISE_GATE,
            EffectKind::GraphicEq => ids::GRAPHIC_EQ,
        }
    }

    /// Instances reserved for this kind.
    pub const fn capacity(self) -> usize {
        match self {
            EffectKind::Delay => DELAYS,
            EffectKind::Overdrive => OVERDRIVES,
            EffectKind::Mixer => MIXERS,
            EffectKind::Reverb => REVERBS,
            EffectKind::Compressor => COMPRESSORS,
            EffectKind::Chorus => CHORUSES,
            EffectKind::NoiseGate => GATES,
            EffectKind::GraphicEq => EQS,
        }
    }
}

const DELAYS: usize = 2;
const OVERDRIVES: usize = 4;
const MIXERS: usize = 2;
const REVERBS: usize = 2;
const COMPRESSORS: usize = 4;
const CHORUSES: usize = 4;
const GATES: usize = 4;
const EQS: usize = 4;

/// Reference to a pooled instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EffectHandle {
    kind: EffectKind,
    index: u8,
}

impl EffectHandle {
    /// Pooled type.
    pub fn kind(&self) -> EffectKind {
        self.kind
    }

    /// Index within the type's pool.
    pub fn index(&self) -> usize {
        usize::from(self.index)
    }
}

/// One type's instances and hand-out cursor.
#[derive(Debug)]
struct Bank<T, const N: usize> {
    units: [T; N],
    cursor: usize,
}

impl<T, const N: usize> Bank<T, N> {
    fn new(make: impl FnMut(usize) -> T) -> Self {
        Self {
            units: core::array::from_fn(make),
            cursor: 0,
        }
    }

    fn take(&mut self) -> Option<usize> {
        (self.cursor < N).then(|| {
            self.cursor += 1;
            self.cursor - 1
        })
    }
}

/// Fixed-capacity pools for every effect type.
pub struct EffectPools {
    delays: Bank<Delay, DELAYS>,
    overdrives: Bank<Overdrive, OVERDRIVES>,
    mixers: Bank<Mixer, MIXERS>,
    reverbs: Bank<Reverb, REVERBS>,
    compressors: Bank<Compressor, COMPRESSORS>,
    choruses: Bank<Chorus, CHORUSES>,
    gates: Bank<NoiseGate, GATES>,
    eqs: Bank<GraphicEq, EQS>,
}

impl EffectPools {
    /// Builds every pool and binds delay and reverb memory from `buffers`.
    ///
    /// Units whose memory cannot be bound still instantiate but pass audio
    /// through.
    pub fn new(buffers: &mut dyn BufferSource) -> Self {
        let delays = Bank::new(|_| {
            let mut delay = Delay::new();
            if !delay.bind_buffers(&mut *buffers) {
                #[cfg(feature = "tracing")]
                tracing::warn!("delay memory unavailable; delay will pass through");
            }
            delay
        });
        let reverbs = Bank::new(|_| {
            let mut reverb = Reverb::new();
            if !reverb.bind_buffers(&mut *buffers) {
                #[cfg(feature = "tracing")]
                tracing::warn!("reverb memory unavailable; reverb will pass through");
            }
            reverb
        });
        Self {
            delays,
            overdrives: Bank::new(|_| Overdrive::new()),
            mixers: Bank::new(|_| Mixer::new()),
            reverbs,
            compressors: Bank::new(|_| Compressor::new()),
            choruses: Bank::new(|_| Chorus::new()),
            gates: Bank::new(|_| NoiseGate::new()),
            eqs: Bank::new(|_| GraphicEq::new()),
        }
    }

    /// Rewinds every cursor, logically freeing all instances.
    pub fn reset(&mut self) {
        self.delays.cursor = 0;
        self.overdrives.cursor = 0;
        self.mixers.cursor = 0;
        self.reverbs.cursor = 0;
        self.compressors.cursor = 0;
        self.choruses.cursor = 0;
        self.gates.cursor = 0;
        self.eqs.cursor = 0;
    }

    /// Hands out the next free instance of `type_id`.
    ///
    /// Returns `None` for unknown types and exhausted pools.
    pub fn instantiate(&mut self, type_id: u8) -> Option<EffectHandle> {
        let kind = EffectKind::from_type_id(type_id)?;
        let index = match kind {
            EffectKind::Delay => self.delays.take(),
            EffectKind::Overdrive => self.overdrives.take(),
            EffectKind::Mixer => self.mixers.take(),
            EffectKind::Reverb => self.reverbs.take(),
            EffectKind::Compressor => self.compressors.take(),
            EffectKind::Chorus => self.choruses.take(),
            EffectKind::NoiseGate => self.gates.take(),
            EffectKind::GraphicEq => self.eqs.take(),
        }?;
        Some(EffectHandle {
            kind,
            index: index as u8,
        })
    }

    /// The instance behind `handle`.
    pub fn get_mut(&mut self, handle: EffectHandle) -> Option<&mut dyn EffectUnit> {
        let i = handle.index();
        let unit: &mut dyn EffectUnit = match handle.kind {
            EffectKind::Delay => self.delays.units.get_mut(i)?,
            EffectKind::Overdrive => self.overdrives.units.get_mut(i)?,
            EffectKind::Mixer => self.mixers.units.get_mut(i)?,
            EffectKind::Reverb => self.reverbs.units.get_mut(i)?,
            EffectKind::Compressor => self.compressors.units.get_mut(i)?,
            EffectKind::Chorus => self.choruses.units.get_mut(i)?,
            EffectKind::NoiseGate => self.gates.units.get_mut(i)?,
            EffectKind::GraphicEq => self.eqs.units.get_mut(i)?,
        };
        Some(unit)
    }

    /// Shared access to the instance behind `handle`.
    pub fn get(&self, handle: EffectHandle) -> Option<&dyn EffectUnit> {
        let i = handle.index();
        let unit: &dyn EffectUnit = match handle.kind {
            EffectKind::Delay => self.delays.units.get(i)?,
            EffectKind::Overdrive => self.overdrives.units.get(i)?,
            EffectKind::Mixer => self.mixers.units.get(i)?,
            EffectKind::Reverb => self.reverbs.units.get(i)?,
            EffectKind::Compressor => self.compressors.units.get(i)?,
            EffectKind::Chorus => self.choruses.units.get(i)?,
            EffectKind::NoiseGate => self.gates.units.get(i)?,
            EffectKind::GraphicEq => self.eqs.units.get(i)?,
        };
        Some(unit)
    }

    /// Pool size for `type_id` (0 for unknown types).
    pub fn capacity(&self, type_id: u8) -> usize {
        EffectKind::from_type_id(type_id).map_or(0, EffectKind::capacity)
    }

    /// Instances of `type_id` handed out since the last reset.
    pub fn in_use(&self, type_id: u8) -> usize {
        match EffectKind::from_type_id(type_id) {
            Some(EffectKind::Delay) => self.delays.cursor,
            Some(EffectKind::Overdrive) => self.overdrives.cursor,
            Some(EffectKind::Mixer) => self.mixers.cursor,
            Some(EffectKind::Reverb) => self.reverbs.cursor,
            Some(EffectKind::Compressor) => self.compressors.cursor,
            Some(EffectKind::Chorus) => self.choruses.cursor,
            Some(EffectKind::NoiseGate) => self.gates.cursor,
            Some(EffectKind::GraphicEq) => self.eqs.cursor,
            None => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use multifx_core::{HeapBuffers, NoBuffers};

    #[test]
    fn capacities_match_registry() {
        let registry = crate::EffectRegistry::new();
        for kind in EffectKind::ALL {
            let d = registry.get(kind.type_id()).unwrap();
            assert_eq!(d.pool_capacity, kind.capacity());
            assert_eq!(EffectKind::from_type_id(kind.type_id()), Some(kind));
        }
    }

    #[test]
    fn exhaustion_and_reset() {
        let mut pools = EffectPools::new(&mut NoBuffers);
        let a = pools.instantiate(ids::DELAY).unwrap();
        let b = pools.instantiate(ids::DELAY).unwrap();
        assert_ne!(a, b);
        assert_eq!(pools.instantiate(ids::DELAY), None);
        assert_eq!(pools.in_use(ids::DELAY), 2);

        pools.reset();
        assert_eq!(pools.in_use(ids::DELAY), 0);
        assert_eq!(pools.instantiate(ids::DELAY), Some(a));
    }

    #[test]
    fn unknown_types_never_instantiate() {
        let mut pools = EffectPools::new(&mut NoBuffers);
        assert_eq!(pools.instantiate(0), None);
        assert_eq!(pools.instantiate(99), None);
        assert_eq!(pools.capacity(99), 0);
    }

    #[test]
    fn handles_resolve_to_matching_units() {
        let mut pools = EffectPools::new(&mut HeapBuffers::new());
        for kind in EffectKind::ALL {
            for _ in 0..kind.capacity() {
                let handle = pools.instantiate(kind.type_id()).unwrap();
                let unit = pools.get_mut(handle).unwrap();
                assert_eq!(unit.type_id(), kind.type_id());
            }
            assert_eq!(pools.instantiate(kind.type_id()), None);
        }
    }

    #[test]
    fn buffers_bound_once_at_construction() {
        let mut heap = HeapBuffers::new();
        let _pools = EffectPools::new(&mut heap);
        let per_delay = 2 * Delay::BUFFER_LEN;
        let per_reverb = Reverb::MAX_PRE_DELAY + 8 * Reverb::MAX_COMB + 4 * Reverb::MAX_ALLPASS;
        assert_eq!(heap.allocated_samples(), DELAYS * per_delay + REVERBS * per_reverb);
    }
}
