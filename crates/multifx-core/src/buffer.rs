//! Buffer binding for effects with large delay memory.
//!
//! Delay lines and reverb tanks need far more memory than is sensible to
//! embed in a pool slot. The hosting platform owns that memory (SDRAM on the
//! pedal, the heap on desktop) and hands it to each effect once, before the
//! first `init`. The engine itself never allocates.
//!
//! An effect that was never bound passes audio through unchanged.

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std as alloc;

use alloc::boxed::Box;
use alloc::vec;

/// Zero-initialized sample buffer owned by an effect after binding.
pub type SampleBuffer = Box<[f32]>;

/// Supplier of effect buffers.
pub trait BufferSource {
    /// Returns a zeroed buffer of exactly `len` samples, or `None` when the
    /// platform has no memory left for it.
    fn acquire(&mut self, len: usize) -> Option<SampleBuffer>;
}

/// Allocates buffers on the global heap.
///
/// Intended for desktop hosts and tests; embedded targets implement
/// [`BufferSource`] over their external RAM.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeapBuffers {
    allocated: usize,
}

impl HeapBuffers {
    /// Creates a heap source.
    pub const fn new() -> Self {
        Self { allocated: 0 }
    }

    /// Total samples handed out so far.
    pub fn allocated_samples(&self) -> usize {
        self.allocated
    }
}

impl BufferSource for HeapBuffers {
    fn acquire(&mut self, len: usize) -> Option<SampleBuffer> {
        self.allocated += len;
        Some(vec![0.0; len].into_boxed_slice())
    }
}

/// Source that never provides memory. Buffered effects stay unbound.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoBuffers;

impl BufferSource for NoBuffers {
    fn acquire(&mut self, _len: usize) -> Option<SampleBuffer> {
        None
    }
}

/// Acquires one buffer, rejecting any whose length is not `len`.
pub fn acquire_exact(source: &mut dyn BufferSource, len: usize) -> Option<SampleBuffer> {
    source.acquire(len).filter(|buf| buf.len() == len)
}

/// Acquires `N` buffers of exactly `len` samples; all or nothing.
pub fn acquire_array<const N: usize>(
    source: &mut dyn BufferSource,
    len: usize,
) -> Option<[SampleBuffer; N]> {
    let mut out: [Option<SampleBuffer>; N] = core::array::from_fn(|_| None);
    for slot in &mut out {
        *slot = Some(acquire_exact(source, len)?);
    }
    Some(out.map(|b| b.unwrap_or_default()))
}
