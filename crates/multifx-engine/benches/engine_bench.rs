//! Criterion benchmarks for the multifx frame loop
//!
//! Run with: cargo bench -p multifx-engine
#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use multifx_core::{PatchDescriptor, SlotDescriptor, Tap};
use multifx_effects::ids;
use multifx_engine::Engine;

const SAMPLE_RATE: f32 = 48000.0;
const BLOCK_SIZES: &[usize] = &[48, 256, 1024];

fn generate_test_signal(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE;
            (2.0 * std::f32::consts::PI * 110.0 * t).sin() * 0.05
        })
        .collect()
}

fn chain(types: &[u8]) -> PatchDescriptor {
    let mut patch = PatchDescriptor::empty();
    for (i, &t) in types.iter().enumerate() {
        let _ = patch.push(SlotDescriptor::chained(i, t));
    }
    patch
}

/// Two parallel branches merged by a mixer, then a shared tail.
fn split_merge() -> PatchDescriptor {
    let mut patch = chain(&[ids::OVERDRIVE, ids::CHORUS, ids::MIXER, ids::REVERB]);
    if let Some(chorus) = patch.slot_mut(1) {
        chorus.input_left = Tap::Input;
        chorus.input_right = Tap::Input;
    }
    if let Some(mixer) = patch.slot_mut(2) {
        mixer.input_left = Tap::Slot(0);
        mixer.input_right = Tap::Slot(1);
    }
    patch
}

fn bench_patches(c: &mut Criterion) {
    let patches = [
        ("empty", PatchDescriptor::empty()),
        (
            "pedalboard",
            chain(&[
                ids::NOISE_GATE,
                ids::COMPRESSOR,
                ids::OVERDRIVE,
                ids::GRAPHIC_EQ,
                ids::CHORUS,
                ids::REVERB,
            ]),
        ),
        ("split_merge", split_merge()),
        (
            "full_board",
            chain(&[
                ids::NOISE_GATE,
                ids::COMPRESSOR,
                ids::OVERDRIVE,
                ids::OVERDRIVE,
                ids::GRAPHIC_EQ,
                ids::CHORUS,
                ids::CHORUS,
                ids::DELAY,
                ids::DELAY,
                ids::REVERB,
                ids::MIXER,
                ids::GRAPHIC_EQ,
            ]),
        ),
    ];

    for (name, patch) in patches {
        let mut engine = Engine::with_heap_buffers(SAMPLE_RATE);
        engine.apply_patch(&patch);
        let mut group = c.benchmark_group(format!("engine/{name}"));

        for &block_size in BLOCK_SIZES {
            let input = generate_test_signal(block_size);
            let mut out_l = vec![0.0; block_size];
            let mut out_r = vec![0.0; block_size];

            group.bench_with_input(
                BenchmarkId::from_parameter(block_size),
                &block_size,
                |b, _| {
                    b.iter(|| {
                        engine.process_block(
                            black_box(&input),
                            black_box(&input),
                            &mut out_l,
                            &mut out_r,
                        );
                        black_box(out_l[0] + out_r[0])
                    })
                },
            );
        }

        group.finish();
    }
}

fn bench_apply_patch(c: &mut Criterion) {
    let mut engine = Engine::with_heap_buffers(SAMPLE_RATE);
    let patch = split_merge();
    c.bench_function("engine/apply_patch", |b| {
        b.iter(|| engine.apply_patch(black_box(&patch)))
    });
}

criterion_group!(benches, bench_patches, bench_apply_patch);
criterion_main!(benches);
