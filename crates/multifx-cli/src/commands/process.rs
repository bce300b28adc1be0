//! File-based patch rendering command.

use super::common::load_descriptor;
use crate::wav::{StereoSamples, read_stereo, write_stereo};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use multifx_config::default_patch;
use multifx_core::{db_to_linear, linear_to_db};
use multifx_engine::Engine;
use std::path::PathBuf;

#[derive(Args)]
pub struct ProcessArgs {
    /// Input WAV file
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output WAV file (always stereo)
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// Patch name, factory key or TOML file (default: the boot patch)
    #[arg(short, long)]
    patch: Option<String>,

    /// Processing block size in frames
    #[arg(long, default_value = "256")]
    block_size: usize,

    /// Input gain in dB (overrides the patch)
    #[arg(long, allow_negative_numbers = true)]
    input_gain: Option<f32>,

    /// Output gain in dB (overrides the patch)
    #[arg(long, allow_negative_numbers = true)]
    output_gain: Option<f32>,

    /// Tempo in BPM for synced delays
    #[arg(long)]
    tempo: Option<f32>,

    /// Disable the per-slot DC blockers
    #[arg(long)]
    bypass_dc: bool,

    /// Output bit depth (16, 24, or 32)
    #[arg(long, default_value = "32")]
    bit_depth: u16,
}

pub fn run(args: ProcessArgs) -> anyhow::Result<()> {
    if args.block_size == 0 {
        anyhow::bail!("block size must be at least one frame");
    }

    println!("Reading {}...", args.input.display());
    let (input, spec) = read_stereo(&args.input)?;
    let sample_rate = spec.sample_rate as f32;
    println!(
        "  {} frames, {} ch, {} Hz, {:.2}s",
        input.len(),
        spec.channels,
        spec.sample_rate,
        input.len() as f32 / sample_rate
    );

    let mut engine = Engine::with_heap_buffers(sample_rate);

    let (name, patch, file_gains) = match &args.patch {
        Some(name) => {
            let (file, patch) = load_descriptor(name)?;
            (file.name, patch, (file.input_gain_db, file.output_gain_db))
        }
        None => ("Default".to_string(), default_patch(), (None, None)),
    };
    println!("Patch: {} ({} slots)", name, patch.slot_count());
    engine.apply_patch(&patch);

    if let Some(db) = args.input_gain.or(file_gains.0) {
        engine.set_input_gain(db_to_linear(db));
    }
    if let Some(db) = args.output_gain.or(file_gains.1) {
        engine.set_output_gain(db_to_linear(db));
    }
    if let Some(bpm) = args.tempo {
        engine.set_tempo(bpm);
    }
    engine.set_dc_blocking(!args.bypass_dc);

    tracing::info!(
        input_gain = engine.input_gain(),
        output_gain = engine.output_gain(),
        dc_blocking = engine.dc_blocking(),
        block_size = args.block_size,
        "rendering"
    );

    let pb = ProgressBar::new(input.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("##-"),
    );

    let mut output = StereoSamples {
        left: vec![0.0; input.len()],
        right: vec![0.0; input.len()],
    };
    let block = args.block_size;
    let blocks = input
        .left
        .chunks(block)
        .zip(input.right.chunks(block))
        .zip(output.left.chunks_mut(block).zip(output.right.chunks_mut(block)));
    for ((in_l, in_r), (out_l, out_r)) in blocks {
        engine.process_block(in_l, in_r, out_l, out_r);
        pb.inc(in_l.len() as u64);
    }
    pb.finish_with_message("done");

    let (staged_peak, output_peak) = engine.take_peaks();
    println!("\nStats:");
    println!(
        "  Input:  RMS {:.1} dB, Peak {:.1} dB (after input gain {:.1} dB)",
        linear_to_db(input.rms()),
        linear_to_db(input.peak()),
        linear_to_db(staged_peak)
    );
    println!(
        "  Output: RMS {:.1} dB, Peak {:.1} dB",
        linear_to_db(output.rms()),
        linear_to_db(output_peak)
    );

    println!("\nWriting {}...", args.output.display());
    write_stereo(&args.output, &output, spec.sample_rate, args.bit_depth)?;
    println!("Done!");

    Ok(())
}
