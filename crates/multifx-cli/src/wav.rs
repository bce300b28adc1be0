//! Stereo WAV reading and writing.

use anyhow::Context;
use hound::{SampleFormat, WavReader, WavWriter};
use std::path::Path;

/// Planar stereo audio.
#[derive(Debug, Clone, Default)]
pub struct StereoSamples {
    pub left: Vec<f32>,
    pub right: Vec<f32>,
}

impl StereoSamples {
    /// Number of frames.
    pub fn len(&self) -> usize {
        self.left.len()
    }

    /// Loudest absolute sample over both channels.
    pub fn peak(&self) -> f32 {
        self.left
            .iter()
            .chain(&self.right)
            .map(|s| s.abs())
            .fold(0.0, f32::max)
    }

    /// RMS over both channels.
    pub fn rms(&self) -> f32 {
        let count = self.left.len() + self.right.len();
        if count == 0 {
            return 0.0;
        }
        let sum: f32 = self.left.iter().chain(&self.right).map(|s| s * s).sum();
        (sum / count as f32).sqrt()
    }
}

/// Reads a WAV file as stereo.
///
/// Mono files are duplicated to both channels. Files with more than two
/// channels keep the first two.
pub fn read_stereo(path: &Path) -> anyhow::Result<(StereoSamples, hound::WavSpec)> {
    let reader =
        WavReader::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let spec = reader.spec();
    let channels = spec.channels as usize;

    let interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<Result<Vec<_>, _>>()?,
        SampleFormat::Int => {
            let max_val = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max_val))
                .collect::<Result<Vec<_>, _>>()?
        }
    };

    let mut samples = StereoSamples::default();
    for frame in interleaved.chunks_exact(channels.max(1)) {
        let left = frame[0];
        let right = if channels > 1 { frame[1] } else { left };
        samples.left.push(left);
        samples.right.push(right);
    }
    Ok((samples, spec))
}

/// Writes planar stereo. 32-bit output is float, 16 and 24 are PCM.
pub fn write_stereo(
    path: &Path,
    samples: &StereoSamples,
    sample_rate: u32,
    bits_per_sample: u16,
) -> anyhow::Result<()> {
    if !matches!(bits_per_sample, 16 | 24 | 32) {
        anyhow::bail!("unsupported bit depth {bits_per_sample} (expected 16, 24 or 32)");
    }
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate,
        bits_per_sample,
        sample_format: if bits_per_sample == 32 {
            SampleFormat::Float
        } else {
            SampleFormat::Int
        },
    };
    let mut writer = WavWriter::create(path, spec)
        .with_context(|| format!("failed to create {}", path.display()))?;

    let frames = samples.left.iter().zip(&samples.right);
    if bits_per_sample == 32 {
        for (&l, &r) in frames {
            writer.write_sample(l)?;
            writer.write_sample(r)?;
        }
    } else {
        let max_val = (1i32 << (bits_per_sample - 1)) as f32;
        let quantize = |s: f32| (s * max_val).clamp(-max_val, max_val - 1.0) as i32;
        for (&l, &r) in frames {
            writer.write_sample(quantize(l))?;
            writer.write_sample(quantize(r))?;
        }
    }

    writer.finalize()?;
    Ok(())
}
