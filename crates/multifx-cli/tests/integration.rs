//! Integration tests for multifx-cli.
//!
//! Tests run the `multifx` binary and check its output and the files it
//! writes.

use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

/// Helper to get the path to the `multifx` binary built by cargo.
fn multifx_bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_multifx"))
}

fn run(args: &[&str]) -> Output {
    multifx_bin()
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run multifx")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn write_sine(path: &Path, channels: u16, frames: usize) {
    let spec = hound::WavSpec {
        channels,
        sample_rate: 48000,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for n in 0..frames {
        let x = (n as f32 * 2.0 * std::f32::consts::PI * 220.0 / 48000.0).sin() * 0.1;
        for _ in 0..channels {
            writer.write_sample(x).unwrap();
        }
    }
    writer.finalize().unwrap();
}

// ---------------------------------------------------------------------------
// `multifx effects`
// ---------------------------------------------------------------------------

#[test]
fn effects_lists_the_catalogue() {
    let output = run(&["effects"]);
    assert!(output.status.success());

    let text = stdout(&output);
    assert!(text.contains("Available Effects"));
    for key in [
        "delay",
        "overdrive",
        "mixer",
        "reverb",
        "compressor",
        "chorus",
        "gate",
        "eq",
    ] {
        assert!(text.contains(key), "listing should contain '{key}'");
    }
}

#[test]
fn effects_json_is_parseable() {
    let output = run(&["effects", "--json"]);
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    let effects = value.as_array().unwrap();
    assert_eq!(effects.len(), 8);
    let reverb = effects.iter().find(|e| e["key"] == "reverb").unwrap();
    assert_eq!(reverb["type_id"], 14);
    assert_eq!(reverb["params"][3]["key"], "pre_delay");
}

#[test]
fn effects_details_and_unknown_names() {
    let output = run(&["effects", "compressor"]);
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("Compressor"));
    assert!(text.contains("threshold"));
    assert!(text.contains("makeup"));

    let output = run(&["effects", "wah"]);
    assert!(!output.status.success());
}

// ---------------------------------------------------------------------------
// `multifx patch`
// ---------------------------------------------------------------------------

#[test]
fn patch_list_shows_factory_patches() {
    let output = run(&["patch", "list"]);
    assert!(output.status.success());
    let text = stdout(&output);
    for name in ["default", "passthrough", "dual_drive", "ambient"] {
        assert!(text.contains(name));
    }
}

#[test]
fn patch_show_prints_the_board() {
    let output = run(&["patch", "show", "dual_drive"]);
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("Dual Drive"));
    assert!(text.contains("mixer"));
    assert!(text.contains("Footswitch 0: toggle bypass (slot 1)"));
}

#[test]
fn patch_validate_reports_forward_taps() {
    let dir = TempDir::new().unwrap();
    let good = dir.path().join("good.toml");
    std::fs::write(&good, "name = \"Good\"\n[[slot]]\neffect = \"overdrive\"\n").unwrap();
    let output = run(&["patch", "validate", good.to_str().unwrap()]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("OK"));

    let bad = dir.path().join("bad.toml");
    std::fs::write(
        &bad,
        "name = \"Bad\"\n[[slot]]\neffect = \"overdrive\"\ninput_left = 1\n\n[[slot]]\neffect = \"reverb\"\n",
    )
    .unwrap();
    let output = run(&["patch", "validate", bad.to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(stdout(&output).contains("1 problem"));
}

#[test]
fn sysex_export_then_import_keeps_the_board() {
    let dir = TempDir::new().unwrap();
    let syx = dir.path().join("ambient.syx");
    let toml = dir.path().join("ambient.toml");

    let output = run(&["patch", "export-sysex", "ambient", "-o", syx.to_str().unwrap()]);
    assert!(output.status.success());
    let bytes = std::fs::read(&syx).unwrap();
    assert_eq!(bytes.first(), Some(&0xF0));
    assert_eq!(bytes.last(), Some(&0xF7));
    assert!(bytes[1..bytes.len() - 1].iter().all(|b| *b < 0x80));

    let output = run(&[
        "patch",
        "import-sysex",
        syx.to_str().unwrap(),
        toml.to_str().unwrap(),
        "--name",
        "Ambient Copy",
    ]);
    assert!(output.status.success());

    let shown = stdout(&run(&["patch", "show", toml.to_str().unwrap()]));
    assert!(shown.contains("Ambient Copy"));
    assert!(shown.contains("chorus"));
    assert!(shown.contains("reverb"));
}

#[test]
fn patch_default_prints_toml() {
    let output = run(&["patch", "default"]);
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("[[slot]]"));
    assert!(text.contains("effect = \"gate\""));
}

// ---------------------------------------------------------------------------
// `multifx process`
// ---------------------------------------------------------------------------

#[test]
fn process_renders_stereo_output() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in.wav");
    let output_path = dir.path().join("out.wav");
    write_sine(&input, 1, 4800);

    let output = run(&[
        "process",
        input.to_str().unwrap(),
        output_path.to_str().unwrap(),
        "--patch",
        "ambient",
        "--input-gain",
        "0",
        "--block-size",
        "100",
    ]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(stdout(&output).contains("Peak"));

    let reader = hound::WavReader::open(&output_path).unwrap();
    assert_eq!(reader.spec().channels, 2);
    assert_eq!(reader.spec().sample_rate, 48000);
    let samples: Vec<f32> = reader.into_samples::<f32>().map(Result::unwrap).collect();
    assert_eq!(samples.len(), 2 * 4800);
    assert!(samples.iter().all(|s| s.is_finite()));
    assert!(samples.iter().any(|s| s.abs() > 0.0));
}

#[test]
fn passthrough_at_unity_keeps_the_signal() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in.wav");
    let output_path = dir.path().join("out.wav");
    write_sine(&input, 2, 480);

    let output = run(&[
        "process",
        input.to_str().unwrap(),
        output_path.to_str().unwrap(),
        "--patch",
        "passthrough",
        "--input-gain",
        "0",
        "--output-gain",
        "0",
    ]);
    assert!(output.status.success());

    let read = |path: &Path| -> Vec<f32> {
        hound::WavReader::open(path)
            .unwrap()
            .into_samples::<f32>()
            .map(Result::unwrap)
            .collect()
    };
    let dry = read(&input);
    let wet = read(&output_path);
    assert_eq!(dry.len(), wet.len());
    for (a, b) in dry.iter().zip(&wet) {
        assert!((a - b).abs() < 1e-5);
    }
}

#[test]
fn process_rejects_missing_patch() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in.wav");
    write_sine(&input, 1, 64);
    let output = run(&[
        "process",
        input.to_str().unwrap(),
        dir.path().join("out.wav").to_str().unwrap(),
        "--patch",
        "no_such_patch_anywhere",
    ]);
    assert!(!output.status.success());
}
