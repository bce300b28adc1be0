//! Patch management commands.

use super::common::{load_descriptor, tap_label};
use anyhow::Context;
use clap::{Args, Subcommand};
use multifx_config::sysex::{self, sender};
use multifx_config::{
    FACTORY_PATCH_NAMES, PatchDump, PatchFile, default_patch_file, patch_findings, paths,
};
use multifx_core::{ButtonMode, ChannelPolicy, PatchDescriptor};
use multifx_engine::EffectRegistry;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

#[derive(Args)]
pub struct PatchArgs {
    #[command(subcommand)]
    command: PatchCommand,
}

#[derive(Subcommand)]
enum PatchCommand {
    /// List factory and saved patches
    List,

    /// Print the board a patch describes
    Show {
        /// Patch name, factory key or TOML file
        name: String,
    },

    /// Check routing order and value ranges
    Validate {
        /// Patch name, factory key or TOML file
        name: String,
    },

    /// Encode a patch as a SysEx load message
    ExportSysex {
        /// Patch name, factory key or TOML file
        name: String,

        /// Write raw bytes here instead of printing hex
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Decode a SysEx patch dump or load message into a TOML file
    ImportSysex {
        /// Raw .syx file
        input: PathBuf,

        /// TOML file to write
        output: PathBuf,

        /// Name stored in the file
        #[arg(long, default_value = "Imported")]
        name: String,
    },

    /// Write the boot patch as TOML
    Default {
        /// Output file (stdout when omitted)
        output: Option<PathBuf>,
    },
}

pub fn run(args: PatchArgs) -> anyhow::Result<()> {
    match args.command {
        PatchCommand::List => list(),
        PatchCommand::Show { name } => show(&name),
        PatchCommand::Validate { name } => validate(&name),
        PatchCommand::ExportSysex { name, output } => export_sysex(&name, output),
        PatchCommand::ImportSysex {
            input,
            output,
            name,
        } => import_sysex(&input, &output, &name),
        PatchCommand::Default { output } => write_default(output),
    }
}

fn list() -> anyhow::Result<()> {
    println!("Factory patches:");
    for name in FACTORY_PATCH_NAMES {
        println!("  {name}");
    }

    let saved = paths::list_all_patches();
    println!();
    if saved.is_empty() {
        println!(
            "No saved patches in {}",
            paths::user_patches_dir().display()
        );
    } else {
        println!("Saved patches:");
        for path in saved {
            let name = paths::patch_name_from_path(&path).unwrap_or_default();
            println!("  {:20} {}", name, path.display());
        }
    }
    Ok(())
}

fn show(name: &str) -> anyhow::Result<()> {
    let (file, patch) = load_descriptor(name)?;
    println!("{}", file.name);
    if let Some(description) = &file.description {
        println!("{description}");
    }
    println!();
    print!("{}", board_table(&patch));
    Ok(())
}

/// Slot table followed by the footswitch assignments.
fn board_table(patch: &PatchDescriptor) -> String {
    let registry = EffectRegistry::new();
    let mut out = String::new();
    let _ = writeln!(
        out,
        "  {:>4}  {:12}  {:3}  {:>5}  {:>5}  {:4}  {:>3}  {:>3}  {:12}  {}",
        "Slot", "Effect", "On", "L", "R", "Mono", "Dry", "Wet", "Channels", "Params"
    );
    for (i, slot) in patch.slots().iter().enumerate() {
        let effect = match registry.get(slot.type_id) {
            Some(d) => d.key.to_string(),
            None if slot.is_off() => "-".to_string(),
            None => format!("?{}", slot.type_id),
        };
        let policy = match slot.channel_policy {
            ChannelPolicy::Auto => "auto",
            ChannelPolicy::ForceMono => "force mono",
            ChannelPolicy::ForceStereo => "force stereo",
        };
        let params = slot
            .params()
            .iter()
            .map(|p| {
                let name = registry
                    .get(slot.type_id)
                    .and_then(|d| d.meta.param(p.id))
                    .map_or_else(|| p.id.to_string(), |info| multifx_config::param_key(info.name));
                format!("{name}={}", p.value)
            })
            .collect::<Vec<_>>()
            .join(" ");
        let _ = writeln!(
            out,
            "  {:>4}  {:12}  {:3}  {:>5}  {:>5}  {:4}  {:>3}  {:>3}  {:12}  {}",
            i,
            effect,
            if slot.enabled { "on" } else { "off" },
            tap_label(slot.input_left),
            tap_label(slot.input_right),
            if slot.sum_to_mono { "yes" } else { "" },
            slot.dry,
            slot.wet,
            policy,
            params
        );
    }

    for (i, button) in patch.buttons.iter().enumerate() {
        let action = match button.mode {
            ButtonMode::Unused => continue,
            ButtonMode::ToggleBypass => "toggle bypass",
            ButtonMode::TapTempo => "tap tempo",
        };
        let target = button.slot.map_or_else(|| "-".to_string(), |s| s.to_string());
        let _ = writeln!(out, "  Footswitch {i}: {action} (slot {target})");
    }
    out
}

fn validate(name: &str) -> anyhow::Result<()> {
    let (file, patch) = load_descriptor(name)?;
    let findings = patch_findings(&patch);
    if findings.is_empty() {
        println!("{}: OK ({} slots)", file.name, patch.slot_count());
        return Ok(());
    }

    println!("{}: {} problem(s)", file.name, findings.len());
    for finding in &findings {
        println!("  {finding}");
    }
    anyhow::bail!("patch '{}' failed validation", file.name)
}

fn export_sysex(name: &str, output: Option<PathBuf>) -> anyhow::Result<()> {
    let (file, patch) = load_descriptor(name)?;
    let mut dump = PatchDump::new(patch);
    if let Some(db) = file.input_gain_db {
        dump.input_gain_db = db;
    }
    if let Some(db) = file.output_gain_db {
        dump.output_gain_db = db;
    }
    let bytes = sysex::encode_load_patch(sender::APP, &dump);

    match output {
        Some(path) => {
            std::fs::write(&path, &bytes)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Wrote {} bytes to {}", bytes.len(), path.display());
        }
        None => println!("{}", hex(&bytes)),
    }
    Ok(())
}

fn import_sysex(input: &Path, output: &Path, name: &str) -> anyhow::Result<()> {
    let bytes =
        std::fs::read(input).with_context(|| format!("failed to read {}", input.display()))?;
    let dump = sysex::decode_patch(&bytes)
        .with_context(|| format!("{} is not a patch message", input.display()))?;

    let mut file = PatchFile::from_descriptor(name, &dump.patch);
    file.input_gain_db = Some(dump.input_gain_db);
    file.output_gain_db = Some(dump.output_gain_db);
    file.save(output)?;
    println!(
        "Wrote {} ({} slots) to {}",
        name,
        dump.patch.slot_count(),
        output.display()
    );
    Ok(())
}

fn write_default(output: Option<PathBuf>) -> anyhow::Result<()> {
    let file = default_patch_file();
    match output {
        Some(path) => {
            file.save(&path)?;
            println!("Wrote {}", path.display());
        }
        None => print!("{}", file.to_toml()?),
    }
    Ok(())
}

/// Space-separated uppercase hex.
fn hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}
