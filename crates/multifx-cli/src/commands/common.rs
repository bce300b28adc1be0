//! Shared CLI helpers used across multiple commands.

use anyhow::Context;
use multifx_config::{PatchFile, paths};
use multifx_core::{PatchDescriptor, Tap};

/// Load a patch by path, user/system patch name or factory key.
pub fn load_patch(name: &str) -> anyhow::Result<PatchFile> {
    paths::resolve_patch(name).with_context(|| {
        format!("cannot load patch '{name}'. Use 'multifx patch list' to see available patches.")
    })
}

/// Load a patch and build its descriptor.
pub fn load_descriptor(name: &str) -> anyhow::Result<(PatchFile, PatchDescriptor)> {
    let file = load_patch(name)?;
    let patch = file
        .to_descriptor()
        .with_context(|| format!("patch '{}' does not describe a board", file.name))?;
    Ok((file, patch))
}

/// "in" for the hardware input, the slot index otherwise.
pub fn tap_label(tap: Tap) -> String {
    match tap {
        Tap::Input => "in".to_string(),
        Tap::Slot(k) => k.to_string(),
    }
}
