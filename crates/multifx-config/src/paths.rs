//! Platform-specific paths for patch files.
//!
//! - **User patches**: `~/.config/multifx/patches/` (Linux), `~/Library/Application Support/multifx/patches/` (macOS), `%APPDATA%\multifx\patches\` (Windows)
//! - **System patches**: `/usr/share/multifx/patches/` (Linux), `/Library/Application Support/multifx/patches/` (macOS)
//!
//! # Example
//!
//! ```rust,no_run
//! use multifx_config::paths;
//!
//! // Name, path, or factory key; user files shadow system files and factory patches
//! let patch = paths::resolve_patch("dual_drive").unwrap();
//! println!("{} slots", patch.len());
//! ```

use std::path::{Path, PathBuf};

use crate::{ConfigError, PatchFile, factory};

/// Application name used for directory paths.
const APP_NAME: &str = "multifx";

/// Subdirectory name for patches.
const PATCHES_SUBDIR: &str = "patches";

/// Returns the user-specific patches directory.
///
/// Falls back to `./multifx/patches` if the config directory cannot be
/// determined.
pub fn user_patches_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
        .join(PATCHES_SUBDIR)
}

/// Returns the system-wide patches directory (typically read-only).
pub fn system_patches_dir() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        PathBuf::from("/usr/share")
            .join(APP_NAME)
            .join(PATCHES_SUBDIR)
    }
    #[cfg(target_os = "macos")]
    {
        PathBuf::from("/Library/Application Support")
            .join(APP_NAME)
            .join(PATCHES_SUBDIR)
    }
    #[cfg(not(any(target_os = "linux", target_os = "macos")))]
    {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_NAME)
            .join(PATCHES_SUBDIR)
    }
}

/// Find a patch file by path or name.
///
/// Searches, in order: the name as a path, the user patches directory, the
/// system patches directory. `.toml` is appended to bare names.
pub fn find_patch(name: &str) -> Option<PathBuf> {
    let path = PathBuf::from(name);
    if path.is_file() {
        return Some(path);
    }

    let filename = if name.ends_with(".toml") {
        name.to_string()
    } else {
        format!("{name}.toml")
    };

    [user_patches_dir(), system_patches_dir()]
        .into_iter()
        .map(|dir| dir.join(&filename))
        .find(|candidate| candidate.is_file())
}

/// Loads a patch by path, file name or factory key.
///
/// Files win over factory patches of the same name, so a user can shadow
/// `default` with their own boot patch.
pub fn resolve_patch(name: &str) -> Result<PatchFile, ConfigError> {
    if let Some(path) = find_patch(name) {
        return PatchFile::load(path);
    }
    factory::factory_patch(name).ok_or_else(|| ConfigError::PatchNotFound(name.to_string()))
}

/// Ensure the user patches directory exists.
pub fn ensure_user_patches_dir() -> Result<PathBuf, ConfigError> {
    let dir = user_patches_dir();
    if !dir.exists() {
        std::fs::create_dir_all(&dir).map_err(|e| ConfigError::create_dir(&dir, e))?;
    }
    Ok(dir)
}

/// List all patch files in the user patches directory.
pub fn list_user_patches() -> Vec<PathBuf> {
    list_patches_in_dir(&user_patches_dir())
}

/// List all patch files in the system patches directory.
pub fn list_system_patches() -> Vec<PathBuf> {
    list_patches_in_dir(&system_patches_dir())
}

/// User patches first, then system patches. Duplicate names are kept.
pub fn list_all_patches() -> Vec<PathBuf> {
    let mut patches = list_user_patches();
    patches.extend(list_system_patches());
    patches
}

fn list_patches_in_dir(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut patches: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "toml"))
        .collect();
    patches.sort();
    patches
}

/// Get the patch name from a file path (the file stem).
///
/// ```rust
/// use multifx_config::paths::patch_name_from_path;
/// use std::path::Path;
///
/// let name = patch_name_from_path(Path::new("/path/to/dual_drive.toml"));
/// assert_eq!(name, Some("dual_drive".to_string()));
/// ```
pub fn patch_name_from_path(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn dirs_name_the_app() {
        assert!(user_patches_dir().to_string_lossy().contains("multifx"));
        assert!(system_patches_dir().ends_with("multifx/patches"));
    }

    #[test]
    fn find_patch_by_path() {
        let temp_dir = TempDir::new().unwrap();
        let patch_path = temp_dir.path().join("test.toml");
        fs::write(&patch_path, "name = \"test\"").unwrap();

        assert_eq!(find_patch(patch_path.to_str().unwrap()), Some(patch_path));
        assert!(find_patch("nonexistent_patch_12345").is_none());
    }

    #[test]
    fn resolve_falls_back_to_factory() {
        let patch = resolve_patch("passthrough").unwrap();
        assert_eq!(patch.name, "Passthrough");
        assert!(matches!(
            resolve_patch("nonexistent_patch_12345"),
            Err(ConfigError::PatchNotFound(_))
        ));
    }

    #[test]
    fn resolve_prefers_files() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("mine.toml");
        fs::write(&path, "name = \"Mine\"\n[[slot]]\neffect = \"reverb\"\n").unwrap();
        let patch = resolve_patch(path.to_str().unwrap()).unwrap();
        assert_eq!(patch.name, "Mine");
        assert_eq!(patch.len(), 1);
    }

    #[test]
    fn list_only_toml_files() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("b.toml"), "").unwrap();
        fs::write(temp_dir.path().join("a.toml"), "").unwrap();
        fs::write(temp_dir.path().join("notes.txt"), "").unwrap();

        let patches = list_patches_in_dir(temp_dir.path());
        let names: Vec<_> = patches.iter().filter_map(|p| patch_name_from_path(p)).collect();
        assert_eq!(names, ["a", "b"]);
        assert!(list_patches_in_dir(Path::new("/nonexistent/path/12345")).is_empty());
    }
}
