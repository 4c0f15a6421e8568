// file: src/vbox/locator.rs
// version: 1.0.0
// guid: 2c8d6f41-a3e9-4b07-9d15-e6f0b4a7c392

//! Resolution of the VBoxManage executable path

use crate::error::{VBoxError, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Registry key holding the VirtualBox install location
pub const VIRTUALBOX_REGISTRY_KEY: &str = r"SOFTWARE\Oracle\VirtualBox";

/// Registry value holding the VirtualBox install directory
pub const INSTALL_DIR_VALUE: &str = "InstallDir";

/// File name of the executable inside the install directory
pub const VBOXMANAGE_EXE: &str = "VBoxManage.exe";

/// Bare command name looked up on `PATH` outside Windows
pub const VBOXMANAGE_COMMAND: &str = "VBoxManage";

/// Find the VBoxManage executable.
///
/// An explicit override must point at an existing file. Otherwise Windows
/// reads the install directory from the registry and every other platform
/// relies on `PATH`.
pub fn locate_vboxmanage(override_path: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = override_path {
        if !path.is_file() {
            return Err(VBoxError::ToolNotFound(path.to_path_buf()));
        }
        debug!("Using VBoxManage override: {}", path.display());
        return Ok(path.to_path_buf());
    }

    default_location()
}

#[cfg(windows)]
fn default_location() -> Result<PathBuf> {
    let install_dir =
        super::registry::read_hklm_string(VIRTUALBOX_REGISTRY_KEY, INSTALL_DIR_VALUE)?;
    debug!("VirtualBox InstallDir from registry: {}", install_dir);
    resolve_in_install_dir(Path::new(&install_dir))
}

#[cfg(not(windows))]
fn default_location() -> Result<PathBuf> {
    Ok(PathBuf::from(VBOXMANAGE_COMMAND))
}

/// Join `install_dir` with the executable name, requiring both to exist.
pub fn resolve_in_install_dir(install_dir: &Path) -> Result<PathBuf> {
    if !install_dir.is_dir() {
        return Err(VBoxError::InstallDirNotFound(install_dir.to_path_buf()));
    }

    let path = install_dir.join(VBOXMANAGE_EXE);
    if !path.is_file() {
        return Err(VBoxError::ToolNotFound(path));
    }

    Ok(path)
}
