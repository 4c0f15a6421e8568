// file: src/config/vm.rs
// version: 1.0.0
// guid: f3b06d28-7c4e-4a91-b5d2-e8a1c947063f

//! VM definition structures

use crate::error::VBoxError;
use crate::vbox::NicType;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;

/// Smallest memory size VirtualBox accepts, in MB
pub const MIN_MEMORY_MB: u64 = 4;

/// Highest port and device number on an IDE controller
pub const MAX_IDE_SLOT: u32 = 1;

/// Highest device number on a floppy controller
pub const MAX_FLOPPY_DEVICE: u32 = 1;

/// Declarative description of a VM to provision
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VmDefinition {
    /// VM display name
    pub name: String,
    /// Guest OS type ID as listed by `VBoxManage list ostypes`
    pub os_type: String,
    /// Memory size in MB
    pub memory_mb: u64,
    /// Model of the first network adapter
    #[serde(default)]
    pub nic_type: Option<NicType>,
    /// Hard disks attached to `ide0`
    #[serde(default)]
    pub disks: Vec<DiskConfig>,
    /// Installation medium in a DVD drive on `ide0`
    #[serde(default)]
    pub optical: Option<OpticalConfig>,
    /// Floppy image on `floppy0`
    #[serde(default)]
    pub floppy: Option<FloppyConfig>,
    /// NAT port-forwarding rules on the first adapter
    #[serde(default)]
    pub port_forwards: Vec<PortForward>,
    /// Power the VM on once configured
    #[serde(default)]
    pub start: bool,
}

/// Hard disk attachment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiskConfig {
    /// Disk image path
    pub filename: PathBuf,
    /// Size in MB, required when `create` is set
    #[serde(default)]
    pub size_mb: Option<u64>,
    /// Create the image before attaching it
    #[serde(default = "default_true")]
    pub create: bool,
    #[serde(default)]
    pub port: u32,
    #[serde(default)]
    pub device: u32,
}

/// DVD drive attachment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpticalConfig {
    /// ISO image path
    pub filename: PathBuf,
    #[serde(default = "default_optical_port")]
    pub port: u32,
    #[serde(default)]
    pub device: u32,
}

/// Floppy drive attachment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FloppyConfig {
    /// Floppy image path
    pub filename: PathBuf,
    #[serde(default)]
    pub device: u32,
}

/// TCP port-forwarding rule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortForward {
    /// Rule name, unique per adapter
    pub name: String,
    pub host_port: u16,
    pub guest_port: u16,
}

fn default_true() -> bool {
    true
}

fn default_optical_port() -> u32 {
    1
}

impl VmDefinition {
    /// Minimal definition with no storage or networking changes
    pub fn minimal(name: impl Into<String>, os_type: impl Into<String>, memory_mb: u64) -> Self {
        Self {
            name: name.into(),
            os_type: os_type.into(),
            memory_mb,
            nic_type: None,
            disks: Vec::new(),
            optical: None,
            floppy: None,
            port_forwards: Vec::new(),
            start: false,
        }
    }

    /// Whether anything needs to be attached to `ide0`
    pub fn needs_ide(&self) -> bool {
        !self.disks.is_empty() || self.optical.is_some()
    }

    /// Validate the VM definition
    pub fn validate(&self) -> crate::Result<()> {
        if self.name.trim().is_empty() {
            return Err(VBoxError::validation("VM name cannot be empty"));
        }

        if self.os_type.trim().is_empty() {
            return Err(VBoxError::validation("OS type cannot be empty"));
        }

        if self.memory_mb < MIN_MEMORY_MB {
            return Err(VBoxError::validation(format!(
                "VM memory must be at least {} MB",
                MIN_MEMORY_MB
            )));
        }

        // Disks and the DVD drive share the IDE slots.
        let mut ide_slots = HashSet::new();
        for disk in &self.disks {
            disk.validate()?;
            if !ide_slots.insert((disk.port, disk.device)) {
                return Err(VBoxError::validation(format!(
                    "IDE slot {}:{} is used more than once",
                    disk.port, disk.device
                )));
            }
        }

        if let Some(optical) = &self.optical {
            validate_ide_slot(optical.port, optical.device)?;
            validate_filename(&optical.filename)?;
            if !ide_slots.insert((optical.port, optical.device)) {
                return Err(VBoxError::validation(format!(
                    "IDE slot {}:{} is used more than once",
                    optical.port, optical.device
                )));
            }
        }

        if let Some(floppy) = &self.floppy {
            validate_filename(&floppy.filename)?;
            if floppy.device > MAX_FLOPPY_DEVICE {
                return Err(VBoxError::validation(format!(
                    "Floppy device must be 0-{}, got {}",
                    MAX_FLOPPY_DEVICE, floppy.device
                )));
            }
        }

        let mut rule_names = HashSet::new();
        for forward in &self.port_forwards {
            forward.validate()?;
            if !rule_names.insert(forward.name.as_str()) {
                return Err(VBoxError::validation(format!(
                    "Duplicate port forward rule: {}",
                    forward.name
                )));
            }
        }

        Ok(())
    }
}

impl DiskConfig {
    /// Validate the disk attachment
    pub fn validate(&self) -> crate::Result<()> {
        validate_filename(&self.filename)?;
        validate_ide_slot(self.port, self.device)?;

        if self.create && self.size_mb.map_or(true, |size| size == 0) {
            return Err(VBoxError::validation(format!(
                "Disk {} is created but has no size",
                self.filename.display()
            )));
        }

        Ok(())
    }
}

impl PortForward {
    /// Validate the forwarding rule
    pub fn validate(&self) -> crate::Result<()> {
        if self.name.is_empty() {
            return Err(VBoxError::validation("Port forward rule name cannot be empty"));
        }

        // The rule is passed as a comma-separated tuple.
        if self.name.contains(',') {
            return Err(VBoxError::validation(format!(
                "Port forward rule name cannot contain commas: {}",
                self.name
            )));
        }

        if self.host_port == 0 || self.guest_port == 0 {
            return Err(VBoxError::validation(format!(
                "Port forward rule {} has a zero port",
                self.name
            )));
        }

        Ok(())
    }
}

fn validate_filename(filename: &std::path::Path) -> crate::Result<()> {
    if filename.as_os_str().is_empty() {
        return Err(VBoxError::validation("Medium filename cannot be empty"));
    }
    Ok(())
}

fn validate_ide_slot(port: u32, device: u32) -> crate::Result<()> {
    if port > MAX_IDE_SLOT || device > MAX_IDE_SLOT {
        return Err(VBoxError::validation(format!(
            "IDE slot {}:{} is out of range (0-{})",
            port, device, MAX_IDE_SLOT
        )));
    }
    Ok(())
}
