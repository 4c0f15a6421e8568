// file: src/cli/commands.rs
// version: 2.1.0
// guid: c816f4a2-0e7b-4d59-93a1-b7e2d5f08c6d

//! Command implementations for the CLI

use crate::{
    config::ConfigLoader,
    error::VBoxError,
    provision::Provisioner,
    vbox::{locator::VBOXMANAGE_COMMAND, Record, VBoxManage},
    Result,
};
use std::path::Path;
use tracing::{error, info, warn};

/// Print the VirtualBox version
pub async fn version_command(vbox: &VBoxManage) -> Result<()> {
    println!("{}", vbox.version().await?);
    Ok(())
}

/// List things VBoxManage knows about
pub async fn list_command(vbox: &VBoxManage, kind: &str, json_output: bool) -> Result<()> {
    let records = vbox.list(kind).await?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if records.is_empty() {
        info!("Nothing listed for {}", kind);
        return Ok(());
    }

    for (i, record) in records.iter().enumerate() {
        if i > 0 {
            println!();
        }
        print_record(record);
    }

    info!("Found {} {} entries", records.len(), kind);
    Ok(())
}

fn print_record(record: &Record) {
    let width = record.keys().map(|k| k.len()).max().unwrap_or(0) + 1;
    for (key, value) in record {
        println!("{:<width$} {}", format!("{}:", key), value, width = width);
    }
}

/// Report whether a VM is registered.
///
/// A missing VM is reported as an error so the exit status reflects it.
pub async fn exists_command(vbox: &VBoxManage, vm: &str) -> Result<()> {
    if vbox.vm_exists(vm).await? {
        println!("{} exists", vm);
        Ok(())
    } else {
        println!("{} does not exist", vm);
        Err(VBoxError::VmNotFound(vm.to_string()))
    }
}

/// Create and register a VM
pub async fn create_vm_command(vbox: &VBoxManage, name: &str, os_type: &str) -> Result<()> {
    vbox.create_vm(name, os_type).await?;
    info!("VM {} created", name);
    Ok(())
}

/// Set a VM's memory size
pub async fn set_memory_command(vbox: &VBoxManage, vm: &str, memory_mb: u64) -> Result<()> {
    vbox.set_ram_size(vm, memory_mb).await
}

/// Create a virtual hard disk image
pub async fn create_hd_command(vbox: &VBoxManage, filename: &Path, size_mb: u64) -> Result<()> {
    vbox.create_hd(filename, size_mb).await?;
    info!("Disk {} created", filename.display());
    Ok(())
}

/// Attach a disk image to `ide0`
pub async fn attach_hd_command(
    vbox: &VBoxManage,
    vm: &str,
    filename: &Path,
    port: u32,
    device: u32,
) -> Result<()> {
    vbox.ensure_ide(vm).await?;
    vbox.attach_ide_hd(vm, filename, port, device).await
}

/// Insert an ISO image into a DVD drive on `ide0`
pub async fn attach_dvd_command(
    vbox: &VBoxManage,
    vm: &str,
    filename: &Path,
    port: u32,
    device: u32,
) -> Result<()> {
    vbox.ensure_ide(vm).await?;
    vbox.attach_optical(vm, filename, port, device).await
}

/// Eject the medium from a DVD drive
pub async fn eject_dvd_command(vbox: &VBoxManage, vm: &str, port: u32, device: u32) -> Result<()> {
    vbox.remove_optical(vm, port, device).await
}

/// Attach a floppy image to `floppy0`
pub async fn attach_floppy_command(
    vbox: &VBoxManage,
    vm: &str,
    filename: &Path,
    device: u32,
) -> Result<()> {
    vbox.ensure_floppy_controller(vm).await?;
    vbox.attach_floppy(vm, filename, device).await
}

/// Print a VM's storage controller names
pub async fn controllers_command(vbox: &VBoxManage, vm: &str) -> Result<()> {
    let names = vbox.storage_controller_names(vm).await?;
    if names.is_empty() {
        info!("{} has no storage controllers", vm);
    }
    for name in names {
        println!("{}", name);
    }
    Ok(())
}

/// Set the first adapter's NIC type
pub async fn set_nic_command(vbox: &VBoxManage, vm: &str, nic_type: crate::vbox::NicType) -> Result<()> {
    vbox.set_nic_type(vm, nic_type).await
}

/// Add a NAT port-forwarding rule
pub async fn nat_forward_command(
    vbox: &VBoxManage,
    vm: &str,
    rule: &str,
    host_port: u16,
    guest_port: u16,
) -> Result<()> {
    let forward = crate::config::PortForward {
        name: rule.to_string(),
        host_port,
        guest_port,
    };
    forward.validate()?;
    vbox.nat_forward_port(vm, rule, host_port, guest_port).await
}

/// Power on a VM
pub async fn start_command(vbox: &VBoxManage, vm: &str) -> Result<()> {
    vbox.start_vm(vm).await
}

/// Provision a VM from a definition file.
///
/// VBoxManage is only located when the plan is actually applied, so a dry run
/// works on hosts without VirtualBox.
pub async fn provision_command(
    vboxmanage: Option<&Path>,
    definition: &str,
    dry_run: bool,
) -> Result<()> {
    let loader = ConfigLoader::new();
    let definitions_dir = ConfigLoader::definitions_dir();
    let path = loader.resolve_definition(definition, definitions_dir.as_deref())?;
    info!("Loading VM definition from {}", path.display());
    let vm = loader.load_vm_definition(&path)?;

    if dry_run {
        info!("DRY RUN: Would provision VM {}", vm.name);
        for (i, step) in Provisioner::plan(&vm).iter().enumerate() {
            println!("{:>2}. {}", i + 1, Provisioner::describe(step, &vm));
        }
        return Ok(());
    }

    let vbox = VBoxManage::locate(vboxmanage)?;
    Provisioner::new(&vbox).provision(&vm).await
}

/// Check that VBoxManage can be found and run
pub async fn check_prerequisites_command(vboxmanage: Option<&Path>) -> Result<()> {
    info!("Checking prerequisites for VBoxManage operations");

    let vbox = match VBoxManage::locate(vboxmanage) {
        Ok(vbox) => vbox,
        Err(e) => {
            error!("✗ Could not locate VBoxManage: {}", e);
            info!("Install VirtualBox or pass --vboxmanage <PATH>");
            return Err(e);
        }
    };

    let program = vbox.program();
    if program == Path::new(VBOXMANAGE_COMMAND) {
        match which::which(VBOXMANAGE_COMMAND) {
            Ok(path) => info!("✓ {} found at {}", VBOXMANAGE_COMMAND, path.display()),
            Err(e) => {
                error!("✗ {} not found on PATH: {}", VBOXMANAGE_COMMAND, e);
                info!("Install VirtualBox or pass --vboxmanage <PATH>");
                return Err(VBoxError::ToolNotFound(program.to_path_buf()));
            }
        }
    } else {
        info!("✓ Using {}", program.display());
    }

    match vbox.version().await {
        Ok(version) => info!("✓ VirtualBox version {}", version),
        Err(e) => {
            error!("✗ VBoxManage did not run: {}", e);
            return Err(e);
        }
    }

    if let Some(dir) = ConfigLoader::definitions_dir() {
        if dir.is_dir() {
            info!("✓ VM definitions directory: {}", dir.display());
        } else {
            warn!("⚠ VM definitions directory does not exist: {}", dir.display());
        }
    }

    info!("System is ready for VBoxManage operations");
    Ok(())
}
