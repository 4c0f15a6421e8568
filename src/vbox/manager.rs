// file: src/vbox/manager.rs
// version: 1.0.0
// guid: 6a3f91c8-d07e-4b25-8e4a-c5b2f0d7193e

//! High-level VBoxManage operations

use super::locator::locate_vboxmanage;
use super::parser::{chomp_newline, parse_records, Record};
use super::runner::CommandRunner;
use super::types::{NicType, FLOPPY_CONTROLLER, IDE_CONTROLLER, STORAGE_CONTROLLER_NAME_PREFIX};
use crate::error::{VBoxError, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Wrapper around the VBoxManage command-line tool
#[derive(Debug, Clone)]
pub struct VBoxManage {
    runner: CommandRunner,
}

fn strings(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}

fn path_arg(path: &Path) -> Result<String> {
    path.to_str().map(str::to_string).ok_or_else(|| {
        VBoxError::validation(format!("Path is not valid UTF-8: {}", path.display()))
    })
}

impl VBoxManage {
    /// Locate VBoxManage for this platform
    pub fn new() -> Result<Self> {
        Self::locate(None)
    }

    /// Locate VBoxManage, preferring `override_path` when given
    pub fn locate(override_path: Option<&Path>) -> Result<Self> {
        let program = locate_vboxmanage(override_path)?;
        Ok(Self::with_program(program))
    }

    /// Use `program` as-is without checking that it exists
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            runner: CommandRunner::new(program),
        }
    }

    /// Path of the executable this wrapper runs
    pub fn program(&self) -> &Path {
        self.runner.program()
    }

    /// Run a raw VBoxManage command, passing its output through
    pub async fn run_cmd(&self, args: &[String]) -> Result<()> {
        self.runner.run(args).await
    }

    /// Run a raw VBoxManage command and return its stdout
    pub async fn run_cmd_output(&self, args: &[String]) -> Result<String> {
        self.runner.run_output(args).await
    }

    /// Version string reported by `VBoxManage -v`
    pub async fn version(&self) -> Result<String> {
        let output = self.run_cmd_output(&strings(&["-v"])).await?;
        Ok(chomp_newline(&output).to_string())
    }

    /// Enumerate things with `VBoxManage list <kind>`.
    ///
    /// `kind` is usually one of the [`super::ListKind`] constants.
    pub async fn list(&self, kind: &str) -> Result<Vec<Record>> {
        let output = self.run_cmd_output(&strings(&["list", kind])).await?;
        Ok(parse_records(&output))
    }

    /// Create and register a new VM
    pub async fn create_vm(&self, vm_name: &str, os_type: &str) -> Result<()> {
        info!("Creating VM {} ({})", vm_name, os_type);
        self.run_cmd(&strings(&[
            "createvm", "--name", vm_name, "--ostype", os_type, "--register",
        ]))
        .await
    }

    /// Set the VM's memory size in megabytes
    pub async fn set_ram_size(&self, vm_name: &str, ram_mb: u64) -> Result<()> {
        info!("Setting memory of {} to {} MB", vm_name, ram_mb);
        self.run_cmd(&strings(&["modifyvm", vm_name, "--memory", &ram_mb.to_string()]))
            .await
    }

    /// Whether a VM with this name is registered.
    ///
    /// `showvminfo` exiting with 1 means the VM does not exist; any other
    /// non-zero code is reported as an error.
    pub async fn vm_exists(&self, vm_name: &str) -> Result<bool> {
        let args = strings(&["showvminfo", vm_name]);
        match self.runner.status(&args).await? {
            Some(0) => Ok(true),
            Some(1) => {
                debug!("VM {} does not exist", vm_name);
                Ok(false)
            }
            code => Err(VBoxError::command_failed(&args, code, "")),
        }
    }

    /// Create a dynamically allocated disk image
    pub async fn create_hd(&self, hd_filename: &Path, hd_size_mb: u64) -> Result<()> {
        info!("Creating {} MB disk {}", hd_size_mb, hd_filename.display());
        self.run_cmd(&strings(&[
            "createmedium",
            "disk",
            "--filename",
            &path_arg(hd_filename)?,
            "--size",
            &hd_size_mb.to_string(),
            "--variant",
            "Standard",
        ]))
        .await
    }

    /// Add the `ide0` controller unless the VM already has it
    pub async fn ensure_ide(&self, vm_name: &str) -> Result<()> {
        self.ensure_controller(vm_name, "ide", IDE_CONTROLLER).await
    }

    /// Add the `floppy0` controller unless the VM already has it
    pub async fn ensure_floppy_controller(&self, vm_name: &str) -> Result<()> {
        self.ensure_controller(vm_name, "floppy", FLOPPY_CONTROLLER)
            .await
    }

    async fn ensure_controller(&self, vm_name: &str, bus: &str, name: &str) -> Result<()> {
        let controllers = self.storage_controller_names(vm_name).await?;
        if controllers.iter().any(|c| c == name) {
            debug!("{} already has controller {}", vm_name, name);
            return Ok(());
        }

        info!("Adding {} controller {} to {}", bus, name, vm_name);
        self.run_cmd(&strings(&["storagectl", vm_name, "--add", bus, "--name", name]))
            .await
    }

    /// Attach a disk image to the `ide0` controller
    pub async fn attach_ide_hd(
        &self,
        vm_name: &str,
        hd_filename: &Path,
        port: u32,
        device: u32,
    ) -> Result<()> {
        self.attach_ide_medium(vm_name, "hdd", &path_arg(hd_filename)?, port, device)
            .await
    }

    /// Insert an ISO image into a DVD drive on the `ide0` controller
    pub async fn attach_optical(
        &self,
        vm_name: &str,
        iso_filename: &Path,
        port: u32,
        device: u32,
    ) -> Result<()> {
        self.attach_ide_medium(vm_name, "dvddrive", &path_arg(iso_filename)?, port, device)
            .await
    }

    async fn attach_ide_medium(
        &self,
        vm_name: &str,
        kind: &str,
        medium: &str,
        port: u32,
        device: u32,
    ) -> Result<()> {
        info!("Attaching {} {} to {} at {}:{}", kind, medium, vm_name, port, device);
        self.run_cmd(&strings(&[
            "storageattach",
            vm_name,
            "--storagectl",
            IDE_CONTROLLER,
            "--type",
            kind,
            "--medium",
            medium,
            "--port",
            &port.to_string(),
            "--device",
            &device.to_string(),
        ]))
        .await
    }

    /// Eject whatever is in the DVD drive at `port`/`device`
    pub async fn remove_optical(&self, vm_name: &str, port: u32, device: u32) -> Result<()> {
        info!("Ejecting optical medium from {} at {}:{}", vm_name, port, device);
        self.run_cmd(&strings(&[
            "storageattach",
            vm_name,
            "--storagectl",
            IDE_CONTROLLER,
            "--port",
            &port.to_string(),
            "--device",
            &device.to_string(),
            "--medium",
            "emptydrive",
        ]))
        .await
    }

    /// Attach a floppy image to the `floppy0` controller
    pub async fn attach_floppy(
        &self,
        vm_name: &str,
        floppy_image_filename: &Path,
        device: u32,
    ) -> Result<()> {
        let medium = path_arg(floppy_image_filename)?;
        info!("Attaching floppy {} to {} device {}", medium, vm_name, device);
        self.run_cmd(&strings(&[
            "storageattach",
            vm_name,
            "--storagectl",
            FLOPPY_CONTROLLER,
            "--type",
            "fdd",
            "--medium",
            &medium,
            "--device",
            &device.to_string(),
        ]))
        .await
    }

    /// Power on a VM
    pub async fn start_vm(&self, vm_name: &str) -> Result<()> {
        info!("Starting VM {}", vm_name);
        self.run_cmd(&strings(&["startvm", vm_name])).await
    }

    /// Names of the VM's storage controllers, as reported by `showvminfo`
    pub async fn storage_controller_names(&self, vm_name: &str) -> Result<Vec<String>> {
        let output = self
            .run_cmd_output(&strings(&["showvminfo", vm_name]))
            .await?;
        let records = parse_records(&output);
        let entry = records.first().ok_or_else(|| {
            VBoxError::unexpected_output(format!("showvminfo {} printed no information", vm_name))
        })?;

        let names: Vec<String> = entry
            .iter()
            .filter(|(key, _)| key.starts_with(STORAGE_CONTROLLER_NAME_PREFIX))
            .map(|(_, name)| name.clone())
            .collect();
        debug!("Storage controllers of {}: {:?}", vm_name, names);
        Ok(names)
    }

    /// Set the hardware model of the first network adapter
    pub async fn set_nic_type(&self, vm_name: &str, nic_type: NicType) -> Result<()> {
        info!("Setting NIC type of {} to {}", vm_name, nic_type);
        self.run_cmd(&strings(&["modifyvm", vm_name, "--nictype1", nic_type.as_str()]))
            .await
    }

    /// Add a TCP port-forwarding rule to the first adapter's NAT
    pub async fn nat_forward_port(
        &self,
        vm_name: &str,
        rule_name: &str,
        host_port: u16,
        guest_port: u16,
    ) -> Result<()> {
        info!(
            "Forwarding host port {} to guest port {} on {} ({})",
            host_port, guest_port, vm_name, rule_name
        );
        let rule = format!("{},tcp,,{},,{}", rule_name, host_port, guest_port);
        self.run_cmd(&strings(&["modifyvm", vm_name, "--natpf1", &rule]))
            .await
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::vbox::test_support::FakeVBoxManage;

    #[tokio::test]
    async fn test_version_is_chomped() {
        let fake = FakeVBoxManage::new();

        let version = VBoxManage::with_program(fake.path()).version().await.unwrap();

        assert_eq!(version, "7.0.14r161095");
        assert_eq!(fake.calls(), vec!["-v"]);
    }

    #[tokio::test]
    async fn test_list_parses_records() {
        let fake = FakeVBoxManage::new();
        fake.set_output(
            "list",
            "ID:          Other\nDescription: Other/Unknown\n\nID:          Ubuntu_64\nDescription: Ubuntu (64-bit)\n",
        );

        let records = VBoxManage::with_program(fake.path()).list(crate::vbox::ListKind::OSTYPES).await.unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[1]["ID"], "Ubuntu_64");
        assert_eq!(records[1]["Description"], "Ubuntu (64-bit)");
        assert_eq!(fake.calls(), vec!["list ostypes"]);
    }

    #[tokio::test]
    async fn test_simple_operations_build_expected_arguments() {
        let fake = FakeVBoxManage::new();
        let vbox = VBoxManage::with_program(fake.path());

        vbox.create_vm("build box", "Ubuntu_64").await.unwrap();
        vbox.set_ram_size("build box", 2048).await.unwrap();
        vbox.create_hd(Path::new("/vms/disk.vdi"), 8192).await.unwrap();
        vbox.start_vm("build box").await.unwrap();
        vbox.set_nic_type("build box", NicType::PcnetFast3).await.unwrap();
        vbox.nat_forward_port("build box", "ssh", 2222, 22).await.unwrap();

        assert_eq!(
            fake.calls(),
            vec![
                "createvm --name build box --ostype Ubuntu_64 --register",
                "modifyvm build box --memory 2048",
                "createmedium disk --filename /vms/disk.vdi --size 8192 --variant Standard",
                "startvm build box",
                "modifyvm build box --nictype1 Am79C973",
                "modifyvm build box --natpf1 ssh,tcp,,2222,,22",
            ]
        );
    }

    #[tokio::test]
    async fn test_storage_attach_arguments() {
        let fake = FakeVBoxManage::new();
        let vbox = VBoxManage::with_program(fake.path());

        vbox.attach_ide_hd("vm", Path::new("/vms/disk.vdi"), 0, 0).await.unwrap();
        vbox.attach_optical("vm", Path::new("/isos/install.iso"), 1, 0).await.unwrap();
        vbox.remove_optical("vm", 1, 0).await.unwrap();
        vbox.attach_floppy("vm", Path::new("/img/boot.img"), 0).await.unwrap();

        assert_eq!(
            fake.calls(),
            vec![
                "storageattach vm --storagectl ide0 --type hdd --medium /vms/disk.vdi --port 0 --device 0",
                "storageattach vm --storagectl ide0 --type dvddrive --medium /isos/install.iso --port 1 --device 0",
                "storageattach vm --storagectl ide0 --port 1 --device 0 --medium emptydrive",
                "storageattach vm --storagectl floppy0 --type fdd --medium /img/boot.img --device 0",
            ]
        );
    }

    #[tokio::test]
    async fn test_storage_controller_names() {
        let fake = FakeVBoxManage::new();
        fake.set_output(
            "showvminfo",
            "Name:                        vm\nStorage Controller Name (0):  ide0\nStorage Controller Type (0):  PIIX4\nStorage Controller Name (1):  floppy0\n\nNIC 1: disabled\n",
        );

        let names = VBoxManage::with_program(fake.path()).storage_controller_names("vm").await.unwrap();

        assert_eq!(names, vec!["ide0", "floppy0"]);
    }

    #[tokio::test]
    async fn test_storage_controller_names_requires_a_record() {
        let fake = FakeVBoxManage::new();
        fake.set_output("showvminfo", "\n\n");

        let err = VBoxManage::with_program(fake.path()).storage_controller_names("vm").await.unwrap_err();

        assert!(matches!(err, VBoxError::UnexpectedOutput(_)));
    }

    #[tokio::test]
    async fn test_ensure_ide_adds_missing_controller() {
        let fake = FakeVBoxManage::new();
        fake.set_output("showvminfo", "Name: vm\nStorage Controller Name (0): floppy0\n");

        VBoxManage::with_program(fake.path()).ensure_ide("vm").await.unwrap();

        assert_eq!(
            fake.calls(),
            vec!["showvminfo vm", "storagectl vm --add ide --name ide0"]
        );
    }

    #[tokio::test]
    async fn test_ensure_ide_skips_existing_controller() {
        let fake = FakeVBoxManage::new();
        fake.set_output("showvminfo", "Name: vm\nStorage Controller Name (0): ide0\n");

        VBoxManage::with_program(fake.path()).ensure_ide("vm").await.unwrap();

        assert_eq!(fake.calls(), vec!["showvminfo vm"]);
    }

    #[tokio::test]
    async fn test_ensure_floppy_controller_adds_missing_controller() {
        let fake = FakeVBoxManage::new();
        fake.set_output("showvminfo", "Name: vm\nStorage Controller Name (0): ide0\n");

        VBoxManage::with_program(fake.path()).ensure_floppy_controller("vm").await.unwrap();

        assert_eq!(
            fake.calls(),
            vec!["showvminfo vm", "storagectl vm --add floppy --name floppy0"]
        );
    }

    #[tokio::test]
    async fn test_ensure_floppy_controller_skips_existing_controller() {
        let fake = FakeVBoxManage::new();
        fake.set_output("showvminfo", "Name: vm\nStorage Controller Name (0): floppy0\n");

        VBoxManage::with_program(fake.path()).ensure_floppy_controller("vm").await.unwrap();

        assert_eq!(fake.calls(), vec!["showvminfo vm"]);
    }

    #[tokio::test]
    async fn test_vm_exists() {
        let fake = FakeVBoxManage::new();
        let vbox = VBoxManage::with_program(fake.path());

        fake.set_output("showvminfo", "Name: vm\n");
        assert!(vbox.vm_exists("vm").await.unwrap());

        fake.set_exit_code("showvminfo", 1);
        assert!(!vbox.vm_exists("ghost").await.unwrap());
    }

    #[tokio::test]
    async fn test_vm_exists_reports_unexpected_exit_codes() {
        let fake = FakeVBoxManage::new();
        fake.set_exit_code("showvminfo", 2);

        let err = VBoxManage::with_program(fake.path()).vm_exists("vm").await.unwrap_err();

        assert_eq!(err.exit_code(), Some(2));
    }

    #[tokio::test]
    async fn test_failures_propagate() {
        let fake = FakeVBoxManage::new();
        fake.set_exit_code("startvm", 1);

        let err = VBoxManage::with_program(fake.path()).start_vm("vm").await.unwrap_err();

        assert!(matches!(err, VBoxError::CommandFailed { ref command, code: Some(1), .. } if command == "startvm"));
    }
}
