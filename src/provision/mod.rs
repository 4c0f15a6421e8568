// file: src/provision/mod.rs
// version: 1.1.0
// guid: 5c2b8e07-f4a1-4d36-9a7f-1e6d03b8c2a9

//! Provisioning of a VM from a [`VmDefinition`]

use crate::config::VmDefinition;
use crate::error::VBoxError;
use crate::logging::logger::with_async_operation_span;
use crate::vbox::{VBoxManage, FLOPPY_CONTROLLER, IDE_CONTROLLER};
use crate::Result;
use std::fmt;
use tracing::info;

/// One VBoxManage operation performed while provisioning
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisionStep {
    CreateVm,
    SetMemory,
    SetNicType,
    CreateDisk(usize),
    EnsureIde,
    AttachDisk(usize),
    AttachOptical,
    EnsureFloppyController,
    AttachFloppy,
    ForwardPort(usize),
    Start,
}

impl ProvisionStep {
    /// Operation name recorded on the step's tracing span
    pub fn operation(&self) -> &'static str {
        match self {
            ProvisionStep::CreateVm => "create_vm",
            ProvisionStep::SetMemory => "set_ram_size",
            ProvisionStep::SetNicType => "set_nic_type",
            ProvisionStep::CreateDisk(_) => "create_hd",
            ProvisionStep::EnsureIde => "ensure_ide",
            ProvisionStep::AttachDisk(_) => "attach_ide_hd",
            ProvisionStep::AttachOptical => "attach_optical",
            ProvisionStep::EnsureFloppyController => "ensure_floppy_controller",
            ProvisionStep::AttachFloppy => "attach_floppy",
            ProvisionStep::ForwardPort(_) => "nat_forward_port",
            ProvisionStep::Start => "start_vm",
        }
    }
}

/// A step paired with the definition it reads from, for display
pub struct StepDescription<'a> {
    step: &'a ProvisionStep,
    definition: &'a VmDefinition,
}

impl fmt::Display for StepDescription<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let vm = self.definition;
        match self.step {
            ProvisionStep::CreateVm => write!(f, "create VM {} ({})", vm.name, vm.os_type),
            ProvisionStep::SetMemory => write!(f, "set memory to {} MB", vm.memory_mb),
            ProvisionStep::SetNicType => match vm.nic_type {
                Some(nic) => write!(f, "set NIC type to {}", nic),
                None => write!(f, "keep default NIC type"),
            },
            ProvisionStep::CreateDisk(i) => {
                let disk = &vm.disks[*i];
                write!(
                    f,
                    "create {} MB disk {}",
                    disk.size_mb.unwrap_or_default(),
                    disk.filename.display()
                )
            }
            ProvisionStep::EnsureIde => write!(f, "ensure controller {}", IDE_CONTROLLER),
            ProvisionStep::AttachDisk(i) => {
                let disk = &vm.disks[*i];
                write!(
                    f,
                    "attach disk {} at {}:{}",
                    disk.filename.display(),
                    disk.port,
                    disk.device
                )
            }
            ProvisionStep::AttachOptical => match &vm.optical {
                Some(optical) => write!(
                    f,
                    "insert {} at {}:{}",
                    optical.filename.display(),
                    optical.port,
                    optical.device
                ),
                None => write!(f, "no optical medium"),
            },
            ProvisionStep::EnsureFloppyController => {
                write!(f, "ensure controller {}", FLOPPY_CONTROLLER)
            }
            ProvisionStep::AttachFloppy => match &vm.floppy {
                Some(floppy) => write!(
                    f,
                    "attach floppy {} at device {}",
                    floppy.filename.display(),
                    floppy.device
                ),
                None => write!(f, "no floppy image"),
            },
            ProvisionStep::ForwardPort(i) => {
                let rule = &vm.port_forwards[*i];
                write!(
                    f,
                    "forward host port {} to guest port {} ({})",
                    rule.host_port, rule.guest_port, rule.name
                )
            }
            ProvisionStep::Start => write!(f, "start VM"),
        }
    }
}

/// Applies a VM definition through VBoxManage
pub struct Provisioner<'a> {
    vbox: &'a VBoxManage,
}

impl<'a> Provisioner<'a> {
    pub fn new(vbox: &'a VBoxManage) -> Self {
        Self { vbox }
    }

    /// Steps `provision` would perform for `definition`, in order
    pub fn plan(definition: &VmDefinition) -> Vec<ProvisionStep> {
        let mut steps = vec![ProvisionStep::CreateVm, ProvisionStep::SetMemory];

        if definition.nic_type.is_some() {
            steps.push(ProvisionStep::SetNicType);
        }

        for (i, disk) in definition.disks.iter().enumerate() {
            if disk.create {
                steps.push(ProvisionStep::CreateDisk(i));
            }
        }

        if definition.needs_ide() {
            steps.push(ProvisionStep::EnsureIde);
        }
        steps.extend((0..definition.disks.len()).map(ProvisionStep::AttachDisk));
        if definition.optical.is_some() {
            steps.push(ProvisionStep::AttachOptical);
        }

        if definition.floppy.is_some() {
            steps.push(ProvisionStep::EnsureFloppyController);
            steps.push(ProvisionStep::AttachFloppy);
        }

        steps.extend((0..definition.port_forwards.len()).map(ProvisionStep::ForwardPort));

        if definition.start {
            steps.push(ProvisionStep::Start);
        }

        steps
    }

    /// Human-readable form of a step
    pub fn describe<'s>(step: &'s ProvisionStep, definition: &'s VmDefinition) -> StepDescription<'s> {
        StepDescription { step, definition }
    }

    /// Create and configure the VM described by `definition`.
    ///
    /// Refuses to touch a VM that is already registered. Stops at the first
    /// failing step; steps already performed are not rolled back.
    pub async fn provision(&self, definition: &VmDefinition) -> Result<()> {
        definition.validate()?;

        if self.vbox.vm_exists(&definition.name).await? {
            return Err(VBoxError::VmAlreadyExists(definition.name.clone()));
        }

        let steps = Self::plan(definition);
        let total = steps.len();
        for (i, step) in steps.iter().enumerate() {
            with_async_operation_span(step.operation(), || async {
                info!("[{}/{}] {}", i + 1, total, Self::describe(step, definition));
                self.apply(step, definition).await
            })
            .await?;
        }

        info!("VM {} provisioned", definition.name);
        Ok(())
    }

    async fn apply(&self, step: &ProvisionStep, vm: &VmDefinition) -> Result<()> {
        let name = vm.name.as_str();
        match step {
            ProvisionStep::CreateVm => self.vbox.create_vm(name, &vm.os_type).await,
            ProvisionStep::SetMemory => self.vbox.set_ram_size(name, vm.memory_mb).await,
            ProvisionStep::SetNicType => match vm.nic_type {
                Some(nic) => self.vbox.set_nic_type(name, nic).await,
                None => Ok(()),
            },
            ProvisionStep::CreateDisk(i) => {
                let disk = &vm.disks[*i];
                self.vbox
                    .create_hd(&disk.filename, disk.size_mb.unwrap_or_default())
                    .await
            }
            ProvisionStep::EnsureIde => self.vbox.ensure_ide(name).await,
            ProvisionStep::AttachDisk(i) => {
                let disk = &vm.disks[*i];
                self.vbox
                    .attach_ide_hd(name, &disk.filename, disk.port, disk.device)
                    .await
            }
            ProvisionStep::AttachOptical => match &vm.optical {
                Some(optical) => {
                    self.vbox
                        .attach_optical(name, &optical.filename, optical.port, optical.device)
                        .await
                }
                None => Ok(()),
            },
            ProvisionStep::EnsureFloppyController => {
                self.vbox.ensure_floppy_controller(name).await
            }
            ProvisionStep::AttachFloppy => match &vm.floppy {
                Some(floppy) => {
                    self.vbox
                        .attach_floppy(name, &floppy.filename, floppy.device)
                        .await
                }
                None => Ok(()),
            },
            ProvisionStep::ForwardPort(i) => {
                let rule = &vm.port_forwards[*i];
                self.vbox
                    .nat_forward_port(name, &rule.name, rule.host_port, rule.guest_port)
                    .await
            }
            ProvisionStep::Start => self.vbox.start_vm(name).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DiskConfig, FloppyConfig, OpticalConfig, PortForward};
    use crate::vbox::NicType;
    use std::path::PathBuf;

    fn full_definition() -> VmDefinition {
        let mut vm = VmDefinition::minimal("builder", "Ubuntu_64", 2048);
        vm.nic_type = Some(NicType::PcnetPci2);
        vm.disks.push(DiskConfig {
            filename: PathBuf::from("/vms/builder.vdi"),
            size_mb: Some(8192),
            create: true,
            port: 0,
            device: 0,
        });
        vm.disks.push(DiskConfig {
            filename: PathBuf::from("/vms/data.vdi"),
            size_mb: None,
            create: false,
            port: 0,
            device: 1,
        });
        vm.optical = Some(OpticalConfig {
            filename: PathBuf::from("/isos/ubuntu.iso"),
            port: 1,
            device: 0,
        });
        vm.floppy = Some(FloppyConfig {
            filename: PathBuf::from("/img/seed.img"),
            device: 0,
        });
        vm.port_forwards.push(PortForward {
            name: "ssh".to_string(),
            host_port: 2222,
            guest_port: 22,
        });
        vm.start = true;
        vm
    }

    #[test]
    fn test_plan_for_minimal_definition() {
        let vm = VmDefinition::minimal("builder", "Ubuntu_64", 2048);

        assert_eq!(
            Provisioner::plan(&vm),
            vec![ProvisionStep::CreateVm, ProvisionStep::SetMemory]
        );
    }

    #[test]
    fn test_plan_orders_storage_before_network_and_start() {
        let vm = full_definition();

        assert_eq!(
            Provisioner::plan(&vm),
            vec![
                ProvisionStep::CreateVm,
                ProvisionStep::SetMemory,
                ProvisionStep::SetNicType,
                ProvisionStep::CreateDisk(0),
                ProvisionStep::EnsureIde,
                ProvisionStep::AttachDisk(0),
                ProvisionStep::AttachDisk(1),
                ProvisionStep::AttachOptical,
                ProvisionStep::EnsureFloppyController,
                ProvisionStep::AttachFloppy,
                ProvisionStep::ForwardPort(0),
                ProvisionStep::Start,
            ]
        );
    }

    #[test]
    fn test_describe_steps() {
        let vm = full_definition();

        assert_eq!(
            Provisioner::describe(&ProvisionStep::CreateDisk(0), &vm).to_string(),
            "create 8192 MB disk /vms/builder.vdi"
        );
        assert_eq!(
            Provisioner::describe(&ProvisionStep::ForwardPort(0), &vm).to_string(),
            "forward host port 2222 to guest port 22 (ssh)"
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_provision_minimal_definition() {
        use crate::vbox::test_support::FakeVBoxManage;

        let fake = FakeVBoxManage::new();
        fake.set_exit_code("showvminfo", 1);
        let vbox = VBoxManage::with_program(fake.path());
        let vm = VmDefinition::minimal("builder", "Ubuntu_64", 2048);

        Provisioner::new(&vbox).provision(&vm).await.unwrap();

        assert_eq!(
            fake.calls(),
            vec![
                "showvminfo builder",
                "createvm --name builder --ostype Ubuntu_64 --register",
                "modifyvm builder --memory 2048",
            ]
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_provision_full_definition() {
        use crate::vbox::test_support::FakeVBoxManage;

        let fake = FakeVBoxManage::new();
        // Not registered for the existence check, then a fresh VM with no
        // controllers for the two ensure steps.
        fake.set_exit_code_once("showvminfo", 1);
        fake.set_output("showvminfo", "Name: builder\nMemory size: 2048MB\n");
        let vbox = VBoxManage::with_program(fake.path());

        Provisioner::new(&vbox).provision(&full_definition()).await.unwrap();

        assert_eq!(
            fake.calls(),
            vec![
                "showvminfo builder",
                "createvm --name builder --ostype Ubuntu_64 --register",
                "modifyvm builder --memory 2048",
                "modifyvm builder --nictype1 Am79C970A",
                "createmedium disk --filename /vms/builder.vdi --size 8192 --variant Standard",
                "showvminfo builder",
                "storagectl builder --add ide --name ide0",
                "storageattach builder --storagectl ide0 --type hdd --medium /vms/builder.vdi --port 0 --device 0",
                "storageattach builder --storagectl ide0 --type hdd --medium /vms/data.vdi --port 0 --device 1",
                "storageattach builder --storagectl ide0 --type dvddrive --medium /isos/ubuntu.iso --port 1 --device 0",
                "showvminfo builder",
                "storagectl builder --add floppy --name floppy0",
                "storageattach builder --storagectl floppy0 --type fdd --medium /img/seed.img --device 0",
                "modifyvm builder --natpf1 ssh,tcp,,2222,,22",
                "startvm builder",
            ]
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_provision_stops_at_first_failure() {
        use crate::vbox::test_support::FakeVBoxManage;

        let fake = FakeVBoxManage::new();
        fake.set_exit_code("showvminfo", 1);
        fake.set_exit_code("createvm", 1);
        let vbox = VBoxManage::with_program(fake.path());
        let vm = VmDefinition::minimal("builder", "Ubuntu_64", 2048);

        let err = Provisioner::new(&vbox).provision(&vm).await.unwrap_err();

        assert_eq!(err.exit_code(), Some(1));
        assert_eq!(fake.calls().len(), 2);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_provision_runs_each_step_in_an_operation_span() {
        use crate::vbox::test_support::FakeVBoxManage;
        use std::sync::{Arc, Mutex};
        use tracing::field::{Field, Visit};
        use tracing::span::{Attributes, Id};
        use tracing::Subscriber;
        use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

        struct OperationNames(Arc<Mutex<Vec<String>>>);

        struct NameVisitor<'a>(&'a mut Vec<String>);

        impl Visit for NameVisitor<'_> {
            fn record_str(&mut self, field: &Field, value: &str) {
                if field.name() == "name" {
                    self.0.push(value.to_string());
                }
            }

            fn record_debug(&mut self, _field: &Field, _value: &dyn fmt::Debug) {}
        }

        impl<S: Subscriber> Layer<S> for OperationNames {
            fn on_new_span(&self, attrs: &Attributes<'_>, _id: &Id, _ctx: Context<'_, S>) {
                if attrs.metadata().name() == "operation" {
                    attrs.record(&mut NameVisitor(&mut self.0.lock().unwrap()));
                }
            }
        }

        let names = Arc::new(Mutex::new(Vec::new()));
        let subscriber = tracing_subscriber::registry().with(OperationNames(names.clone()));
        let _guard = tracing::subscriber::set_default(subscriber);

        let fake = FakeVBoxManage::new();
        fake.set_exit_code("showvminfo", 1);
        let vbox = VBoxManage::with_program(fake.path());
        let mut vm = VmDefinition::minimal("builder", "Ubuntu_64", 2048);
        vm.start = true;

        Provisioner::new(&vbox).provision(&vm).await.unwrap();

        assert_eq!(
            *names.lock().unwrap(),
            vec!["create_vm", "set_ram_size", "start_vm"]
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_provision_refuses_existing_vm() {
        use crate::vbox::test_support::FakeVBoxManage;

        let fake = FakeVBoxManage::new();
        fake.set_output("showvminfo", "Name: builder\n");
        let vbox = VBoxManage::with_program(fake.path());
        let vm = VmDefinition::minimal("builder", "Ubuntu_64", 2048);

        let err = Provisioner::new(&vbox).provision(&vm).await.unwrap_err();

        assert!(matches!(err, VBoxError::VmAlreadyExists(name) if name == "builder"));
        assert_eq!(fake.calls(), vec!["showvminfo builder"]);
    }
}
