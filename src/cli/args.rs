// file: src/cli/args.rs
// version: 1.2.0
// guid: a7d3e185-4b0c-49f6-8e27-c61f5b09d3e4

//! Command line argument definitions

use crate::vbox::{ListKind, NicType};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "vbox-manage")]
#[command(about = "Create and configure VirtualBox VMs through VBoxManage")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the VBoxManage executable
    #[arg(long = "vboxmanage", env = "VBOXMANAGE_PATH", global = true)]
    pub vboxmanage: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the VirtualBox version
    Version,

    /// List things VBoxManage knows about (ostypes, vms, hdds, ...)
    List {
        #[arg(default_value = ListKind::OSTYPES)]
        kind: String,

        #[arg(short, long)]
        json: bool,
    },

    /// Check whether a VM is registered
    Exists { vm: String },

    /// Create and register a VM
    CreateVm {
        #[arg(short, long)]
        name: String,

        #[arg(short, long, default_value = "Other")]
        os_type: String,
    },

    /// Set a VM's memory size
    SetMemory {
        vm: String,

        #[arg(help = "Memory size in MB")]
        memory_mb: u64,
    },

    /// Create a virtual hard disk image
    CreateHd {
        #[arg(short, long)]
        filename: PathBuf,

        #[arg(short, long, help = "Disk size in MB")]
        size_mb: u64,
    },

    /// Attach a disk image to the IDE controller, adding it if needed
    AttachHd {
        vm: String,

        #[arg(short, long)]
        filename: PathBuf,

        #[arg(long, default_value = "0")]
        port: u32,

        #[arg(long, default_value = "0")]
        device: u32,
    },

    /// Insert an ISO image into a DVD drive on the IDE controller
    AttachDvd {
        vm: String,

        #[arg(short, long)]
        filename: PathBuf,

        #[arg(long, default_value = "1")]
        port: u32,

        #[arg(long, default_value = "0")]
        device: u32,
    },

    /// Eject the medium from a DVD drive
    EjectDvd {
        vm: String,

        #[arg(long, default_value = "1")]
        port: u32,

        #[arg(long, default_value = "0")]
        device: u32,
    },

    /// Attach a floppy image, adding the floppy controller if needed
    AttachFloppy {
        vm: String,

        #[arg(short, long)]
        filename: PathBuf,

        #[arg(long, default_value = "0")]
        device: u32,
    },

    /// Show a VM's storage controllers
    Controllers { vm: String },

    /// Set the hardware model of the first network adapter
    SetNic {
        vm: String,

        #[arg(value_parser = parse_nic_type)]
        nic_type: NicType,
    },

    /// Forward a host TCP port to the guest through NAT
    NatForward {
        vm: String,

        #[arg(short, long)]
        rule: String,

        #[arg(long)]
        host_port: u16,

        #[arg(long)]
        guest_port: u16,
    },

    /// Power on a VM
    Start { vm: String },

    /// Create and configure a VM from a YAML definition
    Provision {
        #[arg(help = "Definition file, or name of a definition in the config directory")]
        definition: String,

        #[arg(long, help = "Show what would be done without actually doing it")]
        dry_run: bool,
    },

    /// Check that VBoxManage can be found and run
    CheckPrereqs,
}

fn parse_nic_type(s: &str) -> Result<NicType, String> {
    s.parse::<NicType>().map_err(|e| e.to_string())
}
