// file: src/main.rs
// version: 2.1.0
// guid: 7f25c9e4-b1a6-4038-8d7c-e4093a6b5f12

//! vbox-manage - Main entry point

use anyhow::Context;
use clap::Parser;
use tokio::signal;
use tracing::warn;
use vbox_manage::{
    cli::{
        args::{Cli, Commands},
        commands::*,
    },
    logging::logger,
    vbox::VBoxManage,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    logger::init_logger(cli.verbose, cli.quiet).context("Failed to set up logging")?;

    let Cli {
        command,
        vboxmanage,
        ..
    } = cli;
    let vboxmanage = vboxmanage.as_deref();

    let command_future = async {
        // These two locate VBoxManage themselves, only when they need it
        let vbox = match command {
            Commands::Provision {
                definition,
                dry_run,
            } => return provision_command(vboxmanage, &definition, dry_run).await,
            Commands::CheckPrereqs => return check_prerequisites_command(vboxmanage).await,
            _ => VBoxManage::locate(vboxmanage)?,
        };

        match command {
            Commands::Version => version_command(&vbox).await,
            Commands::List { kind, json } => list_command(&vbox, &kind, json).await,
            Commands::Exists { vm } => exists_command(&vbox, &vm).await,
            Commands::CreateVm { name, os_type } => {
                create_vm_command(&vbox, &name, &os_type).await
            }
            Commands::SetMemory { vm, memory_mb } => {
                set_memory_command(&vbox, &vm, memory_mb).await
            }
            Commands::CreateHd { filename, size_mb } => {
                create_hd_command(&vbox, &filename, size_mb).await
            }
            Commands::AttachHd {
                vm,
                filename,
                port,
                device,
            } => attach_hd_command(&vbox, &vm, &filename, port, device).await,
            Commands::AttachDvd {
                vm,
                filename,
                port,
                device,
            } => attach_dvd_command(&vbox, &vm, &filename, port, device).await,
            Commands::EjectDvd { vm, port, device } => {
                eject_dvd_command(&vbox, &vm, port, device).await
            }
            Commands::AttachFloppy {
                vm,
                filename,
                device,
            } => attach_floppy_command(&vbox, &vm, &filename, device).await,
            Commands::Controllers { vm } => controllers_command(&vbox, &vm).await,
            Commands::SetNic { vm, nic_type } => set_nic_command(&vbox, &vm, nic_type).await,
            Commands::NatForward {
                vm,
                rule,
                host_port,
                guest_port,
            } => nat_forward_command(&vbox, &vm, &rule, host_port, guest_port).await,
            Commands::Start { vm } => start_command(&vbox, &vm).await,
            Commands::Provision { .. } | Commands::CheckPrereqs => unreachable!("dispatched above"),
        }
    };

    tokio::select! {
        result = command_future => Ok(result?),
        _ = signal::ctrl_c() => {
            warn!("Interrupted by user");
            std::process::exit(130); // Standard exit code for Ctrl+C
        }
    }
}
