// file: src/vbox/mod.rs
// version: 1.0.0
// guid: 0d7c4a93-e5b8-4216-af30-8c19f6e2d4b7

//! Wrapper around the VBoxManage executable
//!
//! [`VBoxManage`] exposes one method per VBoxManage invocation. Output of the
//! `list` and `showvminfo` sub-commands is parsed into [`Record`]s.

pub mod locator;
pub mod manager;
pub mod parser;
#[cfg(windows)]
pub mod registry;
pub mod runner;
pub mod types;

#[cfg(all(test, unix))]
pub(crate) mod test_support;

pub use locator::locate_vboxmanage;
pub use manager::VBoxManage;
pub use parser::{parse_records, Record};
pub use runner::CommandRunner;
pub use types::{ListKind, NicType, FLOPPY_CONTROLLER, IDE_CONTROLLER};
