// file: src/lib.rs
// version: 3.0.0
// guid: 2b90e6f3-5d18-4a7c-b4e2-0f61c8d93a75

//! # vbox-manage
//!
//! A thin wrapper around VirtualBox's `VBoxManage` command-line tool. Every
//! operation runs `VBoxManage` with a fixed argument shape and waits for it
//! to exit; `list` and `showvminfo` output is parsed into key/value records.
//!
//! ```no_run
//! # async fn demo() -> vbox_manage::Result<()> {
//! use vbox_manage::vbox::{ListKind, VBoxManage};
//!
//! let vbox = VBoxManage::new()?;
//! println!("VirtualBox {}", vbox.version().await?);
//! for os_type in vbox.list(ListKind::OSTYPES).await? {
//!     println!("{:?}", os_type);
//! }
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod provision;
pub mod vbox;

pub use error::{Result, VBoxError};

/// Version information for the utility
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
