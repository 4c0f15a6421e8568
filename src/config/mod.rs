// file: src/config/mod.rs
// version: 2.0.0
// guid: 4a6e2f19-83c0-4d57-b1a8-97d5e3c06b21

//! Configuration module
//!
//! Handles loading and validation of VM definitions.

pub mod loader;
pub mod vm;

pub use loader::ConfigLoader;
pub use vm::{DiskConfig, FloppyConfig, OpticalConfig, PortForward, VmDefinition};
