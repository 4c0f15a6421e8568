// file: src/logging/mod.rs
// version: 1.1.0
// guid: 8d2e4b17-0c93-4f6a-a1d5-6e7b39c2f048

//! Logging setup for the VBoxManage wrapper

pub mod logger;

pub use logger::init_logger;
