// file: src/cli/mod.rs
// version: 1.1.0
// guid: 9e41b7d0-26fa-4c83-a5e9-d08c3f17b6a2

//! Command line interface for vbox-manage

pub mod args;
pub mod commands;

pub use args::Cli;
pub use commands::*;
