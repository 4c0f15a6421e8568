// file: src/error.rs
// version: 2.2.0
// guid: 3f6c0a91-5b2e-4d7a-9e18-c4b7d2a05e63

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for the application
pub type Result<T> = std::result::Result<T, VBoxError>;

/// Error types for the VBoxManage wrapper
#[derive(Error, Debug)]
pub enum VBoxError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("VBoxManage {command} failed with exit code {}{}", format_code(.code), format_stderr(.stderr))]
    CommandFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("VBoxManage executable not found: {}", .0.display())]
    ToolNotFound(PathBuf),

    #[error("VirtualBox install directory not found: {}", .0.display())]
    InstallDirNotFound(PathBuf),

    #[error("Registry error: {0}")]
    Registry(String),

    #[error("Unexpected VBoxManage output: {0}")]
    UnexpectedOutput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("VM already exists: {0}")]
    VmAlreadyExists(String),

    #[error("VM not found: {0}")]
    VmNotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

fn format_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "none (terminated by signal)".to_string(),
    }
}

fn format_stderr(stderr: &str) -> String {
    let stderr = stderr.trim();
    if stderr.is_empty() {
        String::new()
    } else {
        format!(": {}", stderr)
    }
}

impl VBoxError {
    /// Create a new command failure error
    pub fn command_failed(args: &[String], code: Option<i32>, stderr: impl Into<String>) -> Self {
        Self::CommandFailed {
            command: args.first().cloned().unwrap_or_default(),
            code,
            stderr: stderr.into(),
        }
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a new registry error
    pub fn registry(msg: impl Into<String>) -> Self {
        Self::Registry(msg.into())
    }

    /// Create a new unexpected output error
    pub fn unexpected_output(msg: impl Into<String>) -> Self {
        Self::UnexpectedOutput(msg.into())
    }

    /// Exit code of a failed VBoxManage invocation, if this is one
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::CommandFailed { code, .. } => *code,
            _ => None,
        }
    }
}
