// file: src/config/loader.rs
// version: 1.2.0
// guid: 1e9a7c35-b0d4-4f82-86e3-5a2c0f91d7b4

//! VM definition loading and environment variable substitution

use super::VmDefinition;
use crate::error::VBoxError;
use crate::Result;
use regex::{Captures, Regex};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Directory name used under the user's config directory
pub const APP_DIR_NAME: &str = "vbox-manage";

/// Loads VM definitions, expanding `${VAR}` placeholders first
pub struct ConfigLoader {
    env_vars: HashMap<String, String>,
}

fn placeholder_regex() -> Result<Regex> {
    Regex::new(r"\$\{([^}]+)\}")
        .map_err(|e| VBoxError::config(format!("Invalid regex pattern: {}", e)))
}

impl ConfigLoader {
    /// Create a new config loader seeded from the process environment
    pub fn new() -> Self {
        Self {
            env_vars: std::env::vars().collect(),
        }
    }

    /// Directory searched for named definitions, e.g.
    /// `~/.config/vbox-manage/vms` on Linux
    pub fn definitions_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR_NAME).join("vms"))
    }

    /// Resolve `name_or_path` to a definition file.
    ///
    /// An existing path is used directly; otherwise `<name>.yaml` is looked
    /// up in `definitions_dir`.
    pub fn resolve_definition(&self, name_or_path: &str, definitions_dir: Option<&Path>) -> Result<PathBuf> {
        let direct = PathBuf::from(name_or_path);
        if direct.is_file() {
            return Ok(direct);
        }

        if let Some(dir) = definitions_dir {
            let named = dir.join(format!("{}.yaml", name_or_path));
            if named.is_file() {
                debug!("Resolved definition {} to {}", name_or_path, named.display());
                return Ok(named);
            }
        }

        Err(VBoxError::config(format!(
            "VM definition not found: {}",
            name_or_path
        )))
    }

    /// Load and validate a VM definition from a YAML file
    pub fn load_vm_definition<P: AsRef<Path>>(&self, path: P) -> Result<VmDefinition> {
        let content = fs::read_to_string(&path).map_err(|e| {
            VBoxError::config(format!(
                "Failed to read VM definition {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        self.parse_vm_definition(&content)
    }

    /// Parse and validate a VM definition from YAML text
    pub fn parse_vm_definition(&self, content: &str) -> Result<VmDefinition> {
        let expanded = self.expand_env_vars(content)?;
        let definition: VmDefinition = serde_yaml::from_str(&expanded)?;

        definition.validate()?;

        Ok(definition)
    }

    /// Expand environment variables in configuration content
    fn expand_env_vars(&self, content: &str) -> Result<String> {
        let re = placeholder_regex()?;
        let mut missing_vars = Vec::new();

        let result = re.replace_all(content, |cap: &Captures| {
            let var_name = &cap[1];
            match self.env_vars.get(var_name) {
                Some(value) => value.clone(),
                None => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                    cap[0].to_string()
                }
            }
        });

        if !missing_vars.is_empty() {
            return Err(VBoxError::config(format!(
                "Missing environment variables: {}",
                missing_vars.join(", ")
            )));
        }

        Ok(result.into_owned())
    }

    /// Set environment variable for substitution
    pub fn set_env_var(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.env_vars.insert(key.into(), value.into());
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
