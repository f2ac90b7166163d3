//! Configuration and state file helpers
//!
//! Configuration documents are YAML using provider attribute names; state
//! files are pretty-printed JSON.

use serde_json::{Map, Value as JsonValue};
use std::path::Path;

use crate::error::{CliError, Result};

/// Load a configuration document
///
/// An empty file is an empty configuration.
pub fn read_config(path: &Path) -> Result<JsonValue> {
    let content = std::fs::read_to_string(path).map_err(|e| CliError::io_at(path, e))?;
    let value: JsonValue = serde_yaml::from_str(&content)
        .map_err(|e| CliError::input(format!("failed to parse {}: {}", path.display(), e)))?;

    match value {
        JsonValue::Object(_) => Ok(value),
        JsonValue::Null => Ok(JsonValue::Object(Map::new())),
        _ => Err(CliError::input(format!(
            "{} must contain a mapping of attributes",
            path.display()
        ))),
    }
}

/// Load a state file; `None` if it does not exist yet
pub fn read_state(path: &Path) -> Result<Option<JsonValue>> {
    if !path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(path).map_err(|e| CliError::io_at(path, e))?;
    let state: JsonValue = serde_json::from_str(&content)
        .map_err(|e| CliError::input(format!("invalid state file {}: {}", path.display(), e)))?;

    if !state.is_object() {
        return Err(CliError::input(format!(
            "invalid state file {}: expected a JSON object",
            path.display()
        )));
    }
    Ok(Some(state))
}

/// Load a state file that must exist
pub fn require_state(path: &Path) -> Result<JsonValue> {
    read_state(path)?.ok_or_else(|| CliError::Io {
        message: format!("state file {} does not exist", path.display()),
    })
}

pub fn write_state(path: &Path, state: &JsonValue) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|e| CliError::io_at(parent, e))?;
    }
    let mut content = serde_json::to_string_pretty(state)?;
    content.push('\n');
    std::fs::write(path, content).map_err(|e| CliError::io_at(path, e))
}

pub fn remove_state(path: &Path) -> Result<()> {
    if path.exists() {
        std::fs::remove_file(path).map_err(|e| CliError::io_at(path, e))?;
    }
    Ok(())
}
