//! Validate command - check a configuration document against a schema

use console::style;
use crdprov_core::TypeRole;
use serde_json::json;
use std::path::Path;

use crate::display;
use crate::error::{CliError, Result};
use crate::util;

pub fn run(type_name: &str, role: TypeRole, file: &Path, json_output: bool) -> Result<()> {
    let entry = super::resolve_type(type_name, role)?;
    let config = util::read_config(file)?;

    let diags = super::offline().validate(&entry.name, role, &config);

    if json_output {
        let report = json!({
            "valid": !diags.has_errors(),
            "type": entry.name,
            "diagnostics": diags,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if diags.has_errors() {
        println!(
            "{} {} is not a valid {} {}",
            style("✗").red(),
            file.display(),
            entry.kind.kind,
            role
        );
        display::print_diagnostics(&diags);
    } else {
        println!(
            "{} {} is a valid {} {}",
            style("✓").green(),
            file.display(),
            entry.kind.kind,
            role
        );
        display::print_diagnostics(&diags);
    }

    if diags.has_errors() {
        return Err(CliError::from_diagnostics(&diags));
    }
    Ok(())
}
