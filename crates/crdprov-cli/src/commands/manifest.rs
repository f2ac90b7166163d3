//! Manifest command - render a Kubernetes manifest locally

use crdprov_core::TypeRole;
use std::path::Path;

use crate::error::Result;
use crate::util;

pub fn run(type_name: &str, file: &Path, json_output: bool) -> Result<()> {
    let entry = super::resolve_type(type_name, TypeRole::Manifest)?;
    let config = util::read_config(file)?;

    let state = super::offline()
        .render_manifest(&entry.name, &config)
        .map_err(super::fail)?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&state)?);
    } else if let Some(yaml) = state.get("yaml").and_then(|y| y.as_str()) {
        print!("{}", yaml);
    }
    Ok(())
}
